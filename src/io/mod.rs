pub mod mode;
pub mod text;
pub mod writer;

pub use mode::{OpenFile, OpenMode};
pub use text::{Errors, TextOptions};
pub use writer::{BytesWriter, TextWriter};
