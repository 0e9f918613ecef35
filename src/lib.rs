//! Path-style access to managed storage folders
//!
//! A [`Folder`] wraps a [`StorageBackend`]; [`FolderPath`] adds lexical path
//! algebra plus content helpers (text, bytes, images) on top of it.
//!
//! ```no_run
//! use folderpath::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let folder = Config::load()?.open_folder();
//! let path = &folder / "reports" / "summary.txt";
//! path.write_text("done", &Default::default())?;
//! for txt in folder.glob("*.txt")? {
//!     println!("{}", txt);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod folder;
pub mod imaging;
pub mod io;
pub mod models;
pub mod path;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use folder::Folder;
pub use imaging::ImageInput;
pub use io::{BytesWriter, Errors, OpenFile, OpenMode, TextOptions, TextWriter};
pub use models::PathDetails;
pub use path::{FolderPath, PathError, PathLike, PurePosixPath};
pub use storage::{LocalStorage, MemoryStorage, StorageBackend};
