pub mod path_details;
pub mod storage_policy;

pub use path_details::*;
pub use storage_policy::*;
