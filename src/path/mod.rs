pub mod folder_path;
pub mod pure;

pub use folder_path::*;
pub use pure::{shell_pattern, PurePosixPath};

/// Errors raised by lexical path algebra
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("'{path}' is not in the subpath of '{other}'")]
    NotRelative { path: String, other: String },

    #[error("'{0}' has an empty name")]
    EmptyName(String),

    #[error("Invalid name {0:?}")]
    InvalidName(String),

    #[error("Invalid suffix {0:?}")]
    InvalidSuffix(String),

    #[error("empty pattern")]
    EmptyPattern,

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}
