use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QTreeError {
    /// A split threshold of zero would make every page permanently overloaded.
    #[error("Split threshold must be at least 1, got {0}.")]
    InvalidSplitThreshold(usize),

    /// The root a writer started from was replaced before it could publish.
    #[error("Tree root was replaced by a concurrent writer.")]
    StaleRoot,
}

pub type Result<T> = std::result::Result<T, QTreeError>;
