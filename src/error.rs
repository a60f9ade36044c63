use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors returned by tree mutations.
///
/// These are returned as values, never panicked, so a renderer can surface
/// them without unwinding through a draw pass.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A folder segment collides with an existing sibling leaf name.
    #[error("name collision: {name}")]
    NameCollision { name: String },

    /// Move target is the node itself or one of its descendants.
    #[error("cannot move a folder into its own subtree")]
    Cycle,

    /// The referenced node has already been removed from the store.
    #[error("node no longer exists")]
    NotFound,

    /// Empty path, or a name containing a path separator.
    #[error("invalid path: {path}")]
    InvalidPath { path: String },
}
