//! Error types for task storage, configuration and image loading.

use thiserror::Error;

/// Errors surfaced by the task workflow around the editor.
///
/// The editor state machine itself never fails; these come from the
/// collaborators it is wired to (task file, settings, image decoding).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be parsed
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Image could not be decoded
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// No task with this identifier exists in the store
    #[error("task not found: {task_id}")]
    TaskNotFound {
        /// The identifier that was looked up
        task_id: String,
    },

    /// Image reference uses a scheme this build cannot resolve
    #[error("unsupported image source: {source_ref}")]
    UnsupportedImageSource {
        /// The raw image reference
        source_ref: String,
    },

    /// Command line arguments could not be parsed
    #[error("invalid arguments: {0}")]
    Args(#[from] pico_args::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
