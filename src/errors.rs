use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the frame pipeline.
///
/// Input errors (`MissingSourceDir`, `NoFrames`, `Configuration`) are raised
/// before any output is written. Per-frame errors inside a batch run are
/// caught by the runner and recorded in its report instead of propagating.
#[derive(Error, Debug)]
pub enum FramekitError {
    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("source directory not found: {}", .path.display())]
    MissingSourceDir { path: PathBuf },

    #[error("no frames found in {}", .path.display())]
    NoFrames { path: PathBuf },

    #[error("a batch run is already in progress")]
    BatchInFlight,

    #[error("{operation} failed for {}", .path.display())]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} failed for {}", .path.display())]
    Image {
        path: PathBuf,
        operation: String,
        #[source]
        source: image::ImageError,
    },

    #[error("background removal command `{program}` {detail}")]
    Removal { program: String, detail: String },

    #[error("archive write failed for {}", .path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

pub type Result<T> = std::result::Result<T, FramekitError>;
