use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a source file into a frame sequence.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file was readable but its format is unknown, unsupported or corrupt.
    #[error("unsupported or corrupt image {}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to decode frame {index} of {}", path.display())]
    Frame {
        path: PathBuf,
        index: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("animation has no frames")]
    Empty,
}
