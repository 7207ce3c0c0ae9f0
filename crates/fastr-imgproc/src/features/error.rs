use fastr_image::ImageError;

use crate::parallel::ParallelError;

/// An error type for the corner detectors.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum DetectorError {
    /// An image operation failed.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The execution strategy could not be set up.
    #[error(transparent)]
    Parallel(#[from] ParallelError),

    /// A configuration value is out of its valid range.
    #[error("Invalid detector configuration: {0}")]
    InvalidConfig(String),
}
