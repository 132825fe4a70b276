use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the annotation tool.
///
/// Each variant carries the context of its domain (filesystem, image codec,
/// window system, segmentation) so callers can decide per variant whether a
/// failure ends the run or only the current file.
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Window error: {operation} failed: {message}")]
    Window { operation: String, message: String },

    #[error("Segmentation error: {reason}")]
    Segmentation { reason: String },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AnnotateError>;

impl AnnotateError {
    pub(crate) fn segmentation(reason: impl Into<String>) -> Self {
        Self::Segmentation {
            reason: reason.into(),
        }
    }
}

/// Convert I/O errors to filesystem errors.
///
/// Code that knows the path and operation should build
/// `AnnotateError::FileSystem` directly instead.
impl From<std::io::Error> for AnnotateError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Convert image crate errors to image processing errors.
impl From<image::ImageError> for AnnotateError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert minifb errors to window errors.
impl From<minifb::Error> for AnnotateError {
    fn from(err: minifb::Error) -> Self {
        Self::Window {
            operation: "window system".to_string(),
            message: err.to_string(),
        }
    }
}

/// Shape mismatches only arise when a label mask is built from raw data.
impl From<ndarray::ShapeError> for AnnotateError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Validation {
            field: "label mask".to_string(),
            reason: err.to_string(),
        }
    }
}
