//! Error kinds raised while collecting and reading the dataset.

use crate::common::*;
use thiserror::Error;

/// The kind of a failure.
///
/// Configuration and empty-dataset failures are returned as the error
/// itself. Acquisition and decode failures are attached as context on top
/// of the underlying cause. Use [ErrorKind::of] to recover the kind from
/// an [anyhow::Error] in both cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Missing or malformed dataset URL.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    /// No training images were found after indexing. The path is the
    /// indexed root, or empty if the root is unknown.
    #[error("{}", empty_dataset_message(.0))]
    EmptyDataset(PathBuf),
    /// Download or extraction failure.
    #[error("failed to acquire dataset: {0}")]
    Acquisition(String),
    /// An image file could not be decoded.
    #[error("failed to decode image '{}'", .0.display())]
    Decode(PathBuf),
}

impl ErrorKind {
    /// Find the error kind carried by the error, looking through context layers.
    pub fn of(error: &Error) -> Option<&ErrorKind> {
        error.downcast_ref::<ErrorKind>()
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_empty_dataset(&self) -> bool {
        matches!(self, Self::EmptyDataset(_))
    }

    pub fn is_acquisition(&self) -> bool {
        matches!(self, Self::Acquisition(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

fn empty_dataset_message(root: &Path) -> String {
    if root.as_os_str().is_empty() {
        "the dataset index has no training images".into()
    } else {
        format!("no training images found under '{}'", root.display())
    }
}
