use std::path::PathBuf;
use thiserror::Error;

/// The main error type for droplabel operations.
#[derive(Debug, Error)]
pub enum DroplabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not extract an image reference from the input: {input:?}")]
    Unresolvable { input: String },

    #[error("Failed to read image file {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Failed to decode image from {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Label already exists: '{0}'")]
    DuplicateLabel(String),

    #[error("Invalid label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: String },

    #[error("Label is not in the catalog: '{0}'")]
    UnknownLabel(String),

    #[error("Please select at least one label")]
    NoLabelsSelected,

    #[error("No image loaded")]
    NoImageLoaded,

    #[error("Failed to save image to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write annotations to {path}: {source} (image {image} may need re-saving)")]
    Log {
        path: PathBuf,
        image: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read annotations from {path}: {source}")]
    LogRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read label catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write label catalog {path}: {source}")]
    CatalogWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
