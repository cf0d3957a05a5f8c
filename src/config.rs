//! File layout and network settings.
//!
//! Defaults reproduce the layout the labeling tool has always used in its
//! working directory. The CLI overrides each field through global flags or
//! `DROPLABEL_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::http::{UreqClient, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT};

pub const DEFAULT_LABELS_FILE: &str = "available_labels.csv";
pub const DEFAULT_ANNOTATIONS_FILE: &str = "annotations.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "saved_images";
pub const DEFAULT_FOLDER_FILE: &str = "folder_path.txt";

/// Runtime configuration for a labeling session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Label catalog, one label per row.
    pub labels_path: PathBuf,
    /// Append-only annotation log.
    pub annotations_path: PathBuf,
    /// Directory receiving `image_NNNN.jpg` files.
    pub output_dir: PathBuf,
    /// Side file that publishes the absolute output directory.
    pub folder_path_file: PathBuf,
    /// Bound on every HTTP request.
    pub http_timeout: Duration,
    /// Cap on downloaded bodies.
    pub max_download_bytes: u64,
    pub user_agent: String,
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            labels_path: PathBuf::from(DEFAULT_LABELS_FILE),
            annotations_path: PathBuf::from(DEFAULT_ANNOTATIONS_FILE),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            folder_path_file: PathBuf::from(DEFAULT_FOLDER_FILE),
            http_timeout: DEFAULT_TIMEOUT,
            max_download_bytes: DEFAULT_MAX_BYTES,
            user_agent: format!("droplabel/{}", env!("CARGO_PKG_VERSION")),
            jpeg_quality: 90,
        }
    }
}

impl Config {
    /// Builds the blocking HTTP client these settings describe.
    pub fn http_client(&self) -> UreqClient {
        UreqClient::new(
            self.http_timeout,
            self.max_download_bytes,
            self.user_agent.clone(),
        )
    }
}
