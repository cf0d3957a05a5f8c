#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Minimal 24-bit BMP with an all-black pixel array.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// A scratch working directory with the default droplabel file layout.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn labels(&self) -> PathBuf {
        self.path("available_labels.csv")
    }

    pub fn annotations(&self) -> PathBuf {
        self.path("annotations.csv")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path("saved_images")
    }

    /// `droplabel` running inside the workspace with every path pinned.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("droplabel").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .env_remove("DROPLABEL_LABELS")
            .env_remove("DROPLABEL_ANNOTATIONS")
            .env_remove("DROPLABEL_OUTPUT_DIR")
            .env_remove("DROPLABEL_FOLDER_FILE")
            .env_remove("DROPLABEL_TIMEOUT_SECS");
        cmd
    }
}
