//! The append-only annotation dataset.
//!
//! Accepted images are JPEG-encoded into the output directory under
//! sequential `image_NNNN.jpg` names, and each one gets a row in the
//! annotation log:
//!
//! ```text
//! image_path,labels
//! saved_images/image_0001.jpg,Gothic;Baroque
//! ```
//!
//! # Ordering guarantees
//!
//! - The image file is written and synced before its log row is appended, so
//!   every row points at a file that exists. A failed append leaves an
//!   unreferenced image behind, never a dangling row.
//! - The next ordinal is derived from the files already in the output
//!   directory, not from the log or a counter, so deleting or truncating the
//!   log never causes a filename to be reused.
//! - Existing image files are never overwritten.

use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::catalog::{Label, LABEL_SEPARATOR};
use crate::error::DroplabelError;
use crate::fetch::Image;

/// Header row of the annotation log.
pub const LOG_HEADER: [&str; 2] = ["image_path", "labels"];

const FILE_PREFIX: &str = "image_";
const FILE_SUFFIX: &str = ".jpg";
const MIN_DIGITS: usize = 4;

/// One row of the annotation log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub image_path: PathBuf,
    pub labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LogRow {
    image_path: String,
    labels: String,
}

/// Writes images and annotation rows for one output directory.
#[derive(Debug)]
pub struct AnnotationStore {
    output_dir: PathBuf,
    log_path: PathBuf,
    jpeg_quality: u8,
    // Held across ordinal scan, image write and log append.
    commit_lock: Mutex<()>,
}

impl AnnotationStore {
    /// Opens a store, creating `output_dir` if needed.
    pub fn open(output_dir: &Path, log_path: &Path) -> Result<Self, DroplabelError> {
        std::fs::create_dir_all(output_dir)?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            log_path: log_path.to_path_buf(),
            jpeg_quality: 90,
            commit_lock: Mutex::new(()),
        })
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Writes the absolute path of the output directory to `side_file` so
    /// external tools can find the dataset.
    pub fn publish_output_dir(&self, side_file: &Path) -> Result<PathBuf, DroplabelError> {
        let absolute = std::fs::canonicalize(&self.output_dir)?;
        std::fs::write(side_file, absolute.to_string_lossy().as_bytes())?;
        Ok(absolute)
    }

    /// Path the next committed image will be written to.
    pub fn next_filename(&self) -> Result<PathBuf, DroplabelError> {
        let names = list_file_names(&self.output_dir)?;
        let ordinal = next_ordinal(names.iter().map(String::as_str));
        Ok(self.output_dir.join(ordinal_file_name(ordinal)))
    }

    /// Writes `image` and appends its annotation row.
    ///
    /// Labels are written in the given order; repeated labels are collapsed.
    pub fn commit(&self, image: &Image, labels: &[Label]) -> Result<AnnotationRecord, DroplabelError> {
        if labels.is_empty() {
            return Err(DroplabelError::NoLabelsSelected);
        }
        let mut unique: Vec<&Label> = Vec::with_capacity(labels.len());
        for label in labels {
            if !unique.contains(&label) {
                unique.push(label);
            }
        }

        let _guard = self
            .commit_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let image_path = self.write_image(image)?;
        let record = AnnotationRecord {
            image_path: image_path.clone(),
            labels: unique.iter().map(|l| l.as_str().to_string()).collect(),
        };
        self.append_row(&record).map_err(|source| DroplabelError::Log {
            path: self.log_path.clone(),
            image: image_path,
            source,
        })?;

        tracing::info!(
            image = %record.image_path.display(),
            labels = record.labels.len(),
            "committed annotation"
        );
        Ok(record)
    }

    fn write_image(&self, image: &Image) -> Result<PathBuf, DroplabelError> {
        // create_new below turns a lost race into an error instead of an overwrite.
        let path = self.next_filename()?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| DroplabelError::Write {
                path: path.clone(),
                source: e.into(),
            })?;

        if let Err(source) = self.encode_jpeg(file, image) {
            // A partial file would still claim its ordinal.
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "could not remove partial image");
            }
            return Err(DroplabelError::Write { path, source });
        }
        Ok(path)
    }

    fn encode_jpeg(&self, file: File, image: &Image) -> Result<(), image::ImageError> {
        let mut writer = BufWriter::new(file);
        let raster = image.raster();
        JpegEncoder::new_with_quality(&mut writer, self.jpeg_quality).write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ExtendedColorType::Rgb8,
        )?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(())
    }

    fn append_row(&self, record: &AnnotationRecord) -> Result<(), csv::Error> {
        let needs_header = std::fs::metadata(&self.log_path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(LOG_HEADER)?;
        }
        let image_path = record.image_path.to_string_lossy();
        let joined = record.labels.join(&LABEL_SEPARATOR.to_string());
        writer.write_record([&*image_path, joined.as_str()])?;
        writer.flush()?;
        Ok(())
    }
}

/// Reads every record from an annotation log. A missing log has no records.
pub fn read_records(log_path: &Path) -> Result<Vec<AnnotationRecord>, DroplabelError> {
    if !log_path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(log_path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    for result in reader.deserialize() {
        let row: LogRow = result.map_err(|source| DroplabelError::LogRead {
            path: log_path.to_path_buf(),
            source,
        })?;
        records.push(AnnotationRecord {
            image_path: PathBuf::from(row.image_path),
            labels: row
                .labels
                .split(LABEL_SEPARATOR)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }
    Ok(records)
}

/// Parses the ordinal out of an `image_NNNN.jpg` file name.
pub fn parse_ordinal(file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?;
    if digits.len() < MIN_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `max(existing ordinals) + 1`, or 1 when none parse.
///
/// Names that do not match the ordinal pattern are ignored.
pub fn next_ordinal<'a, I>(file_names: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    file_names
        .into_iter()
        .filter_map(parse_ordinal)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Formats an ordinal as `image_NNNN.jpg`.
pub fn ordinal_file_name(ordinal: u32) -> String {
    format!("{FILE_PREFIX}{ordinal:0width$}{FILE_SUFFIX}", width = MIN_DIGITS)
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, DroplabelError> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| DroplabelError::Io(e.into()))?;
        if entry.file_type().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

/// Ordinal image files in `dir` that no record references.
pub fn orphaned_images(
    dir: &Path,
    records: &[AnnotationRecord],
) -> Result<Vec<PathBuf>, DroplabelError> {
    let referenced: std::collections::HashSet<String> = records
        .iter()
        .filter_map(|r| r.image_path.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();

    let mut orphans: Vec<PathBuf> = list_file_names(dir)?
        .into_iter()
        .filter(|name| parse_ordinal(name).is_some() && !referenced.contains(name))
        .map(|name| dir.join(name))
        .collect();
    orphans.sort();
    Ok(orphans)
}
