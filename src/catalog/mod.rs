//! The persistent label vocabulary.
//!
//! The catalog file holds one label per row with no header. It is read once
//! when the catalog is opened and rewritten in full after every successful
//! [`LabelCatalog::add`].

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::DroplabelError;

/// Separator used between labels in the annotation log.
pub const LABEL_SEPARATOR: char = ';';

/// A non-empty, trimmed label.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(String);

impl Label {
    /// Validates and trims a user-supplied label.
    pub fn parse(raw: &str) -> Result<Self, DroplabelError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DroplabelError::InvalidLabel {
                label: raw.to_string(),
                reason: "label is empty".to_string(),
            });
        }
        if trimmed.contains(LABEL_SEPARATOR) {
            return Err(DroplabelError::InvalidLabel {
                label: raw.to_string(),
                reason: format!("label may not contain '{}'", LABEL_SEPARATOR),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({:?})", self.0)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, duplicate-free set of labels backed by a file.
#[derive(Debug)]
pub struct LabelCatalog {
    path: PathBuf,
    labels: Vec<Label>,
}

impl LabelCatalog {
    /// Opens the catalog at `path`. A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self, DroplabelError> {
        let labels = if path.exists() {
            read_labels(path)?
        } else {
            Vec::new()
        };
        tracing::debug!(path = %path.display(), count = labels.len(), "loaded label catalog");
        Ok(Self {
            path: path.to_path_buf(),
            labels,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Case-sensitive exact lookup.
    pub fn get(&self, name: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.as_str() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Appends a label and flushes the whole catalog before returning.
    ///
    /// The in-memory catalog is only updated once the flush succeeded.
    pub fn add(&mut self, raw: &str) -> Result<Label, DroplabelError> {
        let label = Label::parse(raw)?;
        if self.contains(label.as_str()) {
            return Err(DroplabelError::DuplicateLabel(label.0));
        }

        let mut next = self.labels.clone();
        next.push(label.clone());
        write_labels(&self.path, &next)?;
        self.labels = next;

        tracing::info!(label = %label, path = %self.path.display(), "added label");
        Ok(label)
    }
}

fn read_labels(path: &Path) -> Result<Vec<Label>, DroplabelError> {
    let file = File::open(path).map_err(DroplabelError::Io)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut labels: Vec<Label> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|source| DroplabelError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(first) = record.get(0) else {
            continue;
        };
        if first.trim().is_empty() {
            continue;
        }
        let label = match Label::parse(first) {
            Ok(label) => label,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping catalog row");
                continue;
            }
        };
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    Ok(labels)
}

/// Rewrites the catalog via a sibling temporary file and a rename.
fn write_labels(path: &Path, labels: &[Label]) -> Result<(), DroplabelError> {
    let tmp = tmp_path(path);
    let write_err = |source: csv::Error| DroplabelError::CatalogWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(&tmp).map_err(|e| write_err(e.into()))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    for label in labels {
        writer.write_record([label.as_str()]).map_err(write_err)?;
    }
    let mut file = writer
        .into_inner()
        .map_err(|e| write_err(e.into_error().into()))?;
    file.flush().map_err(|e| write_err(e.into()))?;
    file.sync_all().map_err(|e| write_err(e.into()))?;
    drop(file);

    std::fs::rename(&tmp, path).map_err(|e| write_err(e.into()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_skips_rows_with_separator() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.csv");
        std::fs::write(&path, "Gothic\na;b\n\nModern\nGothic\n").expect("write");

        let catalog = LabelCatalog::load(&path).expect("load");
        let names: Vec<&str> = catalog.labels().iter().map(Label::as_str).collect();
        assert_eq!(names, vec!["Gothic", "Modern"]);
        assert!(!catalog.contains("a;b"));
    }

    #[test]
    fn missing_file_is_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let catalog = LabelCatalog::load(&dir.path().join("labels.csv")).expect("load");
        assert!(catalog.is_empty());
    }

    #[test]
    fn add_persists_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.csv");

        let mut catalog = LabelCatalog::load(&path).expect("load");
        catalog.add("Gothic").expect("add");
        catalog.add("  Art Deco  ").expect("add");
        catalog.add("Baroque, late").expect("add");

        let reloaded = LabelCatalog::load(&path).expect("reload");
        let names: Vec<&str> = reloaded.labels().iter().map(Label::as_str).collect();
        assert_eq!(names, vec!["Gothic", "Art Deco", "Baroque, late"]);
        assert!(!dir.path().join("labels.csv.tmp").exists());
    }

    #[test]
    fn duplicate_is_rejected_and_file_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.csv");

        let mut catalog = LabelCatalog::load(&path).expect("load");
        catalog.add("Gothic").expect("add");
        let before = std::fs::read(&path).expect("read");

        let err = catalog.add("Gothic").expect_err("duplicate");
        assert!(matches!(err, DroplabelError::DuplicateLabel(ref l) if l == "Gothic"));
        assert_eq!(std::fs::read(&path).expect("read"), before);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut catalog = LabelCatalog::load(&dir.path().join("labels.csv")).expect("load");
        catalog.add("Gothic").expect("add");
        catalog.add("gothic").expect("different case is a different label");
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn blank_and_separator_labels_are_invalid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.csv");
        let mut catalog = LabelCatalog::load(&path).expect("load");

        for bad in ["", "   ", "\t\n", "a;b"] {
            let err = catalog.add(bad).expect_err("invalid");
            assert!(matches!(err, DroplabelError::InvalidLabel { .. }));
        }
        assert!(!path.exists());
    }

    #[test]
    fn load_skips_blank_rows_and_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("labels.csv");
        std::fs::write(&path, "Gothic\n\nModern\nGothic\n\"Tudor, revival\"\n").expect("write");

        let catalog = LabelCatalog::load(&path).expect("load");
        let names: Vec<&str> = catalog.labels().iter().map(Label::as_str).collect();
        assert_eq!(names, vec!["Gothic", "Modern", "Tudor, revival"]);
    }
}
