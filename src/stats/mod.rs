//! Dataset statistics.
//!
//! Reads the annotation log back and cross-checks it against the output
//! directory and the label catalog.

mod report;

pub use report::{LabelCount, StatsReport, SummarySection};

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::catalog::LabelCatalog;
use crate::error::DroplabelError;
use crate::store::{self, AnnotationRecord};

/// Options for dataset statistics.
#[derive(Clone, Debug)]
pub struct StatsOptions {
    /// Width of histogram bars (in characters).
    pub bar_width: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self { bar_width: 20 }
    }
}

/// Computes statistics for the dataset formed by `log_path` and `output_dir`.
pub fn dataset_stats(
    log_path: &Path,
    output_dir: &Path,
    catalog: &LabelCatalog,
    opts: &StatsOptions,
) -> Result<StatsReport, DroplabelError> {
    let records = store::read_records(log_path)?;
    let orphaned_images = if output_dir.is_dir() {
        store::orphaned_images(output_dir, &records)?
    } else {
        Vec::new()
    };
    let images_on_disk = if output_dir.is_dir() {
        count_ordinal_files(output_dir)?
    } else {
        0
    };

    Ok(build_report(
        &records,
        catalog,
        images_on_disk,
        orphaned_images,
        opts,
    ))
}

fn build_report(
    records: &[AnnotationRecord],
    catalog: &LabelCatalog,
    images_on_disk: usize,
    orphaned_images: Vec<std::path::PathBuf>,
    opts: &StatsOptions,
) -> StatsReport {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        for label in &record.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
    }

    let mut labels: Vec<LabelCount> = counts
        .iter()
        .map(|(label, count)| LabelCount {
            label: (*label).to_string(),
            count: *count,
        })
        .collect();
    labels.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

    let used: HashSet<&str> = counts.keys().copied().collect();
    let unused_labels = catalog
        .labels()
        .iter()
        .filter(|label| !used.contains(label.as_str()))
        .map(|label| label.as_str().to_string())
        .collect();

    let missing_images = records
        .iter()
        .filter(|r| !r.image_path.is_file())
        .map(|r| r.image_path.clone())
        .collect();

    StatsReport {
        summary: SummarySection {
            records: records.len(),
            catalog_labels: catalog.len(),
            distinct_labels: counts.len(),
            assignments: counts.values().sum(),
            images_on_disk,
        },
        labels,
        unused_labels,
        missing_images,
        orphaned_images,
        bar_width: opts.bar_width,
    }
}

fn count_ordinal_files(dir: &Path) -> Result<usize, DroplabelError> {
    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        if store::parse_ordinal(&name.to_string_lossy()).is_some() {
            count += 1;
        }
    }
    Ok(count)
}
