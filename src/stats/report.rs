//! Stats report types and terminal formatting.
//!
//! A [`StatsReport`] renders as text through `Display` or serializes to JSON.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Statistics for an annotation dataset on disk.
#[derive(Clone, Debug, Serialize)]
pub struct StatsReport {
    pub summary: SummarySection,
    /// Per-label usage, sorted by count descending then name.
    pub labels: Vec<LabelCount>,
    /// Labels present in the catalog that no record uses.
    pub unused_labels: Vec<String>,
    /// Records whose image file is gone.
    pub missing_images: Vec<PathBuf>,
    /// Ordinal image files no record references.
    pub orphaned_images: Vec<PathBuf>,
    #[serde(skip)]
    pub(crate) bar_width: usize,
}

/// Summary counts.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    /// Data rows in the annotation log.
    pub records: usize,
    /// Labels in the catalog.
    pub catalog_labels: usize,
    /// Distinct labels used by records.
    pub distinct_labels: usize,
    /// Label assignments across all records.
    pub assignments: usize,
    /// `image_NNNN.jpg` files in the output directory.
    pub images_on_disk: usize,
}

/// A single label with its record count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;

        writeln!(f, "Dataset stats")?;
        writeln!(f)?;
        writeln!(f, "  Records:          {:>8}", format_number(s.records))?;
        writeln!(f, "  Images on disk:   {:>8}", format_number(s.images_on_disk))?;
        writeln!(f, "  Catalog labels:   {:>8}", format_number(s.catalog_labels))?;
        writeln!(f, "  Labels in use:    {:>8}", format_number(s.distinct_labels))?;
        writeln!(f, "  Assignments:      {:>8}", format_number(s.assignments))?;
        writeln!(f)?;

        self.fmt_labels(f)?;

        if !self.unused_labels.is_empty() {
            writeln!(f)?;
            writeln!(f, "Unused labels: {}", self.unused_labels.join(", "))?;
        }
        fmt_paths(f, "Missing images (referenced but not on disk)", &self.missing_images)?;
        fmt_paths(f, "Orphaned images (on disk but never recorded)", &self.orphaned_images)?;

        Ok(())
    }
}

impl StatsReport {
    fn fmt_labels(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            return writeln!(f, "No annotations yet.");
        }

        writeln!(f, "Labels")?;
        let max_count = self.labels.first().map(|l| l.count).unwrap_or(0);
        let name_width = self
            .labels
            .iter()
            .map(|l| l.label.chars().count())
            .max()
            .unwrap_or(0)
            .min(32);

        for entry in &self.labels {
            writeln!(
                f,
                "  {:<name_width$}  {} {:>6}  {:>6}",
                truncate(&entry.label, 32),
                render_bar(entry.count, max_count, self.bar_width),
                format_number(entry.count),
                fmt_percent(entry.count, self.summary.records),
                name_width = name_width
            )?;
        }
        Ok(())
    }
}

fn fmt_paths(f: &mut fmt::Formatter<'_>, title: &str, paths: &[PathBuf]) -> fmt::Result {
    if paths.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "{} ({})", title, paths.len())?;
    for path in paths {
        writeln!(f, "  {}", path.display())?;
    }
    Ok(())
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Format a number with thousand separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Format a percentage, handling zero denominators.
fn fmt_percent(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        "n/a".to_string()
    } else {
        format!("{:.1}%", (numerator as f64 / denominator as f64) * 100.0)
    }
}

fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return String::new();
    }

    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}
