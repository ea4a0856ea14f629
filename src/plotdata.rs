//! Data behind the lab's exploratory figures, exported as CSV so any
//! plotting tool can draw them. Each raw measurement gets ECDF steps, a box
//! summary and histogram bins; the group column gets level counts. Box
//! summaries grouped by slope, figure point labels and the normalized
//! roughness coefficients in long format cover the derived columns.

use crate::config::ColumnConfig;
use crate::error::Result;
use crate::io::csv::round_to;
use crate::normalize::normalized_columns;
use crate::stats::{self, categorical_frequencies};
use crate::table::ObservationTable;
use csv::Writer;
use log::{debug, info};
use polars::prelude::StringChunked;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Column holding the slope label that groups every figure.
pub const GROUP_BY: &str = "slope_perc";
pub const WHISKER_IQR: f64 = 1.5;
pub const MIN_BINS: usize = 5;
pub const MAX_BINS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EcdfPoint {
    pub value: f64,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

// One box of a grouped box plot, flat so it fits a CSV row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupBox {
    pub group: String,
    pub variable: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

impl GroupBox {
    pub fn new(group: &str, variable: &str, s: BoxSummary) -> Self {
        GroupBox {
            group: group.to_string(),
            variable: variable.to_string(),
            count: s.count,
            min: s.min,
            q1: s.q1,
            median: s.median,
            q3: s.q3,
            max: s.max,
            lower_whisker: s.lower_whisker,
            upper_whisker: s.upper_whisker,
            outliers: s.outliers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointLabel {
    pub row: usize,
    pub slope_perc: String,
    pub depth: f64,
    pub discharge: f64,
    pub vel: f64,
    pub froude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCount {
    pub level: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRow {
    pub slope_perc: String,
    pub variable: String,
    pub value: f64,
}

/// Empirical CDF: sorted values with cumulative fraction i / n.
pub fn ecdf(values: &[f64]) -> Vec<EcdfPoint> {
    let sorted = stats::sorted(values);
    let n = sorted.len() as f64;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, value)| EcdfPoint {
            value,
            fraction: (i + 1) as f64 / n,
        })
        .collect()
}

/// Five-number summary with Tukey whiskers; `None` for an empty series.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let sorted = stats::sorted(values);

    let q1 = stats::quantile(&sorted, 0.25)?;
    let median = stats::quantile(&sorted, 0.5)?;
    let q3 = stats::quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - WHISKER_IQR * iqr, q3 + WHISKER_IQR * iqr);

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();

    Some(BoxSummary {
        count: sorted.len(),
        min: *sorted.first()?,
        q1,
        median,
        q3,
        max: *sorted.last()?,
        lower_whisker: inside.first().copied().unwrap_or(q1),
        upper_whisker: inside.last().copied().unwrap_or(q3),
        outliers: sorted.len() - inside.len(),
    })
}

/// Equal-width bins from min to max. The bin count follows Freedman-Diaconis
/// (`2 IQR / cbrt(n)`, or `range / sqrt(n)` when the IQR is zero), kept
/// within MIN_BINS..=MAX_BINS. The maximum lands in the last bin; a constant
/// series gets one zero-width bin.
pub fn histogram(values: &[f64]) -> Vec<HistBin> {
    let sorted = stats::sorted(values);
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Vec::new();
    };
    if max - min == 0.0 {
        return vec![HistBin {
            bin_start: min,
            bin_end: max,
            count: sorted.len(),
        }];
    }

    let n = sorted.len() as f64;
    let iqr = match (stats::quantile(&sorted, 0.25), stats::quantile(&sorted, 0.75)) {
        (Some(q1), Some(q3)) => q3 - q1,
        _ => 0.0,
    };
    let h = if iqr > 0.0 {
        2.0 * iqr / n.cbrt()
    } else {
        (max - min) / n.sqrt()
    };
    let num_bins = (((max - min) / h).ceil() as usize).clamp(MIN_BINS, MAX_BINS);
    let width = (max - min) / num_bins as f64;

    let mut counts = vec![0; num_bins];
    for value in &sorted {
        let index = (((value - min) / width).floor() as usize).min(num_bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistBin {
            bin_start: min + i as f64 * width,
            bin_end: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Level counts of a grouping column, most frequent first. Blank labels
/// are left out.
pub fn level_counts(table: &ObservationTable, name: &str) -> Result<Vec<LevelCount>> {
    let labels = table.labels(name)?;
    let ca: StringChunked = labels
        .iter()
        .map(|l| (!l.is_empty()).then_some(l.as_str()))
        .collect();

    Ok(categorical_frequencies(&ca)
        .into_iter()
        .map(|row| LevelCount {
            level: row.value.to_string(),
            count: row.count,
            percent: row.percent,
        })
        .collect())
}

/// Distinct labels in first-seen order.
fn group_order(labels: &[String]) -> Vec<&str> {
    let mut order: Vec<&str> = Vec::new();
    for label in labels {
        if !order.contains(&label.as_str()) {
            order.push(label);
        }
    }
    order
}

pub fn boxplots_by_group(
    table: &ObservationTable,
    group_by: &str,
    variables: &[&str],
) -> Result<Vec<GroupBox>> {
    let labels = table.labels(group_by)?;
    let groups = group_order(&labels);
    let mut boxes = Vec::new();

    for &variable in variables {
        let values = table.numeric(variable)?;
        for &group in &groups {
            let members: Vec<f64> = labels
                .iter()
                .zip(values)
                .filter(|(label, _)| label.as_str() == group)
                .map(|(_, v)| *v)
                .collect();
            if let Some(summary) = box_summary(&members) {
                boxes.push(GroupBox::new(group, variable, summary));
            }
        }
    }
    Ok(boxes)
}

pub fn point_labels(table: &ObservationTable, columns: &ColumnConfig) -> Result<Vec<PointLabel>> {
    let slope = table.labels(GROUP_BY)?;
    let depth = table.numeric(&columns.depth)?;
    let discharge = table.numeric(&columns.discharge)?;
    let vel = table.numeric("vel")?;
    let froude = table.numeric("froude")?;

    Ok((0..table.n_rows())
        .filter_map(|row| {
            Some(PointLabel {
                row,
                slope_perc: slope.get(row)?.clone(),
                depth: *depth.get(row)?,
                discharge: *discharge.get(row)?,
                vel: round_to(*vel.get(row)?, 2),
                froude: round_to(*froude.get(row)?, 2),
            })
        })
        .collect())
}

/// Wide-to-long: one row per (id, variable) pair, variable-major.
pub fn melt(table: &ObservationTable, id: &str, variables: &[&str]) -> Result<Vec<LongRow>> {
    let ids = table.labels(id)?;
    let mut rows = Vec::with_capacity(ids.len() * variables.len());
    for &variable in variables {
        let values = table.numeric(variable)?;
        rows.extend(ids.iter().zip(values).map(|(label, value)| LongRow {
            slope_perc: label.clone(),
            variable: variable.to_string(),
            value: *value,
        }));
    }
    Ok(rows)
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every figure's data set into `dir`; returns the files written.
pub fn write_plot_data(
    dir: &Path,
    table: &ObservationTable,
    columns: &ColumnConfig,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for name in columns.numeric_inputs() {
        let values = table.numeric(name)?;

        let path = dir.join(format!("ecdf_{}.csv", name));
        write_rows(&path, &ecdf(values))?;
        written.push(path);

        let path = dir.join(format!("box_{}.csv", name));
        let summary: Vec<BoxSummary> = box_summary(values).into_iter().collect();
        write_rows(&path, &summary)?;
        written.push(path);

        let path = dir.join(format!("hist_{}.csv", name));
        let bins = histogram(values);
        debug!("{}: {} histogram bins", name, bins.len());
        write_rows(&path, &bins)?;
        written.push(path);
    }

    let path = dir.join(format!("counts_{}.csv", columns.group));
    write_rows(&path, &level_counts(table, &columns.group)?)?;
    written.push(path);

    let variables = [columns.depth.as_str(), "n_manning", "m_kutter", "s_bazin"];
    let path = dir.join("boxplot_by_slope.csv");
    write_rows(&path, &boxplots_by_group(table, GROUP_BY, &variables)?)?;
    written.push(path);

    let path = dir.join("point_labels.csv");
    write_rows(&path, &point_labels(table, columns)?)?;
    written.push(path);

    let path = dir.join("normalized_long.csv");
    write_rows(&path, &melt(table, GROUP_BY, &normalized_columns())?)?;
    written.push(path);

    info!("Wrote {} plot data files to {}", written.len(), dir.display());
    Ok(written)
}
