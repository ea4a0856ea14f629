//! Descriptive statistics for every column of an observation table.
//!
//! Numeric columns get moments, linear-interpolation quantiles, dispersion
//! and shape measures; categorical columns get level bookkeeping. Every
//! column also gets a frequency table with running totals.
//!
//! Estimators follow the usual sample conventions: standard deviation uses
//! the n - 1 denominator, skewness and kurtosis are the bias-corrected
//! Fisher forms (excess kurtosis), and the mean confidence interval uses the
//! normal approximation `mean ± 1.96 · sd / √n` rather than a t quantile.

use crate::error::{HydroError, Result};
use crate::table::{ColumnKind, ObservationTable, dtype_label};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

pub const CI_Z: f64 = 1.96;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub distinct: usize,
    pub zeros: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub vcoef: f64,
    pub mad: f64,
    pub min: f64,
    pub p05: f64,
    pub p10: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub p90: f64,
    pub p95: f64,
    pub max: f64,
    pub iqr: f64,
    pub range: f64,
    pub skew: f64,
    pub kurt: f64,
    pub mean_ci_lower: f64,
    pub mean_ci_upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub missing: usize,
    pub unique: usize,
    /// Distinct values in first-seen order
    pub levels: Vec<String>,
    pub dupes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Summary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FrequencyValue {
    Number(f64),
    Level(String),
}

impl fmt::Display for FrequencyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyValue::Number(v) => write!(f, "{}", v),
            FrequencyValue::Level(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRow {
    pub value: FrequencyValue,
    pub count: usize,
    pub percent: f64,
    pub cum_count: usize,
    pub cum_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnRecord {
    pub name: String,
    pub dtype: String,
    pub summary: Summary,
    pub frequencies: Vec<FrequencyRow>,
}

/// Result of describing one column; failures stay local to their column.
#[derive(Debug)]
pub struct ColumnOutcome {
    pub name: String,
    pub dtype: &'static str,
    pub result: Result<ColumnRecord>,
}

#[derive(Debug)]
pub struct TableSummary {
    pub n_rows: usize,
    pub n_cols: usize,
    pub complete_cases: usize,
    pub columns: Vec<ColumnOutcome>,
}

impl TableSummary {
    pub fn records(&self) -> impl Iterator<Item = &ColumnRecord> {
        self.columns.iter().filter_map(|c| c.result.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &HydroError> {
        self.columns.iter().filter_map(|c| c.result.as_ref().err())
    }

    pub fn record(&self, name: &str) -> Option<&ColumnRecord> {
        self.records().find(|r| r.name == name)
    }
}

pub fn describe(table: &ObservationTable) -> TableSummary {
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            ColumnOutcome {
                name: series.name().to_string(),
                dtype: dtype_label(series),
                result: describe_column(series),
            }
        })
        .collect();

    TableSummary {
        n_rows: table.n_rows(),
        n_cols: table.n_cols(),
        complete_cases: table.complete_cases(),
        columns,
    }
}

pub fn describe_column(series: &Series) -> Result<ColumnRecord> {
    let malformed = |reason: String| HydroError::MalformedColumn {
        column: series.name().to_string(),
        reason,
    };
    if series.is_empty() {
        return Err(malformed("has no observations".to_string()));
    }

    let (summary, frequencies) = match ColumnKind::of(series) {
        ColumnKind::Numeric => (
            Summary::Numeric(numeric_summary(series)?),
            numeric_frequencies(series)?,
        ),
        ColumnKind::Categorical => {
            let ca = series.str()?;
            (
                Summary::Categorical(categorical_summary(ca)),
                categorical_frequencies(ca),
            )
        }
        ColumnKind::Unclassified => {
            return Err(malformed(format!(
                "{} of {} cells are missing, cannot classify as numeric or categorical",
                series.null_count(),
                series.len()
            )));
        }
    };

    Ok(ColumnRecord {
        name: series.name().to_string(),
        dtype: dtype_label(series).to_string(),
        summary,
        frequencies,
    })
}

/// Summary of a Float64 series without nulls.
pub fn numeric_summary(series: &Series) -> Result<NumericSummary> {
    let ca = series.f64()?;
    let values: Vec<f64> = ca.into_iter().flatten().collect();
    let n = values.len();

    let q = |p: f64| {
        ca.quantile(p, QuantileMethod::Linear)
            .ok()
            .flatten()
            .unwrap_or(f64::NAN)
    };
    let mean = ca.mean().unwrap_or(f64::NAN);
    let std_dev = if n < 2 {
        f64::NAN
    } else {
        ca.std(1).unwrap_or(f64::NAN)
    };
    let vcoef = if mean != 0.0 { std_dev / mean } else { f64::NAN };
    let mad = values.iter().map(|x| (x - mean).abs()).sum::<f64>() / n as f64;
    let min = ca.min().unwrap_or(f64::NAN);
    let max = ca.max().unwrap_or(f64::NAN);
    let half_width = CI_Z * std_dev / (n as f64).sqrt();

    Ok(NumericSummary {
        count: n,
        distinct: series.n_unique()?,
        zeros: values.iter().filter(|&&x| x == 0.0).count(),
        mean,
        std_dev,
        vcoef,
        mad,
        min,
        p05: q(0.05),
        p10: q(0.10),
        q1: q(0.25),
        median: ca.median().unwrap_or(f64::NAN),
        q3: q(0.75),
        p90: q(0.90),
        p95: q(0.95),
        max,
        iqr: q(0.75) - q(0.25),
        range: max - min,
        skew: skewness(&values, mean),
        kurt: kurtosis(&values, mean),
        mean_ci_lower: mean - half_width,
        mean_ci_upper: mean + half_width,
    })
}

/// Level bookkeeping over the non-null cells.
pub fn categorical_summary(ca: &StringChunked) -> CategoricalSummary {
    let count = ca.len() - ca.null_count();
    let levels = first_seen_counts(ca)
        .into_iter()
        .map(|(level, _)| level.to_string())
        .collect::<Vec<_>>();

    CategoricalSummary {
        count,
        missing: ca.null_count(),
        unique: levels.len(),
        dupes: levels.len() < count,
        levels,
    }
}

/// Exact-value counts, ascending by value.
pub fn numeric_frequencies(series: &Series) -> Result<Vec<FrequencyRow>> {
    let sorted = series.sort(SortOptions::default())?;

    let mut counts: Vec<(f64, usize)> = Vec::new();
    for value in sorted.f64()?.into_iter().flatten() {
        match counts.last_mut() {
            Some((last, count)) if *last == value => *count += 1,
            _ => counts.push((value, 1)),
        }
    }

    Ok(with_running_totals(
        counts
            .into_iter()
            .map(|(v, c)| (FrequencyValue::Number(v), c)),
        series.len(),
    ))
}

/// Level counts, most frequent first; ties keep first-seen order.
pub fn categorical_frequencies(ca: &StringChunked) -> Vec<FrequencyRow> {
    let mut counts = first_seen_counts(ca);
    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    with_running_totals(
        counts
            .into_iter()
            .map(|(level, c)| (FrequencyValue::Level(level.to_string()), c)),
        ca.len() - ca.null_count(),
    )
}

fn first_seen_counts(ca: &StringChunked) -> Vec<(&str, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in ca.into_iter().flatten() {
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    counts
}

fn with_running_totals(
    counts: impl Iterator<Item = (FrequencyValue, usize)>,
    total: usize,
) -> Vec<FrequencyRow> {
    let mut cum_count = 0;
    counts
        .map(|(value, count)| {
            cum_count += count;
            FrequencyRow {
                value,
                count,
                percent: percent(count, total),
                cum_count,
                cum_percent: percent(cum_count, total),
            }
        })
        .collect()
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Linear-interpolation quantile (`h = (n - 1) p`); None when empty or `p`
/// lies outside [0, 1].
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    Float64Chunked::from_slice(PlSmallStr::EMPTY, values)
        .quantile(p, QuantileMethod::Linear)
        .ok()
        .flatten()
}

pub fn median(values: &[f64]) -> Option<f64> {
    Float64Chunked::from_slice(PlSmallStr::EMPTY, values).median()
}

/// Values in ascending order.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    Float64Chunked::from_slice(PlSmallStr::EMPTY, values)
        .sort(false)
        .into_iter()
        .flatten()
        .collect()
}

// Central moment sums: (sum d^2, sum d^3, sum d^4)
fn moment_sums(values: &[f64], mean: f64) -> (f64, f64, f64) {
    values.iter().fold((0.0, 0.0, 0.0), |(s2, s3, s4), x| {
        let d = x - mean;
        let d2 = d * d;
        (s2 + d2, s3 + d2 * d, s4 + d2 * d2)
    })
}

/// Adjusted Fisher-Pearson skewness (G1).
pub fn skewness(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 3 {
        return f64::NAN;
    }
    let (s2, s3, _) = moment_sums(values, mean);
    if s2 == 0.0 {
        return 0.0;
    }
    let m2 = s2 / n;
    let m3 = s3 / n;
    let g1 = m3 / m2.powf(1.5);
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Bias-corrected excess kurtosis (G2).
pub fn kurtosis(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if values.len() < 4 {
        return f64::NAN;
    }
    let (s2, _, s4) = moment_sums(values, mean);
    if s2 == 0.0 {
        return 0.0;
    }
    let numerator = n * (n + 1.0) * (n - 1.0) * s4;
    let denominator = (n - 2.0) * (n - 3.0) * s2 * s2;
    let adjustment = 3.0 * (n - 1.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0));
    numerator / denominator - adjustment
}
