use crate::error::Result;
use crate::stats::{ColumnRecord, TableSummary};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Serializable view of a statistics run
#[derive(Debug, Serialize)]
pub struct StatsDocument<'a> {
    pub n_rows: usize,
    pub n_cols: usize,
    pub complete_cases: usize,
    pub columns: Vec<ColumnEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ColumnEntry<'a> {
    pub name: &'a str,
    pub dtype: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<&'a ColumnRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<'a> StatsDocument<'a> {
    pub fn new(summary: &'a TableSummary) -> Self {
        let columns = summary
            .columns
            .iter()
            .map(|c| ColumnEntry {
                name: &c.name,
                dtype: c.dtype,
                record: c.result.as_ref().ok(),
                error: c.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect();

        StatsDocument {
            n_rows: summary.n_rows,
            n_cols: summary.n_cols,
            complete_cases: summary.complete_cases,
            columns,
        }
    }
}

pub fn write_stats_json<W: Write>(summary: &TableSummary, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &StatsDocument::new(summary))?;
    Ok(())
}

pub fn save_stats_json(path: &Path, summary: &TableSummary) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_stats_json(summary, &mut writer)?;
    writer.flush()?;
    info!("Statistics written to {}", path.display());
    Ok(())
}
