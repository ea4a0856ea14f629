use crate::config::IoConfig;
use crate::error::{HydroError, Result};
use crate::table::{ColumnValues, ObservationTable};
use csv::{ReaderBuilder, Writer, WriterBuilder};
use log::{debug, info};
use polars::prelude::{DataType, Series};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Read a delimited table with a header row. Column kinds are decided here,
/// once, from the cell text.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<ObservationTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for result in rdr.records() {
        let record = result?;
        for (column, value) in cells.iter_mut().zip(record.iter()) {
            column.push(value.to_string());
        }
    }

    let mut table = ObservationTable::new();
    for (name, column) in headers.into_iter().zip(cells) {
        table.push_column(name.as_str(), ColumnValues::infer(column))?;
        debug!("Column {} inferred as {}", name, table.dtype(&name)?);
    }
    Ok(table)
}

// Function to load the raw measurement file
pub fn load_table(path: &Path, io: &IoConfig) -> Result<ObservationTable> {
    let file = File::open(path)?;
    let table = read_table(BufReader::new(file), io.input_byte()?)?;
    info!(
        "Loaded {} obs. of {} variables from {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(table)
}

/// Round half to even at `digits` decimals; `-0` is folded to `0`.
/// Magnitudes too large to scale are already coarser than `digits`.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round_ties_even() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Export text of one column: numbers rounded, missing cells left blank.
pub fn format_column(series: &Series, digits: u32) -> Result<Vec<String>> {
    let cells = match series.dtype() {
        DataType::String => series
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect(),
        _ => series
            .f64()?
            .into_iter()
            .map(|v| {
                v.map(|x| round_to(x, digits).to_string())
                    .unwrap_or_default()
            })
            .collect(),
    };
    Ok(cells)
}

pub fn write_table<W: Write>(table: &ObservationTable, wtr: &mut Writer<W>, digits: u32) -> Result<()> {
    let columns = table
        .columns()
        .iter()
        .map(|c| format_column(c.as_materialized_series(), digits))
        .collect::<Result<Vec<_>>>()?;

    wtr.write_record(table.names())?;
    for row in 0..table.n_rows() {
        wtr.write_record(columns.iter().map(|cells| cells[row].as_str()))?;
    }
    wtr.flush()?;
    Ok(())
}

// Create CSV writer for the export file
pub fn create_csv_writer(path: &Path, io: &IoConfig) -> Result<Writer<File>> {
    let wtr = WriterBuilder::new()
        .has_headers(true)
        .delimiter(io.output_byte()?)
        .from_path(path)?;
    Ok(wtr)
}

pub fn export_table(path: &Path, table: &ObservationTable, io: &IoConfig) -> Result<()> {
    let mut wtr = create_csv_writer(path, io)?;
    write_table(table, &mut wtr, io.digits)?;
    info!(
        "Exported {} rows x {} columns to {}",
        table.n_rows(),
        table.n_cols(),
        path.display()
    );
    Ok(())
}

/// Export to an in-memory string, mostly for golden comparisons.
pub fn export_to_string(table: &ObservationTable, io: &IoConfig) -> Result<String> {
    let mut wtr = WriterBuilder::new()
        .delimiter(io.output_byte()?)
        .from_writer(Vec::new());
    write_table(table, &mut wtr, io.digits)?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| HydroError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| HydroError::SchemaError {
        column: "<export>".to_string(),
        reason: e.to_string(),
    })
}
