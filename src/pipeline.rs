use crate::config::{ChannelConstants, ColumnConfig};
use crate::error::{HydroError, Result};
use crate::hydraulics::{Fault, RowContext, SLOPE_PERC, STEPS, Step, slope_perc};
use crate::table::{ColumnValues, ObservationTable};
use indicatif::ProgressBar;
use log::{debug, info, warn};

/// Derived column names, in the order they are appended.
pub fn derived_columns() -> Vec<&'static str> {
    std::iter::once(SLOPE_PERC)
        .chain(STEPS.iter().map(|s| s.column))
        .collect()
}

/// Fail before any computation if a required input is missing or mistyped.
pub fn check_schema(table: &ObservationTable, columns: &ColumnConfig) -> Result<()> {
    for name in columns.required() {
        table.require(name)?;
    }
    for name in columns.numeric_inputs() {
        table.numeric(name)?;
    }
    Ok(())
}

/// Derived values of one row: the slope label, then one number per step.
#[derive(Debug, Clone, PartialEq)]
pub struct RowValues {
    pub slope_perc: String,
    pub numbers: Vec<f64>,
}

pub fn fault_to_error(fault: Fault, row: usize, column: &str, expression: &str) -> HydroError {
    match fault {
        Fault::NegativeRoot { value } => HydroError::InvalidDomain {
            row,
            column: column.to_string(),
            formula: expression.to_string(),
            value,
        },
        Fault::ZeroDenominator { denominator } => HydroError::DivisionByZero {
            row: Some(row),
            column: column.to_string(),
            denominator: denominator.to_string(),
        },
        Fault::NonFinite { value } => HydroError::NonFinite {
            row,
            column: column.to_string(),
            formula: expression.to_string(),
            value,
        },
        Fault::MissingInput { name } => HydroError::SchemaError {
            column: name.to_string(),
            reason: format!("is not available when computing {}", column),
        },
    }
}

fn step_error(fault: Fault, row: usize, step: &Step) -> HydroError {
    fault_to_error(fault, row, step.column, step.expression)
}

/// Run the formula chain on one row. Stops at the first failing step,
/// since every later step depends on it.
pub fn evaluate_row(
    row: usize,
    discharge: f64,
    depth: f64,
    slope: f64,
    constants: &ChannelConstants,
) -> Result<RowValues> {
    let label =
        slope_perc(slope).map_err(|fault| fault_to_error(fault, row, SLOPE_PERC, "slope * 100"))?;
    let mut ctx = RowContext::new(discharge, depth, slope);
    let mut numbers = Vec::with_capacity(STEPS.len());

    for step in &STEPS {
        let value = step
            .evaluate(&ctx, constants)
            .map_err(|fault| step_error(fault, row, step))?;
        ctx.insert(step.column, value);
        numbers.push(value);
    }

    Ok(RowValues {
        slope_perc: label,
        numbers,
    })
}

pub fn derive(
    table: ObservationTable,
    constants: &ChannelConstants,
    columns: &ColumnConfig,
) -> Result<ObservationTable> {
    derive_with_progress(table, constants, columns, &ProgressBar::hidden())
}

/// Append the derived hydraulic columns to `table`.
///
/// Every row is evaluated; all row failures are returned together as
/// `HydroError::Derivation` and the table is only extended when none occur.
pub fn derive_with_progress(
    mut table: ObservationTable,
    constants: &ChannelConstants,
    columns: &ColumnConfig,
    pb: &ProgressBar,
) -> Result<ObservationTable> {
    constants.validate()?;
    check_schema(&table, columns)?;
    for name in derived_columns() {
        if table.contains(name) {
            return Err(HydroError::DuplicateColumn(name.to_string()));
        }
    }

    debug!(
        "Deriving with base_m = {}, visco = {}",
        constants.base_m, constants.visco
    );

    let n_rows = table.n_rows();
    let mut labels = Vec::with_capacity(n_rows);
    let mut outputs: Vec<Vec<f64>> = STEPS.iter().map(|_| Vec::with_capacity(n_rows)).collect();
    let mut failures = Vec::new();

    {
        let discharge = table.numeric(&columns.discharge)?;
        let depth = table.numeric(&columns.depth)?;
        let slope = table.numeric(&columns.slope)?;

        // Process each row in file order
        for (row, ((&q, &y), &s)) in discharge.iter().zip(depth).zip(slope).enumerate() {
            match evaluate_row(row, q, y, s, constants) {
                Ok(values) => {
                    labels.push(values.slope_perc);
                    for (output, value) in outputs.iter_mut().zip(values.numbers) {
                        output.push(value);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    failures.push(e);
                }
            }
            pb.inc(1);
        }
    }
    pb.finish();

    if !failures.is_empty() {
        return Err(HydroError::Derivation(failures));
    }

    table.push_column(SLOPE_PERC, ColumnValues::Categorical(labels))?;
    for (step, values) in STEPS.iter().zip(outputs) {
        table.push_column(step.column, ColumnValues::Numeric(values))?;
    }

    info!(
        "Derived {} columns for {} rows",
        STEPS.len() + 1,
        table.n_rows()
    );
    Ok(table)
}
