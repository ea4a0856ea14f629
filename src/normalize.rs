use crate::error::{HydroError, Result};
use crate::stats;
use crate::table::{ColumnValues, ObservationTable};
use log::debug;

/// Roughness coefficients rescaled by their median, as (source, target).
pub const NORMALIZED: [(&str, &str); 3] = [
    ("n_manning", "n_manning_norm"),
    ("m_kutter", "m_kutter_norm"),
    ("s_bazin", "s_bazin_norm"),
];

pub fn normalized_columns() -> Vec<&'static str> {
    NORMALIZED.iter().map(|(_, target)| *target).collect()
}

/// `value / median(column)` for one numeric series.
pub fn normalize_by_median(source: &str, target: &str, values: &[f64]) -> Result<Vec<f64>> {
    let median = stats::median(values).ok_or_else(|| HydroError::MalformedColumn {
        column: source.to_string(),
        reason: "has no observations".to_string(),
    })?;
    if median == 0.0 {
        return Err(HydroError::DivisionByZero {
            row: None,
            column: target.to_string(),
            denominator: format!("median({})", source),
        });
    }
    debug!("median({}) = {}", source, median);
    values
        .iter()
        .enumerate()
        .map(|(row, v)| {
            let scaled = v / median;
            if scaled.is_finite() {
                Ok(scaled)
            } else {
                Err(HydroError::NonFinite {
                    row,
                    column: target.to_string(),
                    formula: format!("{} / median({})", source, source),
                    value: scaled,
                })
            }
        })
        .collect()
}

/// Append the three median-normalized roughness columns.
pub fn normalize(mut table: ObservationTable) -> Result<ObservationTable> {
    for (source, target) in NORMALIZED {
        let scaled = normalize_by_median(source, target, table.numeric(source)?)?;
        table.push_column(target, ColumnValues::Numeric(scaled))?;
    }
    Ok(table)
}
