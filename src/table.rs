use crate::error::{HydroError, Result};
use polars::prelude::*;
use std::collections::HashSet;

// Cell values of one column, classified once when the table is built
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
    /// Cells that could not be classified (all missing, or numeric with gaps).
    Unclassified(Vec<String>),
}

impl ColumnValues {
    /// Classify raw text cells. Empty cells count as missing.
    pub fn infer(cells: Vec<String>) -> Self {
        let missing = cells.iter().filter(|c| c.trim().is_empty()).count();
        if cells.is_empty() || missing == cells.len() {
            return ColumnValues::Unclassified(cells);
        }

        let parsed: Vec<Option<f64>> = cells.iter().map(|c| parse_number(c)).collect();
        let numeric = parsed.iter().filter(|v| v.is_some()).count();

        if numeric == cells.len() {
            ColumnValues::Numeric(parsed.into_iter().flatten().collect())
        } else if numeric + missing == cells.len() {
            // Numbers with holes: neither a clean numeric series nor a set of labels
            ColumnValues::Unclassified(cells)
        } else {
            ColumnValues::Categorical(cells.into_iter().map(|c| c.trim().to_string()).collect())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(v) => v.len(),
            ColumnValues::Categorical(v) | ColumnValues::Unclassified(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric cells become a Float64 series; blank cells become nulls.
    /// Unclassified cells only ever hold numbers and blanks, so they are
    /// stored as a Float64 series with nulls.
    pub fn into_series(self, name: &str) -> Series {
        match self {
            ColumnValues::Numeric(values) => Series::new(name.into(), values),
            ColumnValues::Categorical(labels) => {
                let cells: Vec<Option<String>> = labels
                    .into_iter()
                    .map(|c| if c.is_empty() { None } else { Some(c) })
                    .collect();
                Series::new(name.into(), cells)
            }
            ColumnValues::Unclassified(cells) => {
                let values: Vec<Option<f64>> = cells.iter().map(|c| parse_number(c)).collect();
                Series::new(name.into(), values)
            }
        }
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Unclassified,
}

impl ColumnKind {
    pub fn of(series: &Series) -> Self {
        match series.dtype() {
            DataType::Float64 if series.null_count() == 0 => ColumnKind::Numeric,
            DataType::String if series.null_count() < series.len() => ColumnKind::Categorical,
            _ => ColumnKind::Unclassified,
        }
    }
}

/// Storage class label, in the vocabulary of the lab's report
pub fn dtype_label(series: &Series) -> &'static str {
    match ColumnKind::of(series) {
        ColumnKind::Numeric => {
            let is_integer = series
                .f64()
                .map(|ca| ca.into_iter().flatten().all(|v| v == v.floor()))
                .unwrap_or(false);
            if is_integer { "int64" } else { "float64" }
        }
        ColumnKind::Categorical => "category",
        ColumnKind::Unclassified => "object",
    }
}

/// Ordered, append-only set of named columns sharing one row count.
#[derive(Debug, Clone)]
pub struct ObservationTable {
    frame: DataFrame,
}

impl PartialEq for ObservationTable {
    fn eq(&self, other: &Self) -> bool {
        self.frame.equals_missing(&other.frame)
    }
}

impl Default for ObservationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationTable {
    pub fn new() -> Self {
        ObservationTable {
            frame: DataFrame::empty(),
        }
    }

    /// Append a column at the end. Names must be unique and lengths must match.
    pub fn push_column(&mut self, name: impl Into<String>, values: ColumnValues) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(HydroError::DuplicateColumn(name));
        }
        if self.n_cols() > 0 && values.len() != self.n_rows() {
            return Err(HydroError::LengthMismatch {
                expected: self.n_rows(),
                found: values.len(),
                column: name,
            });
        }
        self.frame.with_column(values.into_series(&name))?;
        Ok(())
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn n_rows(&self) -> usize {
        self.frame.height()
    }

    pub fn n_cols(&self) -> usize {
        self.frame.width()
    }

    pub fn columns(&self) -> &[Column] {
        self.frame.get_columns()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns().iter().map(|c| c.name().as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.frame.get_column_index(name).is_some()
    }

    pub fn require(&self, name: &str) -> Result<&Series> {
        self.frame
            .column(name)
            .map(|c| c.as_materialized_series())
            .map_err(|_| HydroError::SchemaError {
                column: name.to_string(),
                reason: "is missing".to_string(),
            })
    }

    pub fn dtype(&self, name: &str) -> Result<&'static str> {
        Ok(dtype_label(self.require(name)?))
    }

    pub fn numeric(&self, name: &str) -> Result<&[f64]> {
        let series = self.require(name)?;
        match ColumnKind::of(series) {
            ColumnKind::Numeric => Ok(series.f64()?.cont_slice()?),
            _ => Err(HydroError::SchemaError {
                column: name.to_string(),
                reason: format!("must be numeric, found {}", dtype_label(series)),
            }),
        }
    }

    /// Cell text of a column usable as a grouping label.
    pub fn labels(&self, name: &str) -> Result<Vec<String>> {
        let series = self.require(name)?;
        match ColumnKind::of(series) {
            ColumnKind::Categorical => Ok(series
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or_default().to_string())
                .collect()),
            ColumnKind::Numeric => Ok(series
                .f64()?
                .into_iter()
                .flatten()
                .map(|v| v.to_string())
                .collect()),
            ColumnKind::Unclassified => Err(HydroError::SchemaError {
                column: name.to_string(),
                reason: "has no usable labels".to_string(),
            }),
        }
    }

    /// Rows without a single missing cell.
    pub fn complete_cases(&self) -> usize {
        let mut complete = vec![true; self.n_rows()];
        for column in self.columns() {
            let present = column.as_materialized_series().is_not_null();
            for (row, valid) in (&present).into_iter().enumerate() {
                if valid != Some(true) {
                    complete[row] = false;
                }
            }
        }
        complete.into_iter().filter(|&c| c).count()
    }

    /// New table holding only the named columns, in the order given.
    pub fn select(&self, names: &[&str]) -> Result<ObservationTable> {
        let mut seen = HashSet::new();
        for &name in names {
            if !seen.insert(name) {
                return Err(HydroError::DuplicateColumn(name.to_string()));
            }
            self.require(name)?;
        }
        Ok(ObservationTable {
            frame: self.frame.select(names.iter().copied())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn single(values: ColumnValues) -> ObservationTable {
        let mut table = ObservationTable::new();
        table.push_column("x", values).unwrap();
        table
    }

    #[test]
    fn test_infer_numeric() {
        let values = ColumnValues::infer(cells(&["10", " 12.5", "3e2"]));
        assert_eq!(values, ColumnValues::Numeric(vec![10.0, 12.5, 300.0]));
        assert_eq!(single(values).dtype("x").unwrap(), "float64");
    }

    #[test]
    fn test_whole_numbers_are_int64() {
        let values = ColumnValues::infer(cells(&["10", "12", "3e2"]));
        assert_eq!(values, ColumnValues::Numeric(vec![10.0, 12.0, 300.0]));
        assert_eq!(single(values).dtype("x").unwrap(), "int64");
    }

    #[test]
    fn test_infer_categorical_and_missing() {
        let labels = ColumnValues::infer(cells(&["A", "B", "10"]));
        assert!(matches!(labels, ColumnValues::Categorical(_)));
        assert_eq!(single(labels).dtype("x").unwrap(), "category");

        let empty = ColumnValues::infer(cells(&["", " ", ""]));
        assert!(matches!(empty, ColumnValues::Unclassified(_)));
        assert_eq!(single(empty).dtype("x").unwrap(), "object");

        let gappy = ColumnValues::infer(cells(&["1.5", "", "2.0"]));
        assert!(matches!(gappy, ColumnValues::Unclassified(_)));
        let table = single(gappy);
        assert_eq!(table.dtype("x").unwrap(), "object");
        assert!(table.numeric("x").is_err());
    }

    #[test]
    fn test_non_finite_text_is_not_numeric() {
        let values = ColumnValues::infer(cells(&["nan", "inf"]));
        assert!(matches!(values, ColumnValues::Categorical(_)));
    }

    #[test]
    fn test_push_column_rejects_duplicates_and_bad_lengths() {
        let mut table = ObservationTable::new();
        table
            .push_column("a", ColumnValues::Numeric(vec![1.0, 2.0]))
            .unwrap();

        let dup = table.push_column("a", ColumnValues::Numeric(vec![3.0, 4.0]));
        assert!(matches!(dup, Err(HydroError::DuplicateColumn(name)) if name == "a"));

        let short = table.push_column("b", ColumnValues::Numeric(vec![1.0]));
        assert!(matches!(
            short,
            Err(HydroError::LengthMismatch { expected: 2, found: 1, .. })
        ));
        assert_eq!(table.names(), vec!["a"]);
        assert_eq!(table.numeric("a").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_numeric_accessor_reports_schema_errors() {
        let mut table = ObservationTable::new();
        table
            .push_column("group", ColumnValues::Categorical(cells(&["A", "B"])))
            .unwrap();

        assert!(matches!(
            table.numeric("y_cm"),
            Err(HydroError::SchemaError { column, .. }) if column == "y_cm"
        ));
        assert!(matches!(
            table.numeric("group"),
            Err(HydroError::SchemaError { column, .. }) if column == "group"
        ));
    }

    #[test]
    fn test_complete_cases_and_select() {
        let mut table = ObservationTable::new();
        table
            .push_column("x", ColumnValues::Numeric(vec![1.0, 2.0, 3.0]))
            .unwrap();
        table
            .push_column("label", ColumnValues::Categorical(cells(&["A", "", "B"])))
            .unwrap();
        assert_eq!(table.complete_cases(), 2);
        assert_eq!(table.labels("label").unwrap(), vec!["A", "", "B"]);

        let picked = table.select(&["label", "x"]).unwrap();
        assert_eq!(picked.names(), vec!["label", "x"]);
        assert_eq!(picked.n_rows(), 3);
        assert!(matches!(
            table.select(&["x", "x"]),
            Err(HydroError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_equal_tables_compare_equal() {
        let build = || {
            let mut table = ObservationTable::new();
            table
                .push_column("x", ColumnValues::Numeric(vec![1.0, 2.0]))
                .unwrap();
            table
                .push_column("g", ColumnValues::Categorical(cells(&["A", "B"])))
                .unwrap();
            table
        };
        assert_eq!(build(), build());
        assert_ne!(build(), build().select(&["x"]).unwrap());
    }
}
