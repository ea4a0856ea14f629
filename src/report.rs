//! Fixed-width text rendering of a statistics run.
//!
//! Output depends only on the summary, so the same table always renders to
//! the same bytes.

use crate::stats::{
    CategoricalSummary, ColumnOutcome, ColumnRecord, FrequencyRow, NumericSummary, Summary,
    TableSummary,
};
use std::fmt::{self, Write};

const RULE: &str =
    "--------------------------------------------------------------------------------";

pub fn render(title: &str, summary: &TableSummary) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, title, summary);
    out
}

pub fn write_report<W: Write>(out: &mut W, title: &str, summary: &TableSummary) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Describe {}:", title)?;
    writeln!(out)?;
    writeln!(
        out,
        "data frame:  {} obs. of {} variables",
        summary.n_rows, summary.n_cols
    )?;
    let complete_pct = if summary.n_rows == 0 {
        0.0
    } else {
        summary.complete_cases as f64 / summary.n_rows as f64 * 100.0
    };
    writeln!(
        out,
        "             {} complete cases ({:.1}%)",
        summary.complete_cases, complete_pct
    )?;
    writeln!(out)?;
    writeln!(out, "  {:>3}  {:<16} {:<10} {:>6}", "Nr", "ColName", "Class", "Levels")?;
    for (i, column) in summary.columns.iter().enumerate() {
        writeln!(
            out,
            "  {:>3}  {:<16} {:<10} {:>6}",
            i + 1,
            column.name,
            column.dtype,
            levels_cell(column)
        )?;
    }

    for (i, column) in summary.columns.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{}", RULE)?;
        writeln!(out)?;
        writeln!(out, "{} - {} ({})", i + 1, column.name, column.dtype)?;
        writeln!(out)?;
        match &column.result {
            Ok(record) => write_record(out, record)?,
            Err(e) => writeln!(out, "  ! {}", e)?,
        }
    }
    Ok(())
}

fn levels_cell(column: &ColumnOutcome) -> String {
    match &column.result {
        Ok(ColumnRecord {
            summary: Summary::Categorical(s),
            ..
        }) => s.unique.to_string(),
        Ok(_) => ".".to_string(),
        Err(_) => "!".to_string(),
    }
}

fn write_record<W: Write>(out: &mut W, record: &ColumnRecord) -> fmt::Result {
    match &record.summary {
        Summary::Numeric(s) => write_numeric(out, s)?,
        Summary::Categorical(s) => write_categorical(out, s)?,
    }
    writeln!(out)?;
    let heading = match record.summary {
        Summary::Numeric(_) => "value",
        Summary::Categorical(_) => "level",
    };
    write_frequencies(out, heading, &record.frequencies)
}

fn write_numeric<W: Write>(out: &mut W, s: &NumericSummary) -> fmt::Result {
    writeln!(
        out,
        "  {:>8} {:>8} {:>6} {:>8} {:>6} {:>10} {:>10}",
        "length", "n", "NAs", "unique", "0s", "mean", "meanCI'"
    )?;
    writeln!(
        out,
        "  {:>8} {:>8} {:>6} {:>8} {:>6} {:>10.2} {:>10.2}",
        s.count, s.count, 0, s.distinct, s.zeros, s.mean, s.mean_ci_lower
    )?;
    writeln!(
        out,
        "  {:>8} {:>8} {:>6} {:>8} {:>6} {:>10} {:>10.2}",
        "",
        "100.0%",
        "0.0%",
        "",
        format!("{:.1}%", pct(s.zeros, s.count)),
        "",
        s.mean_ci_upper
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "  {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        ".05", ".10", ".25", "median", ".75", ".90", ".95"
    )?;
    writeln!(
        out,
        "  {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
        s.p05, s.p10, s.q1, s.median, s.q3, s.p90, s.p95
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "  {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "range", "sd", "vcoef", "mad", "IQR", "skew", "kurt"
    )?;
    writeln!(
        out,
        "  {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2} {:>8.2}",
        s.range, s.std_dev, s.vcoef, s.mad, s.iqr, s.skew, s.kurt
    )
}

fn write_categorical<W: Write>(out: &mut W, s: &CategoricalSummary) -> fmt::Result {
    writeln!(
        out,
        "  {:>8} {:>8} {:>6} {:>8} {:>8} {:>6}",
        "length", "n", "NAs", "unique", "levels", "dupes"
    )?;
    writeln!(
        out,
        "  {:>8} {:>8} {:>6} {:>8} {:>8} {:>6}",
        s.count + s.missing,
        s.count,
        s.missing,
        s.unique,
        s.levels.len(),
        if s.dupes { "y" } else { "n" }
    )
}

fn write_frequencies<W: Write>(out: &mut W, heading: &str, rows: &[FrequencyRow]) -> fmt::Result {
    writeln!(
        out,
        "  {:>3}  {:<12} {:>6} {:>8} {:>8} {:>8}",
        "", heading, "freq", "perc", "cumfreq", "cumperc"
    )?;
    for (j, row) in rows.iter().enumerate() {
        writeln!(
            out,
            "  {:>3}  {:<12} {:>6} {:>7.1}% {:>8} {:>7.1}%",
            j + 1,
            row.value.to_string(),
            row.count,
            row.percent,
            row.cum_count,
            row.cum_percent
        )?;
    }
    Ok(())
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::describe;
    use crate::table::{ColumnValues, ObservationTable};

    fn sample() -> ObservationTable {
        let mut table = ObservationTable::new();
        table
            .push_column("y_cm", ColumnValues::Numeric(vec![1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap();
        table
            .push_column(
                "group",
                ColumnValues::Categorical(
                    ["A", "B", "A", "A", "B"].iter().map(|s| s.to_string()).collect(),
                ),
            )
            .unwrap();
        table
            .push_column("notes", ColumnValues::Unclassified(vec![String::new(); 5]))
            .unwrap();
        table
    }

    #[test]
    fn test_report_is_deterministic() {
        let table = sample();
        let first = render("df.base", &describe(&table));
        let second = render("df.base", &describe(&table));
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_sections() {
        let text = render("df.base", &describe(&sample()));
        assert!(text.contains("Describe df.base:"));
        assert!(text.contains("5 obs. of 3 variables"));
        assert!(text.contains("0 complete cases (0.0%)"));
        assert!(text.contains("1 - y_cm (int64)"));
        assert!(text.contains("2 - group (category)"));
        assert!(text.contains("3 - notes (object)"));
        assert!(text.contains("Malformed column 'notes'"));

        // group frequency table: A first (3 of 5), then B
        let a_row = text
            .lines()
            .find(|l| l.trim_start().starts_with("1  A"))
            .unwrap();
        assert!(a_row.contains("60.0%"));
    }
}
