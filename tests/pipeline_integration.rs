//! End-to-end runs over a small flume data set: load, describe, derive,
//! normalize, export, re-import.

use std::fs;
use uniflow::config::{ChannelConstants, ColumnConfig, IoConfig, RunConfig};
use uniflow::io::csv::{export_table, export_to_string, load_table, read_table};
use uniflow::normalize::{normalize, normalized_columns};
use uniflow::pipeline::{derive, derived_columns};
use uniflow::stats::{self, Summary};
use uniflow::{HydroError, ObservationTable, plotdata};

const UNIFORME: &str = "\
q_m3_h\ty_cm\tslope_m_m\tgroup
10\t5\t0.001\tA
12\t5.6\t0.001\tA
14\t6.1\t0.001\tA
10\t3.9\t0.003\tB
12\t4.4\t0.003\tB
14\t4.8\t0.003\tB
10\t3.2\t0.005\tC
12\t3.6\t0.005\tC
14\t4.1\t0.005\tC
";

fn raw() -> ObservationTable {
    read_table(UNIFORME.as_bytes(), b'\t').unwrap()
}

fn full_run(table: ObservationTable) -> ObservationTable {
    let config = RunConfig::default();
    let derived = derive(table, &config.channel, &config.columns).unwrap();
    normalize(derived).unwrap()
}

#[test]
fn test_export_column_order() {
    let table = full_run(raw());
    let mut expected = vec!["q_m3_h", "y_cm", "slope_m_m", "group"];
    expected.extend(derived_columns());
    expected.extend(normalized_columns());
    assert_eq!(table.names(), expected);
    assert_eq!(table.n_cols(), 4 + 13 + 3);
    assert_eq!(table.n_rows(), 9);
}

#[test]
fn test_first_row_matches_hand_calculation() {
    let table = full_run(raw());
    let at = |name: &str| table.numeric(name).unwrap()[0];

    assert!((at("y_m") - 0.05).abs() < 1e-12);
    assert!((at("area") - 0.0043).abs() < 1e-12);
    assert!((at("perimeter") - 0.186).abs() < 1e-12);
    assert!((at("radius") - 0.02312).abs() < 1e-5);
    assert!((at("q_vol_s") - 0.002778).abs() < 1e-6);
    assert!((at("vel") - 0.6460).abs() < 1e-3);
    assert_eq!(table.labels("slope_perc").unwrap()[0], "0.1");
}

#[test]
fn test_pipeline_is_idempotent_on_raw_columns() {
    let raw = raw();
    let first = full_run(raw.clone());
    let second = full_run(raw.select(&["q_m3_h", "y_cm", "slope_m_m", "group"]).unwrap());

    for name in derived_columns().into_iter().chain(normalized_columns()) {
        assert_eq!(
            first.select(&[name]).unwrap(),
            second.select(&[name]).unwrap(),
            "{} differs between runs",
            name
        );
    }

    // Re-deriving from the derived table's own raw columns gives the same values
    let stripped = first
        .select(&["q_m3_h", "y_cm", "slope_m_m", "group"])
        .unwrap();
    let third = full_run(stripped);
    assert_eq!(first, third);
}

#[test]
fn test_normalized_columns_have_unit_median() {
    let table = full_run(raw());
    for name in normalized_columns() {
        let median = stats::median(table.numeric(name).unwrap()).unwrap();
        assert!((median - 1.0).abs() < 1e-12, "median of {} is {}", name, median);
    }
}

#[test]
fn test_export_round_trip_preserves_raw_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("df.output.csv");
    let io = IoConfig::default();

    let source = raw();
    let before = stats::describe(&source);
    export_table(&path, &full_run(source), &io).unwrap();

    let reloaded = load_table(&path, &IoConfig {
        input_delimiter: ',',
        ..io
    })
    .unwrap();
    let after = stats::describe(&reloaded.select(&["q_m3_h", "y_cm", "slope_m_m", "group"]).unwrap());

    for name in ["q_m3_h", "y_cm", "slope_m_m", "group"] {
        assert_eq!(before.record(name), after.record(name), "{} changed", name);
    }
}

#[test]
fn test_export_is_byte_identical_across_runs() {
    let io = IoConfig::default();
    let first = export_to_string(&full_run(raw()), &io).unwrap();
    let second = export_to_string(&full_run(raw()), &io).unwrap();
    assert_eq!(first, second);

    let header = first.lines().next().unwrap();
    assert!(header.ends_with("froude,n_manning_norm,m_kutter_norm,s_bazin_norm"));
    let row = first.lines().nth(1).unwrap();
    assert!(row.starts_with("10,5,0.001,A,0.1,0.003,0.05,0.004,0.186,0.023,0.152,0.646,"));
}

#[test]
fn test_raw_statistics() {
    let summary = stats::describe(&raw());
    assert_eq!(summary.failures().count(), 0);

    let Some(record) = summary.record("q_m3_h") else {
        panic!("q_m3_h not described");
    };
    let Summary::Numeric(q) = &record.summary else {
        panic!("q_m3_h should be numeric");
    };
    assert_eq!(q.count, 9);
    assert!((q.mean - 12.0).abs() < 1e-12);
    assert_eq!(q.distinct, 3);
    assert_eq!(record.frequencies.len(), 3);
    assert_eq!(record.frequencies[2].cum_count, 9);

    let Some(group) = summary.record("group") else {
        panic!("group not described");
    };
    let Summary::Categorical(g) = &group.summary else {
        panic!("group should be categorical");
    };
    assert_eq!(g.levels, vec!["A", "B", "C"]);
    assert!(g.dupes);
}

#[test]
fn test_bad_rows_are_all_reported() {
    let input = "\
q_m3_h\ty_cm\tslope_m_m\tgroup
10\t0\t0.001\tA
12\t5.6\t0\tA
14\t6.1\t-0.001\tB
";
    let table = read_table(input.as_bytes(), b'\t').unwrap();
    let err = derive(table, &ChannelConstants::default(), &ColumnConfig::new()).unwrap_err();
    let failures = match err {
        HydroError::Derivation(failures) => failures,
        other => panic!("unexpected error {:?}", other),
    };

    let located: Vec<(Option<usize>, Option<&str>)> =
        failures.iter().map(|f| (f.row(), f.column())).collect();
    assert_eq!(
        located,
        vec![(Some(0), Some("vel")), (Some(1), Some("c_exp")), (Some(2), Some("c_exp"))]
    );
    assert!(matches!(failures[1], HydroError::DivisionByZero { .. }));
    assert!(matches!(failures[2], HydroError::InvalidDomain { .. }));
}

#[test]
fn test_missing_column_aborts_before_computation() {
    let input = "q_m3_h\ty_cm\tgroup\n10\t5\tA\n";
    let table = read_table(input.as_bytes(), b'\t').unwrap();
    let err = derive(table, &ChannelConstants::default(), &ColumnConfig::new()).unwrap_err();
    assert!(matches!(err, HydroError::SchemaError { column, .. } if column == "slope_m_m"));
}

#[test]
fn test_plot_data_files() {
    let dir = tempfile::tempdir().unwrap();
    let table = full_run(raw());
    let written = plotdata::write_plot_data(dir.path(), &table, &ColumnConfig::new()).unwrap();
    // ecdf, box and hist per raw input, group counts, then three figure files
    assert_eq!(written.len(), 3 * 3 + 1 + 3);
    for name in ["q_m3_h", "y_cm", "slope_m_m"] {
        for prefix in ["ecdf", "box", "hist"] {
            let path = dir.path().join(format!("{}_{}.csv", prefix, name));
            assert!(written.contains(&path), "{} not written", path.display());
        }
    }

    let hist = fs::read_to_string(dir.path().join("hist_q_m3_h.csv")).unwrap();
    assert_eq!(hist.lines().next().unwrap(), "bin_start,bin_end,count");
    let counts: Vec<usize> = hist
        .lines()
        .skip(1)
        .map(|l| l.rsplit(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(counts, vec![3, 0, 3, 0, 3]);

    let q_box = fs::read_to_string(dir.path().join("box_q_m3_h.csv")).unwrap();
    assert_eq!(q_box.lines().count(), 2);
    assert!(q_box.lines().nth(1).unwrap().starts_with("9,10.0,10.0,12.0,14.0,14.0,"));

    let levels = fs::read_to_string(dir.path().join("counts_group.csv")).unwrap();
    assert_eq!(levels.lines().next().unwrap(), "level,count,percent");
    assert_eq!(levels.lines().count(), 1 + 3);
    assert!(levels.lines().nth(1).unwrap().starts_with("A,3,"));

    let boxes = fs::read_to_string(dir.path().join("boxplot_by_slope.csv")).unwrap();
    // header + 3 slope groups x 4 variables
    assert_eq!(boxes.lines().count(), 1 + 12);
    assert!(boxes.lines().nth(1).unwrap().starts_with("0.1,y_cm,3,"));

    let long = fs::read_to_string(dir.path().join("normalized_long.csv")).unwrap();
    assert_eq!(long.lines().next().unwrap(), "slope_perc,variable,value");
    assert_eq!(long.lines().count(), 1 + 27);
}
