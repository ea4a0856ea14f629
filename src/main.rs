use anyhow::{Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::fs;
use std::io::Write;

mod cli;

use cli::get_args;
use uniflow::{io, normalize, pipeline, plotdata, report, stats};

fn main() -> Result<()> {
    let args = get_args();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    // Configuration
    let started = Local::now();
    info!("Run started at {}", started.format("%Y-%m-%d %H:%M:%S"));
    let config = args.resolve_config()?;
    debug!("Run configuration: {:?}", config);
    info!(
        "Channel constants: base_m = {} m, visco = {} m2/s",
        config.channel.base_m, config.channel.visco
    );

    // Load raw measurements
    let table = io::csv::load_table(&args.input, &config.io)
        .with_context(|| format!("Failed to read input: {:?}", args.input))?;
    pipeline::check_schema(&table, &config.columns)
        .with_context(|| format!("Input {:?} does not match the expected schema", args.input))?;

    // Descriptive statistics on the raw table
    let summary = stats::describe(&table);
    for failure in summary.failures() {
        warn!("Statistics skipped: {}", failure);
    }
    if config.format.wants_text() {
        let text = report::render("df.base (data.frame)", &summary);
        match &args.report {
            Some(path) => {
                fs::write(path, &text)
                    .with_context(|| format!("Failed to write report: {:?}", path))?;
                info!("Report written to {}", path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
        }
    }
    if config.format.wants_json() {
        io::results::save_stats_json(&args.stats_json, &summary)
            .with_context(|| format!("Failed to write statistics: {:?}", args.stats_json))?;
    }

    // Create progress bar
    let pb = ProgressBar::new(table.n_rows() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({eta})")?
            .progress_chars("#>-"),
    );

    // Hydraulic derivation and normalization
    info!("Deriving hydraulic variables...");
    let table = match pipeline::derive_with_progress(table, &config.channel, &config.columns, &pb) {
        Ok(table) => table,
        Err(e) => {
            error!("{}", e);
            return Err(e).context("Hydraulic derivation failed");
        }
    };
    let table = normalize::normalize(table).context("Normalization failed")?;

    io::csv::export_table(&args.output, &table, &config.io)
        .with_context(|| format!("Failed to export: {:?}", args.output))?;

    if let Some(dir) = &args.plot_dir {
        plotdata::write_plot_data(dir, &table, &config.columns)
            .with_context(|| format!("Failed to write plot data to {:?}", dir))?;
    }

    let elapsed = Local::now() - started;
    info!(
        "Run complete in {} ms. Output saved to {}",
        elapsed.num_milliseconds(),
        args.output.display()
    );
    Ok(())
}
