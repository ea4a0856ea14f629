use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use uniflow::config::{OutputFormat, RunConfig};

/// Derive uniform-flow hydraulics from flume measurements
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Tab-separated measurements (q_m3_h, y_cm, slope_m_m, group)
    pub input: PathBuf,

    /// Export path for the derived table
    #[arg(short, long, default_value = "df.output.csv")]
    pub output: PathBuf,

    /// Write the text report here instead of stdout
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Statistics JSON path, used when the format includes json
    #[arg(long, default_value = "df.stats.json")]
    pub stats_json: PathBuf,

    /// Directory for plot data files
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,

    /// TOML run configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Channel base width (m)
    #[arg(long)]
    pub base_m: Option<f64>,

    /// Kinematic viscosity (m2/s)
    #[arg(long)]
    pub visco: Option<f64>,

    /// Statistics output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// File configuration first, then flags on top.
    pub fn resolve_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("Failed to load config: {:?}", path))?,
            None => RunConfig::default(),
        };

        if let Some(base_m) = self.base_m {
            config.channel.base_m = base_m;
        }
        if let Some(visco) = self.visco {
            config.channel.visco = visco;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        config
            .channel
            .validate()
            .context("Invalid channel constants")?;
        Ok(config)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub fn get_args() -> Args {
    Args::parse()
}
