//! Uniform open-channel flow analysis for laboratory flume runs.
//!
//! A run loads a tab-separated table of trials (discharge, depth, slope,
//! group), summarizes every column, derives velocity, hydraulic radius,
//! Chezy/Manning/Kutter/Bazin coefficients and the Froude number row by
//! row, normalizes the roughness coefficients by their median, and exports
//! the result.
//!
//! ```no_run
//! use uniflow::config::RunConfig;
//! use uniflow::{io, normalize, pipeline, stats};
//!
//! # fn main() -> uniflow::error::Result<()> {
//! let config = RunConfig::default();
//! let table = io::csv::load_table("uniforme.txt".as_ref(), &config.io)?;
//! let summary = stats::describe(&table);
//! let table = pipeline::derive(table, &config.channel, &config.columns)?;
//! let table = normalize::normalize(table)?;
//! io::csv::export_table("df.output.csv".as_ref(), &table, &config.io)?;
//! # let _ = summary;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hydraulics;
pub mod io;
pub mod normalize;
pub mod pipeline;
pub mod plotdata;
pub mod report;
pub mod stats;
pub mod table;

pub use error::{HydroError, Result};
pub use table::{ColumnKind, ColumnValues, ObservationTable};
