use crate::error::{HydroError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration structure for input column name mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Discharge in m3/h
    pub discharge: String,
    /// Water depth in cm
    pub depth: String,
    /// Channel slope in m/m
    pub slope: String,
    pub group: String,
}

impl ColumnConfig {
    pub fn new() -> Self {
        ColumnConfig {
            discharge: "q_m3_h".to_string(),
            depth: "y_cm".to_string(),
            slope: "slope_m_m".to_string(),
            group: "group".to_string(),
        }
    }

    pub fn required(&self) -> [&str; 4] {
        [
            self.discharge.as_str(),
            self.depth.as_str(),
            self.slope.as_str(),
            self.group.as_str(),
        ]
    }

    pub fn numeric_inputs(&self) -> [&str; 3] {
        [self.discharge.as_str(), self.depth.as_str(), self.slope.as_str()]
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self::new()
    }
}

// Channel constants, fixed for the whole run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConstants {
    /// Flume base width (m)
    pub base_m: f64,
    /// Kinematic viscosity of water (m2/s)
    pub visco: f64,
}

impl ChannelConstants {
    pub fn new(base_m: f64, visco: f64) -> Self {
        ChannelConstants { base_m, visco }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("base_m", self.base_m), ("visco", self.visco)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(HydroError::InvalidConstant { name, value });
            }
        }
        Ok(())
    }
}

impl Default for ChannelConstants {
    fn default() -> Self {
        ChannelConstants {
            base_m: 0.086,
            visco: 1e-6,
        }
    }
}

// Output format configuration for the statistics report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Both,
}

impl OutputFormat {
    pub fn wants_text(self) -> bool {
        matches!(self, OutputFormat::Text | OutputFormat::Both)
    }

    pub fn wants_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

// Flat-file layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    pub input_delimiter: char,
    pub output_delimiter: char,
    /// Decimal digits kept for numeric values on export
    pub digits: u32,
}

impl IoConfig {
    pub fn input_byte(&self) -> Result<u8> {
        delimiter_byte("input_delimiter", self.input_delimiter)
    }

    pub fn output_byte(&self) -> Result<u8> {
        delimiter_byte("output_delimiter", self.output_delimiter)
    }
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            input_delimiter: '\t',
            output_delimiter: ',',
            digits: 3,
        }
    }
}

fn delimiter_byte(name: &str, delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(|b| b.is_ascii())
        .ok_or_else(|| HydroError::SchemaError {
            column: name.to_string(),
            reason: format!("delimiter {:?} is not a single ASCII character", delimiter),
        })
}

/// Everything a run needs, as read from an optional TOML file.
///
/// ```toml
/// format = "both"
///
/// [channel]
/// base_m = 0.086
/// visco = 1e-6
///
/// [columns]
/// discharge = "q_m3_h"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub columns: ColumnConfig,
    pub channel: ChannelConstants,
    pub io: IoConfig,
    pub format: OutputFormat,
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(content)?;
        config.channel.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_lab_setup() {
        let config = RunConfig::default();
        assert_eq!(config.channel.base_m, 0.086);
        assert_eq!(config.channel.visco, 1e-6);
        assert_eq!(
            config.columns.required(),
            ["q_m3_h", "y_cm", "slope_m_m", "group"]
        );
        assert_eq!(config.io.input_byte().unwrap(), b'\t');
        assert_eq!(config.io.digits, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RunConfig::from_toml_str(
            r#"
            format = "both"

            [channel]
            base_m = 0.1

            [columns]
            depth = "depth_cm"
            "#,
        )
        .unwrap();

        assert_eq!(config.channel.base_m, 0.1);
        assert_eq!(config.channel.visco, 1e-6);
        assert_eq!(config.columns.depth, "depth_cm");
        assert_eq!(config.columns.discharge, "q_m3_h");
        assert_eq!(config.format, OutputFormat::Both);
    }

    #[test]
    fn test_non_positive_constants_are_rejected() {
        let err = RunConfig::from_toml_str("[channel]\nbase_m = 0.0\n").unwrap_err();
        assert!(matches!(err, HydroError::InvalidConstant { name: "base_m", .. }));

        assert!(ChannelConstants::new(0.086, -1.0).validate().is_err());
        assert!(ChannelConstants::new(f64::NAN, 1e-6).validate().is_err());
    }

    #[test]
    fn test_non_ascii_delimiter_is_rejected() {
        let io = IoConfig {
            input_delimiter: 'é',
            ..IoConfig::default()
        };
        assert!(io.input_byte().is_err());
    }
}
