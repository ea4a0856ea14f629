//! Closed-form hydraulics for a rectangular laboratory flume.
//!
//! The chain is an ordered list of named steps. Every step reads only the
//! fields of its own row that earlier steps (or the raw inputs) produced,
//! and reports a `Fault` instead of letting a NaN or infinity through.

use crate::config::ChannelConstants;

pub const GRAVITY: f64 = 9.81;
pub const SECONDS_PER_HOUR: f64 = 3600.0;
pub const CM_PER_M: f64 = 100.0;
pub const KUTTER_FACTOR: f64 = 100.0;
pub const BAZIN_FACTOR: f64 = 87.0;

// Raw input keys inside a row context, whatever the file calls them
pub const DISCHARGE: &str = "q_m3_h";
pub const DEPTH: &str = "y_cm";
pub const SLOPE: &str = "slope_m_m";

#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    NegativeRoot { value: f64 },
    ZeroDenominator { denominator: &'static str },
    /// Overflow or underflow turned the result into an infinity or NaN.
    NonFinite { value: f64 },
    MissingInput { name: &'static str },
}

/// Numeric fields of one row, raw inputs first, then each derived value.
#[derive(Debug, Clone)]
pub struct RowContext {
    fields: Vec<(&'static str, f64)>,
}

impl RowContext {
    pub fn new(discharge: f64, depth: f64, slope: f64) -> Self {
        RowContext {
            fields: vec![(DISCHARGE, discharge), (DEPTH, depth), (SLOPE, slope)],
        }
    }

    pub fn get(&self, name: &'static str) -> Result<f64, Fault> {
        self.fields
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or(Fault::MissingInput { name })
    }

    pub fn insert(&mut self, name: &'static str, value: f64) {
        self.fields.push((name, value));
    }
}

pub type Formula = fn(&RowContext, &ChannelConstants) -> Result<f64, Fault>;

/// Display label of the slope, appended ahead of the numeric chain.
pub const SLOPE_PERC: &str = "slope_perc";

#[derive(Clone, Copy)]
pub struct Step {
    pub column: &'static str,
    pub inputs: &'static [&'static str],
    pub expression: &'static str,
    pub formula: Formula,
}

impl Step {
    pub fn evaluate(&self, ctx: &RowContext, constants: &ChannelConstants) -> Result<f64, Fault> {
        finite((self.formula)(ctx, constants)?)
    }
}

pub const STEPS: [Step; 12] = [
    Step {
        column: "q_vol_s",
        inputs: &[DISCHARGE],
        expression: "q_m3_h / 3600",
        formula: q_vol_s,
    },
    Step {
        column: "y_m",
        inputs: &[DEPTH],
        expression: "y_cm / 100",
        formula: y_m,
    },
    Step {
        column: "area",
        inputs: &["y_m"],
        expression: "y_m * base_m",
        formula: area,
    },
    Step {
        column: "perimeter",
        inputs: &["y_m"],
        expression: "2 * y_m + base_m",
        formula: perimeter,
    },
    Step {
        column: "radius",
        inputs: &["area", "perimeter"],
        expression: "area / perimeter",
        formula: radius,
    },
    Step {
        column: "radius_root",
        inputs: &["radius"],
        expression: "sqrt(radius)",
        formula: radius_root,
    },
    Step {
        column: "vel",
        inputs: &["q_vol_s", "area"],
        expression: "q_vol_s / area",
        formula: vel,
    },
    Step {
        column: "c_exp",
        inputs: &["vel", "radius", SLOPE],
        expression: "vel / sqrt(radius * slope)",
        formula: c_exp,
    },
    Step {
        column: "n_manning",
        inputs: &["radius", "c_exp"],
        expression: "radius^(1/6) / c_exp",
        formula: n_manning,
    },
    Step {
        column: "m_kutter",
        inputs: &["radius_root", "c_exp"],
        expression: "radius_root * 100 / c_exp - radius_root",
        formula: m_kutter,
    },
    Step {
        column: "s_bazin",
        inputs: &["radius_root", "c_exp"],
        expression: "(87 / c_exp - 1) * radius_root",
        formula: s_bazin,
    },
    Step {
        column: "froude",
        inputs: &["vel", "area"],
        expression: "vel / sqrt(area * 9.81 / base_m)",
        formula: froude,
    },
];

pub fn divide(numerator: f64, denominator: f64, name: &'static str) -> Result<f64, Fault> {
    if denominator == 0.0 {
        Err(Fault::ZeroDenominator { denominator: name })
    } else {
        Ok(numerator / denominator)
    }
}

pub fn finite(value: f64) -> Result<f64, Fault> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Fault::NonFinite { value })
    }
}

pub fn root(value: f64) -> Result<f64, Fault> {
    if value < 0.0 {
        Err(Fault::NegativeRoot { value })
    } else {
        Ok(value.sqrt())
    }
}

/// Shortest round-trip decimal, always with a fractional part ("0.1", "1.0").
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// `slope * 100` as display text.
pub fn slope_perc(slope: f64) -> Result<String, Fault> {
    Ok(format_decimal(finite(slope * 100.0)?))
}

fn q_vol_s(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    Ok(ctx.get(DISCHARGE)? / SECONDS_PER_HOUR)
}

fn y_m(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    Ok(ctx.get(DEPTH)? / CM_PER_M)
}

fn area(ctx: &RowContext, c: &ChannelConstants) -> Result<f64, Fault> {
    Ok(ctx.get("y_m")? * c.base_m)
}

fn perimeter(ctx: &RowContext, c: &ChannelConstants) -> Result<f64, Fault> {
    Ok(2.0 * ctx.get("y_m")? + c.base_m)
}

fn radius(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    divide(ctx.get("area")?, ctx.get("perimeter")?, "perimeter")
}

fn radius_root(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    root(ctx.get("radius")?)
}

fn vel(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    divide(ctx.get("q_vol_s")?, ctx.get("area")?, "area")
}

fn c_exp(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    let chezy_root = root(ctx.get("radius")? * ctx.get(SLOPE)?)?;
    divide(ctx.get("vel")?, chezy_root, "sqrt(radius * slope)")
}

fn n_manning(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    divide(ctx.get("radius")?.powf(1.0 / 6.0), ctx.get("c_exp")?, "c_exp")
}

fn m_kutter(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    let rr = ctx.get("radius_root")?;
    Ok(divide(rr * KUTTER_FACTOR, ctx.get("c_exp")?, "c_exp")? - rr)
}

fn s_bazin(ctx: &RowContext, _: &ChannelConstants) -> Result<f64, Fault> {
    let rr = ctx.get("radius_root")?;
    Ok((divide(BAZIN_FACTOR, ctx.get("c_exp")?, "c_exp")? - 1.0) * rr)
}

fn froude(ctx: &RowContext, c: &ChannelConstants) -> Result<f64, Fault> {
    // Hydraulic depth of a rectangle is area / base
    let wave_speed = root(ctx.get("area")? * GRAVITY / c.base_m)?;
    divide(ctx.get("vel")?, wave_speed, "sqrt(area * 9.81 / base_m)")
}
