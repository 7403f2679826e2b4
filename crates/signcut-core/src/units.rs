//! Unit conversion utilities
//!
//! The engine works in millimeters once a drawing is scaled. SVG documents
//! carry their own length units in `width`/`height`, which are parsed here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurement system used when reporting lengths to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    /// Metric system (mm)
    #[default]
    Metric,
    /// Imperial system (inches)
    Imperial,
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for MeasurementSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(format!("Unknown measurement system: {}", s)),
        }
    }
}

/// Length unit suffix accepted on SVG `width`/`height` attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvgLengthUnit {
    /// User units (no suffix or `px`)
    User,
    /// Millimeters
    Mm,
    /// Centimeters
    Cm,
    /// Inches
    In,
    /// Points
    Pt,
}

impl FromStr for SvgLengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "px" => Ok(Self::User),
            "mm" => Ok(Self::Mm),
            "cm" => Ok(Self::Cm),
            "in" => Ok(Self::In),
            "pt" => Ok(Self::Pt),
            other => Err(format!("Unknown SVG length unit: {}", other)),
        }
    }
}

/// Parse an SVG length attribute such as `"210mm"` or `"800"`.
///
/// Returns the numeric part and its unit. Percentages and unknown units
/// yield `None` since they cannot seed a viewBox.
pub fn parse_svg_length(input: &str) -> Option<(f64, SvgLengthUnit)> {
    let input = input.trim();
    let split = input
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(input.len());
    let (number, suffix) = input.split_at(split);
    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let unit = suffix.parse().ok()?;
    Some((value, unit))
}

/// Convert centimeters to millimeters
pub fn cm_to_mm(cm: f64) -> f64 {
    cm * 10.0
}

/// Format a machine coordinate with three decimals.
///
/// Values that round to zero are written without a sign.
pub fn format_coord(value: f64) -> String {
    if value.abs() < 0.0005 {
        return "0.000".to_string();
    }
    format!("{:.3}", value)
}

/// Format length value for display
///
/// * `value_mm` - Value in millimeters
/// * `system` - Target measurement system
pub fn format_length(value_mm: f64, system: MeasurementSystem) -> String {
    match system {
        MeasurementSystem::Metric => format!("{:.3} mm", value_mm),
        MeasurementSystem::Imperial => format!("{:.3} in", value_mm / 25.4),
    }
}

/// Format a duration given in minutes as `"{m}m {s}s"`
pub fn format_minutes(minutes: f64) -> String {
    if !minutes.is_finite() || minutes <= 0.0 {
        return "0m 0s".to_string();
    }
    let whole = minutes.floor();
    let seconds = ((minutes - whole) * 60.0).round();
    // 59.6s rounds up into the next minute
    if seconds >= 60.0 {
        return format!("{}m 0s", whole as u64 + 1);
    }
    format!("{}m {}s", whole as u64, seconds as u64)
}
