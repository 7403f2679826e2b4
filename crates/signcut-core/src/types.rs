//! Small enums shared between the pipeline crates and the settings layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order in which free space on a sheet is consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillDirection {
    /// Column-first: spaces sorted by x, then y
    #[default]
    Vertical,
    /// Row-first: spaces sorted by y, then x
    Horizontal,
}

impl fmt::Display for FillDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertical => write!(f, "vertical"),
            Self::Horizontal => write!(f, "horizontal"),
        }
    }
}

impl FromStr for FillDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vertical" | "v" | "columns" => Ok(Self::Vertical),
            "horizontal" | "h" | "rows" => Ok(Self::Horizontal),
            _ => Err(format!("Unknown fill direction: {}", s)),
        }
    }
}

/// Placement heuristic used by the packer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// First space that fits
    #[default]
    FirstFit,
    /// Space leaving the smallest short-side remainder
    BestShortSideFit,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstFit => write!(f, "first_fit"),
            Self::BestShortSideFit => write!(f, "best_short_side_fit"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first_fit" | "first" => Ok(Self::FirstFit),
            "best_short_side_fit" | "bssf" | "best" => Ok(Self::BestShortSideFit),
            _ => Err(format!("Unknown packing strategy: {}", s)),
        }
    }
}

/// What a cut frees from the material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutClass {
    /// Interior void of a part
    Hole,
    /// Outer boundary of a part
    Contour,
}

impl fmt::Display for CutClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hole => write!(f, "hole"),
            Self::Contour => write!(f, "contour"),
        }
    }
}
