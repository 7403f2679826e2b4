//! Standard router G-code.
//!
//! Absolute millimeters. Every contour is entered with the spindle off,
//! cut at feed rate with the spindle on, and the program ends with the
//! spindle off and a single move to the park position.

use crate::error::{CamToolResult, ParameterError};
use crate::gcode::{group_operations, remove_redundant_m5, validate, xy};
use crate::sequencer::Toolpath;
use serde::{Deserialize, Serialize};
use signcut_core::units::format_coord;
use signcut_core::Point;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterOptions {
    /// Cutting feed in mm/min
    pub feed_rate: f64,
    pub park: Point,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            feed_rate: 1200.0,
            park: Point::ORIGIN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouterEmitter {
    options: RouterOptions,
}

impl RouterEmitter {
    pub fn new(options: RouterOptions) -> CamToolResult<Self> {
        ParameterError::check_positive("feed_rate", options.feed_rate)?;
        if !options.park.is_finite() {
            return Err(ParameterError::InvalidValue {
                name: "park".to_string(),
                reason: "coordinates must be finite".to_string(),
            }
            .into());
        }
        Ok(Self { options })
    }

    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Render a toolpath as a complete program.
    ///
    /// Fails without producing any text when the toolpath is empty or holds
    /// a non-finite coordinate.
    pub fn emit(&self, toolpath: &Toolpath) -> CamToolResult<String> {
        validate(toolpath)?;

        let mut lines: Vec<String> = vec![
            "%".to_string(),
            "(SignCut router program)".to_string(),
            format!(
                "(Sheet {}: {} x {} mm)",
                toolpath.sheet_id,
                format_coord(toolpath.width),
                format_coord(toolpath.height)
            ),
            "G21".to_string(),
            "G90".to_string(),
            "G17".to_string(),
            "M5".to_string(),
            String::new(),
        ];

        let groups = group_operations(&toolpath.operations);
        for group in &groups {
            lines.push(format!("({})", group.label()));
            lines.push("M5".to_string());
            for rapid in group.rapids() {
                lines.push(format!("G0 {}", xy(rapid.end)));
            }
            let mut cuts = group.cuts().peekable();
            if cuts.peek().is_some() {
                lines.push("M3".to_string());
                lines.push(format!("G1 F{:.0}", self.options.feed_rate));
                for cut in cuts {
                    lines.push(format!("G1 {}", xy(cut.end)));
                }
            }
            lines.push(String::new());
        }

        lines.push("M5".to_string());
        lines.push(format!("G0 {}", xy(self.options.park)));
        lines.push("M30".to_string());
        lines.push("%".to_string());

        let lines = remove_redundant_m5(lines);
        info!(
            "Router program for sheet {}: {} contours, {} lines",
            toolpath.sheet_id,
            groups.len(),
            lines.len()
        );

        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }
}
