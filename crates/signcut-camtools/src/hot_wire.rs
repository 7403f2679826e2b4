//! Hot-wire foam cutter G-code.
//!
//! The wire is heated once at program start with an `S` temperature word
//! and stays hot; every contour ends with a short dwell so the wire does not
//! drag the foam. Material presets give speed and temperature pairs that a
//! job can override.

use crate::error::{CamToolError, CamToolResult, ParameterError};
use crate::gcode::{group_operations, validate, xy};
use crate::sequencer::Toolpath;
use serde::{Deserialize, Serialize};
use signcut_core::units::format_minutes;
use signcut_core::Point;
use tracing::info;

/// Highest accepted `S` value
pub const MAX_TEMPERATURE: u32 = 1000;

/// Named speed and temperature pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MaterialPreset {
    pub key: &'static str,
    pub name: &'static str,
    /// mm/min
    pub speed: f64,
    /// `S` word
    pub temperature: u32,
}

pub const PRESETS: &[MaterialPreset] = &[
    MaterialPreset {
        key: "eps_20",
        name: "Telgopor (EPS) 20mm",
        speed: 300.0,
        temperature: 350,
    },
    MaterialPreset {
        key: "eps_50",
        name: "Telgopor (EPS) 50mm",
        speed: 300.0,
        temperature: 400,
    },
    MaterialPreset {
        key: "xps_20",
        name: "Polyfan (XPS) 20mm",
        speed: 300.0,
        temperature: 600,
    },
    MaterialPreset {
        key: "xps_50",
        name: "Polyfan (XPS) 50mm",
        speed: 300.0,
        temperature: 800,
    },
    MaterialPreset {
        key: "custom",
        name: "Custom",
        speed: 300.0,
        temperature: 0,
    },
];

pub fn preset(key: &str) -> Option<&'static MaterialPreset> {
    PRESETS.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotWireOptions {
    pub preset: String,
    /// Overrides the preset speed
    pub speed: Option<f64>,
    /// Overrides the preset temperature
    pub temperature: Option<u32>,
    /// Seconds to wait for the wire to heat
    pub heat_up_dwell: f64,
    /// Seconds to wait after each closed contour
    pub contour_dwell: f64,
    pub park: Point,
}

impl Default for HotWireOptions {
    fn default() -> Self {
        Self {
            preset: "eps_20".to_string(),
            speed: None,
            temperature: None,
            heat_up_dwell: 1.0,
            contour_dwell: 0.5,
            park: Point::ORIGIN,
        }
    }
}

/// Summary shown to the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotWireStats {
    pub paths: usize,
    pub points: usize,
    pub length_mm: f64,
    pub time_minutes: f64,
    pub width: f64,
    pub height: f64,
}

impl HotWireStats {
    pub fn time_label(&self) -> String {
        format_minutes(self.time_minutes)
    }
}

#[derive(Debug, Clone)]
pub struct HotWireProgram {
    pub gcode: String,
    pub stats: HotWireStats,
}

#[derive(Debug, Clone)]
pub struct HotWireEmitter {
    material: String,
    speed: f64,
    temperature: u32,
    heat_up_dwell: f64,
    contour_dwell: f64,
    park: Point,
}

impl HotWireEmitter {
    /// Resolve the preset, apply overrides and check the result.
    pub fn new(options: &HotWireOptions) -> CamToolResult<Self> {
        let preset = preset(&options.preset)
            .ok_or_else(|| CamToolError::UnknownPreset(options.preset.clone()))?;

        let speed = options.speed.unwrap_or(preset.speed);
        let temperature = options.temperature.unwrap_or(preset.temperature);
        ParameterError::check_positive("speed", speed)?;
        ParameterError::check_range(
            "temperature",
            f64::from(temperature),
            0.0,
            f64::from(MAX_TEMPERATURE),
        )?;
        ParameterError::check_range("heat_up_dwell", options.heat_up_dwell, 0.0, 60.0)?;
        ParameterError::check_range("contour_dwell", options.contour_dwell, 0.0, 60.0)?;

        Ok(Self {
            material: preset.name.to_string(),
            speed,
            temperature,
            heat_up_dwell: options.heat_up_dwell,
            contour_dwell: options.contour_dwell,
            park: options.park,
        })
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn temperature(&self) -> u32 {
        self.temperature
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    pub fn stats(&self, toolpath: &Toolpath) -> HotWireStats {
        let groups = group_operations(&toolpath.operations);
        let mut stats = HotWireStats::default();
        for group in &groups {
            let cuts = group.cuts().count();
            if cuts > 0 {
                stats.paths += 1;
                stats.points += cuts + 1;
            }
        }
        stats.length_mm = toolpath.cut_length();
        stats.time_minutes = stats.length_mm / self.speed;
        if let Some(b) = toolpath.cut_bounds() {
            stats.width = b.w;
            stats.height = b.h;
        }
        stats
    }

    pub fn emit(&self, toolpath: &Toolpath) -> CamToolResult<HotWireProgram> {
        validate(toolpath)?;

        let mut lines: Vec<String> = vec![
            "; Hot wire G-code generated by SignCut".to_string(),
            format!(
                "; Date: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ),
            format!("; Material: {}", self.material),
            format!("; Speed: {:.0} mm/min", self.speed),
            format!("; Temperature (S): {}", self.temperature),
            String::new(),
            "G21 ; Millimeters".to_string(),
            "G90 ; Absolute positioning".to_string(),
            "G0 Z0 ; Z axis to 0".to_string(),
            format!("M3 S{} ; Wire heating on", self.temperature),
            format!("G4 P{} ; Wait for heat up", self.heat_up_dwell),
            format!("G1 F{:.0} ; Set feed rate", self.speed),
            String::new(),
        ];

        let mut path_no = 0;
        for group in group_operations(&toolpath.operations) {
            let mut cuts = group.cuts().peekable();
            let Some(first) = cuts.peek().copied() else {
                continue;
            };
            path_no += 1;
            lines.push(format!("; Path {}", path_no));
            for rapid in group.rapids() {
                lines.push(format!("G0 {}", xy(rapid.end)));
            }
            if group.rapids().next().is_none() {
                lines.push(format!("G0 {}", xy(first.start)));
            }
            for cut in cuts {
                lines.push(format!("G1 {}", xy(cut.end)));
            }
            if group.is_closed() {
                lines.push(format!("G4 P{}", self.contour_dwell));
            }
            lines.push(String::new());
        }

        lines.push("M5 ; Wire heating off".to_string());
        lines.push(format!("G0 {} ; Return to park", xy(self.park)));
        lines.push("M30 ; End of program".to_string());

        let stats = self.stats(toolpath);
        info!(
            "Hot wire program for sheet {}: {} paths, {:.1} mm, {}",
            toolpath.sheet_id,
            stats.paths,
            stats.length_mm,
            stats.time_label()
        );

        let mut gcode = lines.join("\n");
        gcode.push('\n');
        Ok(HotWireProgram { gcode, stats })
    }
}
