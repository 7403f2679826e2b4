//! Job configuration for SignCut
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Sheet stock (size, inter-part gap)
//! - Packing (rotation, fill direction, strategy, budget)
//! - Import (target width, sampling, background removal)
//! - Toolpath (safe travel, ordering, EcoCut)
//! - Router and hot-wire machine output

use crate::error::{SettingsError, SettingsResult};
pub use signcut_core::units::MeasurementSystem;
pub use signcut_core::{FillDirection, StrategyKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stock board dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    /// Sheet width in mm
    pub width: f64,
    /// Sheet height in mm
    pub height: f64,
    /// Minimum clearance between parts in mm
    pub gap: f64,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 600.0,
            gap: 5.0,
        }
    }
}

/// Packing behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackingSettings {
    /// Allow 90 degree rotation of parts
    pub allow_rotation: bool,
    /// Column-first or row-first fill
    pub fill_direction: FillDirection,
    /// Placement heuristic
    pub strategy: StrategyKind,
    /// Abort packing after this many placement attempts
    pub max_steps: Option<u64>,
    /// Abort packing after this many milliseconds
    pub timeout_ms: Option<u64>,
}

impl Default for PackingSettings {
    fn default() -> Self {
        Self {
            allow_rotation: true,
            fill_direction: FillDirection::Vertical,
            strategy: StrategyKind::FirstFit,
            max_steps: None,
            timeout_ms: None,
        }
    }
}

/// Vector import behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Target drawing width in cm; `None` keeps drawing units as mm
    pub real_width_cm: Option<f64>,
    /// Arc-length step for boundary sampling, in drawing units
    pub sample_step: f64,
    /// Drop a leading shape covering 90% of the viewBox
    pub remove_background: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            real_width_cm: None,
            sample_step: 1.0,
            remove_background: true,
        }
    }
}

/// Cut ordering and travel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolpathSettings {
    /// Route rapids along the sheet border
    pub safe_travel: bool,
    /// Invert the nearest-neighbor part order
    pub reverse_order: bool,
    /// Rapid traverse rate used for time estimates, mm/min
    pub rapid_rate: f64,
    /// Join all contours of a sheet into one continuous stroke
    pub ecocut: bool,
    /// Resampling step for EcoCut contours, mm
    pub ecocut_step: f64,
}

impl Default for ToolpathSettings {
    fn default() -> Self {
        Self {
            safe_travel: false,
            reverse_order: false,
            rapid_rate: 3000.0,
            ecocut: false,
            ecocut_step: 1.0,
        }
    }
}

/// CNC router output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
    /// Cutting feed rate, mm/min
    pub feed_rate: f64,
    /// Park position X after the program, mm
    pub park_x: f64,
    /// Park position Y after the program, mm
    pub park_y: f64,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            feed_rate: 1200.0,
            park_x: 0.0,
            park_y: 0.0,
        }
    }
}

/// Hot-wire foam cutter output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotWireSettings {
    /// Material preset key
    pub preset: String,
    /// Overrides the preset speed, mm/min
    pub speed: Option<f64>,
    /// Overrides the preset wire temperature (S word)
    pub temperature: Option<u32>,
    /// Dwell before the first cut, seconds
    pub heat_up_dwell: f64,
    /// Dwell after each closed contour, seconds
    pub contour_dwell: f64,
}

impl Default for HotWireSettings {
    fn default() -> Self {
        Self {
            preset: "eps_20".to_string(),
            speed: None,
            temperature: None,
            heat_up_dwell: 1.0,
            contour_dwell: 0.5,
        }
    }
}

/// Reporting preferences
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Unit system for printed statistics
    pub units: MeasurementSystem,
}

/// Complete job configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralSettings,
    pub sheet: SheetSettings,
    pub packing: PackingSettings,
    pub import: ImportSettings,
    pub toolpath: ToolpathSettings,
    pub router: RouterSettings,
    pub hot_wire: HotWireSettings,
}

impl Config {
    /// Default config location: `<config dir>/signcut/config.json`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("signcut").join("config.json"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("platform config directory not found".to_string())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Config = match extension(path).as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match extension(path).as_deref() {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)?,
            other => {
                return Err(SettingsError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if !(self.sheet.width > 0.0) || !(self.sheet.height > 0.0) {
            return Err(SettingsError::invalid(
                "sheet",
                "sheet dimensions must be > 0",
            ));
        }

        if !(self.sheet.gap >= 0.0) {
            return Err(SettingsError::invalid("sheet.gap", "must be >= 0"));
        }

        if let Some(cm) = self.import.real_width_cm {
            if !(cm > 0.0) {
                return Err(SettingsError::invalid("import.real_width_cm", "must be > 0"));
            }
        }

        if !(self.import.sample_step > 0.0) {
            return Err(SettingsError::invalid("import.sample_step", "must be > 0"));
        }

        if !(self.toolpath.rapid_rate > 0.0) {
            return Err(SettingsError::invalid("toolpath.rapid_rate", "must be > 0"));
        }

        if !(self.toolpath.ecocut_step > 0.0) {
            return Err(SettingsError::invalid("toolpath.ecocut_step", "must be > 0"));
        }

        if !(self.router.feed_rate > 0.0) {
            return Err(SettingsError::invalid("router.feed_rate", "must be > 0"));
        }

        if !self.router.park_x.is_finite() || !self.router.park_y.is_finite() {
            return Err(SettingsError::invalid("router.park", "must be finite"));
        }

        if let Some(speed) = self.hot_wire.speed {
            if !(speed > 0.0) {
                return Err(SettingsError::invalid("hot_wire.speed", "must be > 0"));
            }
        }

        if self.hot_wire.heat_up_dwell < 0.0 || self.hot_wire.contour_dwell < 0.0 {
            return Err(SettingsError::invalid("hot_wire.dwell", "must be >= 0"));
        }

        Ok(())
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
