//! SignCut Settings Crate
//!
//! Handles job configuration and its persistence.

pub mod config;
pub mod error;

pub use config::{
    Config, GeneralSettings, HotWireSettings, ImportSettings, PackingSettings, RouterSettings,
    SheetSettings, ToolpathSettings,
};
pub use error::{SettingsError, SettingsResult};
