//! # SignCut
//!
//! CAM engine for sign and foam shops: turns an SVG drawing into nested
//! sheet layouts and G-code for a CNC router or a hot-wire cutter.
//!
//! ## Architecture
//!
//! SignCut is organized as a workspace with multiple crates:
//!
//! 1. **signcut-core** - Geometry, error taxonomy, units, cancellation budget
//! 2. **signcut-settings** - Job configuration in JSON or TOML
//! 3. **signcut-designer** - SVG import and solid/hole hierarchy reconstruction
//! 4. **signcut-camtools** - Packing, toolpath sequencing, EcoCut, G-code emitters
//! 5. **signcut** - Session object and command line front end
//!
//! ## Pipeline
//!
//! SVG text → parts → sheets → ordered tool operations → G-code text.
//! [`CamSession`] owns the state between those steps.

pub mod session;

pub use session::CamSession;

pub use signcut_camtools as camtools;
pub use signcut_designer as designer;
pub use signcut_settings as settings;

pub use signcut_camtools::{
    CamToolError, CamToolResult, HotWireProgram, HotWireStats, PackResult, Sheet, Toolpath,
};
pub use signcut_core::{Error, Result};
pub use signcut_designer::{ImportOutcome, Part};
pub use signcut_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Pretty formatted output on stderr, so G-code on stdout stays clean
/// - RUST_LOG environment variable support
/// - `verbose` lowers the default level from INFO to DEBUG
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
