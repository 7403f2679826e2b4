//! # SignCut CAM Tools
//!
//! Everything between a list of parts and a machine program:
//!
//! - **Packer**: greedy multi-sheet placement with pluggable strategies and
//!   nesting inside the cutouts of larger parts
//! - **Sequencer**: nearest-neighbor part order, holes before outer
//!   contours, path-start optimization and optional border-hugging rapids
//! - **EcoCut**: joins every contour of a sheet into one continuous path
//! - **Router emitter**: standard spindle G-code
//! - **Hot-wire emitter**: foam cutter G-code with material presets
//!
//! ```no_run
//! use signcut_camtools::{PackOptions, Packer, RouterEmitter, RouterOptions, Sequencer};
//! use signcut_core::Budget;
//!
//! # fn run(parts: Vec<signcut_designer::Part>) -> signcut_camtools::CamToolResult<()> {
//! let layout = Packer::new(PackOptions::default()).pack(&parts, &Budget::unlimited())?;
//! let emitter = RouterEmitter::new(RouterOptions::default())?;
//! for sheet in &layout.sheets {
//!     let toolpath = Sequencer::default().toolpath(sheet, &parts);
//!     let _program = emitter.emit(&toolpath)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod ecocut;
pub mod error;
pub mod gcode;
pub mod hot_wire;
pub mod packer;
pub mod router;
pub mod sequencer;

pub use ecocut::EcoCutJoiner;
pub use error::{CamToolError, CamToolResult, ParameterError};
pub use hot_wire::{
    preset, HotWireEmitter, HotWireOptions, HotWireProgram, HotWireStats, MaterialPreset, PRESETS,
};
pub use packer::{
    strategy_for, BestShortSideFit, Candidate, FirstFit, PackOptions, PackResult, Packer,
    Placement, PlacementStrategy, Sheet, Space,
};
pub use router::{RouterEmitter, RouterOptions};
pub use sequencer::{
    OperationKind, SequenceOptions, SequencedContour, Sequencer, ToolOperation, Toolpath,
};
