//! # SignCut Core
//!
//! Core types and utilities shared by the SignCut CAM pipeline:
//! error taxonomy, unit handling, plane geometry and cooperative
//! cancellation.

pub mod cancel;
pub mod error;
pub mod geometry;
pub mod types;
pub mod units;

pub use cancel::{Budget, CancelToken};
pub use error::{EmitError, Error, ImportError, PackError, Result};
pub use geometry::{dist_sq, BBox, Point};
pub use types::{CutClass, FillDirection, StrategyKind};
pub use units::MeasurementSystem;
