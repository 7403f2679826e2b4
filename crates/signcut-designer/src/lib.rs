//! # SignCut Designer
//!
//! Vector ingestion for the CAM pipeline. SVG markup is normalized into
//! path data, decomposed into simple contours, nested into a containment
//! tree and finally rebuilt as [`Part`]s with metric scaling applied.
//!
//! ```no_run
//! use signcut_designer::{HierarchyBuilder, ImportOptions};
//!
//! let builder = HierarchyBuilder::new(ImportOptions {
//!     real_width_cm: Some(20.0),
//!     ..Default::default()
//! });
//! let outcome = builder.import("<svg viewBox=\"0 0 100 50\"></svg>").unwrap();
//! assert!(outcome.parts.is_empty());
//! ```

pub mod builder;
pub mod hierarchy;
pub mod import;
pub mod part;
pub mod svg_path;

pub use builder::{HierarchyBuilder, ImportOptions, ImportOutcome, ShapeSummary};
pub use hierarchy::{ShapeNode, ShapeRole, ShapeTree};
pub use import::{ElementKind, SvgDocument, SvgElement, SvgImporter, ViewBox};
pub use part::{Part, PartGeometry};
pub use svg_path::{PathCommand, PathData, Polyline};
