//! Parts: the unit the packer places.
//!
//! A part owns its path data in scaled millimeters plus flattened cut
//! contours normalized to its own bounding-box origin. Parts are immutable
//! once built; placement lives in separate records.

use crate::svg_path::PathData;
use serde::{Deserialize, Serialize};
use signcut_core::geometry::point_in_polygon;
use signcut_core::{BBox, CutClass, Point};

/// Share of a hole's bounding box offered for nested placement
pub const HOLE_SAFE_RATIO: f64 = 0.7;

/// Flattened cut geometry in part-local coordinates
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PartGeometry {
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
}

/// A physical piece to be cut
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub id: u32,
    /// Solid plus hole contours, scaled, in drawing position
    #[serde(skip)]
    pub path: PathData,
    pub fill: String,
    /// Scaled bounds in mm
    pub bbox: BBox,
    /// Bounds in original drawing units
    pub original_bbox: BBox,
    pub geometry: PartGeometry,
    /// Safe rectangles inside holes, part-local
    pub holes: Vec<BBox>,
}

impl Part {
    pub fn w(&self) -> f64 {
        self.bbox.w
    }

    pub fn h(&self) -> f64 {
        self.bbox.h
    }

    /// Path data moved so the bounding box starts at the origin
    pub fn local_path(&self) -> PathData {
        self.path.translated(-self.bbox.x, -self.bbox.y)
    }

    /// Even-odd fill test in part-local coordinates
    pub fn contains_point(&self, p: Point) -> bool {
        let mut crossings = usize::from(point_in_polygon(p, &self.geometry.outer));
        for hole in &self.geometry.holes {
            crossings += usize::from(point_in_polygon(p, hole));
        }
        crossings % 2 == 1
    }

    /// Cut contours with their class, holes first then the outer boundary,
    /// each group in geometry order.
    pub fn contours(&self) -> Vec<(CutClass, &[Point])> {
        let mut out: Vec<(CutClass, &[Point])> = self
            .geometry
            .holes
            .iter()
            .map(|h| (CutClass::Hole, h.as_slice()))
            .collect();
        if !self.geometry.outer.is_empty() {
            out.push((CutClass::Contour, self.geometry.outer.as_slice()));
        }
        out
    }

    /// Map a part-local point onto the sheet.
    ///
    /// Rotation is a quarter turn: `x' = y`, `y' = w - x`.
    pub fn place_point(&self, p: Point, fit: Point, rotated: bool) -> Point {
        if rotated {
            Point::new(fit.x + p.y, fit.y + self.w() - p.x)
        } else {
            Point::new(fit.x + p.x, fit.y + p.y)
        }
    }

    pub fn global_points(&self, points: &[Point], fit: Point, rotated: bool) -> Vec<Point> {
        points
            .iter()
            .map(|p| self.place_point(*p, fit, rotated))
            .collect()
    }

    /// Map a part-local rectangle onto the sheet
    pub fn place_rect(&self, r: &BBox, fit: Point, rotated: bool) -> BBox {
        if rotated {
            BBox::new(fit.x + r.y, fit.y + self.w() - (r.x + r.w), r.h, r.w)
        } else {
            BBox::new(fit.x + r.x, fit.y + r.y, r.w, r.h)
        }
    }
}

/// Centered safe rectangle inside a hole's bounds
pub fn hole_safe_rect(hole: &BBox) -> BBox {
    let w = hole.w * HOLE_SAFE_RATIO;
    let h = hole.h * HOLE_SAFE_RATIO;
    BBox::new(
        hole.x + (hole.w - w) / 2.0,
        hole.y + (hole.h - h) / 2.0,
        w,
        h,
    )
}
