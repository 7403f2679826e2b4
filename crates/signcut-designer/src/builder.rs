//! Vector hierarchy builder
//!
//! Turns SVG markup into packable [`Part`]s:
//! 1. normalize the document into path data
//! 2. split compound paths on every move-to (welded paths stay whole)
//! 3. measure bounds and sample boundary polygons
//! 4. drop the leading background frame
//! 5. nest sub-paths into a containment tree
//! 6. emit one part per solid, with its holes, plus islands as new parts
//! 7. apply metric scaling

use crate::hierarchy::{ShapeNode, ShapeRole, ShapeTree, DEFAULT_MAX_DEPTH, DEFAULT_MAX_NODES};
use crate::import::{SvgImporter, ViewBox};
use crate::part::{hole_safe_rect, Part, PartGeometry};
use crate::svg_path::{PathData, Polyline};
use serde::{Deserialize, Serialize};
use signcut_core::geometry::{polyline_length, resample};
use signcut_core::units::cm_to_mm;
use signcut_core::{BBox, Budget, Point, Result};
use tracing::{debug, info, warn};

/// Parts at or below this size on either axis are noise
pub const MIN_PART_SIZE_MM: f64 = 0.1;

/// Share of both viewBox dimensions a background frame covers
pub const BACKGROUND_COVERAGE: f64 = 0.9;

/// Fewest boundary samples taken per contour
pub const MIN_SAMPLES: usize = 8;

/// Import options
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    /// Target drawing width in cm
    pub real_width_cm: Option<f64>,
    /// Boundary sampling step in drawing units
    pub sample_step: f64,
    /// Curve flattening tolerance for cut contours, mm
    pub flatten_tolerance: f64,
    pub remove_background: bool,
    pub max_depth: usize,
    pub max_nodes: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            real_width_cm: None,
            sample_step: 1.0,
            flatten_tolerance: 0.05,
            remove_background: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Classification of one sub-path, for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSummary {
    /// Unscaled bounds
    pub bbox: BBox,
    pub depth: usize,
    pub role: ShapeRole,
}

/// Result of one SVG import
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub parts: Vec<Part>,
    /// Drawing frame in scaled units; `None` when none could be derived
    pub view_box: Option<ViewBox>,
    pub scale_factor: f64,
    pub shapes: Vec<ShapeSummary>,
    pub background_removed: bool,
    /// Sub-paths dropped as degenerate
    pub discarded: usize,
    pub warnings: Vec<String>,
}

impl ImportOutcome {
    fn empty(warning: String) -> Self {
        Self {
            scale_factor: 1.0,
            warnings: vec![warning],
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Clean SVG with one even-odd path per part, in scaled units
    pub fn to_svg(&self) -> String {
        let vb = self.view_box.unwrap_or_default();
        let mut out = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"{w}mm\" height=\"{h}mm\">\n",
            w = trim(vb.w),
            h = trim(vb.h)
        );
        for part in &self.parts {
            out.push_str(&format!(
                "  <path id=\"{}\" d=\"{}\" fill=\"{}\" fill-rule=\"evenodd\"/>\n",
                part.id,
                part.path.translated(-vb.x, -vb.y).to_svg_d(),
                part.fill
            ));
        }
        out.push_str("</svg>\n");
        out
    }
}

fn trim(v: f64) -> String {
    let s = format!("{:.3}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Runs the full import pipeline
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    pub options: ImportOptions,
}

impl HierarchyBuilder {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn import(&self, svg: &str) -> Result<ImportOutcome> {
        self.import_with_budget(svg, &Budget::unlimited())
    }

    /// Import with cancellation checkpoints between sub-paths and tree
    /// insertions.
    pub fn import_with_budget(&self, svg: &str, budget: &Budget) -> Result<ImportOutcome> {
        let doc = SvgImporter::new().parse(svg)?;

        let Some(view_box) = doc.view_box else {
            let msg = "SVG has no viewBox and no width/height; nothing imported".to_string();
            warn!("{}", msg);
            return Ok(ImportOutcome::empty(msg));
        };

        let mut warnings = Vec::new();
        let scale = self.scale_factor(&view_box, &mut warnings);

        let mut shapes = Vec::new();
        let mut discarded = 0usize;
        for element in doc.elements {
            let pieces = if element.welded {
                vec![element.path]
            } else {
                element.path.subpaths()
            };
            for piece in pieces {
                budget.checkpoint()?;
                match self.measure(piece, &element.fill, scale) {
                    Some(node) => shapes.push(node),
                    None => discarded += 1,
                }
            }
        }
        debug!(
            "Decomposed {} sub-paths, {} discarded as degenerate",
            shapes.len(),
            discarded
        );

        shapes.sort_by(|a, b| b.area.total_cmp(&a.area));

        let mut background_removed = false;
        if self.options.remove_background {
            if let Some(first) = shapes.first() {
                if first.bbox.w >= BACKGROUND_COVERAGE * view_box.w
                    && first.bbox.h >= BACKGROUND_COVERAGE * view_box.h
                {
                    info!(
                        "Removing background shape {:.1}x{:.1}",
                        first.bbox.w, first.bbox.h
                    );
                    shapes.remove(0);
                    background_removed = true;
                }
            }
        }

        let tree = ShapeTree::with_limits(self.options.max_depth, self.options.max_nodes)
            .build(shapes, budget)?;
        warnings.extend(tree.warnings().iter().cloned());

        let parts = self.emit_parts(&tree, scale);
        if parts.is_empty() {
            let msg = "No valid parts found in drawing".to_string();
            warn!("{}", msg);
            warnings.push(msg);
        } else {
            info!("Imported {} parts (scale factor {:.4})", parts.len(), scale);
        }

        let shapes = tree
            .nodes()
            .iter()
            .map(|n| ShapeSummary {
                bbox: n.bbox,
                depth: n.depth,
                role: n.role(),
            })
            .collect();

        Ok(ImportOutcome {
            parts,
            view_box: Some(ViewBox {
                x: view_box.x * scale,
                y: view_box.y * scale,
                w: view_box.w * scale,
                h: view_box.h * scale,
            }),
            scale_factor: scale,
            shapes,
            background_removed,
            discarded,
            warnings,
        })
    }

    fn scale_factor(&self, view_box: &ViewBox, warnings: &mut Vec<String>) -> f64 {
        match self.options.real_width_cm {
            Some(cm) if cm > 0.0 && view_box.w > 0.0 => cm_to_mm(cm) / view_box.w,
            Some(cm) => {
                let msg = format!("Ignoring target width {} cm; drawing left unscaled", cm);
                warn!("{}", msg);
                warnings.push(msg);
                1.0
            }
            None => 1.0,
        }
    }

    fn measure(&self, path: PathData, fill: &str, scale: f64) -> Option<ShapeNode> {
        if !path.is_finite() {
            return None;
        }

        let step = self.options.sample_step;
        let lines = path.flatten(step * 0.1);
        let bbox = BBox::from_points(lines.iter().flat_map(|l| l.points.iter()))?;
        let scaled_bbox = bbox.scaled(scale);
        if !(scaled_bbox.w > MIN_PART_SIZE_MM && scaled_bbox.h > MIN_PART_SIZE_MM) {
            return None;
        }

        let polygon = largest(&lines)
            .map(|line| {
                let length = polyline_length(&line.points);
                let step = step.min(length / MIN_SAMPLES as f64);
                resample(&line.points, step)
            })
            .unwrap_or_default();

        Some(ShapeNode {
            path,
            bbox,
            scaled_bbox,
            polygon,
            area: bbox.area(),
            fill: fill.to_string(),
            depth: 0,
            children: Vec::new(),
        })
    }

    fn emit_parts(&self, tree: &ShapeTree, scale: f64) -> Vec<Part> {
        let tolerance = self.options.flatten_tolerance;
        let mut parts = Vec::new();

        for (solid_idx, hole_idxs) in tree.solids() {
            let solid = tree.node(solid_idx);
            let bbox = solid.scaled_bbox;
            let local = |p: &Point| Point::new(p.x - bbox.x, p.y - bbox.y);

            let mut path = solid.path.scaled(scale);
            let mut solid_lines = path.flatten(tolerance);
            let outer_idx = largest_index(&solid_lines);
            let outer: Vec<Point> = outer_idx
                .map(|i| solid_lines.remove(i).points.iter().map(local).collect())
                .unwrap_or_default();

            // Extra loops of a welded solid are cut like holes.
            let mut hole_contours: Vec<Vec<Point>> = solid_lines
                .iter()
                .map(|l| l.points.iter().map(local).collect())
                .collect();
            let mut safe_rects = Vec::new();

            for &hole_idx in &hole_idxs {
                let hole = tree.node(hole_idx);
                let hole_path = hole.path.scaled(scale);
                for line in hole_path.flatten(tolerance) {
                    hole_contours.push(line.points.iter().map(local).collect());
                }
                path.extend(&hole_path);

                let hb = hole.scaled_bbox;
                safe_rects.push(hole_safe_rect(&BBox::new(
                    hb.x - bbox.x,
                    hb.y - bbox.y,
                    hb.w,
                    hb.h,
                )));
            }

            parts.push(Part {
                id: parts.len() as u32 + 1,
                path,
                fill: solid.fill.clone(),
                bbox,
                original_bbox: solid.bbox,
                geometry: PartGeometry {
                    outer,
                    holes: hole_contours,
                },
                holes: safe_rects,
            });
        }
        parts
    }
}

fn line_area(line: &Polyline) -> f64 {
    BBox::from_points(&line.points).map_or(0.0, |b| b.area())
}

fn largest_index(lines: &[Polyline]) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, line)| {
            let area = line_area(line);
            match best {
                Some((_, a)) if a >= area => best,
                _ => Some((i, area)),
            }
        })
        .map(|(i, _)| i)
}

fn largest(lines: &[Polyline]) -> Option<&Polyline> {
    largest_index(lines).map(|i| &lines[i])
}
