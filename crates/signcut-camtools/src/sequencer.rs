//! Toolpath sequencing for one packed sheet.
//!
//! Parts are visited nearest-neighbor from the sheet origin. Inside a part
//! the holes are cut before the outer contour so the piece stays held by the
//! surrounding material until the very last cut. The result is an ordered
//! list of [`ToolOperation`]s that every emitter and simulator consumes.

use crate::packer::{parts_by_id, Placement, Sheet};
use serde::{Deserialize, Serialize};
use signcut_core::geometry::{dist_sq, optimize_path_start, safe_travel_path};
use signcut_core::{BBox, CutClass, Point};
use signcut_designer::Part;
use tracing::{debug, warn};

/// Rapids shorter than this are dropped
pub const MIN_RAPID_MM: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Rapid,
    Cut,
}

/// One straight segment of machine motion in sheet coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolOperation {
    pub kind: OperationKind,
    pub start: Point,
    pub end: Point,
    /// Seconds at feed rate (cuts) or rapid rate (rapids)
    pub time_estimate: f64,
    pub cut_class: Option<CutClass>,
    /// Part this segment cuts or travels to
    pub part_id: Option<u32>,
    /// Index of the contour within the part, in cut order
    pub contour: Option<usize>,
}

impl ToolOperation {
    fn segment(kind: OperationKind, start: Point, end: Point, rate_mm_min: f64) -> Self {
        let length = start.distance_to(&end);
        Self {
            kind,
            start,
            end,
            time_estimate: if rate_mm_min > 0.0 {
                length / rate_mm_min * 60.0
            } else {
                0.0
            },
            cut_class: None,
            part_id: None,
            contour: None,
        }
    }

    pub fn rapid(start: Point, end: Point, rate_mm_min: f64) -> Self {
        Self::segment(OperationKind::Rapid, start, end, rate_mm_min)
    }

    pub fn cut(start: Point, end: Point, rate_mm_min: f64) -> Self {
        Self::segment(OperationKind::Cut, start, end, rate_mm_min)
    }

    pub fn tagged(
        mut self,
        part_id: Option<u32>,
        contour: Option<usize>,
        class: Option<CutClass>,
    ) -> Self {
        self.part_id = part_id;
        self.contour = contour;
        self.cut_class = class;
        self
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    pub fn is_cut(&self) -> bool {
        self.kind == OperationKind::Cut
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.time_estimate.is_finite()
    }
}

/// Ordered motion for one sheet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Toolpath {
    pub sheet_id: u32,
    pub width: f64,
    pub height: f64,
    pub operations: Vec<ToolOperation>,
    /// Points dropped because a coordinate was not finite
    pub filtered: usize,
    pub warnings: Vec<String>,
}

impl Toolpath {
    pub fn new(sheet: &Sheet) -> Self {
        Self {
            sheet_id: sheet.id,
            width: sheet.width,
            height: sheet.height,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn cut_length(&self) -> f64 {
        self.operations
            .iter()
            .filter(|op| op.is_cut())
            .map(ToolOperation::length)
            .sum()
    }

    pub fn rapid_length(&self) -> f64 {
        self.operations
            .iter()
            .filter(|op| !op.is_cut())
            .map(ToolOperation::length)
            .sum()
    }

    /// Total estimate in seconds
    pub fn estimated_time(&self) -> f64 {
        self.operations.iter().map(|op| op.time_estimate).sum()
    }

    /// Where the tool rests after the last operation.
    pub fn end_position(&self) -> Point {
        self.operations.last().map_or(Point::ORIGIN, |op| op.end)
    }

    /// Extent of all cutting moves.
    pub fn cut_bounds(&self) -> Option<BBox> {
        let points: Vec<Point> = self
            .operations
            .iter()
            .filter(|op| op.is_cut())
            .flat_map(|op| [op.start, op.end])
            .collect();
        BBox::from_points(&points)
    }
}

/// One contour ready to cut, in sheet coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct SequencedContour {
    pub part_id: u32,
    pub contour: usize,
    pub cut_class: CutClass,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceOptions {
    /// Cutting feed in mm/min
    pub feed_rate: f64,
    /// Travel feed in mm/min, used for time estimates
    pub rapid_rate: f64,
    /// Route rapids along the sheet border
    pub safe_travel: bool,
    /// Visit parts in reverse nearest-neighbor order
    pub reverse_order: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            feed_rate: 1200.0,
            rapid_rate: 3000.0,
            safe_travel: false,
            reverse_order: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    options: SequenceOptions,
}

impl Sequencer {
    pub fn new(options: SequenceOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SequenceOptions {
        &self.options
    }

    /// Nearest-neighbor visiting order over placement corners, starting at
    /// the sheet origin. Equal distances keep placement order.
    pub fn order_parts<'a>(&self, sheet: &'a Sheet) -> Vec<&'a Placement> {
        let mut remaining: Vec<&Placement> = sheet.placements.iter().collect();
        let mut ordered = Vec::with_capacity(remaining.len());
        let mut current = Point::ORIGIN;

        while !remaining.is_empty() {
            let mut nearest = 0;
            let mut best = f64::INFINITY;
            for (i, p) in remaining.iter().enumerate() {
                let d = dist_sq(p.fit, current);
                if d < best {
                    best = d;
                    nearest = i;
                }
            }
            let next = remaining.remove(nearest);
            current = next.fit;
            ordered.push(next);
        }

        if self.options.reverse_order {
            ordered.reverse();
        }
        ordered
    }

    /// Contours of every placed part in cut order, mapped onto the sheet.
    ///
    /// Within a part the holes come first, smallest bounding box first, and
    /// the outer contour last. Non-finite points are dropped and counted in
    /// the returned total.
    pub fn sequence(&self, sheet: &Sheet, parts: &[Part]) -> (Vec<SequencedContour>, usize) {
        let lookup = parts_by_id(parts);
        let mut out = Vec::new();
        let mut filtered = 0;

        for placement in self.order_parts(sheet) {
            let Some(part) = lookup.get(&placement.part_id) else {
                warn!("Part #{} is placed but was not supplied", placement.part_id);
                continue;
            };

            let mut contours = part.contours();
            contours.sort_by(|(ca, a), (cb, b)| {
                let rank = |c: &CutClass| matches!(c, CutClass::Contour);
                rank(ca)
                    .cmp(&rank(cb))
                    .then(contour_area(a).total_cmp(&contour_area(b)))
            });

            for (index, (class, local)) in contours.into_iter().enumerate() {
                let mut points = part.global_points(local, placement.fit, placement.rotated);
                let before = points.len();
                points.retain(Point::is_finite);
                filtered += before - points.len();
                if points.len() < 2 {
                    continue;
                }
                out.push(SequencedContour {
                    part_id: part.id,
                    contour: index,
                    cut_class: class,
                    points,
                });
            }
        }
        (out, filtered)
    }

    /// Build the full operation list for a sheet.
    ///
    /// Each contour is rotated to start near the incoming tool position,
    /// reached by one rapid (or three along the border with safe travel) and
    /// cut segment by segment. The park move is left to the emitter.
    pub fn toolpath(&self, sheet: &Sheet, parts: &[Part]) -> Toolpath {
        let (contours, filtered) = self.sequence(sheet, parts);
        let mut toolpath = Toolpath::new(sheet);
        toolpath.filtered = filtered;
        if filtered > 0 {
            let msg = format!("Dropped {} non-finite points on sheet {}", filtered, sheet.id);
            warn!("{}", msg);
            toolpath.warnings.push(msg);
        }

        let mut current = Point::ORIGIN;
        for contour in &contours {
            let points = optimize_path_start(&contour.points, current);
            let tag = (Some(contour.part_id), Some(contour.contour), Some(contour.cut_class));

            let waypoints: Vec<Point> = if self.options.safe_travel {
                safe_travel_path(current, points[0], sheet.width, sheet.height).to_vec()
            } else {
                vec![points[0]]
            };
            for wp in waypoints {
                if current.distance_to(&wp) > MIN_RAPID_MM {
                    toolpath.operations.push(
                        ToolOperation::rapid(current, wp, self.options.rapid_rate)
                            .tagged(tag.0, tag.1, None),
                    );
                }
                current = wp;
            }

            for w in points.windows(2) {
                toolpath.operations.push(
                    ToolOperation::cut(w[0], w[1], self.options.feed_rate)
                        .tagged(tag.0, tag.1, tag.2),
                );
            }
            current = points[points.len() - 1];
        }

        debug!(
            "Sheet {}: {} contours, {} operations, {:.1} mm cut, {:.0} s",
            sheet.id,
            contours.len(),
            toolpath.operations.len(),
            toolpath.cut_length(),
            toolpath.estimated_time()
        );
        toolpath
    }
}

fn contour_area(points: &[Point]) -> f64 {
    BBox::from_points(points).map_or(0.0, |b| b.area())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::{PackOptions, Packer};
    use signcut_core::{Budget, FillDirection};
    use signcut_designer::{PartGeometry, PathData};

    fn square(x: f64, y: f64, s: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + s, y),
            Point::new(x + s, y + s),
            Point::new(x, y + s),
            Point::new(x, y),
        ]
    }

    fn part(id: u32, s: f64, hole: Option<(f64, f64, f64)>) -> Part {
        let outer = square(0.0, 0.0, s);
        let holes: Vec<Vec<Point>> = hole.map(|(x, y, hs)| square(x, y, hs)).into_iter().collect();
        Part {
            id,
            path: PathData::polygon(&outer[..4], true),
            fill: "#000000".into(),
            bbox: BBox::new(0.0, 0.0, s, s),
            original_bbox: BBox::new(0.0, 0.0, s, s),
            geometry: PartGeometry { outer, holes },
            holes: Vec::new(),
        }
    }

    fn sheet_with(placements: &[(u32, f64, f64)]) -> Sheet {
        let mut sheet = Sheet::new(1, 500.0, 500.0, 5.0, FillDirection::Vertical);
        for &(id, x, y) in placements {
            sheet.placements.push(Placement {
                part_id: id,
                sheet_id: 1,
                fit: Point::new(x, y),
                rotated: false,
                in_hole: false,
                w: 10.0,
                h: 10.0,
            });
        }
        sheet
    }

    #[test]
    fn test_nearest_neighbor_order() {
        let sheet = sheet_with(&[(1, 200.0, 0.0), (2, 10.0, 10.0), (3, 100.0, 0.0)]);
        let seq = Sequencer::default();
        let ids: Vec<u32> = seq.order_parts(&sheet).iter().map(|p| p.part_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        let seq = Sequencer::new(SequenceOptions {
            reverse_order: true,
            ..Default::default()
        });
        let ids: Vec<u32> = seq.order_parts(&sheet).iter().map(|p| p.part_id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[test]
    fn test_hole_before_contour() {
        let parts = vec![part(1, 50.0, Some((10.0, 10.0, 20.0)))];
        let sheet = sheet_with(&[(1, 0.0, 0.0)]);
        let (contours, _) = Sequencer::default().sequence(&sheet, &parts);
        let classes: Vec<CutClass> = contours.iter().map(|c| c.cut_class).collect();
        assert_eq!(classes, vec![CutClass::Hole, CutClass::Contour]);
    }

    #[test]
    fn test_time_estimate_in_seconds() {
        let op = ToolOperation::cut(Point::ORIGIN, Point::new(1200.0, 0.0), 1200.0);
        assert!((op.time_estimate - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_toolpath_square_at_origin() {
        let parts = vec![part(1, 10.0, None)];
        let sheet = sheet_with(&[(1, 0.0, 0.0)]);
        let tp = Sequencer::default().toolpath(&sheet, &parts);
        // Starts at the origin, so the approach rapid is dropped.
        assert_eq!(tp.operations.len(), 4);
        assert!(tp.operations.iter().all(ToolOperation::is_cut));
        assert!((tp.cut_length() - 40.0).abs() < 1e-9);
        assert_eq!(tp.end_position(), Point::ORIGIN);
    }

    #[test]
    fn test_path_start_follows_tool() {
        let parts = vec![part(1, 10.0, None)];
        let sheet = sheet_with(&[(1, 100.0, 100.0)]);
        let tp = Sequencer::default().toolpath(&sheet, &parts);
        let first_cut = tp.operations.iter().find(|op| op.is_cut()).unwrap();
        assert_eq!(first_cut.start, Point::new(100.0, 100.0));

        let parts = vec![part(1, 10.0, None)];
        let mut sheet = sheet_with(&[(1, 100.0, 100.0)]);
        sheet.placements.insert(
            0,
            Placement {
                part_id: 2,
                sheet_id: 1,
                fit: Point::new(0.0, 0.0),
                rotated: false,
                in_hole: false,
                w: 10.0,
                h: 10.0,
            },
        );
        let tp = Sequencer::default().toolpath(&sheet, &parts);
        // Part 2 is not supplied and is skipped.
        assert_eq!(tp.operations.iter().filter(|op| op.is_cut()).count(), 4);
    }

    #[test]
    fn test_safe_travel_uses_border() {
        let parts = vec![part(1, 10.0, None)];
        let sheet = sheet_with(&[(1, 250.0, 40.0)]);
        let tp = Sequencer::new(SequenceOptions {
            safe_travel: true,
            ..Default::default()
        })
        .toolpath(&sheet, &parts);
        let rapids: Vec<&ToolOperation> = tp.operations.iter().filter(|op| !op.is_cut()).collect();
        // Origin is on the border already, so only border run and drop-in remain.
        assert_eq!(rapids.len(), 2);
        assert_eq!(rapids[0].end, Point::new(250.0, 0.0));
        assert_eq!(rapids[1].end, Point::new(250.0, 40.0));
    }

    #[test]
    fn test_non_finite_points_filtered() {
        let mut p = part(1, 10.0, None);
        p.geometry.outer.insert(2, Point::new(f64::NAN, 3.0));
        let sheet = sheet_with(&[(1, 0.0, 0.0)]);
        let tp = Sequencer::default().toolpath(&sheet, &[p]);
        assert_eq!(tp.filtered, 1);
        assert_eq!(tp.warnings.len(), 1);
        assert!(tp.operations.iter().all(ToolOperation::is_finite));
    }

    #[test]
    fn test_sequences_packed_sheet() {
        let parts = vec![part(1, 40.0, Some((10.0, 10.0, 20.0))), part(2, 20.0, None)];
        let result = Packer::new(PackOptions::default())
            .pack(&parts, &Budget::unlimited())
            .unwrap();
        let tp = Sequencer::default().toolpath(&result.sheets[0], &parts);
        let first = tp.operations.iter().find(|op| op.is_cut()).unwrap();
        assert_eq!(first.part_id, Some(1));
        assert_eq!(first.cut_class, Some(CutClass::Hole));
    }
}
