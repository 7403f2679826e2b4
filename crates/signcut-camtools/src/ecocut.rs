//! Continuous-path cutting.
//!
//! Every contour on a sheet is resampled and spliced into one open path by
//! repeatedly joining the remaining contour whose closest point pair to the
//! main path is shortest. The tool plunges once and cuts through the short
//! connecting jumps, which suits foam and other soft stock.

use crate::packer::{parts_by_id, Sheet};
use crate::sequencer::{SequenceOptions, ToolOperation, Toolpath, MIN_RAPID_MM};
use signcut_core::geometry::{dist_sq, resample, CLOSED_TOLERANCE_SQ};
use signcut_core::{Budget, Point, Result};
use signcut_designer::Part;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EcoCutJoiner {
    /// Resampling step in mm
    step: f64,
}

impl Default for EcoCutJoiner {
    fn default() -> Self {
        Self { step: 1.0 }
    }
}

impl EcoCutJoiner {
    pub fn new(step: f64) -> Self {
        Self { step }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Every contour of every placed part as a closed, resampled polygon in
    /// sheet coordinates, plus the number of non-finite points dropped.
    pub fn collect_contours(&self, sheet: &Sheet, parts: &[Part]) -> (Vec<Vec<Point>>, usize) {
        let lookup = parts_by_id(parts);
        let mut paths = Vec::new();
        let mut filtered = 0;

        for placement in &sheet.placements {
            let Some(part) = lookup.get(&placement.part_id) else {
                continue;
            };
            for (_, local) in part.contours() {
                let mut finite = part.global_points(local, placement.fit, placement.rotated);
                let before = finite.len();
                finite.retain(Point::is_finite);
                filtered += before - finite.len();
                let mut points = resample(&finite, self.step);
                if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                    if dist_sq(first, last) > CLOSED_TOLERANCE_SQ {
                        points.push(first);
                    }
                }
                if !points.is_empty() {
                    paths.push(points);
                }
            }
        }
        (paths, filtered)
    }

    /// Splice `paths` into one continuous path.
    ///
    /// Each merge scans every remaining path against the main path for the
    /// closest point pair. The first pair found wins ties. The candidate is
    /// rotated to start at its matching point, closed again, and inserted
    /// right after the matching main-path point, so no points are lost.
    /// The budget is checked once per merge.
    pub fn join(&self, paths: Vec<Vec<Point>>, budget: &Budget) -> Result<Vec<Point>> {
        let mut iter = paths.into_iter();
        let Some(mut main) = iter.next() else {
            return Ok(Vec::new());
        };
        let mut remaining: Vec<Vec<Point>> = iter.collect();
        let total = remaining.len();

        while !remaining.is_empty() {
            budget.checkpoint()?;

            let mut best_dist = f64::INFINITY;
            let mut best = (0, 0, 0);
            for (r, other) in remaining.iter().enumerate() {
                for (i, m) in main.iter().enumerate() {
                    for (j, o) in other.iter().enumerate() {
                        let d = dist_sq(*m, *o);
                        if d < best_dist {
                            best_dist = d;
                            best = (r, i, j);
                        }
                    }
                }
            }

            let (r, i, j) = best;
            let candidate = remaining.remove(r);
            let spliced = if candidate.len() < 2 {
                candidate
            } else {
                let unique = &candidate[..candidate.len() - 1];
                let k = j % unique.len();
                let mut rotated = Vec::with_capacity(candidate.len());
                rotated.extend_from_slice(&unique[k..]);
                rotated.extend_from_slice(&unique[..k]);
                rotated.push(unique[k]);
                rotated
            };

            let tail = main.split_off((i + 1).min(main.len()));
            main.extend(spliced);
            main.extend(tail);

            let merged = total - remaining.len();
            if merged % 100 == 0 {
                debug!("EcoCut merged {}/{} contours", merged, total);
            }
        }

        Ok(main)
    }

    /// Joined path for a whole sheet as a single-plunge toolpath.
    pub fn toolpath(
        &self,
        sheet: &Sheet,
        parts: &[Part],
        options: &SequenceOptions,
        budget: &Budget,
    ) -> Result<Toolpath> {
        let (contours, filtered) = self.collect_contours(sheet, parts);
        let count = contours.len();
        let path = self.join(contours, budget)?;

        let mut toolpath = Toolpath::new(sheet);
        toolpath.filtered = filtered;
        if filtered > 0 {
            let msg = format!("Dropped {} non-finite points on sheet {}", filtered, sheet.id);
            warn!("{}", msg);
            toolpath.warnings.push(msg);
        }
        let Some(&start) = path.first() else {
            return Ok(toolpath);
        };
        if start.distance_to(&Point::ORIGIN) > MIN_RAPID_MM {
            let op = ToolOperation::rapid(Point::ORIGIN, start, options.rapid_rate);
            toolpath.operations.push(op.tagged(None, Some(0), None));
        }
        for w in path.windows(2) {
            let op = ToolOperation::cut(w[0], w[1], options.feed_rate).tagged(None, Some(0), None);
            toolpath.operations.push(op);
        }

        info!(
            "EcoCut joined {} contours on sheet {} into {} points",
            count,
            sheet.id,
            path.len()
        );
        Ok(toolpath)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(x: f64, y: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + 1.0, y),
            Point::new(x + 1.0, y + 1.0),
            Point::new(x, y + 1.0),
            Point::new(x, y),
        ]
    }

    #[test]
    fn test_join_keeps_every_point() {
        let a = unit_square(0.0, 0.0);
        let b = unit_square(5.0, 0.0);
        let joined = EcoCutJoiner::default()
            .join(vec![a.clone(), b.clone()], &Budget::unlimited())
            .unwrap();
        assert_eq!(joined.len(), a.len() + b.len());
        // (1,0)-(5,0) is the first closest pair found.
        assert_eq!(joined[2], Point::new(5.0, 0.0));
        assert_eq!(joined[6], Point::new(5.0, 0.0));
    }

    #[test]
    fn test_join_rotates_candidate() {
        let a = unit_square(0.0, 0.0);
        let b = unit_square(0.0, 3.0);
        let joined = EcoCutJoiner::default()
            .join(vec![a, b], &Budget::unlimited())
            .unwrap();
        // (1,1)-(1,3) is found before the equally close (0,1)-(0,3).
        assert_eq!(joined[2], Point::new(1.0, 1.0));
        assert_eq!(joined[3], Point::new(1.0, 3.0));
        assert_eq!(joined[7], Point::new(1.0, 3.0));
        assert_eq!(joined[8], Point::new(0.0, 1.0));
    }

    #[test]
    fn test_join_empty_and_single() {
        let joiner = EcoCutJoiner::default();
        assert!(joiner.join(Vec::new(), &Budget::unlimited()).unwrap().is_empty());
        let single = joiner
            .join(vec![unit_square(0.0, 0.0)], &Budget::unlimited())
            .unwrap();
        assert_eq!(single.len(), 5);
    }

    #[test]
    fn test_join_respects_budget() {
        let paths = vec![
            unit_square(0.0, 0.0),
            unit_square(3.0, 0.0),
            unit_square(6.0, 0.0),
        ];
        let err = EcoCutJoiner::default()
            .join(paths, &Budget::unlimited().with_max_steps(1))
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
