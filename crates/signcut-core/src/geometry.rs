//! Plane geometry shared by every pipeline stage.
//!
//! Coordinates are `f64`. Y grows downwards, matching SVG user space and the
//! sheet coordinate system the packer works in.

use serde::{Deserialize, Serialize};

/// Squared distance under which a contour's end is treated as its start.
pub const CLOSED_TOLERANCE_SQ: f64 = 0.1;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        dist_sq(*self, *other).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned bounding box given by its top-left corner and size
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Tight box around a point set. Non-finite points are ignored; `None`
    /// when nothing finite remains.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        let mut any = false;

        for p in points.into_iter().filter(|p| p.is_finite()) {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
            any = true;
        }

        any.then(|| BBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.w
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.h
    }

    /// Width times height.
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        BBox::new(
            self.x * factor,
            self.y * factor,
            self.w * factor,
            self.h * factor,
        )
    }

    /// True when `other` lies inside `self`, allowing `eps` of overshoot on
    /// every side.
    pub fn contains_bbox(&self, other: &BBox, eps: f64) -> bool {
        other.x >= self.x - eps
            && other.y >= self.y - eps
            && other.max_x() <= self.max_x() + eps
            && other.max_y() <= self.max_y() + eps
    }

    /// Strict overlap test; touching edges do not count.
    pub fn overlaps(&self, other: &BBox, eps: f64) -> bool {
        self.x < other.max_x() - eps
            && other.x < self.max_x() - eps
            && self.y < other.max_y() - eps
            && other.y < self.max_y() - eps
    }

    /// Grow by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        BBox::new(
            self.x - margin,
            self.y - margin,
            self.w + 2.0 * margin,
            self.h + 2.0 * margin,
        )
    }
}

pub fn dist_sq(a: Point, b: Point) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Even-odd ray casting test.
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Area-weighted centroid. Degenerate polygons fall back to the vertex mean.
pub fn polygon_centroid(polygon: &[Point]) -> Option<Point> {
    if polygon.is_empty() {
        return None;
    }

    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }

    if area2.abs() > 1e-9 {
        return Some(Point::new(cx / (3.0 * area2), cy / (3.0 * area2)));
    }

    let sum = polygon
        .iter()
        .fold(Point::ORIGIN, |acc, p| acc.offset(p.x, p.y));
    Some(Point::new(sum.x / n as f64, sum.y / n as f64))
}

pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

pub fn is_closed(points: &[Point]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 => {
            dist_sq(*first, *last) <= CLOSED_TOLERANCE_SQ
        }
        _ => false,
    }
}

/// Rotate a closed contour so it starts at the vertex nearest `from`.
///
/// Open contours and contours with fewer than three points are returned
/// unchanged. The result stays closed: its last point repeats the new start.
pub fn optimize_path_start(points: &[Point], from: Point) -> Vec<Point> {
    if points.len() < 3 || !is_closed(points) {
        return points.to_vec();
    }

    let unique = &points[..points.len() - 1];
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, p) in unique.iter().enumerate() {
        let d = dist_sq(*p, from);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }

    if best == 0 {
        return points.to_vec();
    }

    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&unique[best..]);
    rotated.extend_from_slice(&unique[..best]);
    rotated.push(unique[best]);
    rotated
}

/// Nearest point on the border of a `width` x `height` sheet.
///
/// Ties resolve in the order top, right, bottom, left.
pub fn nearest_border_point(p: Point, width: f64, height: f64) -> Point {
    let x = p.x.clamp(0.0, width);
    let y = p.y.clamp(0.0, height);
    let candidates = [
        Point::new(x, 0.0),
        Point::new(width, y),
        Point::new(x, height),
        Point::new(0.0, y),
    ];

    let mut best = candidates[0];
    let mut best_dist = dist_sq(p, best);
    for c in &candidates[1..] {
        let d = dist_sq(p, *c);
        if d < best_dist {
            best_dist = d;
            best = *c;
        }
    }
    best
}

/// Waypoints for a rapid from `start` to `end` that hugs the sheet border:
/// leave to the border, run to the border point nearest `end`, then drop in.
pub fn safe_travel_path(start: Point, end: Point, width: f64, height: f64) -> [Point; 3] {
    [
        nearest_border_point(start, width, height),
        nearest_border_point(end, width, height),
        end,
    ]
}

/// Resample a polyline at a fixed arc-length `step`.
///
/// The first and last input points are always kept, so a closed input stays
/// closed.
pub fn resample(points: &[Point], step: f64) -> Vec<Point> {
    if points.len() < 2 || !(step > 0.0) {
        return points.to_vec();
    }

    let mut out = vec![points[0]];
    let mut carried = 0.0;
    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let seg = a.distance_to(&b);
        if seg <= f64::EPSILON {
            continue;
        }
        let mut t = step - carried;
        while t < seg - 1e-9 {
            let k = t / seg;
            out.push(Point::new(a.x + (b.x - a.x) * k, a.y + (b.y - a.y) * k));
            t += step;
        }
        carried = seg - (t - step);
    }

    if let Some(last) = points.last() {
        if out.last().map_or(true, |p| dist_sq(*p, *last) > 1e-18) {
            out.push(*last);
        }
    }
    out
}
