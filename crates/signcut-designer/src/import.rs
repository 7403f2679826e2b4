//! # SVG Import
//!
//! Normalizes an SVG document into plain path geometry.
//!
//! Supports:
//! - viewBox resolution (derived from `width`/`height` when absent)
//! - rect (including rounded corners), circle, ellipse, line, polyline,
//!   polygon and path elements
//! - `transform` attributes on elements and on enclosing `<g>` groups
//! - fill colour from the `fill` attribute or inline `style`
//! - weld tagging (`data-welded`) for compound paths that must not be split

use crate::svg_path::{parse_transform, Affine, PathCommand, PathData};
use regex::Regex;
use signcut_core::units::parse_svg_length;
use signcut_core::{ImportError, Point, Result};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::debug;

/// Bezier approximation constant for quarter circles
pub const KAPPA: f64 = 0.5522847498;

const DEFAULT_FILL: &str = "#000000";

/// Document coordinate frame
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Element kinds the importer converts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polyline,
    Polygon,
}

impl ElementKind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "path" => Some(Self::Path),
            "rect" => Some(Self::Rect),
            "circle" => Some(Self::Circle),
            "ellipse" => Some(Self::Ellipse),
            "line" => Some(Self::Line),
            "polyline" => Some(Self::Polyline),
            "polygon" => Some(Self::Polygon),
            _ => None,
        }
    }
}

/// One drawable element converted to path data
#[derive(Debug, Clone)]
pub struct SvgElement {
    pub kind: ElementKind,
    pub path: PathData,
    pub fill: String,
    /// Produced by a weld operation; kept as one compound shape
    pub welded: bool,
}

/// Normalized document: a resolved viewBox plus path-only elements
#[derive(Debug, Clone)]
pub struct SvgDocument {
    /// `None` when neither viewBox nor width/height could be read
    pub view_box: Option<ViewBox>,
    pub elements: Vec<SvgElement>,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|_| unreachable!("import pattern is valid"))
    })
}

fn svg_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?s)<svg\b([^>]*)>")
}

/// Group open/close tags and drawable elements, in document order
fn element_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?s)<(/?)(g|path|rect|circle|ellipse|line|polyline|polygon)\b([^>]*)>",
    )
}

fn attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
    )
}

fn hidden_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(?s)<!--.*?-->|<defs\b.*?</defs>|<clipPath\b.*?</clipPath>|<mask\b.*?</mask>",
    )
}

fn parse_attributes(tag_body: &str) -> HashMap<String, String> {
    attr_regex()
        .captures_iter(tag_body)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            (caps[1].to_string(), value)
        })
        .collect()
}

fn attr_f64(attrs: &HashMap<String, String>, name: &str) -> Option<f64> {
    attrs
        .get(name)
        .and_then(|v| parse_svg_length(v))
        .map(|(value, _)| value)
}

fn parse_points(value: &str) -> Vec<Point> {
    let numbers: Vec<f64> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

fn fill_of(attrs: &HashMap<String, String>) -> String {
    if let Some(style) = attrs.get("style") {
        for decl in style.split(';') {
            if let Some((key, value)) = decl.split_once(':') {
                if key.trim() == "fill" {
                    return value.trim().to_string();
                }
            }
        }
    }
    attrs
        .get("fill")
        .cloned()
        .unwrap_or_else(|| DEFAULT_FILL.to_string())
}

fn parse_view_box(attrs: &HashMap<String, String>) -> Option<ViewBox> {
    if let Some(value) = attrs.get("viewBox") {
        let nums: Vec<f64> = value
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        if let [x, y, w, h] = nums.as_slice() {
            if *w > 0.0 && *h > 0.0 {
                return Some(ViewBox {
                    x: *x,
                    y: *y,
                    w: *w,
                    h: *h,
                });
            }
        }
    }

    match (attr_f64(attrs, "width"), attr_f64(attrs, "height")) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some(ViewBox { x: 0.0, y: 0.0, w, h }),
        _ => None,
    }
}

/// Rectangle, optionally with rounded corners
pub fn rect_path(x: f64, y: f64, w: f64, h: f64, rx: Option<f64>, ry: Option<f64>) -> PathData {
    let (rx, ry) = match (rx, ry) {
        (Some(rx), Some(ry)) => (rx, ry),
        (Some(r), None) | (None, Some(r)) => (r, r),
        (None, None) => (0.0, 0.0),
    };
    let rx = rx.clamp(0.0, w / 2.0);
    let ry = ry.clamp(0.0, h / 2.0);

    if rx <= 0.0 || ry <= 0.0 {
        return PathData::polygon(
            &[
                Point::new(x, y),
                Point::new(x + w, y),
                Point::new(x + w, y + h),
                Point::new(x, y + h),
            ],
            true,
        );
    }

    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    let (x1, y1) = (x + w, y + h);
    PathData::from_commands(vec![
        PathCommand::MoveTo(Point::new(x + rx, y)),
        PathCommand::LineTo(Point::new(x1 - rx, y)),
        PathCommand::CubicTo {
            ctrl1: Point::new(x1 - rx + kx, y),
            ctrl2: Point::new(x1, y + ry - ky),
            to: Point::new(x1, y + ry),
        },
        PathCommand::LineTo(Point::new(x1, y1 - ry)),
        PathCommand::CubicTo {
            ctrl1: Point::new(x1, y1 - ry + ky),
            ctrl2: Point::new(x1 - rx + kx, y1),
            to: Point::new(x1 - rx, y1),
        },
        PathCommand::LineTo(Point::new(x + rx, y1)),
        PathCommand::CubicTo {
            ctrl1: Point::new(x + rx - kx, y1),
            ctrl2: Point::new(x, y1 - ry + ky),
            to: Point::new(x, y1 - ry),
        },
        PathCommand::LineTo(Point::new(x, y + ry)),
        PathCommand::CubicTo {
            ctrl1: Point::new(x, y + ry - ky),
            ctrl2: Point::new(x + rx - kx, y),
            to: Point::new(x + rx, y),
        },
        PathCommand::Close,
    ])
}

/// Ellipse as four cubic Beziers, starting at the rightmost point
pub fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64) -> PathData {
    let kx = rx * KAPPA;
    let ky = ry * KAPPA;
    PathData::from_commands(vec![
        PathCommand::MoveTo(Point::new(cx + rx, cy)),
        PathCommand::CubicTo {
            ctrl1: Point::new(cx + rx, cy + ky),
            ctrl2: Point::new(cx + kx, cy + ry),
            to: Point::new(cx, cy + ry),
        },
        PathCommand::CubicTo {
            ctrl1: Point::new(cx - kx, cy + ry),
            ctrl2: Point::new(cx - rx, cy + ky),
            to: Point::new(cx - rx, cy),
        },
        PathCommand::CubicTo {
            ctrl1: Point::new(cx - rx, cy - ky),
            ctrl2: Point::new(cx - kx, cy - ry),
            to: Point::new(cx, cy - ry),
        },
        PathCommand::CubicTo {
            ctrl1: Point::new(cx + kx, cy - ry),
            ctrl2: Point::new(cx + rx, cy - ky),
            to: Point::new(cx + rx, cy),
        },
        PathCommand::Close,
    ])
}

/// SVG importer producing an [`SvgDocument`]
#[derive(Debug, Default, Clone)]
pub struct SvgImporter;

impl SvgImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse markup into a normalized document.
    ///
    /// Only text without an `<svg>` root is an error. A document without a
    /// usable viewBox is returned with `view_box: None`.
    pub fn parse(&self, svg_content: &str) -> Result<SvgDocument> {
        let root = svg_tag_regex()
            .captures(svg_content)
            .ok_or(ImportError::NotSvg)?;
        let view_box = parse_view_box(&parse_attributes(&root[1]));

        let visible = hidden_block_regex().replace_all(svg_content, "");
        let mut elements = Vec::new();
        let mut skipped = 0usize;

        // Composed transform of every open group, innermost last.
        let mut groups: Vec<Affine> = Vec::new();

        for caps in element_regex().captures_iter(&visible) {
            let closing = !caps[1].is_empty();
            let body = &caps[3];

            if &caps[2] == "g" {
                if closing {
                    groups.pop();
                } else if !body.trim_end().ends_with('/') {
                    let parent = groups.last().copied().unwrap_or_else(Affine::identity);
                    let own = parse_attributes(body)
                        .get("transform")
                        .map_or_else(Affine::identity, |t| parse_transform(t));
                    groups.push(own.then(&parent));
                }
                continue;
            }
            if closing {
                continue;
            }
            let Some(kind) = ElementKind::from_tag(&caps[2]) else {
                continue;
            };
            let attrs = parse_attributes(body);

            let Some(mut path) = Self::element_path(kind, &attrs) else {
                skipped += 1;
                continue;
            };
            let own = attrs.get("transform").map(|t| parse_transform(t));
            let transform = match (own, groups.last()) {
                (Some(own), Some(group)) => Some(own.then(group)),
                (Some(own), None) => Some(own),
                (None, Some(group)) => Some(*group),
                (None, None) => None,
            };
            if let Some(transform) = transform {
                path = path.transformed(&transform);
            }

            let welded = attrs
                .get("data-welded")
                .is_some_and(|v| v == "true" || v == "1");

            elements.push(SvgElement {
                kind,
                path,
                fill: fill_of(&attrs),
                welded,
            });
        }

        debug!(
            "Parsed SVG: {} elements ({} skipped), viewBox {:?}",
            elements.len(),
            skipped,
            view_box
        );

        Ok(SvgDocument { view_box, elements })
    }

    fn element_path(kind: ElementKind, attrs: &HashMap<String, String>) -> Option<PathData> {
        let get = |name: &str| attr_f64(attrs, name);
        let path = match kind {
            ElementKind::Path => PathData::parse(attrs.get("d")?),
            ElementKind::Rect => {
                let (w, h) = (get("width")?, get("height")?);
                if w <= 0.0 || h <= 0.0 {
                    return None;
                }
                rect_path(
                    get("x").unwrap_or(0.0),
                    get("y").unwrap_or(0.0),
                    w,
                    h,
                    get("rx"),
                    get("ry"),
                )
            }
            ElementKind::Circle => {
                let r = get("r")?;
                if r <= 0.0 {
                    return None;
                }
                ellipse_path(get("cx").unwrap_or(0.0), get("cy").unwrap_or(0.0), r, r)
            }
            ElementKind::Ellipse => {
                let (rx, ry) = (get("rx")?, get("ry")?);
                if rx <= 0.0 || ry <= 0.0 {
                    return None;
                }
                ellipse_path(get("cx").unwrap_or(0.0), get("cy").unwrap_or(0.0), rx, ry)
            }
            ElementKind::Line => PathData::polygon(
                &[
                    Point::new(get("x1").unwrap_or(0.0), get("y1").unwrap_or(0.0)),
                    Point::new(get("x2").unwrap_or(0.0), get("y2").unwrap_or(0.0)),
                ],
                false,
            ),
            ElementKind::Polyline => PathData::polygon(&parse_points(attrs.get("points")?), false),
            ElementKind::Polygon => PathData::polygon(&parse_points(attrs.get("points")?), true),
        };

        (!path.is_empty()).then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_svg_is_error() {
        let err = SvgImporter::new().parse("hello world").unwrap_err();
        assert!(err.is_import_error());
    }

    #[test]
    fn test_viewbox_from_width_height() {
        let doc = SvgImporter::new()
            .parse(r#"<svg width="210mm" height="100mm"><rect width="10" height="10"/></svg>"#)
            .unwrap();
        assert_eq!(
            doc.view_box,
            Some(ViewBox {
                x: 0.0,
                y: 0.0,
                w: 210.0,
                h: 100.0
            })
        );
        assert_eq!(doc.elements.len(), 1);
    }

    #[test]
    fn test_missing_viewbox() {
        let doc = SvgImporter::new()
            .parse(r#"<svg><circle cx="5" cy="5" r="2"/></svg>"#)
            .unwrap();
        assert!(doc.view_box.is_none());
    }

    #[test]
    fn test_primitives_and_fill() {
        let svg = r#"<svg viewBox="0 0 100 100">
            <rect x="1" y="2" width="10" height="5" rx="1" style="stroke:red; fill: #ff0000"/>
            <ellipse cx="50" cy="50" rx="10" ry="5"/>
            <polygon points="0,0 10,0 10,10"/>
            <polyline points="0 0 5 5 10 0"/>
            <line x1="0" y1="0" x2="10" y2="10"/>
            <defs><rect width="99" height="99"/></defs>
        </svg>"#;
        let doc = SvgImporter::new().parse(svg).unwrap();
        assert_eq!(doc.elements.len(), 5);
        assert_eq!(doc.elements[0].kind, ElementKind::Rect);
        assert_eq!(doc.elements[0].fill, "#ff0000");
        assert_eq!(doc.elements[1].fill, DEFAULT_FILL);
        assert!(doc.elements[2].path.commands().ends_with(&[PathCommand::Close]));
        assert!(!doc.elements[3].path.commands().ends_with(&[PathCommand::Close]));
    }

    #[test]
    fn test_rounded_rect_bounds() {
        let bb = rect_path(0.0, 0.0, 20.0, 10.0, Some(3.0), None)
            .bounds(0.01)
            .unwrap();
        assert!((bb.w - 20.0).abs() < 1e-3);
        assert!((bb.h - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_element_transform_applied() {
        let doc = SvgImporter::new()
            .parse(r#"<svg viewBox="0 0 100 100"><rect width="10" height="10" transform="translate(5 7)"/></svg>"#)
            .unwrap();
        let bb = doc.elements[0].path.bounds(0.01).unwrap();
        assert!((bb.x - 5.0).abs() < 1e-9);
        assert!((bb.y - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_transform_applied() {
        let doc = SvgImporter::new()
            .parse(r#"<svg viewBox="0 0 300 300"><g transform="translate(100,100)"><rect width="20" height="20"/></g><rect width="5" height="5"/></svg>"#)
            .unwrap();
        let bb = doc.elements[0].path.bounds(0.01).unwrap();
        assert!((bb.x - 100.0).abs() < 1e-9);
        assert!((bb.y - 100.0).abs() < 1e-9);
        assert!((bb.w - 20.0).abs() < 1e-9);

        // Outside the group again.
        let bb = doc.elements[1].path.bounds(0.01).unwrap();
        assert!(bb.x.abs() < 1e-9 && bb.y.abs() < 1e-9);
    }

    #[test]
    fn test_nested_group_transforms_compose() {
        let svg = r#"<svg viewBox="0 0 300 300">
            <g transform="translate(100 50)">
                <g transform="scale(2)">
                    <rect x="1" y="1" width="10" height="5" transform="translate(4 0)"/>
                </g>
                <rect width="3" height="3"/>
            </g>
            <g/>
            <rect x="7" y="7" width="1" height="1"/>
        </svg>"#;
        let doc = SvgImporter::new().parse(svg).unwrap();
        assert_eq!(doc.elements.len(), 3);

        // (1,1) -> translate(4,0) -> (5,1) -> scale 2 -> (10,2) -> (110,52)
        let bb = doc.elements[0].path.bounds(0.01).unwrap();
        assert!((bb.x - 110.0).abs() < 1e-9);
        assert!((bb.y - 52.0).abs() < 1e-9);
        assert!((bb.w - 20.0).abs() < 1e-9);
        assert!((bb.h - 10.0).abs() < 1e-9);

        let bb = doc.elements[1].path.bounds(0.01).unwrap();
        assert!((bb.x - 100.0).abs() < 1e-9);
        assert!((bb.y - 50.0).abs() < 1e-9);

        let bb = doc.elements[2].path.bounds(0.01).unwrap();
        assert!((bb.x - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_welded_flag() {
        let doc = SvgImporter::new()
            .parse(r#"<svg viewBox="0 0 10 10"><path d="M0 0 L5 0 L5 5 Z M6 6 L8 6 L8 8 Z" data-welded="true"/></svg>"#)
            .unwrap();
        assert!(doc.elements[0].welded);
    }
}
