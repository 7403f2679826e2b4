//! SVG path data
//!
//! [`PathData`] is the pure geometry carried by shapes and parts: a list of
//! absolute move/line/quadratic/cubic/close commands in `f64`. It is parsed
//! from SVG `d` strings, serialised back to them, and flattened through a
//! lyon path whenever polylines are needed.

use lyon::geom::euclid::default::Transform2D;
use lyon::geom::{ArcFlags, SvgArc};
use lyon::math::point;
use lyon::path::iterator::PathIterator;
use lyon::path::Path;
use regex::Regex;
use signcut_core::{BBox, Point};
use std::sync::OnceLock;

/// 2D affine transform in SVG matrix order
pub type Affine = Transform2D<f64>;

/// One absolute path command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { ctrl: Point, to: Point },
    CubicTo { ctrl1: Point, ctrl2: Point, to: Point },
    Close,
}

/// A flattened sub-path
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Absolute path command list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathData {
    commands: Vec<PathCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

const COMMANDS: &str = "MmLlHhVvCcSsQqTtAaZz";

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?")
            .unwrap_or_else(|_| unreachable!("path number pattern is valid"))
    })
}

/// Arc arguments 3 and 4 are single-character flags, so `0 1140 0`
/// reads as flags 1, 1 followed by 40 0.
fn is_arc_flag(command: Option<char>, arg: usize) -> bool {
    matches!(command, Some('A' | 'a')) && matches!(arg % 7, 3 | 4)
}

fn tokenize(data: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut command = None;
    let mut arg = 0usize;
    let mut pos = 0;

    while let Some(c) = data[pos..].chars().next() {
        if c.is_whitespace() || c == ',' {
            pos += c.len_utf8();
            continue;
        }
        if COMMANDS.contains(c) {
            tokens.push(Token::Command(c));
            command = Some(c);
            arg = 0;
            pos += 1;
            continue;
        }
        if is_arc_flag(command, arg) && matches!(c, '0' | '1') {
            tokens.push(Token::Number(if c == '1' { 1.0 } else { 0.0 }));
            arg += 1;
            pos += 1;
            continue;
        }
        match number_regex().find(&data[pos..]) {
            Some(m) => {
                if let Ok(n) = m.as_str().parse() {
                    tokens.push(Token::Number(n));
                    arg += 1;
                }
                pos += m.end();
            }
            None => pos += c.len_utf8(),
        }
    }
    tokens
}

fn to_lyon(p: Point) -> lyon::geom::Point<f64> {
    lyon::geom::point(p.x, p.y)
}

fn from_lyon(p: lyon::geom::Point<f64>) -> Point {
    Point::new(p.x, p.y)
}

fn reflect(ctrl: Option<Point>, about: Point) -> Point {
    match ctrl {
        Some(c) => Point::new(2.0 * about.x - c.x, 2.0 * about.y - c.y),
        None => about,
    }
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn number(&mut self) -> Option<f64> {
        match self.tokens.get(self.pos) {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Some(*n)
            }
            _ => None,
        }
    }

    fn pair(&mut self) -> Option<(f64, f64)> {
        let save = self.pos;
        match (self.number(), self.number()) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => {
                self.pos = save;
                None
            }
        }
    }

    fn next_is_number(&self) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Number(_)))
    }
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_commands(commands: Vec<PathCommand>) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        !self
            .commands
            .iter()
            .any(|c| !matches!(c, PathCommand::MoveTo(_) | PathCommand::Close))
    }

    /// Closed polygon through `points`
    pub fn polygon(points: &[Point], closed: bool) -> Self {
        let mut commands = Vec::with_capacity(points.len() + 1);
        for (i, p) in points.iter().enumerate() {
            if i == 0 {
                commands.push(PathCommand::MoveTo(*p));
            } else {
                commands.push(PathCommand::LineTo(*p));
            }
        }
        if closed && points.len() > 1 {
            commands.push(PathCommand::Close);
        }
        Self { commands }
    }

    /// Parse an SVG `d` attribute.
    ///
    /// Malformed trailing data is ignored; whatever parsed up to that point
    /// is kept.
    pub fn parse(data: &str) -> Self {
        let mut cursor = Cursor {
            tokens: tokenize(data),
            pos: 0,
        };
        let mut out: Vec<PathCommand> = Vec::new();
        let mut current = Point::ORIGIN;
        let mut start = Point::ORIGIN;
        let mut last_cubic_ctrl: Option<Point> = None;
        let mut last_quad_ctrl: Option<Point> = None;
        let mut command: Option<char> = None;
        let mut needs_move = true;

        // Drawing commands after Z re-open at the sub-path start.
        fn ensure_open(out: &mut Vec<PathCommand>, needs_move: &mut bool, at: Point) {
            if *needs_move {
                out.push(PathCommand::MoveTo(at));
                *needs_move = false;
            }
        }

        while cursor.pos < cursor.tokens.len() {
            let cmd = match cursor.tokens[cursor.pos] {
                Token::Command(c) => {
                    cursor.pos += 1;
                    c
                }
                Token::Number(_) => match command {
                    Some('M') => 'L',
                    Some('m') => 'l',
                    Some(c) if !matches!(c, 'Z' | 'z') => c,
                    _ => {
                        cursor.pos += 1;
                        continue;
                    }
                },
            };
            command = Some(cmd);
            let relative = cmd.is_ascii_lowercase();
            let base = if relative { current } else { Point::ORIGIN };

            match cmd.to_ascii_uppercase() {
                'M' => {
                    let Some((x, y)) = cursor.pair() else { break };
                    current = base.offset(x, y);
                    start = current;
                    out.push(PathCommand::MoveTo(current));
                    needs_move = false;
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                }
                'L' => {
                    let Some((x, y)) = cursor.pair() else { break };
                    ensure_open(&mut out, &mut needs_move, current);
                    current = base.offset(x, y);
                    out.push(PathCommand::LineTo(current));
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                }
                'H' => {
                    let Some(x) = cursor.number() else { break };
                    ensure_open(&mut out, &mut needs_move, current);
                    current = Point::new(if relative { current.x + x } else { x }, current.y);
                    out.push(PathCommand::LineTo(current));
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                }
                'V' => {
                    let Some(y) = cursor.number() else { break };
                    ensure_open(&mut out, &mut needs_move, current);
                    current = Point::new(current.x, if relative { current.y + y } else { y });
                    out.push(PathCommand::LineTo(current));
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                }
                'C' => {
                    let (Some(c1), Some(c2), Some(to)) = (cursor.pair(), cursor.pair(), cursor.pair())
                    else {
                        break;
                    };
                    ensure_open(&mut out, &mut needs_move, current);
                    let ctrl1 = base.offset(c1.0, c1.1);
                    let ctrl2 = base.offset(c2.0, c2.1);
                    current = base.offset(to.0, to.1);
                    out.push(PathCommand::CubicTo { ctrl1, ctrl2, to: current });
                    last_cubic_ctrl = Some(ctrl2);
                    last_quad_ctrl = None;
                }
                'S' => {
                    let (Some(c2), Some(to)) = (cursor.pair(), cursor.pair()) else { break };
                    ensure_open(&mut out, &mut needs_move, current);
                    let ctrl1 = reflect(last_cubic_ctrl, current);
                    let ctrl2 = base.offset(c2.0, c2.1);
                    current = base.offset(to.0, to.1);
                    out.push(PathCommand::CubicTo { ctrl1, ctrl2, to: current });
                    last_cubic_ctrl = Some(ctrl2);
                    last_quad_ctrl = None;
                }
                'Q' => {
                    let (Some(c), Some(to)) = (cursor.pair(), cursor.pair()) else { break };
                    ensure_open(&mut out, &mut needs_move, current);
                    let ctrl = base.offset(c.0, c.1);
                    current = base.offset(to.0, to.1);
                    out.push(PathCommand::QuadTo { ctrl, to: current });
                    last_quad_ctrl = Some(ctrl);
                    last_cubic_ctrl = None;
                }
                'T' => {
                    let Some(to) = cursor.pair() else { break };
                    ensure_open(&mut out, &mut needs_move, current);
                    let ctrl = reflect(last_quad_ctrl, current);
                    current = base.offset(to.0, to.1);
                    out.push(PathCommand::QuadTo { ctrl, to: current });
                    last_quad_ctrl = Some(ctrl);
                    last_cubic_ctrl = None;
                }
                'A' => {
                    let (Some(rx), Some(ry), Some(rotation), Some(large), Some(sweep), Some(to)) = (
                        cursor.number(),
                        cursor.number(),
                        cursor.number(),
                        cursor.number(),
                        cursor.number(),
                        cursor.pair(),
                    ) else {
                        break;
                    };
                    ensure_open(&mut out, &mut needs_move, current);
                    let target = base.offset(to.0, to.1);
                    push_arc(&mut out, current, target, rx, ry, rotation, large != 0.0, sweep != 0.0);
                    current = target;
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                }
                'Z' => {
                    if !needs_move {
                        out.push(PathCommand::Close);
                    }
                    current = start;
                    needs_move = true;
                    last_cubic_ctrl = None;
                    last_quad_ctrl = None;
                    // A number right after Z has no command to attach to.
                    while cursor.next_is_number() {
                        cursor.pos += 1;
                    }
                }
                _ => {}
            }
        }

        Self { commands: out }
    }

    /// Serialise to an absolute SVG `d` string
    pub fn to_svg_d(&self) -> String {
        let mut parts = Vec::with_capacity(self.commands.len());
        for cmd in &self.commands {
            parts.push(match cmd {
                PathCommand::MoveTo(p) => format!("M{} {}", num(p.x), num(p.y)),
                PathCommand::LineTo(p) => format!("L{} {}", num(p.x), num(p.y)),
                PathCommand::QuadTo { ctrl, to } => format!(
                    "Q{} {} {} {}",
                    num(ctrl.x),
                    num(ctrl.y),
                    num(to.x),
                    num(to.y)
                ),
                PathCommand::CubicTo { ctrl1, ctrl2, to } => format!(
                    "C{} {} {} {} {} {}",
                    num(ctrl1.x),
                    num(ctrl1.y),
                    num(ctrl2.x),
                    num(ctrl2.y),
                    num(to.x),
                    num(to.y)
                ),
                PathCommand::Close => "Z".to_string(),
            });
        }
        parts.join(" ")
    }

    /// Split on every move-to into single-contour paths
    pub fn subpaths(&self) -> Vec<PathData> {
        let mut result = Vec::new();
        let mut current: Vec<PathCommand> = Vec::new();
        for cmd in &self.commands {
            if matches!(cmd, PathCommand::MoveTo(_)) && !current.is_empty() {
                result.push(PathData::from_commands(std::mem::take(&mut current)));
            }
            current.push(*cmd);
        }
        if !current.is_empty() {
            result.push(PathData::from_commands(current));
        }
        result.retain(|p| !p.is_empty());
        result
    }

    /// Append the commands of `other`
    pub fn extend(&mut self, other: &PathData) {
        self.commands.extend_from_slice(&other.commands);
    }

    pub fn map_points(&self, f: impl Fn(Point) -> Point) -> PathData {
        let commands = self
            .commands
            .iter()
            .map(|cmd| match *cmd {
                PathCommand::MoveTo(p) => PathCommand::MoveTo(f(p)),
                PathCommand::LineTo(p) => PathCommand::LineTo(f(p)),
                PathCommand::QuadTo { ctrl, to } => PathCommand::QuadTo {
                    ctrl: f(ctrl),
                    to: f(to),
                },
                PathCommand::CubicTo { ctrl1, ctrl2, to } => PathCommand::CubicTo {
                    ctrl1: f(ctrl1),
                    ctrl2: f(ctrl2),
                    to: f(to),
                },
                PathCommand::Close => PathCommand::Close,
            })
            .collect();
        PathData { commands }
    }

    pub fn transformed(&self, transform: &Affine) -> PathData {
        self.map_points(|p| from_lyon(transform.transform_point(to_lyon(p))))
    }

    pub fn scaled(&self, factor: f64) -> PathData {
        self.map_points(|p| Point::new(p.x * factor, p.y * factor))
    }

    pub fn translated(&self, dx: f64, dy: f64) -> PathData {
        self.map_points(|p| p.offset(dx, dy))
    }

    /// All coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.commands.iter().all(|cmd| match cmd {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p.is_finite(),
            PathCommand::QuadTo { ctrl, to } => ctrl.is_finite() && to.is_finite(),
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                ctrl1.is_finite() && ctrl2.is_finite() && to.is_finite()
            }
            PathCommand::Close => true,
        })
    }

    pub fn to_lyon_path(&self) -> Path {
        let mut builder = Path::builder();
        let mut open = false;
        let mut last = Point::ORIGIN;
        for cmd in &self.commands {
            let f = |p: Point| point(p.x as f32, p.y as f32);
            match *cmd {
                PathCommand::MoveTo(p) => {
                    if open {
                        builder.end(false);
                    }
                    builder.begin(f(p));
                    open = true;
                    last = p;
                }
                PathCommand::Close => {
                    if open {
                        builder.end(true);
                        open = false;
                    }
                }
                drawing => {
                    if !open {
                        builder.begin(f(last));
                        open = true;
                    }
                    match drawing {
                        PathCommand::LineTo(p) => {
                            builder.line_to(f(p));
                            last = p;
                        }
                        PathCommand::QuadTo { ctrl, to } => {
                            builder.quadratic_bezier_to(f(ctrl), f(to));
                            last = to;
                        }
                        PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                            builder.cubic_bezier_to(f(ctrl1), f(ctrl2), f(to));
                            last = to;
                        }
                        _ => {}
                    }
                }
            }
        }
        if open {
            builder.end(false);
        }
        builder.build()
    }

    /// Flatten curves into polylines, one per sub-path.
    ///
    /// Closed sub-paths end with a repeat of their first point.
    pub fn flatten(&self, tolerance: f64) -> Vec<Polyline> {
        let path = self.to_lyon_path();
        let mut result = Vec::new();
        let mut current: Vec<Point> = Vec::new();

        for event in path.iter().flattened(tolerance.max(1e-4) as f32) {
            match event {
                lyon::path::Event::Begin { at } => {
                    current = vec![Point::new(at.x as f64, at.y as f64)];
                }
                lyon::path::Event::Line { to, .. } => {
                    current.push(Point::new(to.x as f64, to.y as f64));
                }
                lyon::path::Event::End { first, close, .. } => {
                    if close {
                        let first = Point::new(first.x as f64, first.y as f64);
                        if current.last() != Some(&first) {
                            current.push(first);
                        }
                    }
                    result.push(Polyline {
                        points: std::mem::take(&mut current),
                        closed: close,
                    });
                }
                _ => {}
            }
        }
        result
    }

    /// Tight bounds of the flattened geometry
    pub fn bounds(&self, tolerance: f64) -> Option<BBox> {
        let lines = self.flatten(tolerance);
        BBox::from_points(lines.iter().flat_map(|l| l.points.iter()))
    }
}

#[allow(clippy::too_many_arguments)]
fn push_arc(
    out: &mut Vec<PathCommand>,
    from: Point,
    to: Point,
    rx: f64,
    ry: f64,
    rotation_deg: f64,
    large_arc: bool,
    sweep: bool,
) {
    let arc = SvgArc {
        from: to_lyon(from),
        to: to_lyon(to),
        radii: lyon::geom::vector(rx.abs(), ry.abs()),
        x_rotation: lyon::geom::Angle::degrees(rotation_deg),
        flags: ArcFlags { large_arc, sweep },
    };

    if arc.is_straight_line() {
        out.push(PathCommand::LineTo(to));
        return;
    }

    arc.to_arc().for_each_cubic_bezier(&mut |seg| {
        out.push(PathCommand::CubicTo {
            ctrl1: from_lyon(seg.ctrl1),
            ctrl2: from_lyon(seg.ctrl2),
            to: from_lyon(seg.to),
        });
    });
}

fn num(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Parse an SVG `transform` attribute list into a single affine transform.
///
/// Unknown entries are skipped.
pub fn parse_transform(value: &str) -> Affine {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(matrix|translate|scale|rotate|skewX|skewY)\s*\(([^)]*)\)")
            .unwrap_or_else(|_| unreachable!("transform pattern is valid"))
    });

    let mut total = Affine::identity();
    for caps in re.captures_iter(value) {
        let args: Vec<f64> = tokenize(&caps[2])
            .into_iter()
            .filter_map(|t| match t {
                Token::Number(n) => Some(n),
                Token::Command(_) => None,
            })
            .collect();

        let item = match (&caps[1], args.as_slice()) {
            ("matrix", [a, b, c, d, e, f]) => Affine::new(*a, *b, *c, *d, *e, *f),
            ("translate", [tx]) => Affine::translation(*tx, 0.0),
            ("translate", [tx, ty]) => Affine::translation(*tx, *ty),
            ("scale", [s]) => Affine::scale(*s, *s),
            ("scale", [sx, sy]) => Affine::scale(*sx, *sy),
            ("rotate", [deg]) => Affine::rotation(lyon::geom::Angle::degrees(*deg)),
            ("rotate", [deg, cx, cy]) => Affine::translation(-cx, -cy)
                .then(&Affine::rotation(lyon::geom::Angle::degrees(*deg)))
                .then(&Affine::translation(*cx, *cy)),
            ("skewX", [deg]) => Affine::new(1.0, 0.0, deg.to_radians().tan(), 1.0, 0.0, 0.0),
            ("skewY", [deg]) => Affine::new(1.0, deg.to_radians().tan(), 0.0, 1.0, 0.0, 0.0),
            _ => continue,
        };
        // Rightmost entries apply first.
        total = item.then(&total);
    }
    total
}
