//! SVG path mini-language ↔ structured path commands.
//!
//! Parsing never fails: malformed tokens are skipped and commands with too
//! few coordinates are dropped. Relative (lowercase) commands and `H`/`V`
//! are resolved against the running current point while parsing, so every
//! parsed `PathPoint` carries absolute `x` and `y`.
//!
//! Control handles are stored on the anchor they were parsed with:
//!
//! | Command | `control_in` | `control_out` |
//! |---------|--------------|---------------|
//! | `C x1 y1 x2 y2 x y` | `(x1, y1)` | `(x2, y2)` |
//! | `Q x1 y1 x y` | `(x1, y1)` | |
//! | `S x2 y2 x y` | | `(x2, y2)` |

use kurbo::{BezPath, Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use winnow::ascii::float;
use winnow::prelude::*;
use winnow::token::take_while;

// ─── Data model ──────────────────────────────────────────────────────────

/// Whether a point is an on-curve vertex or a free-standing handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointKind {
    #[default]
    Anchor,
    Control,
}

/// A vertex of a path plus the handles owned by it.
///
/// A missing handle means a sharp corner on that side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub kind: PointKind,
    pub control_in: Option<Point>,
    pub control_out: Option<Point>,
}

impl PathPoint {
    pub fn anchor(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            kind: PointKind::Anchor,
            control_in: None,
            control_out: None,
        }
    }

    pub fn with_controls(mut self, control_in: Option<Point>, control_out: Option<Point>) -> Self {
        self.control_in = control_in;
        self.control_out = control_out;
        self
    }

    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_pos(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn has_handles(&self) -> bool {
        self.control_in.is_some() || self.control_out.is_some()
    }
}

/// SVG command letters. Parsed commands are always absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    M,
    L,
    H,
    V,
    C,
    S,
    Q,
    T,
    A,
    Z,
}

impl CommandKind {
    pub fn from_letter(c: char) -> Option<Self> {
        Some(match c.to_ascii_uppercase() {
            'M' => Self::M,
            'L' => Self::L,
            'H' => Self::H,
            'V' => Self::V,
            'C' => Self::C,
            'S' => Self::S,
            'Q' => Self::Q,
            'T' => Self::T,
            'A' => Self::A,
            'Z' => Self::Z,
            _ => return None,
        })
    }

    pub fn letter(self) -> char {
        match self {
            Self::M => 'M',
            Self::L => 'L',
            Self::H => 'H',
            Self::V => 'V',
            Self::C => 'C',
            Self::S => 'S',
            Self::Q => 'Q',
            Self::T => 'T',
            Self::A => 'A',
            Self::Z => 'Z',
        }
    }

    /// Number of numeric arguments consumed per coordinate group.
    pub fn arity(self) -> usize {
        match self {
            Self::Z => 0,
            Self::H | Self::V => 1,
            Self::M | Self::L | Self::T => 2,
            Self::S | Self::Q => 4,
            Self::C => 6,
            Self::A => 7,
        }
    }
}

/// Elliptical arc parameters carried by an `A` command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcParams {
    pub rx: f64,
    pub ry: f64,
    pub x_axis_rotation: f64,
    pub large_arc: bool,
    pub sweep: bool,
}

/// One command of a path. `Z` has no points; every other kind has one
/// anchor (plus whatever handles the kind uses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCommand {
    pub kind: CommandKind,
    pub points: SmallVec<[PathPoint; 1]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arc: Option<ArcParams>,
}

impl PathCommand {
    pub fn new(kind: CommandKind, point: PathPoint) -> Self {
        Self {
            kind,
            points: smallvec![point],
            arc: None,
        }
    }

    pub fn move_to(x: f64, y: f64) -> Self {
        Self::new(CommandKind::M, PathPoint::anchor(x, y))
    }

    pub fn line_to(x: f64, y: f64) -> Self {
        Self::new(CommandKind::L, PathPoint::anchor(x, y))
    }

    pub fn cubic_to(c1: Point, c2: Point, end: Point) -> Self {
        Self::new(
            CommandKind::C,
            PathPoint::anchor(end.x, end.y).with_controls(Some(c1), Some(c2)),
        )
    }

    pub fn quad_to(c: Point, end: Point) -> Self {
        Self::new(
            CommandKind::Q,
            PathPoint::anchor(end.x, end.y).with_controls(Some(c), None),
        )
    }

    pub fn close() -> Self {
        Self {
            kind: CommandKind::Z,
            points: SmallVec::new(),
            arc: None,
        }
    }

    /// The anchor this command ends on, if it has one.
    pub fn end_point(&self) -> Option<Point> {
        self.points.last().map(PathPoint::pos)
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────

/// Parse SVG path data into absolute commands.
pub fn parse(path_data: &str) -> Vec<PathCommand> {
    let segments = tokenize(path_data);
    let mut commands = Vec::with_capacity(segments.len());
    let mut current = Point::ZERO;
    let mut subpath_start = Point::ZERO;

    for (letter, nums) in segments {
        let Some(kind) = CommandKind::from_letter(letter) else {
            continue;
        };
        let relative = letter.is_ascii_lowercase();

        if kind == CommandKind::Z {
            commands.push(PathCommand::close());
            current = subpath_start;
            continue;
        }

        let arity = kind.arity();
        if nums.len() < arity {
            log::trace!("dropping `{letter}` with {} of {arity} arguments", nums.len());
            continue;
        }

        for (i, group) in nums.chunks_exact(arity).enumerate() {
            // Extra coordinate pairs after a moveto are implicit linetos.
            let kind = if kind == CommandKind::M && i > 0 {
                CommandKind::L
            } else {
                kind
            };
            let origin = if relative { current } else { Point::ZERO };
            let at = |dx: f64, dy: f64| Point::new(origin.x + dx, origin.y + dy);

            let cmd = match kind {
                CommandKind::M | CommandKind::L | CommandKind::T => {
                    let p = at(group[0], group[1]);
                    PathCommand::new(kind, PathPoint::anchor(p.x, p.y))
                }
                CommandKind::H => {
                    let x = if relative { current.x + group[0] } else { group[0] };
                    PathCommand::new(kind, PathPoint::anchor(x, current.y))
                }
                CommandKind::V => {
                    let y = if relative { current.y + group[0] } else { group[0] };
                    PathCommand::new(kind, PathPoint::anchor(current.x, y))
                }
                CommandKind::C => {
                    PathCommand::cubic_to(at(group[0], group[1]), at(group[2], group[3]), at(group[4], group[5]))
                }
                CommandKind::Q => PathCommand::quad_to(at(group[0], group[1]), at(group[2], group[3])),
                CommandKind::S => {
                    let end = at(group[2], group[3]);
                    PathCommand::new(
                        kind,
                        PathPoint::anchor(end.x, end.y).with_controls(None, Some(at(group[0], group[1]))),
                    )
                }
                CommandKind::A => {
                    let end = at(group[5], group[6]);
                    let mut cmd = PathCommand::new(kind, PathPoint::anchor(end.x, end.y));
                    cmd.arc = Some(ArcParams {
                        rx: group[0],
                        ry: group[1],
                        x_axis_rotation: group[2],
                        large_arc: group[3] != 0.0,
                        sweep: group[4] != 0.0,
                    });
                    cmd
                }
                CommandKind::Z => PathCommand::close(),
            };

            if let Some(end) = cmd.end_point() {
                current = end;
                if kind == CommandKind::M {
                    subpath_start = end;
                }
            }
            commands.push(cmd);
        }

        let leftover = nums.len() % arity;
        if leftover != 0 {
            log::trace!("dropping {leftover} trailing arguments of `{letter}`");
        }
    }

    commands
}

fn is_command_letter(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'M' | 'L' | 'H' | 'V' | 'C' | 'S' | 'Q' | 'T' | 'A' | 'Z')
}

fn skip_separators(input: &mut &str) {
    let _: ModalResult<&str> = take_while(0.., |c: char| c.is_whitespace() || c == ',').parse_next(input);
}

fn number(input: &mut &str) -> ModalResult<f64> {
    float.parse_next(input)
}

/// Split path data into `(letter, numbers)` groups. Stray characters and
/// numbers before the first command letter are discarded.
fn tokenize(input: &str) -> Vec<(char, Vec<f64>)> {
    let mut rest = input;
    let mut segments = Vec::new();
    let mut current: Option<(char, Vec<f64>)> = None;

    loop {
        skip_separators(&mut rest);
        let Some(c) = rest.chars().next() else {
            break;
        };

        if is_command_letter(c) {
            segments.extend(current.take());
            current = Some((c, Vec::new()));
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let checkpoint = rest;
        match number(&mut rest) {
            Ok(n) if n.is_finite() && rest.len() < checkpoint.len() => {
                if let Some((_, nums)) = current.as_mut() {
                    nums.push(n);
                }
            }
            _ => {
                rest = &checkpoint[c.len_utf8()..];
            }
        }
    }

    segments.extend(current);
    segments
}

// ─── Serialization ───────────────────────────────────────────────────────

/// Serialize commands back into path data (absolute, space separated).
///
/// Points missing the handles their command needs are omitted; a command
/// left with nothing to emit is dropped entirely.
pub fn serialize(commands: &[PathCommand]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(commands.len());

    for cmd in commands {
        if cmd.kind == CommandKind::Z {
            parts.push("Z".to_string());
            continue;
        }

        let mut nums: Vec<f64> = Vec::new();
        for p in &cmd.points {
            match cmd.kind {
                CommandKind::M | CommandKind::L | CommandKind::T => nums.extend([p.x, p.y]),
                CommandKind::H => nums.push(p.x),
                CommandKind::V => nums.push(p.y),
                CommandKind::C => {
                    if let (Some(c1), Some(c2)) = (p.control_in, p.control_out) {
                        nums.extend([c1.x, c1.y, c2.x, c2.y, p.x, p.y]);
                    }
                }
                CommandKind::Q => {
                    if let Some(c) = p.control_in {
                        nums.extend([c.x, c.y, p.x, p.y]);
                    }
                }
                CommandKind::S => {
                    if let Some(c) = p.control_out {
                        nums.extend([c.x, c.y, p.x, p.y]);
                    }
                }
                CommandKind::A => {
                    if let Some(arc) = cmd.arc {
                        nums.extend([
                            arc.rx,
                            arc.ry,
                            arc.x_axis_rotation,
                            f64::from(u8::from(arc.large_arc)),
                            f64::from(u8::from(arc.sweep)),
                            p.x,
                            p.y,
                        ]);
                    }
                }
                CommandKind::Z => {}
            }
        }

        if nums.is_empty() {
            continue;
        }
        let mut part = String::with_capacity(2 + nums.len() * 4);
        part.push(cmd.kind.letter());
        for n in nums {
            part.push(' ');
            part.push_str(&format_num(n));
        }
        parts.push(part);
    }

    parts.join(" ")
}

/// Format a coordinate with the shortest text that parses back to the
/// same `f64`. Integers carry no fraction and `-0` prints as `0`.
pub fn format_num(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    format!("{n}")
}

// ─── Geometry helpers ────────────────────────────────────────────────────

/// Iterate every anchor in the path along with its `(command, point)` index.
pub fn anchors(commands: &[PathCommand]) -> impl Iterator<Item = ((usize, usize), &PathPoint)> {
    commands
        .iter()
        .enumerate()
        .flat_map(|(ci, cmd)| cmd.points.iter().enumerate().map(move |(pi, p)| ((ci, pi), p)))
}

/// Bounding box of every anchor and handle (the control polygon).
pub fn path_bounds(commands: &[PathCommand]) -> Option<Rect> {
    let mut pts = anchors(commands).flat_map(|(_, p)| {
        [Some(p.pos()), p.control_in, p.control_out].into_iter().flatten()
    });
    let first = pts.next()?;
    Some(pts.fold(Rect::from_points(first, first), |r, p| r.union_pt(p)))
}

/// Convert to a kurbo path for rendering-side queries (hit testing, area).
///
/// `S`/`T` reflect the previous handle as SVG does; arcs are approximated by
/// kurbo's arc-to-cubic conversion.
pub fn to_bez_path(commands: &[PathCommand]) -> BezPath {
    let mut path = BezPath::new();
    let mut current = Point::ZERO;
    let mut last_cubic_ctrl: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;
    let mut started = false;

    for cmd in commands {
        let Some(p) = cmd.points.first() else {
            if cmd.kind == CommandKind::Z && started {
                path.close_path();
            }
            continue;
        };
        let end = p.pos();
        if !started && cmd.kind != CommandKind::M {
            path.move_to(current);
        }
        started = true;

        let (mut cubic_ctrl, mut quad_ctrl) = (None, None);
        match cmd.kind {
            CommandKind::M => path.move_to(end),
            CommandKind::L | CommandKind::H | CommandKind::V => path.line_to(end),
            CommandKind::C => match (p.control_in, p.control_out) {
                (Some(c1), Some(c2)) => {
                    path.curve_to(c1, c2, end);
                    cubic_ctrl = Some(c2);
                }
                _ => path.line_to(end),
            },
            CommandKind::S => {
                let c1 = last_cubic_ctrl.map_or(current, |c| current + (current - c));
                let c2 = p.control_out.unwrap_or(end);
                path.curve_to(c1, c2, end);
                cubic_ctrl = Some(c2);
            }
            CommandKind::Q => {
                let c = p.control_in.unwrap_or(end);
                path.quad_to(c, end);
                quad_ctrl = Some(c);
            }
            CommandKind::T => {
                let c = last_quad_ctrl.map_or(current, |q| current + (current - q));
                path.quad_to(c, end);
                quad_ctrl = Some(c);
            }
            CommandKind::A => match cmd.arc {
                Some(arc) => {
                    let svg_arc = kurbo::SvgArc {
                        from: current,
                        to: end,
                        radii: kurbo::Vec2::new(arc.rx, arc.ry),
                        x_rotation: arc.x_axis_rotation.to_radians(),
                        large_arc: arc.large_arc,
                        sweep: arc.sweep,
                    };
                    match kurbo::Arc::from_svg_arc(&svg_arc) {
                        Some(a) => a.to_cubic_beziers(0.1, |c1, c2, p| path.curve_to(c1, c2, p)),
                        None => path.line_to(end),
                    }
                }
                None => path.line_to(end),
            },
            CommandKind::Z => {}
        }
        last_cubic_ctrl = cubic_ctrl;
        last_quad_ctrl = quad_ctrl;
        current = end;
    }

    path
}
