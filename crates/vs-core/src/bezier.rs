//! Bézier evaluation and handle math used by the node editor and pen tool.

use kurbo::{CubicBez, ParamCurve, Point, QuadBez};
use std::f64::consts::PI;

/// Handles whose opposing angle is within this many radians of a straight
/// line are treated as a smooth (mirrored) node.
pub const SMOOTH_ANGLE_TOLERANCE: f64 = 0.1;

/// Iterations of the ternary search in [`closest_point_on_cubic`].
const CLOSEST_POINT_ITERATIONS: usize = 20;

/// Coarse samples used to bracket the ternary search.
const CLOSEST_POINT_SEEDS: usize = 16;

/// Evaluate a cubic Bézier at `t` (clamped to `[0, 1]`).
pub fn cubic_point(t: f64, p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
    CubicBez::new(p0, p1, p2, p3).eval(t.clamp(0.0, 1.0))
}

/// Evaluate a quadratic Bézier at `t` (clamped to `[0, 1]`).
pub fn quadratic_point(t: f64, p0: Point, p1: Point, p2: Point) -> Point {
    QuadBez::new(p0, p1, p2).eval(t.clamp(0.0, 1.0))
}

pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Reflect `control` through `anchor`.
pub fn mirror_control_point(anchor: Point, control: Point) -> Point {
    Point::new(anchor.x * 2.0 - control.x, anchor.y * 2.0 - control.y)
}

/// Angle of the handle as seen from its anchor, in radians.
pub fn handle_angle(anchor: Point, control: Point) -> f64 {
    (control - anchor).atan2()
}

/// Whether two handles sit on opposite sides of the anchor (±tolerance).
///
/// Zero-length handles have no direction and are never smooth.
pub fn is_smooth(anchor: Point, control_in: Point, control_out: Point) -> bool {
    if control_in == anchor || control_out == anchor {
        return false;
    }
    let mut diff = (handle_angle(anchor, control_in) - handle_angle(anchor, control_out)).abs();
    if diff > PI {
        diff = 2.0 * PI - diff;
    }
    (diff - PI).abs() < SMOOTH_ANGLE_TOLERANCE
}

/// A segment as stored on a path: start, optional handles, end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    pub start: Point,
    pub control1: Option<Point>,
    pub control2: Option<Point>,
    pub end: Point,
}

impl CurveSegment {
    pub fn cubic(&self) -> Option<CubicBez> {
        match (self.control1, self.control2) {
            (Some(c1), Some(c2)) => Some(CubicBez::new(self.start, c1, c2, self.end)),
            _ => None,
        }
    }
}

/// Approximate nearest point on a cubic segment.
///
/// Brackets the best coarse sample, then runs a fixed ternary search. A
/// segment missing either handle returns its end point at `t = 1`.
pub fn closest_point_on_cubic(point: Point, curve: &CurveSegment) -> (f64, Point) {
    let Some(cubic) = curve.cubic() else {
        return (1.0, curve.end);
    };
    let dist = |t: f64| cubic.eval(t).distance_squared(point);

    let step = 1.0 / CLOSEST_POINT_SEEDS as f64;
    let best_seed = (0..=CLOSEST_POINT_SEEDS)
        .map(|i| i as f64 * step)
        .min_by(|a, b| dist(*a).total_cmp(&dist(*b)))
        .unwrap_or(0.0);

    let mut lo = (best_seed - step).max(0.0);
    let mut hi = (best_seed + step).min(1.0);
    for _ in 0..CLOSEST_POINT_ITERATIONS {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if dist(m1) < dist(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }

    let t = (lo + hi) / 2.0;
    (t, cubic.eval(t))
}
