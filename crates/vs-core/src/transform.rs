//! Object placement and constraint application.
//!
//! `width`/`height` are the unscaled footprint; `scale_x`/`scale_y`
//! accumulate multiplicatively and default to 1 when absent.

use crate::geometry::{Bounds, snap_to_grid};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Width/height substituted for a non-finite or non-positive dimension.
pub const FALLBACK_DIMENSION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees, clockwise.
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
}

impl Transform {
    /// Identity placement at the origin with the given footprint.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            scale_x: None,
            scale_y: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        self.at(self.x + dx, self.y + dy)
    }

    /// Multiply the accumulated scale factors.
    pub fn scale(mut self, sx: f64, sy: f64) -> Self {
        self.scale_x = Some(self.scale_x() * sx);
        self.scale_y = Some(self.scale_y() * sy);
        self
    }

    pub fn rotate(mut self, degrees: f64) -> Self {
        self.rotation += degrees;
        self
    }

    /// Fresh transform with the given footprint; everything else defaulted.
    pub fn reset(width: f64, height: f64) -> Self {
        Self::new(width, height)
    }

    pub fn scale_x(&self) -> f64 {
        self.scale_x.unwrap_or(1.0)
    }

    pub fn scale_y(&self) -> f64 {
        self.scale_y.unwrap_or(1.0)
    }

    /// Footprint after scaling.
    pub fn effective_size(&self) -> (f64, f64) {
        (self.width * self.scale_x(), self.height * self.scale_y())
    }

    pub fn bounds(&self) -> Bounds {
        let (w, h) = self.effective_size();
        Bounds::new(self.x, self.y, w, h)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Replace anything non-finite or non-positive with a usable value.
    fn sanitized(mut self) -> Self {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        self.x = finite_or(self.x, 0.0);
        self.y = finite_or(self.y, 0.0);
        self.rotation = finite_or(self.rotation, 0.0);
        self.width = positive_dimension(self.width);
        self.height = positive_dimension(self.height);
        self.scale_x = self.scale_x.filter(|s| s.is_finite() && *s > 0.0);
        self.scale_y = self.scale_y.filter(|s| s.is_finite() && *s > 0.0);
        self
    }
}

fn positive_dimension(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { FALLBACK_DIMENSION }
}

/// Limits applied by [`apply_constraints`]. Every field is optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConstraints {
    /// Snap the position to multiples of this size.
    pub grid_size: Option<f64>,
    pub maintain_aspect_ratio: bool,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    /// Keep the whole footprint (not just the origin) inside this box.
    pub bounds: Option<Bounds>,
}

/// Apply constraints in a fixed order: grid snap → aspect ratio → size
/// clamp → position bounds. Never fails; out-of-range input is clamped.
pub fn apply_constraints(transform: Transform, constraints: &TransformConstraints) -> Transform {
    let mut t = transform.sanitized();

    if let Some(grid) = constraints.grid_size {
        (t.x, t.y) = snap_to_grid(t.x, t.y, grid, true);
    }

    if constraints.maintain_aspect_ratio {
        let (sx, sy) = (t.scale_x(), t.scale_y());
        if sx != 1.0 {
            t.scale_y = Some(sx);
        } else if sy != 1.0 {
            t.scale_x = Some(sy);
        }
    }

    t.width = clamp_dimension(t.width, constraints.min_width, constraints.max_width);
    t.height = clamp_dimension(t.height, constraints.min_height, constraints.max_height);

    if let Some(b) = constraints.bounds {
        t.x = t.x.min(b.right() - t.width).max(b.x);
        t.y = t.y.min(b.bottom() - t.height).max(b.y);
    }

    t
}

fn clamp_dimension(v: f64, min: Option<f64>, max: Option<f64>) -> f64 {
    let mut v = v;
    if let Some(max) = max.filter(|m| m.is_finite()) {
        v = v.min(max);
    }
    if let Some(min) = min.filter(|m| m.is_finite()) {
        v = v.max(min);
    }
    positive_dimension(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scale_accumulates() {
        let t = Transform::new(10.0, 20.0).scale(2.0, 3.0).scale(0.5, 2.0);
        assert_eq!((t.scale_x(), t.scale_y()), (1.0, 6.0));
        assert_eq!(t.effective_size(), (10.0, 120.0));
    }

    #[test]
    fn rotate_is_additive() {
        let t = Transform::new(1.0, 1.0).rotate(30.0).rotate(45.0);
        assert_eq!(t.rotation, 75.0);
    }

    #[test]
    fn reset_defaults_everything_else() {
        let t = Transform::reset(40.0, 30.0);
        assert_eq!(t, Transform::new(40.0, 30.0));
        assert_eq!(t.scale_x, None);
    }

    #[test]
    fn constraints_run_in_order() {
        let constraints = TransformConstraints {
            grid_size: Some(10.0),
            maintain_aspect_ratio: true,
            min_width: Some(20.0),
            max_width: Some(50.0),
            bounds: Some(Bounds::new(0.0, 0.0, 100.0, 100.0)),
            ..Default::default()
        };
        let t = Transform {
            x: 94.0,
            y: -3.0,
            width: 80.0,
            height: 10.0,
            rotation: 0.0,
            scale_x: Some(2.0),
            scale_y: None,
        };
        let out = apply_constraints(t, &constraints);
        assert_eq!(out.scale_y, Some(2.0));
        assert_eq!(out.width, 50.0);
        // right edge clamp uses the clamped width: 100 - 50
        assert_eq!(out.x, 50.0);
        assert_eq!(out.y, 0.0);
    }

    #[test]
    fn aspect_ratio_uses_non_default_y_axis() {
        let t = Transform::new(10.0, 10.0).scale(1.0, 3.0);
        let out = apply_constraints(
            t,
            &TransformConstraints {
                maintain_aspect_ratio: true,
                ..Default::default()
            },
        );
        assert_eq!((out.scale_x(), out.scale_y()), (3.0, 3.0));
    }

    #[test]
    fn constraints_are_idempotent() {
        let constraints = TransformConstraints {
            grid_size: Some(5.0),
            maintain_aspect_ratio: true,
            min_width: Some(10.0),
            max_height: Some(40.0),
            bounds: Some(Bounds::new(0.0, 0.0, 200.0, 200.0)),
            ..Default::default()
        };
        let t = Transform {
            x: 187.0,
            y: 13.0,
            width: 4.0,
            height: 90.0,
            rotation: 12.0,
            scale_x: None,
            scale_y: Some(1.5),
        };
        let once = apply_constraints(t, &constraints);
        let twice = apply_constraints(once, &constraints);
        assert_eq!(once, twice);
    }

    #[test]
    fn sub_unit_sizes_are_kept() {
        let out = apply_constraints(Transform::new(0.5, 0.25), &TransformConstraints::default());
        assert_eq!((out.width, out.height), (0.5, 0.25));

        let clamped = apply_constraints(
            Transform::new(0.5, 0.25),
            &TransformConstraints {
                max_width: Some(0.1),
                min_height: Some(0.3),
                ..Default::default()
            },
        );
        assert_eq!((clamped.width, clamped.height), (0.1, 0.3));
    }

    #[test]
    fn off_grid_lower_bound_is_not_idempotent() {
        // Snap puts x on 0, the bound pulls it back to 7, and the next pass
        // snaps 7 up to 10.
        let constraints = TransformConstraints {
            grid_size: Some(10.0),
            bounds: Some(Bounds::new(7.0, 7.0, 100.0, 100.0)),
            ..Default::default()
        };
        let once = apply_constraints(Transform::new(20.0, 20.0).at(3.0, 3.0), &constraints);
        let twice = apply_constraints(once, &constraints);
        assert_eq!((once.x, once.y), (7.0, 7.0));
        assert_eq!((twice.x, twice.y), (10.0, 10.0));
    }

    #[test]
    fn never_produces_nan_or_non_positive_size() {
        let t = Transform {
            x: f64::NAN,
            y: f64::INFINITY,
            width: -5.0,
            height: f64::NAN,
            rotation: f64::NAN,
            scale_x: Some(f64::NAN),
            scale_y: Some(0.0),
        };
        let out = apply_constraints(t, &TransformConstraints::default());
        assert_eq!(out.x, 0.0);
        assert_eq!(out.y, 0.0);
        assert!(out.width > 0.0 && out.height > 0.0);
        assert_eq!(out.rotation, 0.0);
        assert_eq!((out.scale_x, out.scale_y), (None, None));
    }
}
