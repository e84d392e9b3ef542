//! Bounding boxes, alignment guides, grid snapping and coordinate spaces.
//!
//! Three spaces are involved while editing:
//!
//! - **screen**: pointer coordinates relative to the stage element
//! - **world**: stage coordinates, mapped from screen by a [`StageViewport`]
//! - **SVG user space**: coordinates inside one asset's `viewBox`

use crate::id::ObjectId;
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Guides whose positions are within this distance are merged.
pub const GUIDE_MERGE_DISTANCE: f64 = 1.0;

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized box spanning two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x.min(b.x), a.y.min(b.y), (b.x - a.x).abs(), (b.y - a.y).abs())
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x(), self.center_y())
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// AABB overlap (touching edges do not count).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right() && self.right() > other.x && self.y < other.bottom() && self.bottom() > other.y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Bounds::new(x, y, self.right().max(other.right()) - x, self.bottom().max(other.bottom()) - y)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Bounds {
        Bounds::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// The value of one alignment line of this box.
    pub fn line(&self, alignment: Alignment) -> f64 {
        match alignment {
            Alignment::Left => self.left(),
            Alignment::CenterX => self.center_x(),
            Alignment::Right => self.right(),
            Alignment::Top => self.top(),
            Alignment::CenterY => self.center_y(),
            Alignment::Bottom => self.bottom(),
        }
    }
}

impl From<Rect> for Bounds {
    fn from(r: Rect) -> Self {
        Bounds::new(r.x0, r.y0, r.width(), r.height())
    }
}

impl From<Bounds> for Rect {
    fn from(b: Bounds) -> Self {
        Rect::new(b.x, b.y, b.right(), b.bottom())
    }
}

// ─── Alignment guides ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// A vertical line; constrains x.
    Vertical,
    /// A horizontal line; constrains y.
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    CenterX,
    Right,
    Top,
    CenterY,
    Bottom,
}

impl Alignment {
    pub const VERTICAL: [Alignment; 3] = [Alignment::Left, Alignment::CenterX, Alignment::Right];
    pub const HORIZONTAL: [Alignment; 3] = [Alignment::Top, Alignment::CenterY, Alignment::Bottom];

    pub fn axis(self) -> Axis {
        match self {
            Alignment::Left | Alignment::CenterX | Alignment::Right => Axis::Vertical,
            Alignment::Top | Alignment::CenterY | Alignment::Bottom => Axis::Horizontal,
        }
    }
}

/// A transient line showing coincidence between the dragged box and others.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentGuide {
    pub axis: Axis,
    pub position: f64,
    pub alignment: Alignment,
    pub targets: SmallVec<[ObjectId; 4]>,
}

/// Compare the moving box's six alignment lines against each other box.
///
/// Lines are compared like-for-like (left with left, center with center…).
/// A guide sits at the other box's line and is emitted when the gap is
/// under `threshold`. Guides on the same axis within
/// [`GUIDE_MERGE_DISTANCE`] are merged and accumulate their targets; the
/// output keeps first-found order (per candidate: left, centerX, right,
/// then top, centerY, bottom).
pub fn detect_alignment(moving: &Bounds, others: &[(ObjectId, Bounds)], threshold: f64) -> Vec<AlignmentGuide> {
    let mut guides: Vec<AlignmentGuide> = Vec::new();

    for (id, other) in others {
        for alignment in Alignment::VERTICAL.into_iter().chain(Alignment::HORIZONTAL) {
            let target = other.line(alignment);
            if (moving.line(alignment) - target).abs() >= threshold {
                continue;
            }
            let axis = alignment.axis();
            match guides
                .iter_mut()
                .find(|g| g.axis == axis && (g.position - target).abs() < GUIDE_MERGE_DISTANCE)
            {
                Some(existing) => {
                    if !existing.targets.contains(id) {
                        existing.targets.push(*id);
                    }
                }
                None => guides.push(AlignmentGuide {
                    axis,
                    position: target,
                    alignment,
                    targets: SmallVec::from_elem(*id, 1),
                }),
            }
        }
    }

    guides
}

/// Offset that moves `moving` onto the first vertical and first horizontal
/// guide. Later guides on the same axis are ignored.
pub fn snap_offset_from_guides(moving: &Bounds, guides: &[AlignmentGuide]) -> (f64, f64) {
    let offset_for = |axis: Axis| {
        guides
            .iter()
            .find(|g| g.axis == axis)
            .map_or(0.0, |g| g.position - moving.line(g.alignment))
    };
    (offset_for(Axis::Vertical), offset_for(Axis::Horizontal))
}

// ─── Grid ────────────────────────────────────────────────────────────────

/// Round a point to the nearest multiple of `grid_size`. No-op when
/// disabled or when the grid size is not a positive number.
pub fn snap_to_grid(x: f64, y: f64, grid_size: f64, enabled: bool) -> (f64, f64) {
    if !enabled || grid_size.is_nan() || grid_size <= 0.0 {
        return (x, y);
    }
    ((x / grid_size).round() * grid_size, (y / grid_size).round() * grid_size)
}

// ─── Stage viewport ──────────────────────────────────────────────────────

/// Pan/zoom of the stage: `screen = world * zoom + (x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageViewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for StageViewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl StageViewport {
    pub const MIN_ZOOM: f64 = 0.05;
    pub const MAX_ZOOM: f64 = 20.0;

    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.zoom, (screen.y - self.y) / self.zoom)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x * self.zoom + self.x, world.y * self.zoom + self.y)
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Change zoom while keeping the world point under `screen` fixed.
    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        let anchor = self.screen_to_world(screen);
        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        self.x = screen.x - anchor.x * self.zoom;
        self.y = screen.y - anchor.y * self.zoom;
    }
}

// ─── SVG user space ──────────────────────────────────────────────────────

/// The `viewBox` of an SVG, in user-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parse a `viewBox` attribute (`"min-x min-y width height"`).
    pub fn parse(attr: &str) -> Option<Self> {
        let nums: Vec<f64> = attr
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        match nums[..] {
            [x, y, width, height] if width > 0.0 && height > 0.0 => Some(Self {
                x,
                y,
                width,
                height,
            }),
            _ => None,
        }
    }
}

/// What a rendered SVG element can tell us about its placement on screen.
pub trait SvgCoordinateSource {
    /// Inverse of the element's screen CTM (screen → user space), if the
    /// host can provide one.
    fn screen_ctm_inverse(&self) -> Option<Affine>;

    /// The element's `viewBox`, if it declares one.
    fn view_box(&self) -> Option<ViewBox>;

    /// The element's rendered box on screen.
    fn client_rect(&self) -> Bounds;
}

/// Convert a screen point into the element's user space.
///
/// Tries the inverse CTM first, then viewBox scaling over the client rect,
/// then plain subtraction of the client rect's origin.
pub fn screen_to_svg_coords(element: &impl SvgCoordinateSource, screen_x: f64, screen_y: f64) -> Point {
    let screen = Point::new(screen_x, screen_y);
    if let Some(inverse) = element.screen_ctm_inverse()
        && inverse.determinant() != 0.0
    {
        return inverse * screen;
    }

    let rect = element.client_rect();
    if let Some(vb) = element.view_box()
        && rect.width > 0.0
        && rect.height > 0.0
    {
        return Point::new(
            vb.x + (screen_x - rect.x) * vb.width / rect.width,
            vb.y + (screen_y - rect.y) * vb.height / rect.height,
        );
    }

    Point::new(screen_x - rect.x, screen_y - rect.y)
}

/// An asset drawn on the stage: its user space mapped through the object's
/// placement and the stage viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedSvg {
    /// User space → screen.
    pub ctm: Affine,
    pub view_box: Option<ViewBox>,
    /// Unscaled size of the asset on the stage.
    pub base_size: (f64, f64),
}

impl PlacedSvg {
    /// Map `view_box` (or raw user units when absent) onto a `base_size`
    /// box at `origin`, scaled by `scale` and rotated `rotation` degrees
    /// about the scaled box's center, then through `viewport`.
    pub fn new(
        origin: Point,
        scale: f64,
        rotation: f64,
        base_size: (f64, f64),
        view_box: Option<ViewBox>,
        viewport: &StageViewport,
    ) -> Self {
        let (w, h) = base_size;
        let (user, fit_x, fit_y) = match view_box {
            Some(vb) => (Affine::translate((-vb.x, -vb.y)), w / vb.width, h / vb.height),
            None => (Affine::IDENTITY, 1.0, 1.0),
        };
        let center = Point::new(w * scale / 2.0, h * scale / 2.0);
        let ctm = Affine::translate((viewport.x, viewport.y))
            * Affine::scale(viewport.zoom)
            * Affine::translate((origin.x, origin.y))
            * Affine::rotate_about(rotation.to_radians(), center)
            * Affine::scale_non_uniform(scale * fit_x, scale * fit_y)
            * user;
        Self {
            ctm,
            view_box,
            base_size,
        }
    }

    /// Screen position of a user-space point.
    pub fn to_screen(&self, user: Point) -> Point {
        self.ctm * user
    }
}

impl SvgCoordinateSource for PlacedSvg {
    fn screen_ctm_inverse(&self) -> Option<Affine> {
        (self.ctm.determinant() != 0.0).then(|| self.ctm.inverse())
    }

    fn view_box(&self) -> Option<ViewBox> {
        self.view_box
    }

    fn client_rect(&self) -> Bounds {
        let user = match self.view_box {
            Some(vb) => Rect::new(vb.x, vb.y, vb.x + vb.width, vb.y + vb.height),
            None => Rect::new(0.0, 0.0, self.base_size.0, self.base_size.1),
        };
        self.ctm.transform_rect_bbox(user).into()
    }
}
