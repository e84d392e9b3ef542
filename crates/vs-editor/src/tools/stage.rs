//! Stage gesture dispatcher.
//!
//! A pointer-down resolves to exactly one gesture (drag, scale, rotate or
//! box select) which owns every event until the pointer comes back up.
//! Drag frames are computed from each object's position at drag start,
//! never accumulated, so grouped objects cannot drift apart.

use super::{EditEffect, Placement, Tool, ToolContext, ToolKind};
use crate::input::InputEvent;
use kurbo::Point;
use vs_core::geometry::{Bounds, detect_alignment, snap_offset_from_guides};
use vs_core::hit::{hit_test, hit_test_rect};
use vs_core::{ObjectId, selection};

/// Distance of the rotate handle above an object's top edge.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

/// What a pointer-down landed on, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageHit {
    ScaleHandle(ObjectId),
    RotateHandle(ObjectId),
    Object(ObjectId),
    Empty,
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Drag {
        anchor: Point,
        /// Each moving object with its position at drag start.
        members: Vec<(ObjectId, Point)>,
    },
    Scale {
        id: ObjectId,
        center: Point,
        start_distance: f64,
        start_scale: f64,
        base: (f64, f64),
    },
    Rotate {
        id: ObjectId,
        center: Point,
        start_angle: f64,
        start_rotation: f64,
    },
    BoxSelect {
        origin: Point,
        /// Selection kept under the box (shift held at pointer-down).
        base: Vec<ObjectId>,
    },
    /// Pointer went down on something that cannot move (locked).
    Blocked,
}

#[derive(Debug, Default)]
pub struct StageTool {
    gesture: Gesture,
}

impl StageTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    /// Name of the active gesture, for diagnostics and tests.
    pub fn gesture_name(&self) -> &'static str {
        match self.gesture {
            Gesture::Idle => "idle",
            Gesture::Drag { .. } => "drag",
            Gesture::Scale { .. } => "scale",
            Gesture::Rotate { .. } => "rotate",
            Gesture::BoxSelect { .. } => "box-select",
            Gesture::Blocked => "blocked",
        }
    }

    /// Where the scale handle (bottom-right corner) and the rotate handle
    /// (above top-center) sit for a box.
    pub fn handle_positions(bounds: &Bounds) -> (Point, Point) {
        (
            Point::new(bounds.right(), bounds.bottom()),
            Point::new(bounds.center_x(), bounds.top() - ROTATE_HANDLE_OFFSET),
        )
    }

    /// Resolve a stage point. Transform handles exist only while exactly
    /// one object is selected.
    pub fn resolve_hit(&self, p: Point, ctx: &ToolContext<'_>) -> StageHit {
        if let [only] = ctx.selection
            && let Some((_, obj)) = ctx.find(*only)
            && obj.visible
        {
            let (scale, rotate) = Self::handle_positions(&ctx.bounds_of(obj));
            let radius = ctx.config.handle_hit_radius;
            if scale.distance(p) <= radius {
                return StageHit::ScaleHandle(obj.id);
            }
            if rotate.distance(p) <= radius {
                return StageHit::RotateHandle(obj.id);
            }
        }
        match hit_test(ctx.layers, p, |obj| ctx.size_of(obj)) {
            Some(id) => StageHit::Object(id),
            None => StageHit::Empty,
        }
    }

    /// Every object that moves with `selected`: the selection plus the
    /// other members of any group it touches, minus locked objects.
    fn drag_members(selected: &[ObjectId], ctx: &ToolContext<'_>) -> Vec<(ObjectId, Point)> {
        let groups: Vec<_> = selected
            .iter()
            .filter_map(|id| ctx.find(*id))
            .filter_map(|(_, obj)| obj.group_id)
            .collect();
        ctx.objects()
            .filter(|(_, obj)| selected.contains(&obj.id) || obj.group_id.is_some_and(|g| groups.contains(&g)))
            .filter(|(_, obj)| ctx.is_editable(obj.id))
            .map(|(_, obj)| (obj.id, Point::new(obj.x, obj.y)))
            .collect()
    }

    fn pointer_down(&mut self, p: Point, multi: bool, ctx: &ToolContext<'_>) -> Vec<EditEffect> {
        match self.resolve_hit(p, ctx) {
            StageHit::ScaleHandle(id) => {
                let Some((_, obj)) = ctx.find(id).filter(|_| ctx.is_editable(id)) else {
                    self.gesture = Gesture::Blocked;
                    return vec![];
                };
                let center = ctx.bounds_of(obj).center();
                self.gesture = Gesture::Scale {
                    id,
                    center,
                    start_distance: p.distance(center),
                    start_scale: obj.scale,
                    base: ctx.size_of(obj),
                };
                vec![EditEffect::BeginGesture]
            }
            StageHit::RotateHandle(id) => {
                let Some((_, obj)) = ctx.find(id).filter(|_| ctx.is_editable(id)) else {
                    self.gesture = Gesture::Blocked;
                    return vec![];
                };
                let center = ctx.bounds_of(obj).center();
                self.gesture = Gesture::Rotate {
                    id,
                    center,
                    start_angle: (p - center).atan2().to_degrees(),
                    start_rotation: obj.rotation,
                };
                vec![EditEffect::BeginGesture]
            }
            StageHit::Object(id) => {
                let next = if multi {
                    selection::toggle(ctx.selection, id, true)
                } else if ctx.selection.contains(&id) {
                    // Keep a multi-selection intact so it can be dragged.
                    ctx.selection.to_vec()
                } else {
                    selection::select_single(id)
                };

                let mut effects = vec![EditEffect::SetSelection(next.clone())];
                let members = if next.contains(&id) {
                    Self::drag_members(&next, ctx)
                } else {
                    Vec::new()
                };
                if members.is_empty() {
                    self.gesture = Gesture::Blocked;
                } else {
                    log::debug!("drag start with {} object(s)", members.len());
                    self.gesture = Gesture::Drag { anchor: p, members };
                    effects.push(EditEffect::BeginGesture);
                }
                effects
            }
            StageHit::Empty => {
                let base = if multi { ctx.selection.to_vec() } else { selection::clear() };
                self.gesture = Gesture::BoxSelect { origin: p, base: base.clone() };
                vec![
                    EditEffect::SetSelection(base),
                    EditEffect::Marquee(Some(Bounds::from_corners(p, p))),
                ]
            }
        }
    }

    fn drag_frame(anchor: Point, members: &[(ObjectId, Point)], p: Point, ctx: &ToolContext<'_>) -> Vec<EditEffect> {
        let delta = p - anchor;
        let mut placed: Vec<Placement> = members
            .iter()
            .filter_map(|(id, start)| {
                let (_, obj) = ctx.find(*id)?;
                let mut placement = Placement::of(obj);
                placement.x = start.x + delta.x;
                placement.y = start.y + delta.y;
                Some(placement)
            })
            .collect();

        let moving_bounds = placed
            .iter()
            .filter_map(|pl| {
                let (_, obj) = ctx.find(pl.id)?;
                let (w, h) = ctx.size_of(obj);
                Some(Bounds::new(pl.x, pl.y, w * pl.scale, h * pl.scale))
            })
            .reduce(|a, b| a.union(&b));
        let Some(moving_bounds) = moving_bounds else {
            return vec![];
        };

        let others: Vec<(ObjectId, Bounds)> = ctx
            .objects()
            .filter(|(layer, obj)| layer.visible && obj.visible)
            .filter(|(_, obj)| !members.iter().any(|(id, _)| *id == obj.id))
            .map(|(_, obj)| (obj.id, ctx.bounds_of(obj)))
            .collect();
        let guides = detect_alignment(&moving_bounds, &others, ctx.config.alignment_threshold);

        let (mut dx, mut dy) = snap_offset_from_guides(&moving_bounds, &guides);
        if guides.is_empty() && ctx.config.snap_to_grid {
            let (gx, gy) = ctx.snap(moving_bounds.x, moving_bounds.y);
            (dx, dy) = (gx - moving_bounds.x, gy - moving_bounds.y);
        }
        for pl in &mut placed {
            pl.x += dx;
            pl.y += dy;
        }
        log::trace!("drag frame: {} placed, {} guide(s)", placed.len(), guides.len());

        vec![EditEffect::Place(placed), EditEffect::Guides(guides)]
    }
}

impl Tool for StageTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Stage
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<EditEffect> {
        let p = event.position();
        match event {
            InputEvent::PointerDown { modifiers, .. } => {
                if !self.is_idle() {
                    log::trace!("pointer-down ignored during {}", self.gesture_name());
                    return vec![];
                }
                self.pointer_down(p, modifiers.is_multi_select(), ctx)
            }
            InputEvent::PointerMove { .. } => match &self.gesture {
                Gesture::Idle | Gesture::Blocked => vec![],
                Gesture::Drag { anchor, members } => Self::drag_frame(*anchor, members, p, ctx),
                Gesture::Scale {
                    id,
                    center,
                    start_distance,
                    start_scale,
                    base,
                } => {
                    let Some((_, obj)) = ctx.find(*id) else {
                        return vec![];
                    };
                    let ratio = if *start_distance > f64::EPSILON {
                        p.distance(*center) / start_distance
                    } else {
                        1.0
                    };
                    let scale = (start_scale * ratio).max(ctx.config.min_object_scale);
                    let mut placement = Placement::of(obj);
                    placement.scale = scale;
                    placement.x = center.x - base.0 * scale / 2.0;
                    placement.y = center.y - base.1 * scale / 2.0;
                    vec![EditEffect::Place(vec![placement])]
                }
                Gesture::Rotate {
                    id,
                    center,
                    start_angle,
                    start_rotation,
                } => {
                    let Some((_, obj)) = ctx.find(*id) else {
                        return vec![];
                    };
                    let angle = (p - *center).atan2().to_degrees();
                    let mut placement = Placement::of(obj);
                    placement.rotation = start_rotation + (angle - start_angle);
                    vec![EditEffect::Place(vec![placement])]
                }
                Gesture::BoxSelect { origin, base } => {
                    let rect = Bounds::from_corners(*origin, p);
                    let hits = hit_test_rect(ctx.layers, &rect, |obj| ctx.size_of(obj));
                    let next = hits.into_iter().fold(base.clone(), |acc, id| selection::add(&acc, id));
                    vec![EditEffect::Marquee(Some(rect)), EditEffect::SetSelection(next)]
                }
            },
            InputEvent::PointerUp { .. } => {
                let finished = std::mem::take(&mut self.gesture);
                match finished {
                    Gesture::Drag { .. } => vec![EditEffect::Guides(Vec::new()), EditEffect::EndGesture],
                    Gesture::Scale { .. } | Gesture::Rotate { .. } => vec![EditEffect::EndGesture],
                    Gesture::BoxSelect { .. } => vec![EditEffect::Marquee(None)],
                    Gesture::Idle | Gesture::Blocked => vec![],
                }
            }
            InputEvent::DoubleClick { .. } => vec![],
        }
    }

    fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use pretty_assertions::assert_eq;
    use vs_core::{AssetId, GroupId, Layer, LayerId, Library, SceneObject, StudioConfig};

    fn object(name: &str, x: f64, y: f64) -> SceneObject {
        SceneObject::new(ObjectId::intern(name), AssetId::intern("stage_square"), x, y)
    }

    fn library() -> Library {
        let mut lib = Library::new();
        lib.insert_asset(AssetId::intern("stage_square"), r#"<svg viewBox="0 0 20 20"/>"#);
        lib
    }

    fn placements(effects: &[EditEffect]) -> Vec<Placement> {
        effects
            .iter()
            .find_map(|e| match e {
                EditEffect::Place(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[test]
    fn empty_space_starts_box_select() {
        let mut layer = Layer::new(LayerId::intern("stage_l1"), "l", 0);
        layer.objects.push(object("stage_a", 10.0, 10.0));
        layer.objects.push(object("stage_b", 100.0, 100.0));
        let layers = vec![layer];
        let (lib, config) = (library(), StudioConfig::default());
        let ctx = ToolContext {
            layers: &layers,
            library: &lib,
            selection: &[],
            config: &config,
        };

        let mut tool = StageTool::new();
        tool.handle(&InputEvent::down(0.0, 0.0), &ctx);
        assert_eq!(tool.gesture_name(), "box-select");
        let effects = tool.handle(&InputEvent::moved(50.0, 50.0), &ctx);
        assert!(effects.contains(&EditEffect::SetSelection(vec![ObjectId::intern("stage_a")])));
        let effects = tool.handle(&InputEvent::up(50.0, 50.0), &ctx);
        assert_eq!(effects, vec![EditEffect::Marquee(None)]);
        assert!(tool.is_idle());
    }

    #[test]
    fn group_members_move_from_start_offsets() {
        let group = GroupId::intern("stage_g");
        let mut layer = Layer::new(LayerId::intern("stage_l2"), "l", 0);
        let mut a = object("stage_ga", 0.0, 0.0);
        let mut b = object("stage_gb", 200.0, 0.0);
        a.group_id = Some(group);
        b.group_id = Some(group);
        layer.objects.extend([a, b]);
        let layers = vec![layer];
        let (lib, config) = (library(), StudioConfig::default());
        let selected = [ObjectId::intern("stage_ga")];
        let ctx = ToolContext {
            layers: &layers,
            library: &lib,
            selection: &selected,
            config: &config,
        };

        let mut tool = StageTool::new();
        let down = tool.handle(&InputEvent::down(5.0, 5.0), &ctx);
        assert!(down.contains(&EditEffect::BeginGesture));
        // Stage state is not updated between frames here; offsets still hold.
        tool.handle(&InputEvent::moved(20.0, 5.0), &ctx);
        let frame = placements(&tool.handle(&InputEvent::moved(35.0, 45.0), &ctx));
        let coords: Vec<(f64, f64)> = frame.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(30.0, 40.0), (230.0, 40.0)]);
    }

    #[test]
    fn drag_snaps_to_alignment_guide() {
        let mut layer = Layer::new(LayerId::intern("stage_l3"), "l", 0);
        layer.objects.push(object("stage_mover", 10.0, 10.0));
        layer.objects.push(object("stage_anchor", 10.0, 200.0));
        let layers = vec![layer];
        let (lib, config) = (library(), StudioConfig::default());
        let selected = [ObjectId::intern("stage_mover")];
        let ctx = ToolContext {
            layers: &layers,
            library: &lib,
            selection: &selected,
            config: &config,
        };

        let mut tool = StageTool::new();
        tool.handle(&InputEvent::down(15.0, 15.0), &ctx);
        let effects = tool.handle(&InputEvent::moved(14.7, 15.0), &ctx);
        let frame = placements(&effects);
        assert!((frame[0].x - 10.0).abs() < 1e-9);
        let guides = effects.iter().find_map(|e| match e {
            EditEffect::Guides(g) => Some(g.clone()),
            _ => None,
        });
        assert_eq!(guides.unwrap()[0].position, 10.0);
    }

    #[test]
    fn locked_objects_are_selected_but_not_dragged() {
        let mut layer = Layer::new(LayerId::intern("stage_l4"), "l", 0);
        let mut obj = object("stage_locked", 0.0, 0.0);
        obj.locked = true;
        layer.objects.push(obj);
        let layers = vec![layer];
        let (lib, config) = (library(), StudioConfig::default());
        let ctx = ToolContext {
            layers: &layers,
            library: &lib,
            selection: &[],
            config: &config,
        };

        let mut tool = StageTool::new();
        let effects = tool.handle(&InputEvent::down(5.0, 5.0), &ctx);
        assert_eq!(effects, vec![EditEffect::SetSelection(vec![ObjectId::intern("stage_locked")])]);
        assert_eq!(tool.gesture_name(), "blocked");
        assert!(tool.handle(&InputEvent::moved(50.0, 50.0), &ctx).is_empty());
    }

    #[test]
    fn scale_keeps_center_fixed() {
        let mut layer = Layer::new(LayerId::intern("stage_l5"), "l", 0);
        layer.objects.push(object("stage_s", 0.0, 0.0));
        let layers = vec![layer];
        let (lib, config) = (library(), StudioConfig::default());
        let selected = [ObjectId::intern("stage_s")];
        let ctx = ToolContext {
            layers: &layers,
            library: &lib,
            selection: &selected,
            config: &config,
        };

        let mut tool = StageTool::new();
        // Bottom-right corner of a 20x20 box is the scale handle.
        tool.handle(&InputEvent::down(20.0, 20.0), &ctx);
        assert_eq!(tool.gesture_name(), "scale");
        let frame = placements(&tool.handle(&InputEvent::moved(30.0, 30.0), &ctx));
        assert!((frame[0].scale - 2.0).abs() < 1e-9);
        assert!((frame[0].x + 10.0).abs() < 1e-9);
        assert!((frame[0].y + 10.0).abs() < 1e-9);

        let frame = placements(&tool.handle(&InputEvent::moved(10.0, 10.0), &ctx));
        assert_eq!(frame[0].scale, config.min_object_scale);
    }

    #[test]
    fn rotate_adds_angle_delta() {
        let mut layer = Layer::new(LayerId::intern("stage_l6"), "l", 0);
        let mut obj = object("stage_r", 0.0, 0.0);
        obj.rotation = 10.0;
        layer.objects.push(obj);
        let layers = vec![layer];
        let (lib, config) = (library(), StudioConfig::default());
        let selected = [ObjectId::intern("stage_r")];
        let ctx = ToolContext {
            layers: &layers,
            library: &lib,
            selection: &selected,
            config: &config,
        };

        let mut tool = StageTool::new();
        // Rotate handle sits above top-center: (10, -24). Center is (10, 10).
        tool.handle(&InputEvent::down(10.0, -ROTATE_HANDLE_OFFSET), &ctx);
        assert_eq!(tool.gesture_name(), "rotate");
        let frame = placements(&tool.handle(&InputEvent::moved(44.0, 10.0), &ctx));
        assert!((frame[0].rotation - 100.0).abs() < 1e-9);
    }

    #[test]
    fn gestures_are_exclusive() {
        let mut layer = Layer::new(LayerId::intern("stage_l7"), "l", 0);
        layer.objects.push(object("stage_x", 0.0, 0.0));
        let layers = vec![layer];
        let (lib, config) = (library(), StudioConfig::default());
        let ctx = ToolContext {
            layers: &layers,
            library: &lib,
            selection: &[],
            config: &config,
        };

        let mut tool = StageTool::new();
        tool.handle(&InputEvent::down(100.0, 100.0), &ctx);
        assert_eq!(tool.gesture_name(), "box-select");
        let second = InputEvent::down(5.0, 5.0).with_modifiers(Modifiers::SHIFT);
        assert!(tool.handle(&second, &ctx).is_empty());
        assert_eq!(tool.gesture_name(), "box-select");
    }
}
