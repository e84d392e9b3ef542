//! Node editor: drag anchors and handles of one parsed path.
//!
//! Handles are stored on the point they belong to, so a node's two
//! handles are mirrored through that point's own anchor. Every mutation
//! re-serializes the whole path and reports it as [`EditEffect::PathChanged`].
//! A handle drag is bracketed by gesture effects so it lands in history as
//! one step.

use super::{EditEffect, Tool, ToolContext, ToolKind};
use crate::input::InputEvent;
use kurbo::{Point, Vec2};
use vs_core::bezier::{is_smooth, mirror_control_point};
use vs_core::path::{self, CommandKind, PathCommand, PathPoint};

/// New handles are this fraction of the distance to the previous anchor.
const NEW_HANDLE_RATIO: f64 = 0.3;

/// Handle length when the node has no previous anchor.
const DEFAULT_HANDLE_LENGTH: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlePart {
    Anchor,
    ControlIn,
    ControlOut,
}

/// Address of one draggable handle: `commands[command].points[point]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleRef {
    pub command: usize,
    pub point: usize,
    pub part: HandlePart,
}

impl HandleRef {
    pub fn anchor(command: usize, point: usize) -> Self {
        Self {
            command,
            point,
            part: HandlePart::Anchor,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeDrag {
    handle: HandleRef,
    /// Smoothness of the node before the drag started.
    was_smooth: bool,
}

#[derive(Debug, Default)]
pub struct NodeEditor {
    commands: Vec<PathCommand>,
    selected: Option<HandleRef>,
    drag: Option<NodeDrag>,
}

impl NodeEditor {
    pub fn new(path_data: &str) -> Self {
        Self {
            commands: path::parse(path_data),
            selected: None,
            drag: None,
        }
    }

    pub fn load(&mut self, path_data: &str) {
        *self = Self::new(path_data);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn selected(&self) -> Option<HandleRef> {
        self.selected
    }

    pub fn path_data(&self) -> String {
        path::serialize(&self.commands)
    }

    pub fn point(&self, at: HandleRef) -> Option<&PathPoint> {
        self.commands.get(at.command)?.points.get(at.point)
    }

    fn point_mut(&mut self, at: HandleRef) -> Option<&mut PathPoint> {
        self.commands.get_mut(at.command)?.points.get_mut(at.point)
    }

    /// Closest handle within `radius` of `p`. Control handles win ties with
    /// their own anchor so they stay grabbable when short.
    pub fn hit_test(&self, p: Point, radius: f64) -> Option<HandleRef> {
        let mut best: Option<(f64, HandleRef)> = None;
        for ((command, point), pt) in path::anchors(&self.commands) {
            let candidates = [
                (Some(pt.pos()), HandlePart::Anchor),
                (pt.control_in, HandlePart::ControlIn),
                (pt.control_out, HandlePart::ControlOut),
            ];
            for (pos, part) in candidates {
                let Some(pos) = pos else { continue };
                let d = pos.distance(p);
                if d > radius {
                    continue;
                }
                if best.is_none_or(|(bd, _)| d < bd || (d == bd && part != HandlePart::Anchor)) {
                    best = Some((d, HandleRef { command, point, part }));
                }
            }
        }
        best.map(|(_, h)| h)
    }

    /// Move a handle to `to`. Anchors carry their handles along; a control
    /// on a node that was smooth drags its opposite handle into mirror.
    pub fn move_handle(&mut self, handle: HandleRef, to: Point, keep_smooth: bool) -> bool {
        let Some(pt) = self.point_mut(handle) else {
            return false;
        };
        match handle.part {
            HandlePart::Anchor => {
                let delta = to - pt.pos();
                pt.set_pos(to);
                pt.control_in = pt.control_in.map(|c| c + delta);
                pt.control_out = pt.control_out.map(|c| c + delta);
            }
            HandlePart::ControlIn => {
                pt.control_in = Some(to);
                if keep_smooth && pt.control_out.is_some() {
                    pt.control_out = Some(mirror_control_point(pt.pos(), to));
                }
            }
            HandlePart::ControlOut => {
                pt.control_out = Some(to);
                if keep_smooth && pt.control_in.is_some() {
                    pt.control_in = Some(mirror_control_point(pt.pos(), to));
                }
            }
        }
        true
    }

    /// Whether the node at `at` currently has mirrored handles.
    pub fn is_node_smooth(&self, at: HandleRef) -> bool {
        self.point(at).is_some_and(|pt| match (pt.control_in, pt.control_out) {
            (Some(cin), Some(cout)) => is_smooth(pt.pos(), cin, cout),
            _ => false,
        })
    }

    /// Toggle a node between sharp (no handles) and smooth (mirrored
    /// handles along the incoming direction). Move-to and arc anchors
    /// cannot carry handles and are left alone.
    pub fn toggle_smooth(&mut self, at: HandleRef) -> bool {
        let anchor_ref = HandleRef::anchor(at.command, at.point);
        let previous = path::anchors(&self.commands)
            .take_while(|(idx, _)| *idx != (at.command, at.point))
            .last()
            .map(|(_, p)| p.pos());

        let Some(cmd) = self.commands.get_mut(anchor_ref.command) else {
            return false;
        };
        let kind = cmd.kind;
        if matches!(kind, CommandKind::M | CommandKind::A | CommandKind::Z) {
            return false;
        }
        let Some(pt) = cmd.points.get_mut(anchor_ref.point) else {
            return false;
        };

        if pt.has_handles() {
            pt.control_in = None;
            pt.control_out = None;
            if matches!(kind, CommandKind::C | CommandKind::S | CommandKind::Q | CommandKind::T) {
                cmd.kind = CommandKind::L;
            }
            log::debug!("node {}:{} -> sharp", at.command, at.point);
        } else {
            let anchor = pt.pos();
            let (dir, length) = match previous {
                Some(prev) if prev != anchor => {
                    let v = anchor - prev;
                    (v / v.hypot(), v.hypot() * NEW_HANDLE_RATIO)
                }
                _ => (Vec2::new(1.0, 0.0), DEFAULT_HANDLE_LENGTH),
            };
            pt.control_in = Some(anchor - dir * length);
            pt.control_out = Some(anchor + dir * length);
            if matches!(kind, CommandKind::L | CommandKind::H | CommandKind::V | CommandKind::T) {
                cmd.kind = CommandKind::C;
            }
            log::debug!("node {}:{} -> smooth", at.command, at.point);
        }
        true
    }

    fn changed(&self) -> Vec<EditEffect> {
        vec![EditEffect::PathChanged(self.path_data())]
    }
}

impl Tool for NodeEditor {
    fn kind(&self) -> ToolKind {
        ToolKind::NodeEdit
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<EditEffect> {
        match *event {
            InputEvent::PointerDown { x, y, .. } => {
                self.selected = self.hit_test(Point::new(x, y), ctx.config.handle_hit_radius);
                self.drag = self.selected.map(|handle| NodeDrag {
                    handle,
                    was_smooth: self.is_node_smooth(handle),
                });
                if self.drag.is_some() {
                    vec![EditEffect::BeginGesture]
                } else {
                    vec![]
                }
            }
            InputEvent::PointerMove { x, y, .. } => {
                let Some(drag) = self.drag else {
                    return vec![];
                };
                let to = match drag.handle.part {
                    HandlePart::Anchor => {
                        let (sx, sy) = ctx.snap(x, y);
                        Point::new(sx, sy)
                    }
                    HandlePart::ControlIn | HandlePart::ControlOut => Point::new(x, y),
                };
                if self.point(drag.handle).is_some_and(|pt| match drag.handle.part {
                    HandlePart::Anchor => pt.pos() == to,
                    HandlePart::ControlIn => pt.control_in == Some(to),
                    HandlePart::ControlOut => pt.control_out == Some(to),
                }) {
                    return vec![];
                }
                if self.move_handle(drag.handle, to, drag.was_smooth) {
                    self.changed()
                } else {
                    vec![]
                }
            }
            InputEvent::PointerUp { .. } => match self.drag.take() {
                Some(_) => vec![EditEffect::EndGesture],
                None => vec![],
            },
            InputEvent::DoubleClick { x, y, .. } => {
                let Some(hit) = self.hit_test(Point::new(x, y), ctx.config.handle_hit_radius) else {
                    return vec![];
                };
                self.drag = None;
                if self.toggle_smooth(hit) {
                    self.selected = Some(HandleRef::anchor(hit.command, hit.point));
                    self.changed()
                } else {
                    vec![]
                }
            }
        }
    }

    fn cancel(&mut self) {
        self.drag = None;
        self.selected = None;
    }
}
