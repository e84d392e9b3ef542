//! Pen tool: click to add anchors, drag to curve, double-click to finish.

use super::{EditEffect, Tool, ToolContext, ToolKind};
use crate::input::InputEvent;
use kurbo::Point;
use vs_core::path::{self, CommandKind, PathCommand};

/// Handle length as a fraction of the drag distance.
const CURVE_HANDLE_RATIO: f64 = 0.3;

/// Drawing needs at least a moveto and one segment.
const MIN_COMMANDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PenState {
    #[default]
    Idle,
    Drawing,
}

#[derive(Debug, Default)]
pub struct PenTool {
    state: PenState,
    commands: Vec<PathCommand>,
    /// Where the current click cycle pressed down, before snapping.
    press: Option<Point>,
}

impl PenTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PenState {
        self.state
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    fn preview(&self) -> EditEffect {
        EditEffect::PathPreview(path::serialize(&self.commands))
    }

    fn reset(&mut self) {
        self.state = PenState::Idle;
        self.commands.clear();
        self.press = None;
    }

    /// Turn the last line into a curve whose handles straddle its anchor
    /// along the drag direction.
    fn curve_last_segment(&mut self, release: Point, press: Point) -> bool {
        let Some(last) = self.commands.last_mut() else {
            return false;
        };
        if last.kind != CommandKind::L {
            return false;
        }
        let Some(anchor) = last.end_point() else {
            return false;
        };
        let drag = release - press;
        let offset = drag * CURVE_HANDLE_RATIO;
        *last = PathCommand::cubic_to(anchor - offset, anchor + offset, anchor);
        true
    }

    /// Drop trailing anchors that repeat the previous one (left behind by
    /// the clicks of a double-click).
    fn drop_duplicate_tail(&mut self) {
        while self.commands.len() >= 2 {
            let n = self.commands.len();
            let (prev, last) = (&self.commands[n - 2], &self.commands[n - 1]);
            if last.kind == CommandKind::L && prev.end_point() == last.end_point() {
                self.commands.pop();
            } else {
                break;
            }
        }
    }

    fn finish(&mut self) -> Vec<EditEffect> {
        self.drop_duplicate_tail();
        let effects = if self.commands.len() >= MIN_COMMANDS {
            let data = path::serialize(&self.commands);
            log::debug!("pen path created: {data}");
            vec![EditEffect::PathCreated(data)]
        } else {
            log::debug!("pen path discarded with {} command(s)", self.commands.len());
            vec![]
        };
        self.reset();
        effects
    }
}

impl Tool for PenTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pen
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<EditEffect> {
        match *event {
            InputEvent::PointerDown { x, y, .. } => {
                let (sx, sy) = ctx.snap(x, y);
                match self.state {
                    PenState::Idle => {
                        self.commands.push(PathCommand::move_to(sx, sy));
                        self.state = PenState::Drawing;
                    }
                    PenState::Drawing => self.commands.push(PathCommand::line_to(sx, sy)),
                }
                self.press = Some(Point::new(x, y));
                vec![self.preview()]
            }
            InputEvent::PointerUp { x, y, .. } => {
                let Some(press) = self.press.take() else {
                    return vec![];
                };
                let release = Point::new(x, y);
                if press.distance(release) > ctx.config.drag_threshold && self.curve_last_segment(release, press) {
                    return vec![self.preview()];
                }
                vec![]
            }
            InputEvent::DoubleClick { .. } if self.state == PenState::Drawing => self.finish(),
            _ => vec![],
        }
    }

    fn cancel(&mut self) {
        self.reset();
    }
}
