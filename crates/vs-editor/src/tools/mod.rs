//! Tool system for stage and path interactions.
//!
//! Each tool translates input events into [`EditEffect`]s that the
//! [`Studio`](crate::studio::Studio) applies.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Stage Tool | Pen Tool | Node Editor |
//! |----------|------------|----------|-------------|
//! | **Shift** | Toggle object in/out of selection; additive box select | | |

pub mod node_editor;
pub mod pen;
pub mod stage;

pub use node_editor::{HandlePart, HandleRef, NodeEditor};
pub use pen::{PenState, PenTool};
pub use stage::{StageHit, StageTool};

use crate::input::InputEvent;
use vs_core::geometry::{AlignmentGuide, Bounds, snap_to_grid};
use vs_core::{Layer, Library, ObjectId, SceneObject, StudioConfig};

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Stage,
    Pen,
    NodeEdit,
}

/// New placement for one object, produced every drag frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotation: f64,
}

impl Placement {
    pub fn of(obj: &SceneObject) -> Self {
        Self {
            id: obj.id,
            x: obj.x,
            y: obj.y,
            scale: obj.scale,
            rotation: obj.rotation,
        }
    }
}

/// What a tool asks the studio to do.
#[derive(Debug, Clone, PartialEq)]
pub enum EditEffect {
    /// The pen finished a path.
    PathCreated(String),
    /// The node editor changed the path being edited.
    PathChanged(String),
    /// In-progress pen path, for preview only.
    PathPreview(String),
    /// Replace the selection.
    SetSelection(Vec<ObjectId>),
    /// Live placement updates (no history entry of their own).
    Place(Vec<Placement>),
    /// Alignment guides for the current frame (empty clears them).
    Guides(Vec<AlignmentGuide>),
    /// Box-selection rectangle (`None` clears it).
    Marquee(Option<Bounds>),
    /// A drag/scale/rotate gesture started; group its updates.
    BeginGesture,
    /// The gesture finished; record it as one history step.
    EndGesture,
}

/// Read-only view of the stage handed to tools.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub layers: &'a [Layer],
    pub library: &'a Library,
    pub selection: &'a [ObjectId],
    pub config: &'a StudioConfig,
}

impl<'a> ToolContext<'a> {
    pub fn find(&self, id: ObjectId) -> Option<(&'a Layer, &'a SceneObject)> {
        self.layers
            .iter()
            .find_map(|layer| layer.object(id).map(|obj| (layer, obj)))
    }

    pub fn objects(&self) -> impl Iterator<Item = (&'a Layer, &'a SceneObject)> {
        self.layers
            .iter()
            .flat_map(|layer| layer.objects.iter().map(move |obj| (layer, obj)))
    }

    /// Unscaled footprint of an object's asset.
    pub fn size_of(&self, obj: &SceneObject) -> (f64, f64) {
        self.library.object_size(obj.asset, self.config.default_object_size)
    }

    pub fn bounds_of(&self, obj: &SceneObject) -> Bounds {
        let (w, h) = self.size_of(obj);
        obj.bounds(w, h)
    }

    /// Whether an object can be moved or transformed.
    pub fn is_editable(&self, id: ObjectId) -> bool {
        self.find(id)
            .is_some_and(|(layer, obj)| !layer.locked && !obj.locked)
    }

    pub fn snap(&self, x: f64, y: f64) -> (f64, f64) {
        snap_to_grid(x, y, self.config.grid_size, self.config.snap_to_grid)
    }
}

/// Trait for tools that handle input and produce effects.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event, returning zero or more effects.
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<EditEffect>;

    /// Drop any in-progress interaction.
    fn cancel(&mut self);
}
