pub mod bezier;
pub mod config;
pub mod geometry;
pub mod hit;
pub mod id;
pub mod library;
pub mod path;
pub mod scene;
pub mod selection;
pub mod transform;

pub use config::{ConfigError, StudioConfig};
pub use geometry::{Alignment, AlignmentGuide, Axis, Bounds, PlacedSvg, StageViewport, SvgCoordinateSource, ViewBox};
pub use id::{AssetId, GroupId, LayerId, ObjectId};
pub use library::{Library, LibraryEntry, LibraryError};
pub use path::{CommandKind, PathCommand, PathPoint, PointKind};
pub use scene::{GraphNode, Layer, SceneGraph, SceneObject};
pub use selection::Selection;
pub use transform::{Transform, TransformConstraints, apply_constraints};

// Re-export kurbo's point type so downstream crates share one geometry type
pub use kurbo::Point;
