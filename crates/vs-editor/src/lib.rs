pub mod boolean;
pub mod history;
pub mod input;
pub mod snapshot;
pub mod studio;
pub mod tools;

pub use boolean::{BooleanBridge, BooleanOp, GeometryKernel, KernelError, KernelLoader, OperationKey};
pub use history::{DEFAULT_MAX_HISTORY, History, HistoryOptions, IndexedHistory, TimelineHistory};
pub use input::{InputEvent, Modifiers};
pub use snapshot::{OutlineKey, OutlineNode, StageSnapshot, StudioMutation, reduce};
pub use studio::{Studio, StudioEvent, SubscriptionId};
pub use tools::{EditEffect, NodeEditor, PenTool, Placement, StageTool, Tool, ToolContext, ToolKind};
