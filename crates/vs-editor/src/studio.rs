//! The studio controller: single owner of the editable application state.
//!
//! Stage changes go through [`StudioMutation`]s. Committed mutations push a
//! history entry; live ones (drag frames) only replace the present. After
//! every stage change the selection is pruned so it never names a missing
//! object. Observers receive [`StudioEvent`]s synchronously. Asset markup
//! lives in the snapshot too, so node edits and boolean results undo like
//! any other stage change.

use crate::boolean::{BooleanBridge, BooleanOp, KernelLoader};
use crate::history::{History, HistoryOptions, TimelineHistory};
use crate::input::InputEvent;
use crate::snapshot::{StageSnapshot, StudioMutation, reduce};
use crate::tools::{EditEffect, NodeEditor, PenTool, StageTool, Tool, ToolContext, ToolKind};
use kurbo::Point;
use vs_core::geometry::{AlignmentGuide, Bounds, PlacedSvg, StageViewport, SvgCoordinateSource, screen_to_svg_coords};
use vs_core::library::{first_path_data, replace_first_path_data};
use vs_core::path;
use vs_core::{AssetId, GroupId, Layer, LayerId, Library, ObjectId, SceneObject, Selection, StudioConfig};

/// Offset applied to duplicated objects.
const DUPLICATE_OFFSET: (f64, f64) = (10.0, 10.0);

#[derive(Debug, Clone, PartialEq)]
pub enum StudioEvent {
    StageChanged,
    SelectionChanged(Vec<ObjectId>),
    HistoryChanged { can_undo: bool, can_redo: bool },
    GuidesChanged(Vec<AlignmentGuide>),
    MarqueeChanged(Option<Bounds>),
    ToolChanged(ToolKind),
    PathPreview(String),
    PathCreated(String),
    AssetUpdated(AssetId),
    /// A boolean operation could not run; the asset is unchanged.
    BooleanFailed { asset: AssetId, op: BooleanOp },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Subscriber = Box<dyn FnMut(&StudioEvent) + Send>;

/// The asset whose first path the node editor is working on.
#[derive(Debug)]
struct NodeSession {
    asset: AssetId,
    /// Placed object the session was opened from. Screen input is mapped
    /// through its placement.
    object: Option<ObjectId>,
    editor: NodeEditor,
}

pub struct Studio {
    config: StudioConfig,
    history: TimelineHistory<StageSnapshot>,
    selection: Selection,
    viewport: StageViewport,
    guides: Vec<AlignmentGuide>,
    marquee: Option<Bounds>,
    active_tool: ToolKind,
    stage_tool: StageTool,
    pen: PenTool,
    node_session: Option<NodeSession>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: usize,
}

impl Studio {
    pub fn new(config: StudioConfig, library: Library) -> Self {
        let history = TimelineHistory::new(
            StageSnapshot::new(library),
            HistoryOptions::with_max_history(config.max_history),
        );
        Self {
            config,
            history,
            selection: Selection::new(),
            viewport: StageViewport::default(),
            guides: Vec::new(),
            marquee: None,
            active_tool: ToolKind::Stage,
            stage_tool: StageTool::new(),
            pen: PenTool::new(),
            node_session: None,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn library(&self) -> &Library {
        &self.history.current().library
    }

    pub fn snapshot(&self) -> &StageSnapshot {
        self.history.current()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.history.current().layers
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.snapshot().object(id)
    }

    /// Selected ids that still exist.
    pub fn selection(&self) -> Vec<ObjectId> {
        let snapshot = self.snapshot();
        self.selection.live_ids(|id| snapshot.contains(id))
    }

    pub fn primary_selection(&self) -> Option<ObjectId> {
        self.selection.primary()
    }

    pub fn viewport(&self) -> &StageViewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut StageViewport {
        &mut self.viewport
    }

    pub fn guides(&self) -> &[AlignmentGuide] {
        &self.guides
    }

    pub fn marquee(&self) -> Option<Bounds> {
        self.marquee
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// The node editor's path, if a node editing session is open.
    pub fn node_editor(&self) -> Option<&NodeEditor> {
        self.node_session.as_ref().map(|s| &s.editor)
    }

    // ─── Observers ───────────────────────────────────────────────────────

    pub fn subscribe(&mut self, subscriber: impl FnMut(&StudioEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn emit(&mut self, event: StudioEvent) {
        log::trace!("studio event: {event:?}");
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event);
        }
    }

    fn emit_history(&mut self) {
        let event = StudioEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        };
        self.emit(event);
    }

    // ─── Stage updates ───────────────────────────────────────────────────

    /// Apply a mutation and record it as one undo step.
    pub fn commit(&mut self, mutation: StudioMutation) {
        let next = reduce(self.history.current(), &mutation);
        self.history.push_to_history(next);
        self.after_stage_change();
        self.emit_history();
    }

    /// Apply a mutation without recording history (live drag frames).
    pub fn apply_live(&mut self, mutation: StudioMutation) {
        let next = reduce(self.history.current(), &mutation);
        self.history.set_present(next);
        self.after_stage_change();
    }

    pub fn undo(&mut self) -> bool {
        if self.history.is_batching() || self.history.undo().is_none() {
            return false;
        }
        self.after_stage_change();
        self.emit_history();
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.history.is_batching() || self.history.redo().is_none() {
            return false;
        }
        self.after_stage_change();
        self.emit_history();
        true
    }

    fn after_stage_change(&mut self) {
        let snapshot = self.history.current();
        let dropped = self.selection.prune(|id| snapshot.contains(id));
        // Undo and redo can swap the asset under an open node session.
        if let Some(session) = &mut self.node_session
            && let Some(data) = snapshot.library.asset_data(session.asset).and_then(first_path_data)
            && path::serialize(&path::parse(&data)) != session.editor.path_data()
        {
            session.editor.load(&data);
        }
        self.emit(StudioEvent::StageChanged);
        if dropped > 0 {
            self.emit(StudioEvent::SelectionChanged(self.selection.ids().to_vec()));
        }
    }

    fn set_selection(&mut self, ids: Vec<ObjectId>) {
        let snapshot = self.history.current();
        let live: Vec<ObjectId> = ids.into_iter().filter(|id| snapshot.contains(*id)).collect();
        if live.as_slice() == self.selection.ids() {
            return;
        }
        self.selection.set(live);
        self.emit(StudioEvent::SelectionChanged(self.selection.ids().to_vec()));
    }

    // ─── Layers and objects ──────────────────────────────────────────────

    pub fn add_layer(&mut self, name: &str) -> LayerId {
        let id = LayerId::generate();
        self.commit(StudioMutation::AddLayer {
            id,
            name: name.to_string(),
        });
        id
    }

    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.snapshot().layer(id).is_none() {
            return false;
        }
        self.commit(StudioMutation::RemoveLayer(id));
        true
    }

    pub fn move_layer_to_z_index(&mut self, id: LayerId, z: i32) -> bool {
        if self.snapshot().layer(id).is_none() {
            return false;
        }
        self.commit(StudioMutation::MoveLayerToZ { id, z });
        true
    }

    /// Place a library entry on a layer, centered on `at`.
    pub fn instantiate(&mut self, asset: AssetId, layer: LayerId, at: Point) -> Option<ObjectId> {
        if !self.library().contains(asset) {
            log::warn!("cannot instantiate unknown library entry {asset}");
            return None;
        }
        self.snapshot().layer(layer)?;
        let (w, h) = self.library().object_size(asset, self.config.default_object_size);
        let id = ObjectId::generate();
        let object = SceneObject::new(id, asset, at.x - w / 2.0, at.y - h / 2.0);
        self.commit(StudioMutation::AddObject { layer, object });
        self.set_selection(vec![id]);
        Some(id)
    }

    pub fn select(&mut self, id: ObjectId, multi: bool) {
        let next = vs_core::selection::toggle(self.selection.ids(), id, multi);
        self.set_selection(next);
    }

    pub fn select_all(&mut self) {
        let all = self.snapshot().object_ids();
        self.set_selection(all);
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(Vec::new());
    }

    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection();
        if ids.is_empty() {
            return 0;
        }
        let n = ids.len();
        self.commit(StudioMutation::RemoveObjects(ids));
        n
    }

    pub fn duplicate_selected(&mut self) -> Vec<ObjectId> {
        let ids = self.selection();
        if ids.is_empty() {
            return ids;
        }
        let new_ids: Vec<ObjectId> = ids.iter().map(|_| ObjectId::generate()).collect();
        self.commit(StudioMutation::Duplicate {
            ids,
            new_ids: new_ids.clone(),
            offset: DUPLICATE_OFFSET,
        });
        self.set_selection(new_ids.clone());
        new_ids
    }

    /// Group the selection. Needs at least two objects.
    pub fn group_selected(&mut self) -> Option<GroupId> {
        let ids = self.selection();
        if ids.len() < 2 {
            return None;
        }
        let group = GroupId::generate();
        self.commit(StudioMutation::Group { ids, group });
        Some(group)
    }

    /// Dissolve every group touched by the selection.
    pub fn ungroup_selected(&mut self) -> bool {
        let snapshot = self.snapshot();
        let mut members: Vec<ObjectId> = Vec::new();
        for id in self.selection() {
            if let Some(group) = snapshot.object(id).and_then(|o| o.group_id) {
                for member in snapshot.group_members(group) {
                    if !members.contains(&member) {
                        members.push(member);
                    }
                }
            }
        }
        if members.is_empty() {
            return false;
        }
        self.commit(StudioMutation::Ungroup(members));
        true
    }

    /// Lock the selection unless all of it is already locked, then unlock.
    pub fn toggle_lock_selected(&mut self) {
        let ids = self.selection();
        let snapshot = self.snapshot();
        if ids.is_empty() {
            return;
        }
        let locked = !ids.iter().all(|id| snapshot.object(*id).is_some_and(|o| o.locked));
        self.commit(StudioMutation::SetLocked { ids, locked });
    }

    pub fn toggle_visibility_selected(&mut self) {
        let ids = self.selection();
        let snapshot = self.snapshot();
        if ids.is_empty() {
            return;
        }
        let visible = !ids.iter().all(|id| snapshot.object(*id).is_some_and(|o| o.visible));
        self.commit(StudioMutation::SetVisible { ids, visible });
    }

    // ─── Tools ───────────────────────────────────────────────────────────

    pub fn set_tool(&mut self, kind: ToolKind) {
        if kind == self.active_tool {
            return;
        }
        self.cancel_gesture();
        self.active_tool = kind;
        self.emit(StudioEvent::ToolChanged(kind));
    }

    /// Open a node editing session on the first path of `asset`.
    pub fn begin_node_edit(&mut self, asset: AssetId) -> bool {
        let Some(data) = self.library().asset_data(asset).and_then(first_path_data) else {
            log::warn!("{asset} has no path to edit");
            return false;
        };
        self.node_session = Some(NodeSession {
            asset,
            object: None,
            editor: NodeEditor::new(&data),
        });
        self.set_tool(ToolKind::NodeEdit);
        true
    }

    /// Open a node editing session on the asset of a placed object.
    /// [`Studio::handle_screen_input`] then maps pointer positions through
    /// the object's placement into the asset's own coordinates.
    pub fn begin_object_node_edit(&mut self, id: ObjectId) -> bool {
        let Some(asset) = self.object(id).map(|o| o.asset) else {
            return false;
        };
        if !self.begin_node_edit(asset) {
            return false;
        }
        if let Some(session) = &mut self.node_session {
            session.object = Some(id);
        }
        true
    }

    pub fn end_node_edit(&mut self) {
        self.node_session = None;
        self.set_tool(ToolKind::Stage);
    }

    fn cancel_gesture(&mut self) {
        self.stage_tool.cancel();
        self.pen.cancel();
        if let Some(session) = &mut self.node_session {
            session.editor.cancel();
        }
        if self.history.is_batching() {
            self.history.cancel_batch();
            self.after_stage_change();
        }
        if !self.guides.is_empty() {
            self.guides.clear();
            self.emit(StudioEvent::GuidesChanged(Vec::new()));
        }
        if self.marquee.take().is_some() {
            self.emit(StudioEvent::MarqueeChanged(None));
        }
    }

    /// Dispatch a pointer event given in stage (world) coordinates.
    pub fn handle_input(&mut self, event: InputEvent) {
        let selection = self.selection();
        let effects = {
            let snapshot = self.history.current();
            let ctx = ToolContext {
                layers: &snapshot.layers,
                library: &snapshot.library,
                selection: &selection,
                config: &self.config,
            };
            match self.active_tool {
                ToolKind::Stage => self.stage_tool.handle(&event, &ctx),
                ToolKind::Pen => self.pen.handle(&event, &ctx),
                ToolKind::NodeEdit => match &mut self.node_session {
                    Some(session) => session.editor.handle(&event, &ctx),
                    None => Vec::new(),
                },
            }
        };
        for effect in effects {
            self.apply_effect(effect);
        }
    }

    /// Dispatch a pointer event given in screen coordinates. While a node
    /// session is bound to a placed object, the position is mapped into
    /// that object's asset coordinates instead of stage coordinates.
    pub fn handle_screen_input(&mut self, event: InputEvent) {
        if self.active_tool == ToolKind::NodeEdit
            && let Some(placed) = self.node_placement()
        {
            self.handle_svg_input(event, &placed);
            return;
        }
        let world = self.viewport.screen_to_world(event.position());
        self.handle_input(event.at(world));
    }

    /// Dispatch a pointer event given in screen coordinates over a rendered
    /// SVG element. The active tool receives the element's user-space point.
    pub fn handle_svg_input(&mut self, event: InputEvent, element: &impl SvgCoordinateSource) {
        let screen = event.position();
        let user = screen_to_svg_coords(element, screen.x, screen.y);
        self.handle_input(event.at(user));
    }

    fn node_placement(&self) -> Option<PlacedSvg> {
        let object = self.object(self.node_session.as_ref()?.object?)?;
        let library = self.library();
        Some(PlacedSvg::new(
            Point::new(object.x, object.y),
            object.scale,
            object.rotation,
            library.object_size(object.asset, self.config.default_object_size),
            library.view_box(object.asset),
            &self.viewport,
        ))
    }

    fn apply_effect(&mut self, effect: EditEffect) {
        match effect {
            EditEffect::BeginGesture => self.history.begin_batch(),
            EditEffect::EndGesture => {
                if self.history.end_batch() {
                    self.emit_history();
                }
            }
            EditEffect::Place(placements) => self.apply_live(StudioMutation::Place(placements)),
            EditEffect::SetSelection(ids) => self.set_selection(ids),
            EditEffect::Guides(guides) => {
                if guides != self.guides {
                    self.guides = guides.clone();
                    self.emit(StudioEvent::GuidesChanged(guides));
                }
            }
            EditEffect::Marquee(rect) => {
                self.marquee = rect;
                self.emit(StudioEvent::MarqueeChanged(rect));
            }
            EditEffect::PathPreview(data) => self.emit(StudioEvent::PathPreview(data)),
            EditEffect::PathCreated(data) => self.emit(StudioEvent::PathCreated(data)),
            EditEffect::PathChanged(data) => self.write_node_path(&data),
        }
    }

    /// Push the node editor's path back into its asset.
    fn write_node_path(&mut self, data: &str) {
        let Some(asset) = self.node_session.as_ref().map(|s| s.asset) else {
            return;
        };
        let Some(svg) = self
            .library()
            .asset_data(asset)
            .and_then(|svg| replace_first_path_data(svg, data))
        else {
            return;
        };
        self.update_asset_data(asset, svg);
    }

    /// Replace an asset's markup as one undo step and notify observers. A
    /// component id updates its base asset.
    pub fn update_asset_data(&mut self, asset: AssetId, svg: String) -> bool {
        let Some((target, _)) = self.library().resolve(asset) else {
            log::warn!("cannot update {asset}: not a resolvable library entry");
            return false;
        };
        self.commit(StudioMutation::UpdateAssetData { asset: target, data: svg });
        self.emit(StudioEvent::AssetUpdated(target));
        true
    }

    // ─── Boolean operations ──────────────────────────────────────────────

    /// Combine the first two paths of an asset in place. On failure the
    /// asset is left unchanged and `BooleanFailed` is emitted.
    pub async fn boolean_on_asset<L: KernelLoader>(
        &mut self,
        bridge: &BooleanBridge<L>,
        asset: AssetId,
        op: BooleanOp,
    ) -> bool {
        let Some(svg) = self.library().asset_data(asset).map(str::to_string) else {
            self.emit(StudioEvent::BooleanFailed { asset, op });
            return false;
        };
        match bridge.apply_to_svg("boolean", asset, &svg, op).await {
            Some(result) => self.update_asset_data(asset, result),
            None => {
                self.emit(StudioEvent::BooleanFailed { asset, op });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Placement;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    const SQUARE: &str = r#"<svg viewBox="0 0 20 20"><path d="M 0 0 L 20 0 L 20 20 Z"/></svg>"#;

    fn studio() -> (Studio, LayerId, AssetId) {
        let asset = AssetId::intern("studio_square");
        let mut library = Library::new();
        library.insert_asset(asset, SQUARE);
        let mut studio = Studio::new(StudioConfig::default(), library);
        let layer = studio.add_layer("Main");
        (studio, layer, asset)
    }

    #[test]
    fn instantiate_centers_and_selects() {
        let (mut studio, layer, asset) = studio();
        let id = studio.instantiate(asset, layer, Point::new(50.0, 50.0)).unwrap();
        let obj = studio.object(id).unwrap();
        assert_eq!((obj.x, obj.y), (40.0, 40.0));
        assert_eq!(studio.selection(), vec![id]);
        assert!(studio.instantiate(AssetId::intern("studio_nope"), layer, Point::ZERO).is_none());
    }

    #[test]
    fn undo_prunes_selection() {
        let (mut studio, layer, asset) = studio();
        let id = studio.instantiate(asset, layer, Point::new(50.0, 50.0)).unwrap();
        assert!(studio.undo());
        assert!(studio.object(id).is_none());
        assert!(studio.selection().is_empty());
        assert!(studio.redo());
        assert!(studio.object(id).is_some());
    }

    #[test]
    fn drag_gesture_is_one_history_step() {
        let (mut studio, layer, asset) = studio();
        let id = studio.instantiate(asset, layer, Point::new(10.0, 10.0)).unwrap();
        studio.handle_input(InputEvent::down(5.0, 5.0));
        studio.handle_input(InputEvent::moved(25.0, 5.0));
        studio.handle_input(InputEvent::moved(45.0, 25.0));
        studio.handle_input(InputEvent::up(45.0, 25.0));
        let obj = studio.object(id).unwrap();
        assert_eq!((obj.x, obj.y), (40.0, 20.0));

        assert!(studio.undo());
        let obj = studio.object(id).unwrap();
        assert_eq!((obj.x, obj.y), (0.0, 0.0));
    }

    #[test]
    fn group_lock_and_delete() {
        let (mut studio, layer, asset) = studio();
        let a = studio.instantiate(asset, layer, Point::new(10.0, 10.0)).unwrap();
        let b = studio.instantiate(asset, layer, Point::new(100.0, 10.0)).unwrap();
        studio.select(a, true);
        let group = studio.group_selected().unwrap();
        assert_eq!(studio.snapshot().group_members(group), vec![a, b]);

        studio.toggle_lock_selected();
        assert!(studio.object(a).unwrap().locked);
        studio.toggle_lock_selected();
        assert!(!studio.object(a).unwrap().locked);

        assert!(studio.ungroup_selected());
        assert_eq!(studio.object(b).unwrap().group_id, None);
        assert_eq!(studio.delete_selected(), 2);
        assert!(studio.selection().is_empty());
    }

    #[test]
    fn duplicate_selects_copies() {
        let (mut studio, layer, asset) = studio();
        let a = studio.instantiate(asset, layer, Point::new(10.0, 10.0)).unwrap();
        let copies = studio.duplicate_selected();
        assert_eq!(copies.len(), 1);
        assert_eq!(studio.selection(), copies);
        let (orig, copy) = (studio.object(a).unwrap(), studio.object(copies[0]).unwrap());
        assert_eq!((copy.x - orig.x, copy.y - orig.y), DUPLICATE_OFFSET);
    }

    #[test]
    fn observers_receive_events() {
        let (mut studio, layer, asset) = studio();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = studio.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        studio.instantiate(asset, layer, Point::new(10.0, 10.0));
        assert!(seen.lock().unwrap().contains(&StudioEvent::StageChanged));
        assert!(studio.unsubscribe(sub));
        let count = seen.lock().unwrap().len();
        studio.clear_selection();
        assert_eq!(seen.lock().unwrap().len(), count);
    }

    #[test]
    fn node_edit_writes_back_to_asset() {
        let (mut studio, _, asset) = studio();
        assert!(studio.begin_node_edit(asset));
        assert_eq!(studio.active_tool(), ToolKind::NodeEdit);
        studio.handle_input(InputEvent::down(20.0, 0.0));
        studio.handle_input(InputEvent::moved(30.0, 0.0));
        studio.handle_input(InputEvent::up(30.0, 0.0));
        assert_eq!(
            studio.library().asset_data(asset),
            Some(r#"<svg viewBox="0 0 20 20"><path d="M 0 0 L 30 0 L 20 20 Z"/></svg>"#)
        );
        studio.end_node_edit();
        assert!(studio.node_editor().is_none());
    }

    #[test]
    fn node_drag_undoes_as_one_step() {
        let (mut studio, _, asset) = studio();
        assert!(studio.begin_node_edit(asset));
        studio.handle_input(InputEvent::down(20.0, 0.0));
        studio.handle_input(InputEvent::moved(25.0, 0.0));
        studio.handle_input(InputEvent::moved(30.0, 0.0));
        studio.handle_input(InputEvent::up(30.0, 0.0));

        assert!(studio.undo());
        assert_eq!(studio.library().asset_data(asset), Some(SQUARE));
        assert_eq!(studio.node_editor().unwrap().path_data(), "M 0 0 L 20 0 L 20 20 Z");

        assert!(studio.redo());
        assert_eq!(studio.node_editor().unwrap().path_data(), "M 0 0 L 30 0 L 20 20 Z");
    }

    #[test]
    fn object_node_edit_maps_screen_through_placement() {
        let (mut studio, layer, asset) = studio();
        let id = studio.instantiate(asset, layer, Point::new(50.0, 50.0)).unwrap();
        studio.commit(StudioMutation::Place(vec![Placement {
            id,
            x: 40.0,
            y: 40.0,
            scale: 2.0,
            rotation: 0.0,
        }]));
        let viewport = studio.viewport_mut();
        viewport.x = 10.0;
        viewport.zoom = 2.0;

        assert!(studio.begin_object_node_edit(id));
        // Asset point (20, 0) sits at stage (80, 40), screen (170, 80).
        // One asset unit is four screen pixels.
        studio.handle_screen_input(InputEvent::down(170.0, 80.0));
        studio.handle_screen_input(InputEvent::moved(190.0, 80.0));
        studio.handle_screen_input(InputEvent::up(190.0, 80.0));
        assert_eq!(
            studio.library().asset_data(asset),
            Some(r#"<svg viewBox="0 0 20 20"><path d="M 0 0 L 25 0 L 20 20 Z"/></svg>"#)
        );
        assert!(!studio.begin_object_node_edit(ObjectId::intern("studio_missing")));
    }

    #[test]
    fn screen_input_goes_through_viewport() {
        let (mut studio, _, _) = studio();
        studio.set_tool(ToolKind::Pen);
        studio.viewport_mut().zoom = 2.0;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        studio.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        studio.handle_screen_input(InputEvent::down(20.0, 40.0));
        assert_eq!(
            seen.lock().unwrap().last(),
            Some(&StudioEvent::PathPreview("M 10 20".into()))
        );
    }
}
