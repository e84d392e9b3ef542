//! Immutable stage snapshots and the reducer that advances them.
//!
//! Every change to the stage is a [`StudioMutation`]; [`reduce`] never
//! touches its input and returns the next snapshot, so history entries can
//! be compared and replayed without aliasing. The library is shared between
//! snapshots and copied only when an asset's markup changes.

use crate::tools::Placement;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vs_core::scene::{GraphNode, move_layer_to_z_index, sort_layers_by_z_index};
use vs_core::{AssetId, GroupId, Layer, LayerId, Library, ObjectId, SceneGraph, SceneObject};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    /// Kept in paint order (stable ascending `z`).
    pub layers: Vec<Layer>,
    pub library: Arc<Library>,
}

impl StageSnapshot {
    pub fn new(library: Library) -> Self {
        Self {
            layers: Vec::new(),
            library: Arc::new(library),
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.layers.iter().find_map(|l| l.object(id))
    }

    pub fn layer_of(&self, id: ObjectId) -> Option<LayerId> {
        self.layers.iter().find(|l| l.contains(id)).map(|l| l.id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.object(id).is_some()
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.layers.iter().flat_map(Layer::object_ids).collect()
    }

    /// Every object carrying `group`.
    pub fn group_members(&self, group: GroupId) -> Vec<ObjectId> {
        self.layers
            .iter()
            .flat_map(|l| l.objects.iter())
            .filter(|o| o.group_id == Some(group))
            .map(|o| o.id)
            .collect()
    }

    fn objects_mut(&mut self) -> impl Iterator<Item = &mut SceneObject> {
        self.layers.iter_mut().flat_map(|l| l.objects.iter_mut())
    }

    /// Layer panel tree: layers → groups → objects.
    pub fn outline(&self) -> SceneGraph<OutlineNode> {
        let mut graph = SceneGraph::new();
        for layer in &self.layers {
            let layer_key = OutlineKey::Layer(layer.id);
            graph.add_node(OutlineNode {
                key: layer_key,
                parent: None,
                label: layer.name.clone(),
            });
            for obj in &layer.objects {
                let parent = match obj.group_id {
                    Some(group) => {
                        let group_key = OutlineKey::Group(layer.id, group);
                        if graph.get_node(group_key).is_none() {
                            graph.add_node(OutlineNode {
                                key: group_key,
                                parent: Some(layer_key),
                                label: group.to_string(),
                            });
                        }
                        group_key
                    }
                    None => layer_key,
                };
                graph.add_node(OutlineNode {
                    key: OutlineKey::Object(obj.id),
                    parent: Some(parent),
                    label: obj.asset.to_string(),
                });
            }
        }
        graph
    }
}

// ─── Layer panel outline ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlineKey {
    Layer(LayerId),
    Group(LayerId, GroupId),
    Object(ObjectId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    pub key: OutlineKey,
    pub parent: Option<OutlineKey>,
    pub label: String,
}

impl GraphNode for OutlineNode {
    type Id = OutlineKey;

    fn id(&self) -> OutlineKey {
        self.key
    }

    fn parent(&self) -> Option<OutlineKey> {
        self.parent
    }

    fn set_parent(&mut self, parent: Option<OutlineKey>) {
        self.parent = parent;
    }
}

// ─── Mutations ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StudioMutation {
    AddLayer { id: LayerId, name: String },
    RemoveLayer(LayerId),
    RenameLayer { id: LayerId, name: String },
    MoveLayerToZ { id: LayerId, z: i32 },
    SetLayerLocked { id: LayerId, locked: bool },
    SetLayerVisible { id: LayerId, visible: bool },
    /// Append an object to a layer's paint order.
    AddObject { layer: LayerId, object: SceneObject },
    RemoveObjects(Vec<ObjectId>),
    Place(Vec<Placement>),
    SetLocked { ids: Vec<ObjectId>, locked: bool },
    SetVisible { ids: Vec<ObjectId>, visible: bool },
    Group { ids: Vec<ObjectId>, group: GroupId },
    Ungroup(Vec<ObjectId>),
    SetMask { id: ObjectId, mask: Option<ObjectId> },
    /// Copy `ids[i]` as `new_ids[i]`, shifted by `offset`.
    Duplicate {
        ids: Vec<ObjectId>,
        new_ids: Vec<ObjectId>,
        offset: (f64, f64),
    },
    BringForward(ObjectId),
    SendBackward(ObjectId),
    BringToFront(ObjectId),
    SendToBack(ObjectId),
    /// Replace the markup of the asset `asset` resolves to.
    UpdateAssetData { asset: AssetId, data: String },
}

/// Compute the snapshot that follows `mutation`. Mutations naming missing
/// layers or objects leave those parts unchanged.
pub fn reduce(snapshot: &StageSnapshot, mutation: &StudioMutation) -> StageSnapshot {
    let mut next = snapshot.clone();
    match mutation {
        StudioMutation::AddLayer { id, name } => {
            if next.layer(*id).is_none() {
                let z = next.layers.iter().map(|l| l.z + 1).max().unwrap_or(0);
                next.layers.push(Layer::new(*id, name.clone(), z));
            }
        }
        StudioMutation::RemoveLayer(id) => next.layers.retain(|l| l.id != *id),
        StudioMutation::RenameLayer { id, name } => {
            if let Some(layer) = next.layers.iter_mut().find(|l| l.id == *id) {
                layer.name = name.clone();
            }
        }
        StudioMutation::MoveLayerToZ { id, z } => {
            if move_layer_to_z_index(&mut next.layers, *id, *z) {
                sort_layers_by_z_index(&mut next.layers);
            }
        }
        StudioMutation::SetLayerLocked { id, locked } => {
            if let Some(layer) = next.layers.iter_mut().find(|l| l.id == *id) {
                layer.locked = *locked;
            }
        }
        StudioMutation::SetLayerVisible { id, visible } => {
            if let Some(layer) = next.layers.iter_mut().find(|l| l.id == *id) {
                layer.visible = *visible;
            }
        }
        StudioMutation::AddObject { layer, object } => {
            if !snapshot.contains(object.id)
                && let Some(target) = next.layers.iter_mut().find(|l| l.id == *layer)
            {
                let mut object = object.clone();
                object.z = target.objects.len() as i32;
                target.objects.push(object);
            }
        }
        StudioMutation::RemoveObjects(ids) => {
            for layer in &mut next.layers {
                layer.objects.retain(|o| !ids.contains(&o.id));
            }
            // Masks pointing at removed objects would dangle.
            for obj in next.objects_mut() {
                if obj.mask_id.is_some_and(|m| ids.contains(&m)) {
                    obj.mask_id = None;
                }
            }
        }
        StudioMutation::Place(placements) => {
            for obj in next.objects_mut() {
                if let Some(p) = placements.iter().find(|p| p.id == obj.id) {
                    obj.x = p.x;
                    obj.y = p.y;
                    obj.scale = p.scale;
                    obj.rotation = p.rotation;
                }
            }
        }
        StudioMutation::SetLocked { ids, locked } => {
            for obj in next.objects_mut().filter(|o| ids.contains(&o.id)) {
                obj.locked = *locked;
            }
        }
        StudioMutation::SetVisible { ids, visible } => {
            for obj in next.objects_mut().filter(|o| ids.contains(&o.id)) {
                obj.visible = *visible;
            }
        }
        StudioMutation::Group { ids, group } => {
            for obj in next.objects_mut().filter(|o| ids.contains(&o.id)) {
                obj.group_id = Some(*group);
            }
        }
        StudioMutation::Ungroup(ids) => {
            for obj in next.objects_mut().filter(|o| ids.contains(&o.id)) {
                obj.group_id = None;
            }
        }
        StudioMutation::SetMask { id, mask } => {
            if mask.is_none_or(|m| m != *id && snapshot.contains(m))
                && let Some(obj) = next.objects_mut().find(|o| o.id == *id)
            {
                obj.mask_id = *mask;
            }
        }
        StudioMutation::Duplicate { ids, new_ids, offset } => {
            for layer in &mut next.layers {
                let copies: Vec<SceneObject> = ids
                    .iter()
                    .zip(new_ids)
                    .filter_map(|(id, new_id)| {
                        let mut copy = layer.object(*id)?.clone();
                        copy.id = *new_id;
                        copy.x += offset.0;
                        copy.y += offset.1;
                        // Copies start outside any group.
                        copy.group_id = None;
                        Some(copy)
                    })
                    .collect();
                for mut copy in copies {
                    copy.z = layer.objects.len() as i32;
                    layer.objects.push(copy);
                }
            }
        }
        StudioMutation::BringForward(id) => reorder(&mut next, *id, Layer::bring_forward),
        StudioMutation::SendBackward(id) => reorder(&mut next, *id, Layer::send_backward),
        StudioMutation::BringToFront(id) => reorder(&mut next, *id, Layer::bring_to_front),
        StudioMutation::SendToBack(id) => reorder(&mut next, *id, Layer::send_to_back),
        StudioMutation::UpdateAssetData { asset, data } => {
            if let Err(err) = Arc::make_mut(&mut next.library).update_asset_data(*asset, data.clone()) {
                log::warn!("{err}");
            }
        }
    }
    next
}

fn reorder(snapshot: &mut StageSnapshot, id: ObjectId, op: fn(&mut Layer, ObjectId) -> bool) {
    if let Some(layer) = snapshot.layers.iter_mut().find(|l| l.contains(id)) {
        op(layer, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stage() -> StageSnapshot {
        let mut snap = StageSnapshot::default();
        for (layer, name) in [("snap_bg", "Background"), ("snap_fg", "Foreground")] {
            snap = reduce(
                &snap,
                &StudioMutation::AddLayer {
                    id: LayerId::intern(layer),
                    name: name.into(),
                },
            );
        }
        for (i, name) in ["snap_a", "snap_b", "snap_c"].into_iter().enumerate() {
            snap = reduce(
                &snap,
                &StudioMutation::AddObject {
                    layer: LayerId::intern("snap_fg"),
                    object: SceneObject::new(ObjectId::intern(name), AssetId::intern("snap_asset"), i as f64 * 10.0, 0.0),
                },
            );
        }
        snap
    }

    #[test]
    fn reduce_leaves_input_untouched() {
        let before = stage();
        let after = reduce(&before, &StudioMutation::RemoveObjects(vec![ObjectId::intern("snap_a")]));
        assert!(before.contains(ObjectId::intern("snap_a")));
        assert!(!after.contains(ObjectId::intern("snap_a")));
    }

    #[test]
    fn new_layers_stack_on_top() {
        let snap = stage();
        let zs: Vec<i32> = snap.layers.iter().map(|l| l.z).collect();
        assert_eq!(zs, vec![0, 1]);
        let moved = reduce(
            &snap,
            &StudioMutation::MoveLayerToZ {
                id: LayerId::intern("snap_bg"),
                z: 5,
            },
        );
        assert_eq!(moved.layers[1].id, LayerId::intern("snap_bg"));
    }

    #[test]
    fn duplicate_offsets_and_ungroups_copies() {
        let group = GroupId::intern("snap_group");
        let snap = reduce(
            &stage(),
            &StudioMutation::Group {
                ids: vec![ObjectId::intern("snap_a"), ObjectId::intern("snap_b")],
                group,
            },
        );
        assert_eq!(snap.group_members(group).len(), 2);

        let copy_id = ObjectId::intern("snap_a_copy");
        let snap = reduce(
            &snap,
            &StudioMutation::Duplicate {
                ids: vec![ObjectId::intern("snap_a")],
                new_ids: vec![copy_id],
                offset: (10.0, 10.0),
            },
        );
        let copy = snap.object(copy_id).unwrap();
        assert_eq!((copy.x, copy.y, copy.z), (10.0, 10.0, 3));
        assert_eq!(copy.group_id, None);
    }

    #[test]
    fn removing_a_mask_clears_references() {
        let snap = reduce(
            &stage(),
            &StudioMutation::SetMask {
                id: ObjectId::intern("snap_a"),
                mask: Some(ObjectId::intern("snap_b")),
            },
        );
        assert_eq!(snap.object(ObjectId::intern("snap_a")).unwrap().mask_id, Some(ObjectId::intern("snap_b")));
        let snap = reduce(&snap, &StudioMutation::RemoveObjects(vec![ObjectId::intern("snap_b")]));
        assert_eq!(snap.object(ObjectId::intern("snap_a")).unwrap().mask_id, None);
    }

    #[test]
    fn asset_updates_copy_the_library_on_write() {
        let asset = AssetId::intern("snap_square");
        let mut library = Library::new();
        library.insert_asset(asset, "<svg/>");
        let before = StageSnapshot::new(library);

        let moved = reduce(&before, &StudioMutation::RenameLayer {
            id: LayerId::intern("snap_missing"),
            name: "x".into(),
        });
        assert!(Arc::ptr_eq(&before.library, &moved.library));

        let after = reduce(&before, &StudioMutation::UpdateAssetData {
            asset,
            data: "<svg><path d=\"M 0 0\"/></svg>".into(),
        });
        assert_eq!(before.library.asset_data(asset), Some("<svg/>"));
        assert_eq!(after.library.asset_data(asset), Some("<svg><path d=\"M 0 0\"/></svg>"));

        let unknown = reduce(&after, &StudioMutation::UpdateAssetData {
            asset: AssetId::intern("snap_missing_asset"),
            data: String::new(),
        });
        assert_eq!(unknown, after);
    }

    #[test]
    fn outline_nests_groups_under_layers() {
        let group = GroupId::intern("snap_outline_group");
        let snap = reduce(
            &stage(),
            &StudioMutation::Group {
                ids: vec![ObjectId::intern("snap_b"), ObjectId::intern("snap_c")],
                group,
            },
        );
        let outline = snap.outline();
        let fg = OutlineKey::Layer(LayerId::intern("snap_fg"));
        let children: Vec<OutlineKey> = outline.get_children(fg).iter().map(|n| n.key).collect();
        assert_eq!(
            children,
            vec![
                OutlineKey::Object(ObjectId::intern("snap_a")),
                OutlineKey::Group(LayerId::intern("snap_fg"), group),
            ]
        );
        assert_eq!(
            outline.ancestors(OutlineKey::Object(ObjectId::intern("snap_c"))),
            vec![OutlineKey::Group(LayerId::intern("snap_fg"), group), fg]
        );
        assert_eq!(outline.root_ids().len(), 2);
    }
}
