//! Scene storage: a generic id-keyed hierarchy plus the stage's layers and
//! placed objects.
//!
//! `SceneGraph<T>` owns every node in one map. The parent relation is a
//! back-reference stored on the node itself, so walking down the tree is a
//! linear scan over insertion order.

use crate::geometry::Bounds;
use crate::id::{AssetId, GroupId, LayerId, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

// ─── Generic hierarchy ───────────────────────────────────────────────────

/// A node that knows its own id and (optionally) its parent's id.
pub trait GraphNode {
    type Id: Copy + Eq + Hash + std::fmt::Debug;

    fn id(&self) -> Self::Id;
    fn parent(&self) -> Option<Self::Id>;
    fn set_parent(&mut self, parent: Option<Self::Id>);
}

#[derive(Debug, Clone)]
pub struct SceneGraph<T: GraphNode> {
    nodes: HashMap<T::Id, T>,
    /// Insertion order of every key, used for deterministic scans.
    order: Vec<T::Id>,
    root_ids: Vec<T::Id>,
}

impl<T: GraphNode> Default for SceneGraph<T> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            root_ids: Vec::new(),
        }
    }
}

impl<T: GraphNode> SceneGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root_ids(&self) -> &[T::Id] {
        &self.root_ids
    }

    pub fn get_node(&self, id: T::Id) -> Option<&T> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: T::Id) -> Option<&mut T> {
        self.nodes.get_mut(&id)
    }

    /// Nodes whose parent is `id`, in insertion order.
    pub fn get_children(&self, id: T::Id) -> Vec<&T> {
        self.order
            .iter()
            .filter_map(|key| self.nodes.get(key))
            .filter(|node| node.parent() == Some(id))
            .collect()
    }

    /// Insert (or replace) a node. Parentless nodes become roots.
    pub fn add_node(&mut self, node: T) {
        let id = node.id();
        let is_root = node.parent().is_none();
        if self.nodes.insert(id, node).is_none() {
            self.order.push(id);
        }
        let listed = self.root_ids.contains(&id);
        if is_root && !listed {
            self.root_ids.push(id);
        } else if !is_root && listed {
            self.root_ids.retain(|r| *r != id);
        }
    }

    /// Remove one node. Its children are promoted to roots rather than left
    /// pointing at a missing parent.
    pub fn remove_node(&mut self, id: T::Id) -> Option<T> {
        let removed = self.nodes.remove(&id)?;
        self.order.retain(|k| *k != id);
        self.root_ids.retain(|k| *k != id);

        let orphans: Vec<T::Id> = self
            .order
            .iter()
            .copied()
            .filter(|k| self.nodes.get(k).and_then(GraphNode::parent) == Some(id))
            .collect();
        for orphan in orphans {
            if let Some(node) = self.nodes.get_mut(&orphan) {
                node.set_parent(None);
            }
            self.root_ids.push(orphan);
        }
        Some(removed)
    }

    /// Remove a node and all of its descendants. Returns them parent-first.
    pub fn remove_subtree(&mut self, id: T::Id) -> Vec<T> {
        let mut doomed = vec![id];
        let mut i = 0;
        while i < doomed.len() {
            let parent = doomed[i];
            doomed.extend(self.get_children(parent).into_iter().map(GraphNode::id));
            i += 1;
        }

        let mut removed = Vec::with_capacity(doomed.len());
        for key in &doomed {
            if let Some(node) = self.nodes.remove(key) {
                removed.push(node);
            }
        }
        self.order.retain(|k| !doomed.contains(k));
        self.root_ids.retain(|k| !doomed.contains(k));
        removed
    }

    /// Parent chain from the immediate parent up to the root.
    pub fn ancestors(&self, id: T::Id) -> Vec<T::Id> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(&id).and_then(GraphNode::parent);
        while let Some(pid) = current {
            if chain.contains(&pid) {
                log::warn!("cycle in scene graph at {pid:?}");
                break;
            }
            chain.push(pid);
            current = self.nodes.get(&pid).and_then(GraphNode::parent);
        }
        chain
    }

    /// Every node in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|k| self.nodes.get(k))
    }
}

// ─── Stage objects ───────────────────────────────────────────────────────

/// A placed instance of a library asset or component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    /// Library key, resolved externally and never owned by the stage.
    #[serde(rename = "ref")]
    pub asset: AssetId,
    pub x: f64,
    pub y: f64,
    pub z: i32,
    pub scale: f64,
    /// Degrees.
    pub rotation: f64,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_id: Option<ObjectId>,
}

fn default_true() -> bool {
    true
}

impl SceneObject {
    pub fn new(id: ObjectId, asset: AssetId, x: f64, y: f64) -> Self {
        Self {
            id,
            asset,
            x,
            y,
            z: 0,
            scale: 1.0,
            rotation: 0.0,
            locked: false,
            visible: true,
            group_id: None,
            mask_id: None,
        }
    }

    /// World-space box given the asset's intrinsic (unscaled) size.
    pub fn bounds(&self, base_width: f64, base_height: f64) -> Bounds {
        Bounds::new(self.x, self.y, base_width * self.scale, base_height * self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub z: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Back-to-front paint order.
    pub objects: Vec<SceneObject>,
}

impl Layer {
    pub fn new(id: LayerId, name: impl Into<String>, z: i32) -> Self {
        Self {
            id,
            name: name.into(),
            z,
            visible: true,
            locked: false,
            objects: Vec::new(),
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.iter().any(|o| o.id == id)
    }

    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.objects.iter().map(|o| o.id).collect()
    }

    /// Move one object to `to` in paint order and renumber `z` to match.
    /// Returns false when nothing changed.
    fn reorder(&mut self, id: ObjectId, to: impl FnOnce(usize, usize) -> usize) -> bool {
        let Some(from) = self.objects.iter().position(|o| o.id == id) else {
            return false;
        };
        let last = self.objects.len() - 1;
        let to = to(from, last).min(last);
        if to == from {
            return false;
        }
        let obj = self.objects.remove(from);
        self.objects.insert(to, obj);
        for (i, o) in self.objects.iter_mut().enumerate() {
            o.z = i as i32;
        }
        true
    }

    pub fn bring_forward(&mut self, id: ObjectId) -> bool {
        self.reorder(id, |from, _| from + 1)
    }

    pub fn send_backward(&mut self, id: ObjectId) -> bool {
        self.reorder(id, |from, _| from.saturating_sub(1))
    }

    pub fn bring_to_front(&mut self, id: ObjectId) -> bool {
        self.reorder(id, |_, last| last)
    }

    pub fn send_to_back(&mut self, id: ObjectId) -> bool {
        self.reorder(id, |_, _| 0)
    }
}

/// Stable ascending sort by `z`; equal values keep their array order.
pub fn sort_layers_by_z_index(layers: &mut [Layer]) {
    layers.sort_by_key(|l| l.z);
}

/// Rewrite one layer's `z`. Siblings are not renumbered, so duplicates are
/// allowed. Returns false if the layer does not exist.
pub fn move_layer_to_z_index(layers: &mut [Layer], id: LayerId, z: i32) -> bool {
    match layers.iter_mut().find(|l| l.id == id) {
        Some(layer) => {
            layer.z = z;
            true
        }
        None => false,
    }
}
