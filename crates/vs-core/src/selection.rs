//! Multi-selection as an ordered id list treated as a set.
//!
//! The free functions are pure: they take the current ids and return the
//! next ones. [`Selection`] wraps them with a primary (single-selection)
//! field and the pruning that keeps dead ids from leaking out.

use crate::id::ObjectId;
use serde::{Deserialize, Serialize};

/// In multi-select mode remove `id` if present, otherwise append it.
/// In single mode the result is just `[id]`.
pub fn toggle(selection: &[ObjectId], id: ObjectId, multi: bool) -> Vec<ObjectId> {
    if !multi {
        return select_single(id);
    }
    if selection.contains(&id) {
        remove(selection, id)
    } else {
        add(selection, id)
    }
}

/// Append `id` unless it is already selected.
pub fn add(selection: &[ObjectId], id: ObjectId) -> Vec<ObjectId> {
    let mut next = selection.to_vec();
    if !next.contains(&id) {
        next.push(id);
    }
    next
}

pub fn remove(selection: &[ObjectId], id: ObjectId) -> Vec<ObjectId> {
    selection.iter().copied().filter(|s| *s != id).collect()
}

pub fn select_single(id: ObjectId) -> Vec<ObjectId> {
    vec![id]
}

pub fn select_all(ids: impl IntoIterator<Item = ObjectId>) -> Vec<ObjectId> {
    ids.into_iter().fold(Vec::new(), |acc, id| add(&acc, id))
}

pub fn clear() -> Vec<ObjectId> {
    Vec::new()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    ids: Vec<ObjectId>,
    /// Most recently singled-out object, if it is still selected.
    primary: Option<ObjectId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.ids
    }

    pub fn primary(&self) -> Option<ObjectId> {
        self.primary
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.ids.contains(&id)
    }

    pub fn toggle(&mut self, id: ObjectId, multi: bool) {
        self.set(toggle(&self.ids, id, multi));
        if self.contains(id) {
            self.primary = Some(id);
        }
    }

    pub fn add(&mut self, id: ObjectId) {
        self.set(add(&self.ids, id));
    }

    pub fn remove(&mut self, id: ObjectId) {
        self.set(remove(&self.ids, id));
    }

    pub fn select_single(&mut self, id: ObjectId) {
        self.ids = select_single(id);
        self.primary = Some(id);
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = ObjectId>) {
        self.set(select_all(ids));
    }

    pub fn clear(&mut self) {
        self.ids = clear();
        self.primary = None;
    }

    /// Replace the whole set, keeping `primary` only if it survives.
    pub fn set(&mut self, ids: Vec<ObjectId>) {
        self.ids = ids;
        self.primary = match self.primary {
            Some(p) if self.ids.contains(&p) => Some(p),
            _ if self.ids.len() == 1 => self.ids.first().copied(),
            _ => None,
        };
    }

    /// Drop ids for which `exists` is false. Returns how many were dropped.
    pub fn prune(&mut self, exists: impl Fn(ObjectId) -> bool) -> usize {
        let before = self.ids.len();
        let live: Vec<ObjectId> = self.ids.iter().copied().filter(|id| exists(*id)).collect();
        let dropped = before - live.len();
        if dropped > 0 {
            log::debug!("pruned {dropped} stale selection id(s)");
            self.set(live);
        }
        dropped
    }

    /// Read-side healing: only ids that still exist, without mutating.
    pub fn live_ids(&self, exists: impl Fn(ObjectId) -> bool) -> Vec<ObjectId> {
        self.ids.iter().copied().filter(|id| exists(*id)).collect()
    }
}
