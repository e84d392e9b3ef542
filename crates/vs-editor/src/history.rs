//! Undo/redo history over whole-state snapshots.
//!
//! Two strategies share the [`History`] contract:
//!
//! - [`IndexedHistory`] keeps one list of states and a cursor into it.
//! - [`TimelineHistory`] keeps `past`/`present`/`future`, plus a live
//!   `set_present` that bypasses history and gesture batching so a drag
//!   records exactly one entry.
//!
//! At a boundary `undo`/`redo` return `None`; the `*_or_current` variants
//! return the unchanged state instead.

use std::collections::VecDeque;
use std::fmt;

pub const DEFAULT_MAX_HISTORY: usize = 50;

type TransformHook<T> = Box<dyn Fn(T) -> T + Send>;
type ChangeHook<T> = Box<dyn FnMut(&T) + Send>;

/// Limits and hooks shared by both strategies.
pub struct HistoryOptions<T> {
    /// Upper bound on stored undo steps; the oldest is evicted first.
    pub max_history: usize,
    /// Applied to every state before it is stored.
    pub transform: Option<TransformHook<T>>,
    /// Fired after every successful mutation, including undo/redo.
    pub on_state_change: Option<ChangeHook<T>>,
}

impl<T> Default for HistoryOptions<T> {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            transform: None,
            on_state_change: None,
        }
    }
}

impl<T> fmt::Debug for HistoryOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryOptions")
            .field("max_history", &self.max_history)
            .field("transform", &self.transform.is_some())
            .field("on_state_change", &self.on_state_change.is_some())
            .finish()
    }
}

impl<T> HistoryOptions<T> {
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history,
            ..Self::default()
        }
    }

    pub fn transform(mut self, hook: impl Fn(T) -> T + Send + 'static) -> Self {
        self.transform = Some(Box::new(hook));
        self
    }

    pub fn on_state_change(mut self, hook: impl FnMut(&T) + Send + 'static) -> Self {
        self.on_state_change = Some(Box::new(hook));
        self
    }

    fn prepare(&self, state: T) -> T {
        match &self.transform {
            Some(hook) => hook(state),
            None => state,
        }
    }

    fn limit(&self) -> usize {
        self.max_history.max(1)
    }
}

fn notify<T>(hook: &mut Option<ChangeHook<T>>, state: &T) {
    if let Some(hook) = hook {
        hook(state);
    }
}

pub trait History<T> {
    fn current(&self) -> &T;

    /// Record `next` as the new current state, discarding any redo future.
    fn commit(&mut self, next: T);

    /// Step back. `None` when there is nothing to undo.
    fn undo(&mut self) -> Option<&T>;

    /// Step forward. `None` when there is nothing to redo.
    fn redo(&mut self) -> Option<&T>;

    /// Forget everything and start over from `reset`.
    fn clear(&mut self, reset: T);

    /// Number of states held, current included.
    fn len(&self) -> usize;

    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commit a state derived from the current one.
    fn commit_with(&mut self, update: impl FnOnce(&T) -> T)
    where
        Self: Sized,
    {
        let next = update(self.current());
        self.commit(next);
    }

    /// Undo, returning the current state whether or not anything moved.
    fn undo_or_current(&mut self) -> &T {
        let _ = self.undo();
        self.current()
    }

    fn redo_or_current(&mut self) -> &T {
        let _ = self.redo();
        self.current()
    }
}

// ─── Index-based ─────────────────────────────────────────────────────────

/// History as one list of states with a cursor. Invariant:
/// `index < entries.len()`.
#[derive(Debug)]
pub struct IndexedHistory<T> {
    entries: Vec<T>,
    index: usize,
    options: HistoryOptions<T>,
}

impl<T> IndexedHistory<T> {
    pub fn new(initial: T, options: HistoryOptions<T>) -> Self {
        let initial = options.prepare(initial);
        Self {
            entries: vec![initial],
            index: 0,
            options,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Overwrite the current entry in place. No history entry is added and
    /// no change hook fires.
    pub fn replace_current(&mut self, state: T) {
        let state = self.options.prepare(state);
        self.entries[self.index] = state;
    }
}

impl<T> History<T> for IndexedHistory<T> {
    fn current(&self) -> &T {
        &self.entries[self.index]
    }

    fn commit(&mut self, next: T) {
        let next = self.options.prepare(next);
        self.entries.truncate(self.index + 1);
        self.entries.push(next);

        let overflow = self.entries.len().saturating_sub(self.options.limit());
        if overflow > 0 {
            log::debug!("history full, evicting {overflow} oldest state(s)");
            self.entries.drain(..overflow);
        }
        self.index = self.entries.len() - 1;
        notify(&mut self.options.on_state_change, &self.entries[self.index]);
    }

    fn undo(&mut self) -> Option<&T> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        notify(&mut self.options.on_state_change, &self.entries[self.index]);
        Some(&self.entries[self.index])
    }

    fn redo(&mut self) -> Option<&T> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        notify(&mut self.options.on_state_change, &self.entries[self.index]);
        Some(&self.entries[self.index])
    }

    fn clear(&mut self, reset: T) {
        self.entries = vec![self.options.prepare(reset)];
        self.index = 0;
        notify(&mut self.options.on_state_change, &self.entries[0]);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn can_undo(&self) -> bool {
        self.index > 0
    }

    fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}

// ─── Past / present / future ─────────────────────────────────────────────

/// History as `past`, `present` and `future`. `past` holds at most
/// `max_history` states.
#[derive(Debug)]
pub struct TimelineHistory<T> {
    past: Vec<T>,
    present: T,
    /// Front is the next state to redo.
    future: VecDeque<T>,
    options: HistoryOptions<T>,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Present captured when the outermost batch opened.
    batch_snapshot: Option<T>,
    /// Whether the present changed during the current batch.
    batch_dirty: bool,
}

impl<T: Clone> TimelineHistory<T> {
    pub fn new(initial: T, options: HistoryOptions<T>) -> Self {
        let present = options.prepare(initial);
        Self {
            past: Vec::new(),
            present,
            future: VecDeque::new(),
            options,
            batch_depth: 0,
            batch_snapshot: None,
            batch_dirty: false,
        }
    }

    pub fn past(&self) -> &[T] {
        &self.past
    }

    pub fn future(&self) -> &VecDeque<T> {
        &self.future
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    /// Move `present` into `past` and make `next` current.
    pub fn push_to_history(&mut self, next: T) {
        if self.batch_depth > 0 {
            // Inside a batch the snapshot at end_batch() records the step.
            self.set_present(next);
            return;
        }
        let next = self.options.prepare(next);
        let previous = std::mem::replace(&mut self.present, next);
        self.record_past(previous);
        notify(&mut self.options.on_state_change, &self.present);
    }

    /// Replace `present` without touching history (live drag frames).
    pub fn set_present(&mut self, state: T) {
        self.present = self.options.prepare(state);
        if self.batch_depth > 0 {
            self.batch_dirty = true;
        }
        notify(&mut self.options.on_state_change, &self.present);
    }

    /// Start a gesture. Changes until the matching `end_batch` become one
    /// undo step.
    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(self.present.clone());
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// Close a gesture. The outermost close records the pre-gesture state
    /// if anything changed. Returns whether an entry was recorded.
    pub fn end_batch(&mut self) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        let snapshot = self.batch_snapshot.take();
        let dirty = std::mem::take(&mut self.batch_dirty);
        match snapshot {
            Some(before) if dirty => {
                self.record_past(before);
                true
            }
            _ => false,
        }
    }

    /// Abandon a gesture and restore the state it started from.
    pub fn cancel_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth = 0;
        self.batch_dirty = false;
        if let Some(before) = self.batch_snapshot.take() {
            self.present = before;
            notify(&mut self.options.on_state_change, &self.present);
        }
    }

    fn record_past(&mut self, previous: T) {
        self.past.push(previous);
        let overflow = self.past.len().saturating_sub(self.options.limit());
        if overflow > 0 {
            log::debug!("history full, evicting {overflow} oldest state(s)");
            self.past.drain(..overflow);
        }
        self.future.clear();
    }
}

impl<T: Clone> History<T> for TimelineHistory<T> {
    fn current(&self) -> &T {
        &self.present
    }

    fn commit(&mut self, next: T) {
        self.push_to_history(next);
    }

    fn undo(&mut self) -> Option<&T> {
        let previous = self.past.pop()?;
        let old = std::mem::replace(&mut self.present, previous);
        self.future.push_front(old);
        notify(&mut self.options.on_state_change, &self.present);
        Some(&self.present)
    }

    fn redo(&mut self) -> Option<&T> {
        let next = self.future.pop_front()?;
        let old = std::mem::replace(&mut self.present, next);
        self.past.push(old);
        notify(&mut self.options.on_state_change, &self.present);
        Some(&self.present)
    }

    fn clear(&mut self, reset: T) {
        self.past.clear();
        self.future.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
        self.present = self.options.prepare(reset);
        notify(&mut self.options.on_state_change, &self.present);
    }

    fn len(&self) -> usize {
        self.past.len() + 1 + self.future.len()
    }

    fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }
}
