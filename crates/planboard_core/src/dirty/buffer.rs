//! Unsaved-changes buffer.
//!
//! # Responsibility
//! - Track an original/modified snapshot pair per edited entity.
//! - Hand snapshots to caller-supplied save/restore callbacks.
//!
//! # Invariants
//! - `original` is captured on the first mark and kept until save or cancel,
//!   so chained edits compare against the last saved baseline.
//! - An entity is dirty only while `modified != original`. Entries that are
//!   back at their baseline stay tracked until save or cancel but are never
//!   reported as unsaved and never reach a callback.
//! - The buffer never persists anything itself and never retries callbacks.

use crate::model::item::{CalendarItem, ItemId};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entity with edits not yet written to durable storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirtyState {
    pub id: ItemId,
    /// Snapshot at the last save point; `None` when the item was created since.
    pub original: Option<CalendarItem>,
    /// Latest snapshot; `None` when the item was deleted since.
    pub modified: Option<CalendarItem>,
    /// Epoch milliseconds of the latest mark.
    pub timestamp: i64,
}

impl DirtyState {
    /// Returns whether the latest snapshot equals the save-point baseline.
    pub fn is_unchanged(&self) -> bool {
        self.original == self.modified
    }
}

/// Dirty-state store keyed by entity ID.
#[derive(Debug, Clone, Default)]
pub struct DirtyBuffer {
    entries: HashMap<ItemId, DirtyState>,
}

impl DirtyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `modified` for `id`, keeping the first recorded `original`.
    pub fn mark_dirty(
        &mut self,
        id: ItemId,
        original: Option<CalendarItem>,
        modified: Option<CalendarItem>,
        timestamp: i64,
    ) {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.modified = modified;
                entry.timestamp = timestamp;
            }
            None => {
                self.entries.insert(
                    id,
                    DirtyState {
                        id,
                        original,
                        modified,
                        timestamp,
                    },
                );
            }
        }
    }

    pub fn is_dirty(&self, id: ItemId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| !entry.is_unchanged())
    }

    /// Navigation-guard flag for the host UI.
    pub fn has_unsaved_changes(&self) -> bool {
        self.entries.values().any(|entry| !entry.is_unchanged())
    }

    /// Number of dirty entities.
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_unchanged())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_unsaved_changes()
    }

    /// Returns the tracked entry for `id`, dirty or back at baseline.
    pub fn get(&self, id: ItemId) -> Option<&DirtyState> {
        self.entries.get(&id)
    }

    /// Dirty entries ordered by mark time, then ID. Feeds the save bar.
    pub fn dirty_entries(&self) -> Vec<&DirtyState> {
        self.tracked_entries()
            .into_iter()
            .filter(|entry| !entry.is_unchanged())
            .collect()
    }

    /// Passes every modified snapshot to `save`, clearing each saved entry.
    ///
    /// `None` tells the callback the item was deleted. The first callback
    /// error stops the pass; that entry and the ones after it stay dirty.
    ///
    /// Returns the number of entries handed to `save`.
    pub fn save_all<E, F>(&mut self, mut save: F) -> Result<usize, E>
    where
        F: FnMut(ItemId, Option<&CalendarItem>) -> Result<(), E>,
    {
        let mut saved = 0;
        for id in self.tracked_ids() {
            let dirty = self.is_dirty(id);
            self.save_one(id, &mut save)?;
            if dirty {
                saved += 1;
            }
        }
        info!(
            "event=dirty_save_all module=dirty status=ok saved={}",
            saved
        );
        Ok(saved)
    }

    /// Single-entity form of [`DirtyBuffer::save_all`].
    ///
    /// Returns `Ok(false)` when `id` had no unsaved changes.
    pub fn save_event<E, F>(&mut self, id: ItemId, mut save: F) -> Result<bool, E>
    where
        F: FnMut(ItemId, Option<&CalendarItem>) -> Result<(), E>,
    {
        let dirty = self.is_dirty(id);
        if !self.entries.contains_key(&id) {
            return Ok(false);
        }
        self.save_one(id, &mut save)?;
        Ok(dirty)
    }

    /// Passes every original snapshot to `restore` and clears the buffer.
    ///
    /// `None` tells the callback the item did not exist at the save point.
    pub fn cancel_all<F>(&mut self, mut restore: F) -> usize
    where
        F: FnMut(ItemId, Option<&CalendarItem>),
    {
        let mut restored = 0;
        for id in self.tracked_ids() {
            if self.cancel_event(id, &mut restore) {
                restored += 1;
            }
        }
        info!(
            "event=dirty_cancel_all module=dirty status=ok restored={}",
            restored
        );
        restored
    }

    /// Single-entity form of [`DirtyBuffer::cancel_all`].
    ///
    /// Returns whether `restore` was invoked.
    pub fn cancel_event<F>(&mut self, id: ItemId, mut restore: F) -> bool
    where
        F: FnMut(ItemId, Option<&CalendarItem>),
    {
        match self.entries.remove(&id) {
            Some(entry) if !entry.is_unchanged() => {
                restore(entry.id, entry.original.as_ref());
                true
            }
            Some(_) | None => false,
        }
    }

    fn save_one<E, F>(&mut self, id: ItemId, save: &mut F) -> Result<(), E>
    where
        F: FnMut(ItemId, Option<&CalendarItem>) -> Result<(), E>,
    {
        if let Some(entry) = self.entries.get(&id).filter(|entry| !entry.is_unchanged()) {
            if let Err(err) = save(id, entry.modified.as_ref()) {
                warn!(
                    "event=dirty_save module=dirty status=error item={} remaining={}",
                    id,
                    self.entries.len()
                );
                return Err(err);
            }
        }
        self.entries.remove(&id);
        Ok(())
    }

    fn tracked_entries(&self) -> Vec<&DirtyState> {
        let mut entries = self.entries.values().collect::<Vec<_>>();
        entries.sort_by_key(|entry| (entry.timestamp, entry.id));
        entries
    }

    /// IDs of every tracked entry, dirty or back at baseline, in mark order.
    pub fn tracked_ids(&self) -> Vec<ItemId> {
        self.tracked_entries()
            .into_iter()
            .map(|entry| entry.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::DirtyBuffer;
    use crate::model::item::CalendarItem;

    #[test]
    fn repeated_marks_keep_first_original() {
        let mut buffer = DirtyBuffer::new();
        let saved = CalendarItem::new("saved", 0, 60);
        let first = saved.with_time_span(crate::model::item::TimeSpan::new(10, 70));
        let second = saved.with_time_span(crate::model::item::TimeSpan::new(20, 80));

        buffer.mark_dirty(saved.id, Some(saved.clone()), Some(first.clone()), 1);
        buffer.mark_dirty(saved.id, Some(first), Some(second.clone()), 2);

        let entry = buffer.get(saved.id).unwrap();
        assert_eq!(entry.original.as_ref(), Some(&saved));
        assert_eq!(entry.modified.as_ref(), Some(&second));
        assert_eq!(entry.timestamp, 2);
    }

    #[test]
    fn failed_save_keeps_remaining_entries() {
        let mut buffer = DirtyBuffer::new();
        let a = CalendarItem::new("a", 0, 60);
        let b = CalendarItem::new("b", 0, 60);
        buffer.mark_dirty(a.id, None, Some(a.clone()), 1);
        buffer.mark_dirty(b.id, None, Some(b.clone()), 2);

        let result = buffer.save_all(|id, _| if id == b.id { Err("offline") } else { Ok(()) });
        assert_eq!(result, Err("offline"));
        assert!(!buffer.is_dirty(a.id));
        assert!(buffer.is_dirty(b.id));
        assert!(buffer.has_unsaved_changes());
    }

    #[test]
    fn entry_back_at_baseline_is_not_dirty() {
        let mut buffer = DirtyBuffer::new();
        let saved = CalendarItem::new("saved", 0, 60);
        let moved = saved.with_time_span(crate::model::item::TimeSpan::new(30, 90));

        buffer.mark_dirty(saved.id, Some(saved.clone()), Some(moved.clone()), 1);
        assert!(buffer.is_dirty(saved.id));
        buffer.mark_dirty(saved.id, Some(moved), Some(saved.clone()), 2);
        assert!(!buffer.is_dirty(saved.id));
        assert!(buffer.get(saved.id).is_some());

        let mut restored = 0;
        assert_eq!(buffer.cancel_all(|_, _| restored += 1), 0);
        assert_eq!(restored, 0);
        assert!(buffer.get(saved.id).is_none());
    }
}
