//! Per-entity undo/redo stacks with global chronological ordering.
//!
//! # Responsibility
//! - Keep one bounded operation stack per entity.
//! - Resolve "undo the most recent action anywhere" across all stacks.
//!
//! # Invariants
//! - Pushing discards the entity's redo tail.
//! - A stack never holds more than `limit` operations; the oldest go first.
//! - Global undo compares `(timestamp, insertion sequence)`, so equal
//!   timestamps resolve by insertion order.
//! - Global redo replays the operation undone most recently, whether it was
//!   undone globally or per entity.
//! - The manager never applies operations; callers apply `before`/`after`.

use crate::history::operation::UndoOperation;
use crate::model::item::ItemId;
use log::debug;
use std::collections::HashMap;

/// Default per-entity history bound.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
struct Recorded {
    sequence: u64,
    /// Sequence stamp of the latest undo of this operation.
    undone_at: Option<u64>,
    operation: UndoOperation,
}

impl Recorded {
    fn order_key(&self) -> (i64, u64) {
        (self.operation.timestamp, self.sequence)
    }
}

/// History of one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoState {
    operations: Vec<Recorded>,
    /// Index of the last applied operation; `None` when nothing can be undone.
    current: Option<usize>,
}

impl UndoState {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Index of the last applied operation.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Operations in push order, applied and undone alike.
    pub fn operations(&self) -> impl Iterator<Item = &UndoOperation> {
        self.operations.iter().map(|recorded| &recorded.operation)
    }

    fn top(&self) -> Option<&Recorded> {
        self.current.and_then(|index| self.operations.get(index))
    }

    fn next_redo(&self) -> Option<&Recorded> {
        self.operations.get(self.redo_index())
    }

    fn redo_index(&self) -> usize {
        self.current.map_or(0, |index| index + 1)
    }
}

/// Undo/redo log sharded by entity.
#[derive(Debug, Clone)]
pub struct UndoManager {
    stacks: HashMap<ItemId, UndoState>,
    limit: usize,
    next_sequence: u64,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoManager {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Creates a manager bounding every stack to `limit` (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            stacks: HashMap::new(),
            limit: limit.max(1),
            next_sequence: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Records `operation` as the newest entry of its entity's stack.
    pub fn push_operation(&mut self, operation: UndoOperation) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let event_id = operation.event_id;
        let kind = operation.kind();
        let state = self.stacks.entry(event_id).or_default();
        let keep = state.redo_index();
        state.operations.truncate(keep);
        state.operations.push(Recorded {
            sequence,
            undone_at: None,
            operation,
        });
        if state.operations.len() > self.limit {
            let overflow = state.operations.len() - self.limit;
            state.operations.drain(..overflow);
        }
        state.current = state.operations.len().checked_sub(1);

        debug!(
            "event=history_push module=history status=ok item={} kind={} depth={}",
            event_id,
            kind,
            state.operations.len()
        );
    }

    /// Steps one operation back and returns it.
    ///
    /// With `event_id`, only that entity's stack is considered. Without it,
    /// the entity whose newest applied operation is most recent wins.
    pub fn undo(&mut self, event_id: Option<ItemId>) -> Option<UndoOperation> {
        let target = match event_id {
            Some(id) => id,
            None => self.latest_undoable()?,
        };
        let state = self.stacks.get_mut(&target)?;
        let index = state.current?;
        let recorded = state.operations.get_mut(index)?;
        recorded.undone_at = Some(self.next_sequence);
        self.next_sequence += 1;
        let operation = recorded.operation.clone();
        state.current = index.checked_sub(1);

        debug!(
            "event=history_undo module=history status=ok item={} kind={}",
            target,
            operation.kind()
        );
        Some(operation)
    }

    /// Steps one operation forward and returns it.
    ///
    /// Without `event_id`, picks the entity whose next redo operation was
    /// undone most recently.
    pub fn redo(&mut self, event_id: Option<ItemId>) -> Option<UndoOperation> {
        let target = match event_id {
            Some(id) => id,
            None => self.latest_undone()?,
        };
        let state = self.stacks.get_mut(&target)?;
        let index = state.redo_index();
        let operation = state.operations.get(index)?.operation.clone();
        state.current = Some(index);

        debug!(
            "event=history_redo module=history status=ok item={} kind={}",
            target,
            operation.kind()
        );
        Some(operation)
    }

    pub fn can_undo(&self, event_id: Option<ItemId>) -> bool {
        match event_id {
            Some(id) => self.stacks.get(&id).and_then(UndoState::top).is_some(),
            None => self.stacks.values().any(|state| state.top().is_some()),
        }
    }

    pub fn can_redo(&self, event_id: Option<ItemId>) -> bool {
        match event_id {
            Some(id) => self
                .stacks
                .get(&id)
                .and_then(UndoState::next_redo)
                .is_some(),
            None => self.stacks.values().any(|state| state.next_redo().is_some()),
        }
    }

    /// Drops one entity's history.
    pub fn clear_history(&mut self, event_id: ItemId) {
        if self.stacks.remove(&event_id).is_some() {
            debug!(
                "event=history_clear module=history status=ok item={}",
                event_id
            );
        }
    }

    /// Drops every entity's history.
    pub fn clear_all_history(&mut self) {
        let cleared = self.stacks.len();
        self.stacks.clear();
        debug!(
            "event=history_clear_all module=history status=ok entities={}",
            cleared
        );
    }

    pub fn state(&self, event_id: ItemId) -> Option<&UndoState> {
        self.stacks.get(&event_id)
    }

    pub fn history_len(&self, event_id: ItemId) -> usize {
        self.stacks.get(&event_id).map_or(0, UndoState::len)
    }

    fn latest_undoable(&self) -> Option<ItemId> {
        self.stacks
            .iter()
            .filter_map(|(id, state)| state.top().map(|top| (top.order_key(), *id)))
            .max_by_key(|(key, _)| *key)
            .map(|(_, id)| id)
    }

    fn latest_undone(&self) -> Option<ItemId> {
        self.stacks
            .iter()
            .filter_map(|(id, state)| state.next_redo().map(|next| (next.undone_at, *id)))
            .max_by_key(|(stamp, _)| *stamp)
            .map(|(_, id)| id)
    }
}
