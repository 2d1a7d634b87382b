//! Edit-commit coordinator.
//!
//! # Responsibility
//! - Validate proposed edits before they become history.
//! - Record accepted edits in the undo log and the dirty buffer together.
//! - Keep the dirty buffer in step with undo/redo, save and cancel.
//! - Drive the pointer interaction state machine.
//!
//! # Invariants
//! - A rejected edit pushes nothing and marks nothing dirty.
//! - Every entity with history has a tracked dirty entry; saving or
//!   cancelling an entity drops its history.
//! - Missing linked tasks are logged and never block the calendar edit.

use crate::config::{ConfigError, EngineConfig};
use crate::conflict::cluster::{detect_conflicts, ConflictGroup};
use crate::dirty::buffer::{DirtyBuffer, DirtyState};
use crate::edit::interaction::{
    self, FrameThrottle, InteractionEvent, InteractionState, PointerMapping, Transition,
};
use crate::edit::validation::{ensure_same_item, validate_item, EditError};
use crate::history::manager::UndoManager;
use crate::history::operation::{Change, UndoOperation};
use crate::layout::heuristic::auto_layout_all_conflicts;
use crate::model::item::{CalendarItem, ItemId, TaskId};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Geometry-changing edit kinds produced by pointer gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReshapeKind {
    Move,
    ResizeStart,
    ResizeEnd,
    ResizeHorizontal,
    ResizeCorner,
}

/// Edit proposed by the host UI, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProposedEdit {
    /// Drag or resize result.
    Reshape {
        kind: ReshapeKind,
        before: CalendarItem,
        after: CalendarItem,
    },
    /// Form edit of any attributes.
    Edit {
        before: CalendarItem,
        after: CalendarItem,
    },
    Create { item: CalendarItem },
    Delete { item: CalendarItem },
    /// Backlog task dropped onto the grid.
    #[serde(rename_all = "camelCase")]
    ScheduleTask { item: CalendarItem, task_id: TaskId },
}

impl ProposedEdit {
    /// Entity the edit targets.
    pub fn event_id(&self) -> ItemId {
        match self {
            Self::Reshape { after, .. } | Self::Edit { after, .. } => after.id,
            Self::Create { item } | Self::Delete { item } | Self::ScheduleTask { item, .. } => {
                item.id
            }
        }
    }
}

/// Lookup of backlog tasks linked to calendar items.
pub trait TaskLinks {
    fn task_exists(&self, task_id: TaskId) -> bool;
}

/// Link lookup that treats every task as present.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTaskLinks;

impl TaskLinks for NullTaskLinks {
    fn task_exists(&self, _task_id: TaskId) -> bool {
        true
    }
}

/// Accepted edit returned to the host UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    /// Record pushed to history.
    pub operation: UndoOperation,
    /// Snapshot to store; `None` when the item was removed.
    pub item: Option<CalendarItem>,
    /// Linked task that still exists and is affected by the edit.
    pub linked_task: Option<TaskId>,
}

/// Result of dispatching one pointer event.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEffect {
    None,
    /// Render this snapshot; nothing is recorded.
    Preview(CalendarItem),
    Committed(CommitOutcome),
    /// Gesture result violated a rule; render `revert_to` and show `error`.
    Rejected {
        error: EditError,
        revert_to: CalendarItem,
    },
    /// Gesture cancelled; render this snapshot.
    Reverted(CalendarItem),
}

/// Single owner of history, dirty state and interaction state.
pub struct EditEngine<L: TaskLinks = NullTaskLinks> {
    config: EngineConfig,
    history: UndoManager,
    dirty: DirtyBuffer,
    links: L,
    interaction: InteractionState,
    mapping: PointerMapping,
    throttle: FrameThrottle,
}

impl EditEngine<NullTaskLinks> {
    /// Creates an engine without task link checks.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_task_links(config, NullTaskLinks)
    }
}

impl<L: TaskLinks> EditEngine<L> {
    /// Creates an engine that checks linked tasks through `links`.
    pub fn with_task_links(config: EngineConfig, links: L) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            history: UndoManager::with_limit(config.history_limit),
            dirty: DirtyBuffer::new(),
            links,
            interaction: InteractionState::Idle,
            mapping: PointerMapping::new(1.0, 100.0, config.snap_minutes),
            throttle: FrameThrottle::default(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &UndoManager {
        &self.history
    }

    pub fn dirty(&self) -> &DirtyBuffer {
        &self.dirty
    }

    /// Updates pixel geometry after the host grid is laid out or resized.
    ///
    /// The snap grid always comes from the engine config.
    pub fn set_pointer_geometry(&mut self, pixels_per_minute: f64, row_width_px: f64) {
        self.mapping =
            PointerMapping::new(pixels_per_minute, row_width_px, self.config.snap_minutes);
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Validates and records one edit.
    ///
    /// # Errors
    /// - [`EditError`] when the resulting snapshot breaks a duration,
    ///   placement or identity rule. No state changes in that case.
    pub fn commit(
        &mut self,
        proposed: ProposedEdit,
        timestamp: i64,
    ) -> Result<CommitOutcome, EditError> {
        let event_id = proposed.event_id();
        let kind = proposed_kind(&proposed);
        let prepared = self.prepare(proposed).inspect_err(|err| {
            warn!(
                "event=edit_commit module=edit status=rejected item={} kind={} reason={}",
                event_id, kind, err
            );
        })?;

        let operation = UndoOperation::new(event_id, timestamp, prepared.change);
        self.history.push_operation(operation.clone());
        self.dirty.mark_dirty(
            event_id,
            prepared.before,
            prepared.after.clone(),
            timestamp,
        );

        info!(
            "event=edit_commit module=edit status=ok item={} kind={}",
            event_id,
            operation.kind()
        );
        Ok(CommitOutcome {
            operation,
            item: prepared.after,
            linked_task: prepared.linked_task,
        })
    }

    /// Steps back one edit and returns it; the caller applies `before`.
    pub fn undo(&mut self, event_id: Option<ItemId>, timestamp: i64) -> Option<UndoOperation> {
        let operation = self.history.undo(event_id)?;
        self.track_restored(&operation, |op, current| op.before_item(current), timestamp);
        Some(operation)
    }

    /// Steps forward one edit and returns it; the caller applies `after`.
    pub fn redo(&mut self, event_id: Option<ItemId>, timestamp: i64) -> Option<UndoOperation> {
        let operation = self.history.redo(event_id)?;
        self.track_restored(&operation, |op, current| op.after_item(current), timestamp);
        Some(operation)
    }

    pub fn can_undo(&self, event_id: Option<ItemId>) -> bool {
        self.history.can_undo(event_id)
    }

    pub fn can_redo(&self, event_id: Option<ItemId>) -> bool {
        self.history.can_redo(event_id)
    }

    pub fn is_dirty(&self, event_id: ItemId) -> bool {
        self.dirty.is_dirty(event_id)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty.has_unsaved_changes()
    }

    pub fn dirty_entries(&self) -> Vec<&DirtyState> {
        self.dirty.dirty_entries()
    }

    /// Saves every dirty entity through `save` and drops the saved history.
    ///
    /// On a callback error, entities saved before it are settled and the rest
    /// keep both their dirty entry and their history.
    pub fn save_all<E, F>(&mut self, save: F) -> Result<usize, E>
    where
        F: FnMut(ItemId, Option<&CalendarItem>) -> Result<(), E>,
    {
        let tracked = self.dirty.tracked_ids();
        let result = self.dirty.save_all(save);
        for id in tracked {
            if self.dirty.get(id).is_none() {
                self.history.clear_history(id);
            }
        }
        result
    }

    /// Saves one entity and drops its history.
    pub fn save_event<E, F>(&mut self, event_id: ItemId, save: F) -> Result<bool, E>
    where
        F: FnMut(ItemId, Option<&CalendarItem>) -> Result<(), E>,
    {
        let saved = self.dirty.save_event(event_id, save)?;
        self.history.clear_history(event_id);
        Ok(saved)
    }

    /// Restores every dirty entity through `restore` and drops all history.
    pub fn cancel_all<F>(&mut self, restore: F) -> usize
    where
        F: FnMut(ItemId, Option<&CalendarItem>),
    {
        let restored = self.dirty.cancel_all(restore);
        self.history.clear_all_history();
        restored
    }

    /// Restores one entity and drops its history.
    pub fn cancel_event<F>(&mut self, event_id: ItemId, restore: F) -> bool
    where
        F: FnMut(ItemId, Option<&CalendarItem>),
    {
        let restored = self.dirty.cancel_event(event_id, restore);
        self.history.clear_history(event_id);
        restored
    }

    pub fn detect_conflicts(&self, items: &[CalendarItem]) -> Vec<ConflictGroup> {
        detect_conflicts(items)
    }

    pub fn auto_layout(&self, items: &[CalendarItem]) -> Vec<CalendarItem> {
        auto_layout_all_conflicts(items)
    }

    /// Feeds one pointer event through the interaction state machine.
    ///
    /// Moves are throttled to one preview per frame. Pointer-up commits
    /// through [`EditEngine::commit`]; everything else leaves history and
    /// dirty state alone.
    pub fn dispatch(&mut self, event: InteractionEvent) -> InteractionEffect {
        if let InteractionEvent::PointerMove { timestamp, .. } = &event {
            if !self.interaction.is_idle() && !self.throttle.admit(*timestamp) {
                return InteractionEffect::None;
            }
        }

        let state = std::mem::take(&mut self.interaction);
        let (next, transition) = interaction::reduce(state, event, &self.mapping);
        self.interaction = next;

        match transition {
            Transition::None => InteractionEffect::None,
            Transition::Preview(item) => InteractionEffect::Preview(item),
            Transition::Revert(origin) => {
                self.throttle.reset();
                InteractionEffect::Reverted(origin)
            }
            Transition::Commit {
                edit,
                origin,
                timestamp,
            } => {
                self.throttle.reset();
                match self.commit(edit, timestamp) {
                    Ok(outcome) => InteractionEffect::Committed(outcome),
                    Err(error) => InteractionEffect::Rejected {
                        error,
                        revert_to: origin,
                    },
                }
            }
        }
    }

    fn prepare(&self, proposed: ProposedEdit) -> Result<PreparedEdit, EditError> {
        match proposed {
            ProposedEdit::Reshape {
                kind,
                before,
                after,
            } => {
                ensure_same_item(&before, &after)?;
                validate_item(&after, &self.config)?;
                Ok(PreparedEdit {
                    change: reshape_change(kind, &before, &after),
                    before: Some(before),
                    after: Some(after),
                    linked_task: None,
                })
            }
            ProposedEdit::Edit { before, after } => {
                ensure_same_item(&before, &after)?;
                validate_item(&after, &self.config)?;
                Ok(PreparedEdit {
                    change: Change::Edit {
                        before: Box::new(before.clone()),
                        after: Box::new(after.clone()),
                    },
                    before: Some(before),
                    after: Some(after),
                    linked_task: None,
                })
            }
            ProposedEdit::Create { item } => {
                validate_item(&item, &self.config)?;
                Ok(PreparedEdit {
                    change: Change::Create {
                        item: Box::new(item.clone()),
                    },
                    before: None,
                    after: Some(item),
                    linked_task: None,
                })
            }
            ProposedEdit::Delete { item } => {
                let linked_task = item
                    .source_task_id
                    .filter(|task_id| self.linked_task_present(item.id, *task_id));
                Ok(PreparedEdit {
                    change: Change::Delete {
                        item: Box::new(item.clone()),
                    },
                    before: Some(item),
                    after: None,
                    linked_task,
                })
            }
            ProposedEdit::ScheduleTask { mut item, task_id } => {
                item.source_task_id = Some(task_id);
                validate_item(&item, &self.config)?;
                let linked_task =
                    Some(task_id).filter(|task_id| self.linked_task_present(item.id, *task_id));
                Ok(PreparedEdit {
                    change: Change::ScheduleTask {
                        item: Box::new(item.clone()),
                        task_id,
                    },
                    before: None,
                    after: Some(item),
                    linked_task,
                })
            }
        }
    }

    fn linked_task_present(&self, item_id: ItemId, task_id: TaskId) -> bool {
        let present = self.links.task_exists(task_id);
        if !present {
            warn!(
                "event=linked_task_missing module=edit status=degraded item={} task={}",
                item_id, task_id
            );
        }
        present
    }

    fn track_restored(
        &mut self,
        operation: &UndoOperation,
        restore: impl Fn(&UndoOperation, Option<&CalendarItem>) -> Option<CalendarItem>,
        timestamp: i64,
    ) {
        let Some(entry) = self.dirty.get(operation.event_id) else {
            warn!(
                "event=history_dirty_sync module=edit status=degraded item={} reason=untracked",
                operation.event_id
            );
            return;
        };
        let restored = restore(operation, entry.modified.as_ref());
        self.dirty
            .mark_dirty(operation.event_id, None, restored, timestamp);
    }
}

struct PreparedEdit {
    change: Change,
    before: Option<CalendarItem>,
    after: Option<CalendarItem>,
    linked_task: Option<TaskId>,
}

fn proposed_kind(proposed: &ProposedEdit) -> &'static str {
    match proposed {
        ProposedEdit::Reshape { kind, .. } => match kind {
            ReshapeKind::Move => "move",
            ReshapeKind::ResizeStart => "resizeStart",
            ReshapeKind::ResizeEnd => "resizeEnd",
            ReshapeKind::ResizeHorizontal => "resizeHorizontal",
            ReshapeKind::ResizeCorner => "resizeCorner",
        },
        ProposedEdit::Edit { .. } => "edit",
        ProposedEdit::Create { .. } => "create",
        ProposedEdit::Delete { .. } => "delete",
        ProposedEdit::ScheduleTask { .. } => "scheduleTask",
    }
}

fn reshape_change(kind: ReshapeKind, before: &CalendarItem, after: &CalendarItem) -> Change {
    match kind {
        ReshapeKind::Move => Change::Move {
            before: before.geometry(),
            after: after.geometry(),
        },
        ReshapeKind::ResizeStart => Change::ResizeStart {
            before: before.time_span(),
            after: after.time_span(),
        },
        ReshapeKind::ResizeEnd => Change::ResizeEnd {
            before: before.time_span(),
            after: after.time_span(),
        },
        ReshapeKind::ResizeHorizontal => Change::ResizeHorizontal {
            before: before.placement(),
            after: after.placement(),
        },
        ReshapeKind::ResizeCorner => Change::ResizeCorner {
            before: before.geometry(),
            after: after.geometry(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{EditEngine, InteractionEffect, ProposedEdit, ReshapeKind, TaskLinks};
    use crate::config::EngineConfig;
    use crate::edit::interaction::{InteractionEvent, PointerPosition, PointerTarget, ResizeHandle};
    use crate::edit::validation::EditError;
    use crate::model::item::{CalendarItem, TaskId, TimeSpan, MINUTE_MS};
    use uuid::Uuid;

    struct NoTasks;

    impl TaskLinks for NoTasks {
        fn task_exists(&self, _task_id: TaskId) -> bool {
            false
        }
    }

    fn hour_item() -> CalendarItem {
        CalendarItem::new("standup", 9 * 60 * MINUTE_MS, 10 * 60 * MINUTE_MS)
    }

    fn engine() -> EditEngine {
        EditEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn rejected_edit_records_nothing() {
        let mut engine = engine();
        let item = hour_item();
        let after = item.with_time_span(TimeSpan::new(item.start, item.start + 10 * MINUTE_MS));

        let err = engine
            .commit(
                ProposedEdit::Reshape {
                    kind: ReshapeKind::ResizeEnd,
                    before: item.clone(),
                    after,
                },
                1,
            )
            .unwrap_err();

        assert!(matches!(err, EditError::DurationTooShort { minutes: 10, .. }));
        assert!(!engine.can_undo(Some(item.id)));
        assert!(!engine.is_dirty(item.id));
    }

    #[test]
    fn undo_back_to_baseline_clears_dirty_flag() {
        let mut engine = engine();
        let item = hour_item();
        let moved = item.with_time_span(TimeSpan::new(
            item.start + 30 * MINUTE_MS,
            item.end + 30 * MINUTE_MS,
        ));
        engine
            .commit(
                ProposedEdit::Reshape {
                    kind: ReshapeKind::Move,
                    before: item.clone(),
                    after: moved.clone(),
                },
                1,
            )
            .unwrap();
        assert!(engine.is_dirty(item.id));

        let undone = engine.undo(None, 2).unwrap();
        assert_eq!(undone.before_item(Some(&moved)), Some(item.clone()));
        assert!(!engine.is_dirty(item.id));

        engine.redo(None, 3).unwrap();
        assert!(engine.is_dirty(item.id));
        assert_eq!(
            engine.dirty().get(item.id).and_then(|e| e.modified.clone()),
            Some(moved)
        );
    }

    #[test]
    fn missing_linked_task_does_not_block_scheduling() {
        let mut engine = EditEngine::with_task_links(EngineConfig::default(), NoTasks).unwrap();
        let task_id = Uuid::new_v4();

        let outcome = engine
            .commit(
                ProposedEdit::ScheduleTask {
                    item: hour_item(),
                    task_id,
                },
                1,
            )
            .unwrap();

        assert_eq!(outcome.linked_task, None);
        let item = outcome.item.unwrap();
        assert_eq!(item.source_task_id, Some(task_id));
        assert!(engine.is_dirty(item.id));
    }

    #[test]
    fn saving_one_item_drops_its_history() {
        let mut engine = engine();
        let item = hour_item();
        engine
            .commit(ProposedEdit::Create { item: item.clone() }, 1)
            .unwrap();

        let saved = engine
            .save_event(item.id, |_, snapshot| {
                assert_eq!(snapshot, Some(&item));
                Ok::<(), ()>(())
            })
            .unwrap();

        assert!(saved);
        assert!(!engine.can_undo(Some(item.id)));
        assert!(!engine.has_unsaved_changes());
    }

    #[test]
    fn drag_gesture_commits_once_on_release() {
        let mut engine = engine();
        let item = hour_item();

        engine.dispatch(InteractionEvent::PointerDown {
            item: item.clone(),
            target: PointerTarget::Body,
            position: PointerPosition::new(0.0, 0.0),
        });
        let preview = engine.dispatch(InteractionEvent::PointerMove {
            position: PointerPosition::new(0.0, 30.0),
            timestamp: 100,
        });
        assert!(matches!(preview, InteractionEffect::Preview(_)));
        assert!(!engine.is_dirty(item.id));

        let throttled = engine.dispatch(InteractionEvent::PointerMove {
            position: PointerPosition::new(0.0, 45.0),
            timestamp: 105,
        });
        assert_eq!(throttled, InteractionEffect::None);

        let effect = engine.dispatch(InteractionEvent::PointerUp {
            position: PointerPosition::new(0.0, 60.0),
            timestamp: 120,
        });
        let InteractionEffect::Committed(outcome) = effect else {
            panic!("expected commit, got {effect:?}");
        };
        assert_eq!(outcome.operation.kind(), "move");
        assert_eq!(engine.history().history_len(item.id), 1);
        assert!(engine.interaction().is_idle());
    }

    #[test]
    fn invalid_resize_gesture_reverts_to_origin() {
        let mut engine = engine();
        let item = hour_item();

        engine.dispatch(InteractionEvent::PointerDown {
            item: item.clone(),
            target: PointerTarget::Handle(ResizeHandle::Bottom),
            position: PointerPosition::new(0.0, 0.0),
        });
        let effect = engine.dispatch(InteractionEvent::PointerUp {
            position: PointerPosition::new(0.0, -60.0),
            timestamp: 10,
        });

        let InteractionEffect::Rejected { error, revert_to } = effect else {
            panic!("expected rejection, got {effect:?}");
        };
        assert!(matches!(error, EditError::InvalidItem(_)));
        assert_eq!(revert_to, item);
        assert!(!engine.can_undo(None));
    }
}
