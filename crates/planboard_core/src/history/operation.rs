//! Undo records for committed edits.
//!
//! # Responsibility
//! - Describe one committed edit with enough data to revert and re-apply it.
//! - Keep every edit kind a distinct variant so consumers match exhaustively.
//!
//! # Invariants
//! - Records are immutable once pushed to history.
//! - `revert` restores the `before` side exactly; `reapply` restores `after`.
//! - Records only describe deltas; applying them never touches history.

use crate::model::item::{CalendarItem, Geometry, ItemId, Placement, TaskId, TimeSpan};
use serde::{Deserialize, Serialize};

/// Edit-kind specific payload of an undo record.
///
/// Serialized with a `type` tag using the wire names
/// `move|resizeStart|resizeEnd|resizeHorizontal|resizeCorner|edit|create|delete|scheduleTask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Change {
    /// Item dragged to a new time and/or column.
    Move { before: Geometry, after: Geometry },
    /// Top edge dragged.
    ResizeStart { before: TimeSpan, after: TimeSpan },
    /// Bottom edge dragged.
    ResizeEnd { before: TimeSpan, after: TimeSpan },
    /// Left or right edge dragged.
    ResizeHorizontal { before: Placement, after: Placement },
    /// Bottom-right corner dragged.
    ResizeCorner { before: Geometry, after: Geometry },
    /// Arbitrary attribute edit (title, times, placement) from a form.
    Edit {
        before: Box<CalendarItem>,
        after: Box<CalendarItem>,
    },
    /// Item added to the calendar.
    Create { item: Box<CalendarItem> },
    /// Item removed from the calendar.
    Delete { item: Box<CalendarItem> },
    /// Backlog task placed on the calendar as a new item.
    #[serde(rename_all = "camelCase")]
    ScheduleTask {
        item: Box<CalendarItem>,
        task_id: TaskId,
    },
}

impl Change {
    /// Stable wire tag of this edit kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Move { .. } => "move",
            Self::ResizeStart { .. } => "resizeStart",
            Self::ResizeEnd { .. } => "resizeEnd",
            Self::ResizeHorizontal { .. } => "resizeHorizontal",
            Self::ResizeCorner { .. } => "resizeCorner",
            Self::Edit { .. } => "edit",
            Self::Create { .. } => "create",
            Self::Delete { .. } => "delete",
            Self::ScheduleTask { .. } => "scheduleTask",
        }
    }
}

/// One committed edit in an entity's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoOperation {
    /// Entity the edit applies to.
    pub event_id: ItemId,
    /// Wall-clock epoch milliseconds. Ordering only.
    pub timestamp: i64,
    #[serde(flatten)]
    pub change: Change,
}

/// Which side of a record to project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

impl UndoOperation {
    pub fn new(event_id: ItemId, timestamp: i64, change: Change) -> Self {
        Self {
            event_id,
            timestamp,
            change,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.change.kind()
    }

    /// Returns `items` with this edit reverted.
    pub fn revert(&self, items: &[CalendarItem]) -> Vec<CalendarItem> {
        self.project(items, Side::Before)
    }

    /// Returns `items` with this edit applied again.
    pub fn reapply(&self, items: &[CalendarItem]) -> Vec<CalendarItem> {
        self.project(items, Side::After)
    }

    /// Returns the item snapshot on the `before` side, `None` when the item
    /// did not exist before the edit.
    pub fn before_item(&self, current: Option<&CalendarItem>) -> Option<CalendarItem> {
        self.item_state(current, Side::Before)
    }

    /// Returns the item snapshot on the `after` side, `None` when the edit
    /// removed the item.
    pub fn after_item(&self, current: Option<&CalendarItem>) -> Option<CalendarItem> {
        self.item_state(current, Side::After)
    }

    /// Computes the item on one side of the edit.
    ///
    /// Geometry-only records need `current` to fill the attributes they do not
    /// carry; they yield `None` without it.
    fn item_state(&self, current: Option<&CalendarItem>, side: Side) -> Option<CalendarItem> {
        match &self.change {
            Change::Move { before, after } | Change::ResizeCorner { before, after } => {
                current.map(|item| item.with_geometry(*pick(side, before, after)))
            }
            Change::ResizeStart { before, after } | Change::ResizeEnd { before, after } => {
                current.map(|item| item.with_time_span(*pick(side, before, after)))
            }
            Change::ResizeHorizontal { before, after } => {
                current.map(|item| item.with_placement(*pick(side, before, after)))
            }
            Change::Edit { before, after } => Some(CalendarItem::clone(pick(side, before, after))),
            Change::Create { item } | Change::ScheduleTask { item, .. } => match side {
                Side::Before => None,
                Side::After => Some(CalendarItem::clone(item)),
            },
            Change::Delete { item } => match side {
                Side::Before => Some(CalendarItem::clone(item)),
                Side::After => None,
            },
        }
    }

    fn project(&self, items: &[CalendarItem], side: Side) -> Vec<CalendarItem> {
        let current = items.iter().find(|item| item.id == self.event_id);
        let target = self.item_state(current, side);

        let mut next = items
            .iter()
            .filter(|item| item.id != self.event_id)
            .cloned()
            .collect::<Vec<_>>();

        match (current, target) {
            (Some(_), Some(target)) => {
                // Keep the item at its original index.
                let index = items
                    .iter()
                    .position(|item| item.id == self.event_id)
                    .unwrap_or(next.len());
                next.insert(index.min(next.len()), target);
            }
            (None, Some(target)) => next.push(target),
            (_, None) => {}
        }
        next
    }
}

fn pick<T>(side: Side, before: T, after: T) -> T {
    match side {
        Side::Before => before,
        Side::After => after,
    }
}
