//! Column layout heuristic for conflict groups.
//!
//! # Responsibility
//! - Propose horizontal slots for the members of one conflict group.
//! - Apply proposals to item snapshots without mutating the input.
//!
//! # Invariants
//! - Suggestions depend only on member count and member order.
//! - Applying the same suggestion twice yields the same placements.
//! - Items without an assignment keep their current placement.

use crate::conflict::cluster::detect_conflicts;
use crate::model::item::{CalendarItem, ItemId, Placement};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const NO_SLOTS: &[(f64, f64)] = &[];
const ONE_COLUMN_SLOTS: &[(f64, f64)] = &[(0.0, 100.0)];
const TWO_COLUMN_SLOTS: &[(f64, f64)] = &[(0.0, 50.0), (50.0, 50.0)];
const THREE_COLUMN_SLOTS: &[(f64, f64)] = &[(0.0, 50.0), (50.0, 25.0), (75.0, 25.0)];
const FOUR_COLUMN_SLOTS: &[(f64, f64)] =
    &[(0.0, 25.0), (25.0, 25.0), (50.0, 25.0), (75.0, 25.0)];

/// Layout family chosen for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    #[serde(rename = "1-column")]
    OneColumn,
    #[serde(rename = "2-column")]
    TwoColumn,
    #[serde(rename = "3-column")]
    ThreeColumn,
    #[serde(rename = "4-column")]
    FourColumn,
    /// Four columns with the overflow stacked in place.
    #[serde(rename = "tackboard")]
    Tackboard,
}

impl LayoutKind {
    /// Stable wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneColumn => "1-column",
            Self::TwoColumn => "2-column",
            Self::ThreeColumn => "3-column",
            Self::FourColumn => "4-column",
            Self::Tackboard => "tackboard",
        }
    }
}

/// One proposed slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutAssignment {
    pub item_id: ItemId,
    pub x_position: f64,
    pub width: f64,
}

impl LayoutAssignment {
    pub fn placement(&self) -> Placement {
        Placement::new(self.x_position, self.width)
    }
}

/// Proposed placement for every assignable member of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSuggestion {
    #[serde(rename = "type")]
    pub kind: LayoutKind,
    pub assignments: Vec<LayoutAssignment>,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f64,
    pub reason: String,
}

impl LayoutSuggestion {
    /// Returns the proposed placement for `id`, if it was assigned one.
    pub fn placement_for(&self, id: ItemId) -> Option<Placement> {
        self.assignments
            .iter()
            .find(|assignment| assignment.item_id == id)
            .map(LayoutAssignment::placement)
    }
}

/// Proposes slots for group members, keyed by member count.
///
/// Members are assigned in the order given. With five or more members only
/// the first four receive quarter columns; the rest stay where they are.
pub fn generate_layout_suggestion<'a>(
    members: impl IntoIterator<Item = &'a CalendarItem>,
) -> LayoutSuggestion {
    let ids = members.into_iter().map(|item| item.id).collect::<Vec<_>>();
    let count = ids.len();

    let (kind, slots, confidence, reason) = match count {
        0 => (
            LayoutKind::OneColumn,
            NO_SLOTS,
            0.0,
            "no items to lay out".to_string(),
        ),
        1 => (
            LayoutKind::OneColumn,
            ONE_COLUMN_SLOTS,
            1.0,
            "single item keeps the full width".to_string(),
        ),
        2 => (
            LayoutKind::TwoColumn,
            TWO_COLUMN_SLOTS,
            0.95,
            "two overlapping items split the row in halves".to_string(),
        ),
        3 => (
            LayoutKind::ThreeColumn,
            THREE_COLUMN_SLOTS,
            0.90,
            "three overlapping items: one half column and two quarter columns".to_string(),
        ),
        4 => (
            LayoutKind::FourColumn,
            FOUR_COLUMN_SLOTS,
            0.85,
            "four overlapping items in equal quarter columns".to_string(),
        ),
        _ => (
            LayoutKind::Tackboard,
            FOUR_COLUMN_SLOTS,
            0.70,
            format!(
                "{count} overlapping items: first four in quarter columns, {} stacked",
                count - FOUR_COLUMN_SLOTS.len()
            ),
        ),
    };

    let assignments = ids
        .iter()
        .zip(slots)
        .map(|(&item_id, &(x_position, width))| LayoutAssignment {
            item_id,
            x_position,
            width,
        })
        .collect();

    LayoutSuggestion {
        kind,
        assignments,
        confidence,
        reason,
    }
}

/// Returns a copy of `items` with the suggestion's placements applied.
pub fn apply_layout_suggestion(
    items: &[CalendarItem],
    suggestion: &LayoutSuggestion,
) -> Vec<CalendarItem> {
    items
        .iter()
        .map(|item| match suggestion.placement_for(item.id) {
            Some(placement) => item.with_placement(placement),
            None => item.clone(),
        })
        .collect()
}

/// Detects every conflict group and applies all suggestions in one pass.
pub fn auto_layout_all_conflicts(items: &[CalendarItem]) -> Vec<CalendarItem> {
    let groups = detect_conflicts(items);
    let placements = groups
        .iter()
        .flat_map(|group| group.layout_suggestion.assignments.iter())
        .map(|assignment| (assignment.item_id, assignment.placement()))
        .collect::<HashMap<_, _>>();

    debug!(
        "event=auto_layout module=layout status=ok groups={} placed={}",
        groups.len(),
        placements.len()
    );

    items
        .iter()
        .map(|item| match placements.get(&item.id) {
            Some(placement) => item.with_placement(*placement),
            None => item.clone(),
        })
        .collect()
}
