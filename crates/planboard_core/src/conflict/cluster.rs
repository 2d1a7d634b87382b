//! Conflict clustering over the item overlap graph.
//!
//! # Responsibility
//! - Group items into connected components of the overlap relation.
//! - Annotate every member with its direct overlaps and a severity tier.
//! - Attach one layout suggestion per group.
//!
//! # Invariants
//! - Grouping is transitive: A~B and B~C put A, B and C in one group.
//! - No item appears in more than one group of a single run.
//! - Output depends only on input order, never on hash iteration order.
//! - Malformed items are skipped; malformed payloads yield no groups.

use crate::conflict::interval::overlaps;
use crate::layout::heuristic::{generate_layout_suggestion, LayoutSuggestion};
use crate::model::item::{CalendarItem, ItemId, Placement, TimeSpan};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Visual severity of one item's conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// One overlapping neighbour.
    Low,
    /// Two overlapping neighbours.
    Medium,
    /// Three or more overlapping neighbours.
    High,
}

impl Severity {
    pub fn from_overlap_count(count: usize) -> Self {
        match count {
            0 | 1 => Self::Low,
            2 => Self::Medium,
            _ => Self::High,
        }
    }
}

/// One item inside a conflict group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEvent {
    pub item: CalendarItem,
    /// Group members this item directly overlaps, in group order.
    pub overlaps: Vec<ItemId>,
    /// Placement proposed by the group suggestion; current placement when stacked.
    pub suggested: Placement,
    pub severity: Severity,
}

/// Maximal set of transitively overlapping items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictGroup {
    /// Derived from the first member so reruns over the same input agree.
    pub id: String,
    pub events: Vec<ConflictEvent>,
    /// Earliest member start to latest member end.
    pub time_range: TimeSpan,
    /// Member count.
    pub density: usize,
    pub layout_suggestion: LayoutSuggestion,
}

impl ConflictGroup {
    /// Returns member IDs in group order.
    pub fn member_ids(&self) -> Vec<ItemId> {
        self.events.iter().map(|event| event.item.id).collect()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.events.iter().any(|event| event.item.id == id)
    }
}

/// Detects every conflict group in `items`.
///
/// Components are seeded in input order and grown breadth-first; members keep
/// discovery order. Components with a single member are not conflicts and are
/// not reported. Items failing validation are ignored.
pub fn detect_conflicts(items: &[CalendarItem]) -> Vec<ConflictGroup> {
    let candidates = items
        .iter()
        .filter(|item| match item.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "event=conflict_item_skipped module=conflict status=invalid item={} reason={}",
                    item.id, err
                );
                false
            }
        })
        .collect::<Vec<_>>();

    let mut assigned = vec![false; candidates.len()];
    let mut groups = Vec::new();

    for seed in 0..candidates.len() {
        if assigned[seed] {
            continue;
        }
        let members = collect_component(&candidates, seed, &mut assigned);
        if members.len() < 2 {
            continue;
        }
        let member_items = members.iter().map(|&index| candidates[index]).collect::<Vec<_>>();
        groups.push(build_group(&member_items));
    }

    debug!(
        "event=conflicts_detected module=conflict status=ok items={} groups={}",
        items.len(),
        groups.len()
    );
    groups
}

/// Decodes a JSON item snapshot and detects conflicts in it.
///
/// Anything other than a JSON array of items yields an empty result.
pub fn detect_conflicts_json(payload: &str) -> Vec<ConflictGroup> {
    match serde_json::from_str::<Vec<CalendarItem>>(payload) {
        Ok(items) => detect_conflicts(&items),
        Err(err) => {
            warn!(
                "event=conflict_payload_rejected module=conflict status=malformed reason={}",
                err
            );
            Vec::new()
        }
    }
}

fn collect_component(
    candidates: &[&CalendarItem],
    seed: usize,
    assigned: &mut [bool],
) -> Vec<usize> {
    assigned[seed] = true;
    let mut members = vec![seed];
    let mut queue = VecDeque::from([seed]);

    while let Some(current) = queue.pop_front() {
        for next in 0..candidates.len() {
            if assigned[next] || !overlaps(candidates[current], candidates[next]) {
                continue;
            }
            assigned[next] = true;
            members.push(next);
            queue.push_back(next);
        }
    }

    members
}

fn build_group(members: &[&CalendarItem]) -> ConflictGroup {
    let suggestion = generate_layout_suggestion(members.iter().copied());

    let events = members
        .iter()
        .map(|item| {
            let neighbours = members
                .iter()
                .filter(|other| other.id != item.id && overlaps(item, other))
                .map(|other| other.id)
                .collect::<Vec<_>>();
            ConflictEvent {
                item: (*item).clone(),
                severity: Severity::from_overlap_count(neighbours.len()),
                overlaps: neighbours,
                suggested: suggestion
                    .placement_for(item.id)
                    .unwrap_or_else(|| item.placement()),
            }
        })
        .collect::<Vec<_>>();

    // Callers only build groups from non-empty components.
    let start = members.iter().map(|item| item.start).min().unwrap_or_default();
    let end = members.iter().map(|item| item.end).max().unwrap_or_default();
    let id = members
        .first()
        .map(|item| format!("conflict-{}", item.id))
        .unwrap_or_default();

    ConflictGroup {
        id,
        density: events.len(),
        events,
        time_range: TimeSpan::new(start, end),
        layout_suggestion: suggestion,
    }
}
