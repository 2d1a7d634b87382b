//! Half-open interval overlap rules.
//!
//! Touching endpoints never overlap: an item ending at 10:00 and one starting
//! at 10:00 share no time. The same rule applies to horizontal placement.

use crate::model::item::{CalendarItem, Placement, TimeSpan};

/// Returns whether two time windows share any instant.
pub fn time_overlaps(a: TimeSpan, b: TimeSpan) -> bool {
    a.start < b.end && b.start < a.end
}

/// Returns whether two horizontal windows share any column.
pub fn placement_overlaps(a: Placement, b: Placement) -> bool {
    a.x_position < b.right() && b.x_position < a.right()
}

/// Returns whether two items visually collide.
///
/// Items laid out side by side (disjoint placement) are not in conflict even
/// when their times intersect.
pub fn overlaps(a: &CalendarItem, b: &CalendarItem) -> bool {
    time_overlaps(a.time_span(), b.time_span()) && placement_overlaps(a.placement(), b.placement())
}
