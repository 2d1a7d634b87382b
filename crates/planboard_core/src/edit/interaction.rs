//! Pointer interaction state machine.
//!
//! # Responsibility
//! - Track one in-flight drag or resize as an explicit state value.
//! - Map pointer deltas in pixels onto snapped minutes and row percent.
//! - Turn pointer-up into a proposed edit; everything before it is preview.
//!
//! # Invariants
//! - `reduce` is the only transition function; it never touches history or
//!   dirty state.
//! - At most one interaction is in flight; pointer-down while busy is ignored.
//! - Cancel always returns to `Idle` and reverts to the origin snapshot.

use crate::edit::coordinator::{ProposedEdit, ReshapeKind};
use crate::model::item::{CalendarItem, Placement, FULL_WIDTH, MINUTE_MS};

/// Minimum spacing between preview updates, about one display frame.
pub const FRAME_INTERVAL_MS: i64 = 16;

/// Largest time shift one gesture can produce, one leap year.
pub const MAX_GESTURE_SHIFT_MINUTES: i64 = 366 * 24 * 60;

/// Edge or corner grabbed by a resize gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    /// Moves the start time.
    Top,
    /// Moves the end time.
    Bottom,
    /// Moves the left edge, keeping the right edge.
    Left,
    /// Moves the right edge.
    Right,
    /// Moves the end time and the right edge.
    BottomRight,
}

impl ResizeHandle {
    pub fn reshape_kind(self) -> ReshapeKind {
        match self {
            Self::Top => ReshapeKind::ResizeStart,
            Self::Bottom => ReshapeKind::ResizeEnd,
            Self::Left | Self::Right => ReshapeKind::ResizeHorizontal,
            Self::BottomRight => ReshapeKind::ResizeCorner,
        }
    }
}

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Body,
    Handle(ResizeHandle),
}

/// Pointer location in pixels relative to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel-to-domain conversion for the current grid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMapping {
    /// Vertical pixels per minute of time.
    pub pixels_per_minute: f64,
    /// Width of one day row in pixels.
    pub row_width_px: f64,
    /// Time changes snap to multiples of this.
    pub snap_minutes: i64,
}

impl PointerMapping {
    pub fn new(pixels_per_minute: f64, row_width_px: f64, snap_minutes: i64) -> Self {
        Self {
            pixels_per_minute,
            row_width_px,
            snap_minutes,
        }
    }

    /// Converts a vertical delta to whole minutes on the snap grid.
    ///
    /// The result stays within [`MAX_GESTURE_SHIFT_MINUTES`] either way.
    pub fn snapped_minutes(&self, dy_px: f64) -> i64 {
        if self.pixels_per_minute <= 0.0 || !dy_px.is_finite() {
            return 0;
        }
        let snap = self.snap_minutes.clamp(1, MAX_GESTURE_SHIFT_MINUTES);
        let limit = MAX_GESTURE_SHIFT_MINUTES / snap;
        let raw = dy_px / self.pixels_per_minute;
        let steps = (raw / snap as f64).round().clamp(-(limit as f64), limit as f64);
        steps as i64 * snap
    }

    /// Snapped vertical delta in milliseconds.
    fn shift_ms(&self, dy_px: f64) -> i64 {
        self.snapped_minutes(dy_px) * MINUTE_MS
    }

    /// Converts a horizontal delta to percent of row width.
    pub fn percent(&self, dx_px: f64) -> f64 {
        if self.row_width_px <= 0.0 || !dx_px.is_finite() {
            return 0.0;
        }
        dx_px / self.row_width_px * FULL_WIDTH
    }
}

/// Drag gesture in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct DragContext {
    pub origin: CalendarItem,
    pub pointer_start: PointerPosition,
    pub preview: CalendarItem,
}

/// Resize gesture in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeContext {
    pub origin: CalendarItem,
    pub handle: ResizeHandle,
    pub pointer_start: PointerPosition,
    pub preview: CalendarItem,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(DragContext),
    Resizing(ResizeContext),
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Pointer input delivered by the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionEvent {
    PointerDown {
        item: CalendarItem,
        target: PointerTarget,
        position: PointerPosition,
    },
    PointerMove {
        position: PointerPosition,
        timestamp: i64,
    },
    PointerUp {
        position: PointerPosition,
        timestamp: i64,
    },
    /// Escape or lost pointer capture.
    Cancel,
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    None,
    /// Advisory snapshot for live rendering.
    Preview(CalendarItem),
    /// Gesture finished with a change; hand to the coordinator.
    Commit {
        edit: ProposedEdit,
        origin: CalendarItem,
        timestamp: i64,
    },
    /// Gesture abandoned; render `origin` again.
    Revert(CalendarItem),
}

/// Advances the interaction state machine by one event.
pub fn reduce(
    state: InteractionState,
    event: InteractionEvent,
    mapping: &PointerMapping,
) -> (InteractionState, Transition) {
    match (state, event) {
        (
            InteractionState::Idle,
            InteractionEvent::PointerDown {
                item,
                target,
                position,
            },
        ) => {
            let next = match target {
                PointerTarget::Body => InteractionState::Dragging(DragContext {
                    preview: item.clone(),
                    origin: item,
                    pointer_start: position,
                }),
                PointerTarget::Handle(handle) => InteractionState::Resizing(ResizeContext {
                    preview: item.clone(),
                    origin: item,
                    handle,
                    pointer_start: position,
                }),
            };
            (next, Transition::None)
        }
        (InteractionState::Dragging(mut ctx), InteractionEvent::PointerMove { position, .. }) => {
            ctx.preview = drag_preview(&ctx.origin, ctx.pointer_start, position, mapping);
            let preview = ctx.preview.clone();
            (InteractionState::Dragging(ctx), Transition::Preview(preview))
        }
        (InteractionState::Resizing(mut ctx), InteractionEvent::PointerMove { position, .. }) => {
            ctx.preview =
                resize_preview(&ctx.origin, ctx.handle, ctx.pointer_start, position, mapping);
            let preview = ctx.preview.clone();
            (InteractionState::Resizing(ctx), Transition::Preview(preview))
        }
        (InteractionState::Dragging(ctx), InteractionEvent::PointerUp { position, timestamp }) => {
            let after = drag_preview(&ctx.origin, ctx.pointer_start, position, mapping);
            finish(ctx.origin, after, ReshapeKind::Move, timestamp)
        }
        (InteractionState::Resizing(ctx), InteractionEvent::PointerUp { position, timestamp }) => {
            let after =
                resize_preview(&ctx.origin, ctx.handle, ctx.pointer_start, position, mapping);
            finish(ctx.origin, after, ctx.handle.reshape_kind(), timestamp)
        }
        (InteractionState::Dragging(ctx), InteractionEvent::Cancel) => {
            (InteractionState::Idle, Transition::Revert(ctx.origin))
        }
        (InteractionState::Resizing(ctx), InteractionEvent::Cancel) => {
            (InteractionState::Idle, Transition::Revert(ctx.origin))
        }
        // Stray input: pointer-down while busy, move/up/cancel while idle.
        (state, _) => (state, Transition::None),
    }
}

fn finish(
    origin: CalendarItem,
    after: CalendarItem,
    kind: ReshapeKind,
    timestamp: i64,
) -> (InteractionState, Transition) {
    if after == origin {
        return (InteractionState::Idle, Transition::None);
    }
    let edit = ProposedEdit::Reshape {
        kind,
        before: origin.clone(),
        after,
    };
    (
        InteractionState::Idle,
        Transition::Commit {
            edit,
            origin,
            timestamp,
        },
    )
}

fn drag_preview(
    origin: &CalendarItem,
    start: PointerPosition,
    current: PointerPosition,
    mapping: &PointerMapping,
) -> CalendarItem {
    let shift_ms = mapping.shift_ms(current.y - start.y);
    let max_x = (FULL_WIDTH - origin.width).max(0.0);
    let x_position = (origin.x_position + mapping.percent(current.x - start.x)).clamp(0.0, max_x);

    let mut preview = origin.clone();
    preview.start = origin.start.saturating_add(shift_ms);
    preview.end = origin.end.saturating_add(shift_ms);
    preview.x_position = x_position;
    preview
}

// Resize previews are not clamped; the coordinator rejects out-of-range results.
fn resize_preview(
    origin: &CalendarItem,
    handle: ResizeHandle,
    start: PointerPosition,
    current: PointerPosition,
    mapping: &PointerMapping,
) -> CalendarItem {
    let shift_ms = mapping.shift_ms(current.y - start.y);
    let shift_pct = mapping.percent(current.x - start.x);
    let placement = origin.placement();

    let mut preview = origin.clone();
    match handle {
        ResizeHandle::Top => preview.start = origin.start.saturating_add(shift_ms),
        ResizeHandle::Bottom => preview.end = origin.end.saturating_add(shift_ms),
        ResizeHandle::Left => {
            preview = preview.with_placement(Placement::new(
                placement.x_position + shift_pct,
                placement.width - shift_pct,
            ));
        }
        ResizeHandle::Right => {
            preview = preview.with_placement(Placement::new(
                placement.x_position,
                placement.width + shift_pct,
            ));
        }
        ResizeHandle::BottomRight => {
            preview.end = origin.end.saturating_add(shift_ms);
            preview.width = placement.width + shift_pct;
        }
    }
    preview
}

/// Admits at most one preview per frame interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameThrottle {
    interval_ms: i64,
    last_emit: Option<i64>,
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL_MS)
    }
}

impl FrameThrottle {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms,
            last_emit: None,
        }
    }

    /// Returns whether an update at `now_ms` may be emitted, recording it if so.
    pub fn admit(&mut self, now_ms: i64) -> bool {
        match self.last_emit {
            Some(last) if now_ms.saturating_sub(last) < self.interval_ms => false,
            _ => {
                self.last_emit = Some(now_ms);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last_emit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{
        reduce, FrameThrottle, InteractionEvent, InteractionState, PointerMapping,
        PointerPosition, PointerTarget, ResizeHandle, Transition, MAX_GESTURE_SHIFT_MINUTES,
    };
    use crate::edit::coordinator::{ProposedEdit, ReshapeKind};
    use crate::model::item::{CalendarItem, MINUTE_MS};

    // One pixel per minute, 400 px rows, 15 minute grid.
    fn mapping() -> PointerMapping {
        PointerMapping::new(1.0, 400.0, 15)
    }

    fn item() -> CalendarItem {
        CalendarItem::new("review", 540 * MINUTE_MS, 600 * MINUTE_MS)
    }

    #[test]
    fn snapped_minutes_round_to_grid() {
        let mapping = mapping();
        assert_eq!(mapping.snapped_minutes(7.0), 0);
        assert_eq!(mapping.snapped_minutes(8.0), 15);
        assert_eq!(mapping.snapped_minutes(-22.0), -15);
        assert_eq!(mapping.percent(100.0), 25.0);
    }

    #[test]
    fn drag_previews_then_commits_move() {
        let origin = item();
        let down = InteractionEvent::PointerDown {
            item: origin.clone(),
            target: PointerTarget::Body,
            position: PointerPosition::new(10.0, 10.0),
        };
        let (state, transition) = reduce(InteractionState::Idle, down, &mapping());
        assert_eq!(transition, Transition::None);

        let moved = InteractionEvent::PointerMove {
            position: PointerPosition::new(10.0, 70.0),
            timestamp: 1,
        };
        let (state, transition) = reduce(state, moved, &mapping());
        match transition {
            Transition::Preview(preview) => assert_eq!(preview.start, 600 * MINUTE_MS),
            other => panic!("expected preview, got {other:?}"),
        }

        let up = InteractionEvent::PointerUp {
            position: PointerPosition::new(10.0, 70.0),
            timestamp: 2,
        };
        let (state, transition) = reduce(state, up, &mapping());
        assert!(state.is_idle());
        match transition {
            Transition::Commit { edit, origin: from, timestamp } => {
                assert_eq!(from, origin);
                assert_eq!(timestamp, 2);
                match edit {
                    ProposedEdit::Reshape { kind, after, .. } => {
                        assert_eq!(kind, ReshapeKind::Move);
                        assert_eq!(after.end, 660 * MINUTE_MS);
                    }
                    other => panic!("expected reshape, got {other:?}"),
                }
            }
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn click_without_movement_commits_nothing() {
        let down = InteractionEvent::PointerDown {
            item: item(),
            target: PointerTarget::Handle(ResizeHandle::Bottom),
            position: PointerPosition::default(),
        };
        let (state, _) = reduce(InteractionState::Idle, down, &mapping());
        let up = InteractionEvent::PointerUp {
            position: PointerPosition::new(0.0, 3.0),
            timestamp: 5,
        };
        let (state, transition) = reduce(state, up, &mapping());
        assert!(state.is_idle());
        assert_eq!(transition, Transition::None);
    }

    #[test]
    fn cancel_reverts_to_origin() {
        let origin = item();
        let down = InteractionEvent::PointerDown {
            item: origin.clone(),
            target: PointerTarget::Handle(ResizeHandle::Right),
            position: PointerPosition::default(),
        };
        let (state, _) = reduce(InteractionState::Idle, down, &mapping());
        let (state, transition) = reduce(state, InteractionEvent::Cancel, &mapping());
        assert!(state.is_idle());
        assert_eq!(transition, Transition::Revert(origin));
    }

    #[test]
    fn drag_clamps_to_row() {
        let mut origin = item();
        origin.width = 50.0;
        let down = InteractionEvent::PointerDown {
            item: origin,
            target: PointerTarget::Body,
            position: PointerPosition::default(),
        };
        let (state, _) = reduce(InteractionState::Idle, down, &mapping());
        let moved = InteractionEvent::PointerMove {
            position: PointerPosition::new(1_000.0, 0.0),
            timestamp: 1,
        };
        let (_, transition) = reduce(state, moved, &mapping());
        match transition {
            Transition::Preview(preview) => assert_eq!(preview.x_position, 50.0),
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[test]
    fn huge_pointer_delta_is_capped() {
        let mapping = mapping();
        assert_eq!(mapping.snapped_minutes(1e30), MAX_GESTURE_SHIFT_MINUTES);
        assert_eq!(mapping.snapped_minutes(-1e30), -MAX_GESTURE_SHIFT_MINUTES);

        let origin = item();
        let down = InteractionEvent::PointerDown {
            item: origin.clone(),
            target: PointerTarget::Handle(ResizeHandle::Top),
            position: PointerPosition::default(),
        };
        let (state, _) = reduce(InteractionState::Idle, down, &mapping);
        let moved = InteractionEvent::PointerMove {
            position: PointerPosition::new(0.0, 1e30),
            timestamp: 100,
        };
        let (_, transition) = reduce(state, moved, &mapping);
        match transition {
            Transition::Preview(preview) => assert_eq!(
                preview.start,
                origin.start + MAX_GESTURE_SHIFT_MINUTES * MINUTE_MS
            ),
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[test]
    fn shift_near_time_limit_saturates() {
        let mut origin = item();
        origin.start = i64::MAX - MINUTE_MS * 60;
        origin.end = i64::MAX - 1;
        let down = InteractionEvent::PointerDown {
            item: origin,
            target: PointerTarget::Body,
            position: PointerPosition::default(),
        };
        let (state, _) = reduce(InteractionState::Idle, down, &mapping());
        let up = InteractionEvent::PointerUp {
            position: PointerPosition::new(0.0, 1e30),
            timestamp: 1,
        };
        let (_, transition) = reduce(state, up, &mapping());
        match transition {
            Transition::Commit { edit, .. } => match edit {
                ProposedEdit::Reshape { after, .. } => {
                    assert_eq!(after.start, i64::MAX);
                    assert_eq!(after.end, i64::MAX);
                }
                other => panic!("expected reshape, got {other:?}"),
            },
            other => panic!("expected commit, got {other:?}"),
        }
    }

    #[test]
    fn throttle_admits_one_update_per_frame() {
        let mut throttle = FrameThrottle::new(16);
        assert!(throttle.admit(0));
        assert!(!throttle.admit(10));
        assert!(throttle.admit(16));
        throttle.reset();
        assert!(throttle.admit(17));
    }
}
