//! Calendar item domain model.
//!
//! # Responsibility
//! - Define the scheduled entity shared by clustering, layout and edit flows.
//! - Provide the time/placement projections that undo records carry.
//!
//! # Invariants
//! - `end` is strictly greater than `start` (both Unix epoch milliseconds).
//! - `x_position >= 0`, `width > 0` and `x_position + width <= 100`.
//! - `id` is stable and never reused for another item.
//!
//! # See also
//! - `history::operation` for the snapshot payloads built from these types.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one calendar item.
pub type ItemId = Uuid;

/// Stable identifier of a backlog task that can be scheduled onto the calendar.
pub type TaskId = Uuid;

/// Full row width in percent.
pub const FULL_WIDTH: f64 = 100.0;

/// Milliseconds per minute.
pub const MINUTE_MS: i64 = 60_000;

// Pointer-derived percentages accumulate float noise; bounds checks allow this much slack.
const PLACEMENT_EPSILON: f64 = 1e-9;

/// Validation failures for a single item snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemValidationError {
    /// `end` is not strictly after `start`.
    InvalidTimeWindow { start: i64, end: i64 },
    /// `x_position` or `width` is NaN or infinite.
    NonFinitePlacement,
    /// `x_position` is below zero.
    NegativePosition(f64),
    /// `width` is zero or negative.
    NonPositiveWidth(f64),
    /// The item extends past the right edge of the row.
    PlacementOverflow { x_position: f64, width: f64 },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeWindow { start, end } => {
                write!(f, "end ({end}) must be after start ({start})")
            }
            Self::NonFinitePlacement => write!(f, "position and width must be finite numbers"),
            Self::NegativePosition(x) => write!(f, "position ({x}%) must not be negative"),
            Self::NonPositiveWidth(width) => write!(f, "width ({width}%) must be positive"),
            Self::PlacementOverflow { x_position, width } => write!(
                f,
                "position ({x_position}%) plus width ({width}%) must not exceed 100%"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// Half-open time window `[start, end)` in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: i64,
    pub end: i64,
}

impl TimeSpan {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Length in milliseconds; wide enough for any pair of `i64` instants.
    pub fn duration_ms(&self) -> i128 {
        i128::from(self.end) - i128::from(self.start)
    }

    /// Length in whole minutes, rounded toward zero.
    pub fn duration_minutes(&self) -> i64 {
        let minutes = self.duration_ms() / i128::from(MINUTE_MS);
        i64::try_from(minutes).unwrap_or(if minutes < 0 { i64::MIN } else { i64::MAX })
    }
}

/// Horizontal window `[x_position, x_position + width)` in percent of row width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x_position: f64,
    pub width: f64,
}

impl Placement {
    /// Full-row placement used when an item was never laid out.
    pub const FULL: Placement = Placement {
        x_position: 0.0,
        width: FULL_WIDTH,
    };

    pub fn new(x_position: f64, width: f64) -> Self {
        Self { x_position, width }
    }

    /// Right edge in percent.
    pub fn right(&self) -> f64 {
        self.x_position + self.width
    }

    /// Checks the row bounds shared by every item.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if !self.x_position.is_finite() || !self.width.is_finite() {
            return Err(ItemValidationError::NonFinitePlacement);
        }
        if self.x_position < -PLACEMENT_EPSILON {
            return Err(ItemValidationError::NegativePosition(self.x_position));
        }
        if self.width <= 0.0 {
            return Err(ItemValidationError::NonPositiveWidth(self.width));
        }
        if self.right() > FULL_WIDTH + PLACEMENT_EPSILON {
            return Err(ItemValidationError::PlacementOverflow {
                x_position: self.x_position,
                width: self.width,
            });
        }
        Ok(())
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::FULL
    }
}

/// Combined time and horizontal window, carried by move and corner-resize records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub start: i64,
    pub end: i64,
    pub x_position: f64,
    pub width: f64,
}

impl Geometry {
    pub fn time_span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }

    pub fn placement(&self) -> Placement {
        Placement::new(self.x_position, self.width)
    }
}

/// The scheduled entity rendered on the calendar grid.
///
/// The item set is owned by the host UI store. Core code only reads
/// snapshots and returns new attribute values; it never persists items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarItem {
    /// Stable ID shared with the host store.
    pub id: ItemId,
    /// Display title. Not interpreted by core.
    #[serde(default)]
    pub title: String,
    /// Unix epoch milliseconds, inclusive.
    pub start: i64,
    /// Unix epoch milliseconds, exclusive. Must be > `start`.
    pub end: i64,
    /// Left edge in percent of row width.
    #[serde(default)]
    pub x_position: f64,
    /// Width in percent of row width.
    #[serde(default = "default_width")]
    pub width: f64,
    /// Backlog task this item was scheduled from, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_task_id: Option<TaskId>,
}

fn default_width() -> f64 {
    FULL_WIDTH
}

impl CalendarItem {
    /// Creates a full-width item with a generated stable ID.
    pub fn new(title: impl Into<String>, start: i64, end: i64) -> Self {
        Self::with_id(Uuid::new_v4(), title, start, end)
    }

    /// Creates a full-width item with a caller-provided ID.
    ///
    /// Used when identity already exists in the host store. Does not validate.
    pub fn with_id(id: ItemId, title: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            id,
            title: title.into(),
            start,
            end,
            x_position: 0.0,
            width: FULL_WIDTH,
            source_task_id: None,
        }
    }

    /// Checks the time window and row bounds.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.end <= self.start {
            return Err(ItemValidationError::InvalidTimeWindow {
                start: self.start,
                end: self.end,
            });
        }
        self.placement().validate()
    }

    pub fn duration_minutes(&self) -> i64 {
        self.time_span().duration_minutes()
    }

    pub fn time_span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }

    pub fn placement(&self) -> Placement {
        Placement::new(self.x_position, self.width)
    }

    pub fn geometry(&self) -> Geometry {
        Geometry {
            start: self.start,
            end: self.end,
            x_position: self.x_position,
            width: self.width,
        }
    }

    /// Returns a copy moved to `span`, placement unchanged.
    pub fn with_time_span(&self, span: TimeSpan) -> Self {
        Self {
            start: span.start,
            end: span.end,
            ..self.clone()
        }
    }

    /// Returns a copy with `placement`, time window unchanged.
    pub fn with_placement(&self, placement: Placement) -> Self {
        Self {
            x_position: placement.x_position,
            width: placement.width,
            ..self.clone()
        }
    }

    /// Returns a copy with both windows replaced.
    pub fn with_geometry(&self, geometry: Geometry) -> Self {
        Self {
            start: geometry.start,
            end: geometry.end,
            x_position: geometry.x_position,
            width: geometry.width,
            ..self.clone()
        }
    }
}
