//! Edit validation rules.
//!
//! # Responsibility
//! - Decide whether a proposed snapshot may become a committed edit.
//! - Produce user-facing messages naming the violated constraint.
//!
//! # Invariants
//! - Validation is pure; a rejected edit leaves every store untouched.
//! - Duration bounds are inclusive on both ends.

use crate::config::EngineConfig;
use crate::model::item::{
    CalendarItem, ItemId, ItemValidationError, Placement, TimeSpan, MINUTE_MS,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reasons a proposed edit is rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    /// The resulting snapshot breaks a basic item invariant.
    InvalidItem(ItemValidationError),
    DurationTooShort { minutes: i64, min_minutes: i64 },
    DurationTooLong { minutes: i64, max_minutes: i64 },
    /// `before` and `after` describe different entities.
    IdMismatch { before: ItemId, after: ItemId },
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidItem(err) => write!(f, "{err}"),
            Self::DurationTooShort {
                minutes,
                min_minutes,
            } => write!(
                f,
                "duration of {minutes} minutes is shorter than the minimum of {min_minutes} minutes"
            ),
            Self::DurationTooLong {
                minutes,
                max_minutes,
            } => write!(
                f,
                "duration of {minutes} minutes is longer than the maximum of {max_minutes} minutes"
            ),
            Self::IdMismatch { before, after } => {
                write!(f, "edit changes item identity from {before} to {after}")
            }
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidItem(err) => Some(err),
            Self::DurationTooShort { .. }
            | Self::DurationTooLong { .. }
            | Self::IdMismatch { .. } => None,
        }
    }
}

impl From<ItemValidationError> for EditError {
    fn from(value: ItemValidationError) -> Self {
        Self::InvalidItem(value)
    }
}

/// Checks `span` against the configured duration bounds.
pub fn validate_duration(span: TimeSpan, config: &EngineConfig) -> Result<(), EditError> {
    if span.end <= span.start {
        return Err(ItemValidationError::InvalidTimeWindow {
            start: span.start,
            end: span.end,
        }
        .into());
    }
    let duration_ms = span.duration_ms();
    let minute_ms = i128::from(MINUTE_MS);
    if duration_ms < i128::from(config.min_duration_minutes) * minute_ms {
        return Err(EditError::DurationTooShort {
            minutes: span.duration_minutes(),
            min_minutes: config.min_duration_minutes,
        });
    }
    if duration_ms > i128::from(config.max_duration_minutes) * minute_ms {
        return Err(EditError::DurationTooLong {
            minutes: span.duration_minutes(),
            max_minutes: config.max_duration_minutes,
        });
    }
    Ok(())
}

/// Checks row bounds: `0 <= x`, `width > 0`, `x + width <= 100`.
pub fn validate_placement(placement: Placement) -> Result<(), EditError> {
    placement.validate().map_err(EditError::from)
}

/// Checks every rule a committed snapshot must satisfy.
pub fn validate_item(item: &CalendarItem, config: &EngineConfig) -> Result<(), EditError> {
    validate_duration(item.time_span(), config)?;
    validate_placement(item.placement())
}

/// Rejects edits whose two sides name different items.
pub fn ensure_same_item(before: &CalendarItem, after: &CalendarItem) -> Result<(), EditError> {
    if before.id != after.id {
        return Err(EditError::IdMismatch {
            before: before.id,
            after: after.id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_duration, validate_placement, EditError};
    use crate::config::EngineConfig;
    use crate::model::item::{ItemValidationError, Placement, TimeSpan, MINUTE_MS};

    #[test]
    fn duration_bounds_are_inclusive() {
        let config = EngineConfig::default();
        assert!(validate_duration(TimeSpan::new(0, 15 * MINUTE_MS), &config).is_ok());
        assert!(validate_duration(TimeSpan::new(0, 1440 * MINUTE_MS), &config).is_ok());
        assert_eq!(
            validate_duration(TimeSpan::new(0, 1441 * MINUTE_MS), &config),
            Err(EditError::DurationTooLong {
                minutes: 1441,
                max_minutes: 1440
            })
        );
    }

    #[test]
    fn ten_minutes_is_too_short() {
        let err = validate_duration(TimeSpan::new(0, 10 * MINUTE_MS), &EngineConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            EditError::DurationTooShort {
                minutes: 10,
                min_minutes: 15
            }
        );
        assert!(err.to_string().contains("minimum of 15 minutes"));
    }

    #[test]
    fn extreme_window_is_too_long_not_a_panic() {
        let span = TimeSpan::new(-(1 << 62), 1 << 62);
        let err = validate_duration(span, &EngineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            EditError::DurationTooLong {
                minutes: 153_722_867_280_912,
                max_minutes: 1440
            }
        );
    }

    #[test]
    fn placement_past_right_edge_is_rejected() {
        let err = validate_placement(Placement::new(60.0, 50.0)).unwrap_err();
        assert_eq!(
            err,
            EditError::InvalidItem(ItemValidationError::PlacementOverflow {
                x_position: 60.0,
                width: 50.0
            })
        );
    }
}
