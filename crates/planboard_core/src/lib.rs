//! Calendar planboard engine.
//! Conflict detection, auto-layout, undo/redo and dirty tracking for
//! time-blocked calendar items. Hosts own rendering and persistence.

pub mod config;
pub mod conflict;
pub mod dirty;
pub mod edit;
pub mod history;
pub mod layout;
pub mod logging;
pub mod model;

pub use config::{ConfigError, EngineConfig};
pub use conflict::cluster::{
    detect_conflicts, detect_conflicts_json, ConflictEvent, ConflictGroup, Severity,
};
pub use conflict::interval::{overlaps, placement_overlaps, time_overlaps};
pub use dirty::buffer::{DirtyBuffer, DirtyState};
pub use edit::coordinator::{
    CommitOutcome, EditEngine, InteractionEffect, NullTaskLinks, ProposedEdit, ReshapeKind,
    TaskLinks,
};
pub use edit::interaction::{
    FrameThrottle, InteractionEvent, InteractionState, PointerMapping, PointerPosition,
    PointerTarget, ResizeHandle,
};
pub use edit::validation::EditError;
pub use history::manager::{UndoManager, UndoState, DEFAULT_HISTORY_LIMIT};
pub use history::operation::{Change, UndoOperation};
pub use layout::heuristic::{
    apply_layout_suggestion, auto_layout_all_conflicts, generate_layout_suggestion,
    LayoutAssignment, LayoutKind, LayoutSuggestion,
};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::item::{
    CalendarItem, Geometry, ItemId, ItemValidationError, Placement, TaskId, TimeSpan,
};

/// Minimal health-check API for host wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the engine crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
