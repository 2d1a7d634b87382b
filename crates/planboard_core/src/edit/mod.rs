//! Edit pipeline: validation, pointer interaction and commit.
//!
//! # Responsibility
//! - Turn pointer gestures and form edits into validated, recorded changes.
//!
//! # See also
//! - [`crate::history`] for the undo log and [`crate::dirty`] for save state.

pub mod coordinator;
pub mod interaction;
pub mod validation;
