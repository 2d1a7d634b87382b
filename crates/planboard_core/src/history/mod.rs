//! Undo/redo history.
//!
//! # Responsibility
//! - Model committed edits as immutable, typed undo records.
//! - Keep per-entity stacks with global chronological undo/redo.

pub mod manager;
pub mod operation;
