//! Conflict detection over calendar items.
//!
//! # Responsibility
//! - Answer pairwise overlap questions for time and horizontal windows.
//! - Cluster items into conflict groups with per-group layout suggestions.

pub mod cluster;
pub mod interval;
