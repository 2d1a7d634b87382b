//! Auto-layout of conflicting items.

pub mod heuristic;
