//! Calendar domain model.
//!
//! # Responsibility
//! - Define the canonical item shape consumed by conflict, layout and edit code.
//! - Keep time and horizontal placement as plain values with explicit validation.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - Times are Unix epoch milliseconds; placement is percent of row width.

pub mod item;
