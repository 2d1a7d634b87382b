//! Unsaved-changes tracking that gates persistence.

pub mod buffer;
