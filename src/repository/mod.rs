//! Persistent, filesystem-backed state that outlives a single task run.

pub mod reflection_cache;
