//! Per-entity event handlers
//!
//! Each handler parses its payload, runs the transform, and hands the
//! result to the store. Handlers are logically sequential per event; a
//! handler error fails that one event and nothing else.

pub mod attendance;
pub mod cohort;
pub mod cohort_member;
pub mod project;
pub mod tracking;
pub mod user;
