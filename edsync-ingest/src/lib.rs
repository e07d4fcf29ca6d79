//! # EdSync Ingest
//!
//! Live-mode synchronization: consumes already-parsed domain events and
//! reconciles each against the destination store. Transport plumbing is
//! upstream; this crate starts at (topic, message) pairs.

pub mod dispatch;
pub mod handlers;
pub mod stream;
