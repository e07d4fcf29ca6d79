//! # EdSync Backfill
//!
//! One-shot historical migration: reads source snapshot files and runs the
//! same transform-and-reconcile logic as the live path, one entity family
//! per subcommand. A single bad record never aborts a run; every runner
//! ends with a counted summary.

pub mod runners;
pub mod source;
