//! The record reconciler (upsert engine)
//!
//! One [`SyncStore`] per destination database. Every operation reconciles
//! by natural key and reports whether it inserted, updated or left the row
//! unchanged. Dynamic column sets are always [`RowPatch`]es validated
//! against the entity's allow-list, and partial updates never touch
//! columns the caller did not supply.
//!
//! Concurrency: callers keep operations for the same natural key
//! sequential. Two first-inserts for a brand-new key may still race across
//! workers; the destination's uniqueness constraints decide the winner and
//! the loser falls back to an update.

mod attendance;
mod cohorts;
mod members;
mod projects;
mod registration;
mod trackers;
mod users;

pub use crate::db::models::UpsertOutcome;

use crate::db::columns::MEMBER_PATCH_COLUMNS;
use crate::db::patch::RowPatch;
use crate::db::schema::ColumnTypeMap;
use sqlx::SqlitePool;

/// Reconciling facade over the destination database
#[derive(Debug, Clone)]
pub struct SyncStore {
    pool: SqlitePool,
    /// Immutable column-encoding snapshot, loaded once at construction
    member_column_types: ColumnTypeMap,
}

impl SyncStore {
    /// Build a store over an initialized destination pool.
    ///
    /// Loads the CohortMember column-type snapshot up front; if
    /// introspection fails the snapshot falls back to scalar encoding for
    /// every column (logged inside the loader).
    pub async fn new(pool: SqlitePool) -> Self {
        let member_column_types =
            ColumnTypeMap::load(&pool, "CohortMember", MEMBER_PATCH_COLUMNS).await;
        Self {
            pool,
            member_column_types,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn member_column_types(&self) -> &ColumnTypeMap {
        &self.member_column_types
    }

    /// True when a sqlx error is a uniqueness-constraint violation, i.e. the
    /// losing side of an insert race
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        match err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                message.contains("UNIQUE constraint failed")
                    || message.contains("PRIMARY KEY constraint failed")
            }
            _ => false,
        }
    }
}

/// Summary of one project-scope task reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskReconcileSummary {
    pub deleted: u64,
    pub upserted: usize,
    pub errors: usize,
}

/// Render `"col" = excluded."col"` fragments for an ON CONFLICT clause
pub(crate) fn excluded_set_clause(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("\"{c}\" = excluded.\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render `"col" = excluded."col"` fragments from a patch's column set
pub(crate) fn excluded_set_clause_for(patch: &RowPatch) -> String {
    patch
        .column_names()
        .map(|c| format!("\"{c}\" = excluded.\"{c}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
