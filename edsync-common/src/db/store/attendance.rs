//! Attendance tracker reconciliation
//!
//! The monthly row is created lazily on the first event for its natural
//! key; every write afterwards touches only the day columns supplied.
//! Update runs before insert so redelivered events and historical rows
//! share one code path.

use crate::db::models::{AttendanceDayRecord, AttendanceMonthRecord, UpsertOutcome};
use crate::db::store::SyncStore;
use crate::{uuid_utils, Result};
use serde_json::Value;
use tracing::debug;

impl SyncStore {
    /// Apply one attendance event: set exactly one day column on the
    /// target monthly row, creating the row when absent.
    pub async fn upsert_attendance_day(
        &self,
        record: &AttendanceDayRecord,
    ) -> Result<UpsertOutcome> {
        let month = AttendanceMonthRecord {
            tenant_id: record.tenant_id.clone(),
            context: record.context.clone(),
            context_id: record.context_id.clone(),
            user_id: record.user_id.clone(),
            year: record.year,
            month: record.month,
            days: vec![(record.day_column, record.day_value.clone())],
        };
        self.upsert_attendance_month(&month).await
    }

    /// Apply a grouped monthly record: update the supplied day columns
    /// only; insert the row with just those days when no row matches.
    pub async fn upsert_attendance_month(
        &self,
        record: &AttendanceMonthRecord,
    ) -> Result<UpsertOutcome> {
        if record.days.is_empty() {
            return Ok(UpsertOutcome::Unchanged);
        }

        let updated = self.update_attendance_days(record).await?;
        if updated > 0 {
            return Ok(UpsertOutcome::Updated);
        }

        match self.insert_attendance_row(record).await {
            Ok(()) => Ok(UpsertOutcome::Inserted),
            // Insert race on a brand-new key: the uniqueness constraint
            // picked a winner, the loser re-applies its day columns
            Err(crate::Error::Database(err)) if Self::is_unique_violation(&err) => {
                self.update_attendance_days(record).await?;
                Ok(UpsertOutcome::Updated)
            }
            Err(err) => Err(err),
        }
    }

    /// Dynamic partial update of the supplied day columns; all other day
    /// columns are left untouched.
    async fn update_attendance_days(&self, record: &AttendanceMonthRecord) -> Result<u64> {
        let set_clause = record
            .days
            .iter()
            .map(|(column, _)| format!("\"{}\" = ?", column))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            r#"UPDATE "AttendanceTracker" SET {set_clause}
               WHERE "TenantID" IS ? AND "Context" IS ? AND "ContextID" IS ?
                 AND "UserID" = ? AND "Year" = ? AND "Month" = ?"#,
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in &record.days {
            query = query.bind(value.to_string());
        }
        query = query
            .bind(&record.tenant_id)
            .bind(&record.context)
            .bind(&record.context_id)
            .bind(&record.user_id)
            .bind(record.year)
            .bind(record.month);

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert_attendance_row(&self, record: &AttendanceMonthRecord) -> Result<()> {
        let mut day_columns: Vec<&str> = record.days.iter().map(|(c, _)| *c).collect();
        day_columns.sort_unstable();

        let columns = day_columns
            .iter()
            .map(|c| format!(", \"{}\"", c))
            .collect::<String>();
        let placeholders = ", ?".repeat(day_columns.len());

        let sql = format!(
            r#"INSERT INTO "AttendanceTracker"
               ("AtndID", "TenantID", "Context", "ContextID", "UserID", "Year", "Month"{columns})
               VALUES (?, ?, ?, ?, ?, ?, ?{placeholders})"#,
        );

        let mut query = sqlx::query(&sql)
            .bind(uuid_utils::generate().to_string())
            .bind(&record.tenant_id)
            .bind(&record.context)
            .bind(&record.context_id)
            .bind(&record.user_id)
            .bind(record.year)
            .bind(record.month);
        for column in &day_columns {
            let value = record
                .days
                .iter()
                .find(|(c, _)| c == column)
                .map(|(_, v)| v.to_string());
            query = query.bind(value);
        }

        query.execute(&self.pool).await?;

        debug!(
            "Inserted attendance row for user {} {}-{:02}",
            record.user_id, record.year, record.month
        );
        Ok(())
    }

    /// Clear one day column (attendance retraction); other days keep their
    /// values
    pub async fn clear_attendance_day(
        &self,
        record: &AttendanceDayRecord,
    ) -> Result<u64> {
        let sql = format!(
            r#"UPDATE "AttendanceTracker" SET "{day}" = NULL
               WHERE "TenantID" IS ? AND "Context" IS ? AND "ContextID" IS ?
                 AND "UserID" = ? AND "Year" = ? AND "Month" = ?"#,
            day = record.day_column,
        );

        let result = sqlx::query(&sql)
            .bind(&record.tenant_id)
            .bind(&record.context)
            .bind(&record.context_id)
            .bind(&record.user_id)
            .bind(record.year)
            .bind(record.month)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Read one day column of a monthly row (diagnostics and tests)
    pub async fn find_attendance_day(
        &self,
        tenant_id: Option<&str>,
        context_id: Option<&str>,
        user_id: &str,
        year: i32,
        month: u32,
        day_column: &'static str,
    ) -> Result<Option<Value>> {
        let sql = format!(
            r#"SELECT "{day_column}" FROM "AttendanceTracker"
               WHERE "TenantID" IS ? AND "ContextID" IS ?
                 AND "UserID" = ? AND "Year" = ? AND "Month" = ?"#,
        );

        let raw: Option<Option<String>> = sqlx::query_scalar(&sql)
            .bind(tenant_id)
            .bind(context_id)
            .bind(user_id)
            .bind(year)
            .bind(month)
            .fetch_optional(&self.pool)
            .await?;

        Ok(raw
            .flatten()
            .and_then(|text| serde_json::from_str(&text).ok()))
    }

    /// Count attendance rows for a natural key prefix (tests)
    pub async fn count_attendance_rows(&self, user_id: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM "AttendanceTracker" WHERE "UserID" = ?"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
