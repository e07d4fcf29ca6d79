//! Cohort membership reconciliation

use crate::db::models::{CohortMemberRecord, CohortMemberRow, UpsertOutcome};
use crate::db::patch::{RowPatch, SqlValue};
use crate::db::store::SyncStore;
use crate::{Result, uuid_utils};
use serde_json::json;
use tracing::{debug, info};

impl SyncStore {
    pub async fn find_cohort_member(
        &self,
        user_id: &str,
        cohort_id: &str,
    ) -> Result<Option<CohortMemberRow>> {
        let row = sqlx::query_as::<_, CohortMemberRow>(
            r#"SELECT "CohortMemberID", "UserID", "CohortID", "MemberStatus", "AcademicYearID"
               FROM "CohortMember" WHERE "UserID" = ? AND "CohortID" = ?"#,
        )
        .bind(user_id)
        .bind(cohort_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn find_cohort_member_by_id(
        &self,
        cohort_member_id: &str,
    ) -> Result<Option<CohortMemberRow>> {
        let row = sqlx::query_as::<_, CohortMemberRow>(
            r#"SELECT "CohortMemberID", "UserID", "CohortID", "MemberStatus", "AcademicYearID"
               FROM "CohortMember" WHERE "CohortMemberID" = ?"#,
        )
        .bind(cohort_member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Reconcile a membership by its (UserID, CohortID) natural key:
    /// identical rows are a no-op, differing rows update only status and
    /// academic year, absent rows insert.
    pub async fn upsert_cohort_member(
        &self,
        member: &CohortMemberRecord,
    ) -> Result<UpsertOutcome> {
        if let Some(existing) = self
            .find_cohort_member(&member.user_id, &member.cohort_id)
            .await?
        {
            let unchanged = existing.member_status.as_deref() == Some(&member.member_status)
                && existing.academic_year_id == member.academic_year_id;
            if unchanged {
                debug!(
                    "User {} already in cohort {} with the same status",
                    member.user_id, member.cohort_id
                );
                return Ok(UpsertOutcome::Unchanged);
            }

            sqlx::query(
                r#"UPDATE "CohortMember" SET "MemberStatus" = ?, "AcademicYearID" = ?
                   WHERE "UserID" = ? AND "CohortID" = ?"#,
            )
            .bind(&member.member_status)
            .bind(&member.academic_year_id)
            .bind(&member.user_id)
            .bind(&member.cohort_id)
            .execute(&self.pool)
            .await?;

            return Ok(UpsertOutcome::Updated);
        }

        let member_id = member
            .cohort_member_id
            .clone()
            .unwrap_or_else(|| uuid_utils::generate().to_string());

        let insert = sqlx::query(
            r#"INSERT INTO "CohortMember"
               ("CohortMemberID", "UserID", "CohortID", "MemberStatus", "AcademicYearID")
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(&member_id)
        .bind(&member.user_id)
        .bind(&member.cohort_id)
        .bind(&member.member_status)
        .bind(&member.academic_year_id)
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => {
                info!(
                    "Created cohort member entry for user {} in cohort {}",
                    member.user_id, member.cohort_id
                );
                Ok(UpsertOutcome::Inserted)
            }
            // Lost an insert race for a brand-new pair; the constraint
            // decided the winner, fall back to the update path
            Err(err) if Self::is_unique_violation(&err) => {
                sqlx::query(
                    r#"UPDATE "CohortMember" SET "MemberStatus" = ?, "AcademicYearID" = ?
                       WHERE "UserID" = ? AND "CohortID" = ?"#,
                )
                .bind(&member.member_status)
                .bind(&member.academic_year_id)
                .bind(&member.user_id)
                .bind(&member.cohort_id)
                .execute(&self.pool)
                .await?;
                Ok(UpsertOutcome::Updated)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Update membership status by the natural key
    pub async fn update_cohort_member_status(
        &self,
        user_id: &str,
        cohort_id: &str,
        status: &str,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"UPDATE "CohortMember" SET "MemberStatus" = ?
               WHERE "UserID" = ? AND "CohortID" = ?"#,
        )
        .bind(status)
        .bind(user_id)
        .bind(cohort_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Apply an allow-listed custom-field patch to one membership row.
    ///
    /// Array-encoded columns (per the startup column-type snapshot) have
    /// their scalar values wrapped as single-element arrays so the original
    /// wire value survives verbatim.
    pub async fn update_member_fields(
        &self,
        cohort_member_id: &str,
        fields: &RowPatch,
    ) -> Result<u64> {
        if fields.is_empty() {
            return Ok(0);
        }

        let mut encoded = RowPatch::new(crate::db::columns::MEMBER_PATCH_COLUMNS);
        for column in fields.column_names().collect::<Vec<_>>() {
            let value = fields.get(column).cloned().unwrap_or(SqlValue::Null);
            let value = if self.member_column_types().is_array(column) {
                match value {
                    SqlValue::Text(s) => SqlValue::Json(json!([s])),
                    other => other,
                }
            } else {
                value
            };
            encoded.set(column, value)?;
        }

        let sql = format!(
            r#"UPDATE "CohortMember" SET {set_clause} WHERE "CohortMemberID" = ?"#,
            set_clause = encoded.set_clause(),
        );

        debug!(
            "Updating CohortMember fields | cohortMembershipId={} | keys={}",
            cohort_member_id,
            encoded.column_names().collect::<Vec<_>>().join(",")
        );

        let query = encoded.bind_all(sqlx::query(&sql)).bind(cohort_member_id);
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
