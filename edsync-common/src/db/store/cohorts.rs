//! Cohort reconciliation

use crate::db::models::{CohortRecord, CohortRow, UpsertOutcome};
use crate::db::patch::RowPatch;
use crate::db::store::SyncStore;
use crate::Result;
use tracing::debug;

impl SyncStore {
    pub async fn find_cohort(&self, cohort_id: &str) -> Result<Option<CohortRow>> {
        let row = sqlx::query_as::<_, CohortRow>(
            r#"SELECT "CohortID", "TenantID", "CohortName", "ParentID", "Type", "Status"
               FROM "Cohort" WHERE "CohortID" = ?"#,
        )
        .bind(cohort_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Upsert a cohort: core identity columns first, then the
    /// custom-field patch. The patch update sets only the columns the
    /// transform resolved; everything else keeps its stored value.
    pub async fn upsert_cohort(&self, cohort: &CohortRecord) -> Result<UpsertOutcome> {
        let existed = self.find_cohort(&cohort.cohort_id).await?.is_some();

        sqlx::query(
            r#"INSERT INTO "Cohort" ("CohortID", "TenantID", "CohortName", "CreatedOn", "ParentID")
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT("CohortID") DO UPDATE SET
                   "TenantID" = excluded."TenantID",
                   "CohortName" = excluded."CohortName",
                   "CreatedOn" = excluded."CreatedOn",
                   "ParentID" = excluded."ParentID",
                   "updatedAt" = CURRENT_TIMESTAMP"#,
        )
        .bind(&cohort.cohort_id)
        .bind(&cohort.tenant_id)
        .bind(&cohort.cohort_name)
        .bind(cohort.created_on)
        .bind(&cohort.parent_id)
        .execute(&self.pool)
        .await?;

        if !cohort.fields.is_empty() {
            self.update_cohort_fields(&cohort.cohort_id, &cohort.fields)
                .await?;
        }

        debug!("Upserted cohort {}", cohort.cohort_id);

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    /// Partial-column cohort update from an allow-listed patch
    pub async fn update_cohort_fields(&self, cohort_id: &str, fields: &RowPatch) -> Result<u64> {
        if fields.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"UPDATE "Cohort" SET {set_clause}, "updatedAt" = CURRENT_TIMESTAMP
               WHERE "CohortID" = ?"#,
            set_clause = fields.set_clause(),
        );

        let query = fields.bind_all(sqlx::query(&sql)).bind(cohort_id);
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Remove a cohort row; returns whether a row was deleted
    pub async fn delete_cohort(&self, cohort_id: &str) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM "Cohort" WHERE "CohortID" = ?"#)
            .bind(cohort_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Parent-type lookup for live-mode child classification: reads the
    /// previously-migrated parent cohort's stored type
    pub async fn lookup_cohort_type(&self, cohort_id: &str) -> Result<Option<String>> {
        Ok(self
            .find_cohort(cohort_id)
            .await?
            .and_then(|row| row.cohort_type))
    }
}
