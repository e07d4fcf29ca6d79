//! Registration tracker reconciliation

use crate::db::models::{RegistrationRecord, RegistrationStatusUpdate, UpsertOutcome};
use crate::db::store::SyncStore;
use crate::{uuid_utils, Error, Result};
use tracing::debug;

impl SyncStore {
    /// Update-if-exists-else-insert keyed on (UserID, RoleID, TenantID)
    pub async fn upsert_registration(
        &self,
        registration: &RegistrationRecord,
    ) -> Result<UpsertOutcome> {
        let updated = self.update_registration_row(registration).await?;
        if updated > 0 {
            return Ok(UpsertOutcome::Updated);
        }

        let insert = sqlx::query(
            r#"INSERT INTO "RegistrationTracker"
               ("REGID", "UserID", "RoleID", "TenantID",
                "PlatformRegnDate", "TenantRegnDate", "IsActive", "Reason")
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(uuid_utils::generate().to_string())
        .bind(&registration.user_id)
        .bind(&registration.role_id)
        .bind(&registration.tenant_id)
        .bind(registration.platform_regn_date)
        .bind(registration.tenant_regn_date)
        .bind(registration.is_active)
        .bind(&registration.reason)
        .execute(&self.pool)
        .await;

        match insert {
            Ok(_) => {
                debug!(
                    "Inserted registration for user {} role {} tenant {}",
                    registration.user_id, registration.role_id, registration.tenant_id
                );
                Ok(UpsertOutcome::Inserted)
            }
            Err(err) if Self::is_unique_violation(&err) => {
                // Concurrent first registration; re-apply as an update
                self.update_registration_row(registration).await?;
                Ok(UpsertOutcome::Updated)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn update_registration_row(&self, registration: &RegistrationRecord) -> Result<u64> {
        let result = sqlx::query(
            r#"UPDATE "RegistrationTracker"
               SET "PlatformRegnDate" = ?, "TenantRegnDate" = ?, "IsActive" = ?, "Reason" = ?
               WHERE "UserID" = ? AND "RoleID" = ? AND "TenantID" = ?"#,
        )
        .bind(registration.platform_regn_date)
        .bind(registration.tenant_regn_date)
        .bind(registration.is_active)
        .bind(&registration.reason)
        .bind(&registration.user_id)
        .bind(&registration.role_id)
        .bind(&registration.tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Role-less status update: touches every registration row for
    /// (UserID, TenantID). A registration cannot be created without a
    /// role, so zero matching rows is an error for the caller to surface.
    pub async fn update_registrations_for_tenant(
        &self,
        update: &RegistrationStatusUpdate,
    ) -> Result<u64> {
        // Only overwrite the platform date when the caller supplied one
        let mut set_parts = vec![
            "\"IsActive\" = ?".to_string(),
            "\"TenantRegnDate\" = ?".to_string(),
            "\"Reason\" = ?".to_string(),
        ];
        if update.platform_regn_date.is_some() {
            set_parts.push("\"PlatformRegnDate\" = ?".to_string());
        }

        let sql = format!(
            r#"UPDATE "RegistrationTracker" SET {set_clause}
               WHERE "UserID" = ? AND "TenantID" = ?"#,
            set_clause = set_parts.join(", "),
        );

        let mut query = sqlx::query(&sql)
            .bind(update.is_active)
            .bind(update.tenant_regn_date)
            .bind(&update.reason);
        if let Some(platform_date) = update.platform_regn_date {
            query = query.bind(platform_date);
        }
        query = query.bind(&update.user_id).bind(&update.tenant_id);

        let result = query.execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!(
                "Cannot update registration tracker without roleId: no rows for user {} in tenant {}",
                update.user_id, update.tenant_id
            )));
        }

        Ok(result.rows_affected())
    }

    /// Read the active flag of one registration row (tests)
    pub async fn registration_is_active(
        &self,
        user_id: &str,
        role_id: &str,
        tenant_id: &str,
    ) -> Result<Option<bool>> {
        let active: Option<bool> = sqlx::query_scalar(
            r#"SELECT "IsActive" FROM "RegistrationTracker"
               WHERE "UserID" = ? AND "RoleID" = ? AND "TenantID" = ?"#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(active)
    }
}
