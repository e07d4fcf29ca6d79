//! User profile reconciliation

use crate::db::models::{UpsertOutcome, UserRecord};
use crate::db::store::{excluded_set_clause_for, SyncStore};
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::debug;

impl SyncStore {
    /// Full-record user upsert keyed on UserID.
    ///
    /// The user transform emits the complete mapped column set (explicit
    /// nulls included), so conflicts refresh every mapped column.
    pub async fn upsert_user(&self, user: &UserRecord) -> Result<UpsertOutcome> {
        let existed = self.user_exists(&user.user_id).await?;

        let sql = format!(
            r#"INSERT INTO "Users" ("UserID", {columns}) VALUES (?, {placeholders})
               ON CONFLICT("UserID") DO UPDATE SET {updates}"#,
            columns = user.columns.insert_columns(),
            placeholders = user.columns.placeholders(),
            updates = excluded_set_clause_for(&user.columns),
        );

        let query = sqlx::query(&sql).bind(&user.user_id);
        user.columns.bind_all(query).execute(&self.pool).await?;

        debug!("Upserted user {}", user.user_id);

        Ok(if existed {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }

    pub async fn user_exists(&self, user_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM "Users" WHERE "UserID" = ?)"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Remove a user row; returns whether a row was deleted
    pub async fn delete_user(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM "Users" WHERE "UserID" = ?"#)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamp the user's last login; missing timestamp means "now"
    pub async fn update_user_last_login(
        &self,
        user_id: &str,
        last_login: Option<DateTime<Utc>>,
    ) -> Result<u64> {
        let when = last_login.unwrap_or_else(Utc::now);
        let result =
            sqlx::query(r#"UPDATE "Users" SET "UserLastLogin" = ? WHERE "UserID" = ?"#)
                .bind(when)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
