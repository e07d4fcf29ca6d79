//! Schema maintenance and introspection
//!
//! Data-driven column maintenance: tables are created with
//! `CREATE TABLE IF NOT EXISTS`, then declarative column lists are compared
//! against `PRAGMA table_info` and missing columns are added via
//! `ALTER TABLE ADD COLUMN`. Custom-field columns accrete over time; this
//! keeps older destination databases usable without hand-written
//! migrations.
//!
//! The same introspection feeds [`ColumnTypeMap`], the read-only snapshot
//! the reconciler consults to decide array-vs-scalar encoding for dynamic
//! member updates.

use crate::Result;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::{info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Declared SQL type; `TEXT[]` marks an array-encoded text column
    pub sql_type: String,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            default_value: None,
        }
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Actual column from database introspection (PRAGMA table_info result)
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub pk: bool,
}

/// Read actual columns from a table using PRAGMA table_info
pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
    let query = format!("PRAGMA table_info(\"{}\")", table_name);
    let rows = sqlx::query(&query).fetch_all(pool).await?;

    let mut columns: Vec<ActualColumn> = rows
        .iter()
        .map(|row| ActualColumn {
            cid: row.get("cid"),
            name: row.get("name"),
            type_name: row.get("type"),
            not_null: row.get::<i32, _>("notnull") != 0,
            pk: row.get::<i32, _>("pk") != 0,
        })
        .collect();

    columns.sort_by_key(|c| c.cid);

    Ok(columns)
}

/// Check if a table exists
pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name = ?
        )
        "#,
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Add any expected columns missing from the table.
///
/// Only additions are automatic; type or constraint changes require manual
/// intervention and are logged.
pub async fn sync_table_columns(
    pool: &SqlitePool,
    table_name: &str,
    expected: &[ColumnDefinition],
) -> Result<()> {
    if !table_exists(pool, table_name).await? {
        warn!(
            "Table '{}' does not exist - expected CREATE TABLE IF NOT EXISTS to run first",
            table_name
        );
        return Ok(());
    }

    let actual = introspect_table(pool, table_name).await?;

    for expected_col in expected {
        if let Some(actual_col) = actual.iter().find(|c| c.name == expected_col.name) {
            if !actual_col.type_name.eq_ignore_ascii_case(&expected_col.sql_type) {
                warn!(
                    "Type mismatch in {}.{}: expected '{}', found '{}'. Manual migration required.",
                    table_name, expected_col.name, expected_col.sql_type, actual_col.type_name
                );
            }
        } else {
            add_column(pool, table_name, expected_col).await?;
        }
    }

    Ok(())
}

/// Add a missing column via ALTER TABLE ADD COLUMN
async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
    // Array-marked type names ("TEXT[]") must be quoted to tokenize
    let type_sql = if column.sql_type.ends_with("[]") {
        format!("\"{}\"", column.sql_type)
    } else {
        column.sql_type.clone()
    };
    let mut sql = format!(
        "ALTER TABLE \"{}\" ADD COLUMN \"{}\" {}",
        table, column.name, type_sql
    );
    if let Some(default) = &column.default_value {
        sql.push_str(&format!(" DEFAULT {}", default));
    }

    info!("Adding column: {}.{} ({})", table, column.name, column.sql_type);

    match sqlx::query(&sql).execute(pool).await {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
            // Concurrent initialization - column added by another connection
            info!(
                "Column {}.{} already added (concurrent initialization)",
                table, column.name
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Read-only snapshot of column encodings for one table.
///
/// Loaded once at store construction and shared immutably afterwards.
/// When introspection fails the snapshot assumes scalar encoding for every
/// column, an explicit and logged fallback branch.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeMap {
    array_columns: HashMap<String, bool>,
}

impl ColumnTypeMap {
    /// Load the encoding snapshot for the named columns of a table
    pub async fn load(pool: &SqlitePool, table_name: &str, columns: &[&str]) -> Self {
        match introspect_table(pool, table_name).await {
            Ok(actual) => {
                let mut array_columns = HashMap::new();
                for column in columns {
                    let is_array = actual
                        .iter()
                        .find(|c| c.name == *column)
                        .map(|c| c.type_name.trim_end().ends_with("[]"))
                        .unwrap_or(false);
                    array_columns.insert((*column).to_string(), is_array);
                }
                Self { array_columns }
            }
            Err(err) => {
                warn!(
                    "Failed to read column types for {}: {} - assuming scalar columns",
                    table_name, err
                );
                let array_columns = columns
                    .iter()
                    .map(|c| ((*c).to_string(), false))
                    .collect();
                Self { array_columns }
            }
        }
    }

    /// Whether the column stores values array-encoded
    pub fn is_array(&self, column: &str) -> bool {
        self.array_columns.get(column).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_introspect_table() {
        let pool = setup_test_db().await;

        sqlx::query(
            r#"
            CREATE TABLE test_table (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                tags "TEXT[]"
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let columns = introspect_table(&pool, "test_table").await.unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].pk);
        assert_eq!(columns[1].name, "name");
        assert!(columns[1].not_null);
        assert_eq!(columns[2].type_name, "TEXT[]");
    }

    #[tokio::test]
    async fn test_sync_adds_missing_column() {
        let pool = setup_test_db().await;

        sqlx::query("CREATE TABLE test_table (id TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();

        let expected = vec![
            ColumnDefinition::new("id", "TEXT"),
            ColumnDefinition::new("status", "TEXT").default("'pending'"),
        ];

        sync_table_columns(&pool, "test_table", &expected)
            .await
            .unwrap();

        let columns = introspect_table(&pool, "test_table").await.unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].name, "status");

        // Second sync is a no-op
        sync_table_columns(&pool, "test_table", &expected)
            .await
            .unwrap();
        let columns = introspect_table(&pool, "test_table").await.unwrap();
        assert_eq!(columns.len(), 2);
    }

    #[tokio::test]
    async fn test_column_type_map_detects_arrays() {
        let pool = setup_test_db().await;

        sqlx::query(
            r#"
            CREATE TABLE members (
                id TEXT PRIMARY KEY,
                "Subject" "TEXT[]",
                "MemberStatus" TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let types = ColumnTypeMap::load(&pool, "members", &["Subject", "MemberStatus"]).await;
        assert!(types.is_array("Subject"));
        assert!(!types.is_array("MemberStatus"));
        // Unknown columns default to scalar
        assert!(!types.is_array("Fees"));
    }

    #[tokio::test]
    async fn test_column_type_map_fallback_on_missing_table() {
        let pool = setup_test_db().await;
        let types = ColumnTypeMap::load(&pool, "no_such_table", &["Subject"]).await;
        assert!(!types.is_array("Subject"));
    }
}
