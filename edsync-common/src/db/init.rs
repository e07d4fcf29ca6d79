//! Destination database initialization
//!
//! Creates the destination schema when missing and keeps custom-field
//! columns in sync. Initialization is idempotent: every statement is
//! `CREATE TABLE IF NOT EXISTS` or an additive column sync, so concurrent
//! workers may race through it safely.

use crate::db::schema::{sync_table_columns, ColumnDefinition};
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize the destination database connection and create tables
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new destination database: {}", db_path.display());
    } else {
        info!("Opened destination database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers while one writer holds the lock
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// In-memory destination database with the full schema (tests, dry runs)
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    create_all_tables(&pool).await?;

    Ok(pool)
}

/// Create every destination table and run the column sync pass
pub async fn create_all_tables(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_cohort_table(pool).await?;
    create_cohort_member_table(pool).await?;
    create_attendance_tracker_table(pool).await?;
    create_registration_tracker_table(pool).await?;
    create_project_table(pool).await?;
    create_project_task_table(pool).await?;
    create_project_task_tracking_table(pool).await?;
    create_assessment_tracker_table(pool).await?;
    create_course_tracker_table(pool).await?;
    create_content_tracker_table(pool).await?;

    // Custom-field columns accrete over time; add any the running binary
    // knows about that an older database file lacks
    sync_table_columns(pool, "Cohort", &cohort_field_columns()).await?;
    sync_table_columns(pool, "CohortMember", &member_field_columns()).await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "Users" (
            "UserID" TEXT PRIMARY KEY,
            "UserName" TEXT,
            "UserFullName" TEXT,
            "UserEmail" TEXT,
            "UserDoB" TEXT,
            "UserMobile" TEXT,
            "UserGender" TEXT,
            "UserIsActive" INTEGER,
            "UserStateID" TEXT,
            "UserDistrictID" TEXT,
            "UserBlockID" TEXT,
            "UserVillageID" TEXT,
            "UserPreferredModeOfLearning" TEXT,
            "UserMotherName" TEXT,
            "UserWorkDomain" TEXT,
            "UserFatherName" TEXT,
            "UserSpouseName" TEXT,
            "UserPhoneType" TEXT,
            "UserWhatDoYouWantToBecome" TEXT,
            "UserClass" TEXT,
            "UserPreferredLanguage" TEXT,
            "UserParentPhone" TEXT,
            "UserGuardianRelation" TEXT,
            "UserGuardianName" TEXT,
            "UserSubjectTaught" TEXT,
            "UserMaritalStatus" TEXT,
            "UserGrade" TEXT,
            "UserTrainingCheck" INTEGER,
            "UserDropOutReason" TEXT,
            "UserOwnPhoneCheck" INTEGER,
            "UserEnrollmentNumber" TEXT,
            "UserDesignation" TEXT,
            "UserBoard" TEXT,
            "UserSubject" TEXT,
            "UserMainSubject" TEXT,
            "UserMedium" TEXT,
            "UserNumOfChildrenWorkingWith" TEXT,
            "JobFamily" TEXT,
            "PSU" TEXT,
            "GroupMembership" TEXT,
            "EMPManager" TEXT,
            "ERPUserID" TEXT,
            "IsManager" INTEGER DEFAULT 0,
            "UserLastLogin" TEXT,
            "UserCustomField" TEXT,
            "UserAccessToWhatsApp" TEXT,
            "UserProgram" TEXT,
            "UserDateOfJoining" TEXT,
            "UserTeacherID" TEXT,
            "UserCEFRLevel" TEXT,
            "UserSubprograms" TEXT,
            "UserOldTeacherID" TEXT,
            "UserRole" TEXT,
            "UserClusterId" TEXT,
            "UserSupervisors" TEXT,
            "UserDateOfLeaving" TEXT,
            "UserReasonForLeaving" TEXT,
            "UserDepartment" TEXT,
            "CreatedAt" TEXT DEFAULT CURRENT_TIMESTAMP,
            "UpdatedAt" TEXT DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_cohort_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "Cohort" (
            "CohortID" TEXT PRIMARY KEY,
            "TenantID" TEXT,
            "CohortName" TEXT,
            "CreatedOn" TEXT,
            "ParentID" TEXT,
            "Type" TEXT,
            "CoStateID" INTEGER,
            "CoDistrictID" INTEGER,
            "CoBlockID" INTEGER,
            "CoVillageID" INTEGER,
            "CoBoard" TEXT,
            "CoSubject" TEXT,
            "CoGrade" TEXT,
            "CoMedium" TEXT,
            "CoIndustry" TEXT,
            "CoGoogleMapLink" TEXT,
            "Status" TEXT DEFAULT 'active',
            "CoProgram" TEXT,
            "CoCluster" TEXT,
            "CoLongitude" TEXT,
            "CoLatitude" TEXT,
            "CoSchoolType" TEXT,
            "createdAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            "updatedAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_cohort_member_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "CohortMember" (
            "CohortMemberID" TEXT PRIMARY KEY,
            "UserID" TEXT NOT NULL,
            "CohortID" TEXT NOT NULL,
            "MemberStatus" TEXT DEFAULT 'active',
            "AcademicYearID" TEXT,
            "Subject" "TEXT[]",
            "Fees" "TEXT[]",
            "Registration" "TEXT[]",
            "Board" "TEXT[]",
            UNIQUE ("UserID", "CohortID")
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attendance_tracker_table(pool: &SqlitePool) -> Result<()> {
    // 31 independent day columns; each holds one structured JSON value
    let mut day_columns = String::new();
    for day in crate::db::columns::DAY_COLUMNS {
        day_columns.push_str(&format!("            \"{}\" TEXT,\n", day));
    }

    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS "AttendanceTracker" (
            "AtndID" TEXT PRIMARY KEY,
            "TenantID" TEXT,
            "Context" TEXT,
            "ContextID" TEXT,
            "UserID" TEXT NOT NULL,
            "Year" INTEGER NOT NULL,
            "Month" INTEGER NOT NULL,
{}            UNIQUE ("TenantID", "UserID", "Year", "Month", "ContextID")
        )
        "#,
        day_columns
    );

    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

async fn create_registration_tracker_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "RegistrationTracker" (
            "REGID" TEXT PRIMARY KEY,
            "UserID" TEXT NOT NULL,
            "RoleID" TEXT NOT NULL,
            "TenantID" TEXT NOT NULL,
            "PlatformRegnDate" TEXT,
            "TenantRegnDate" TEXT,
            "IsActive" INTEGER,
            "Reason" TEXT,
            UNIQUE ("UserID", "RoleID", "TenantID")
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_project_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "Project" (
            "ProjectId" TEXT PRIMARY KEY,
            "ProjectName" TEXT,
            "Board" TEXT,
            "Medium" TEXT,
            "Subject" TEXT,
            "Grade" TEXT,
            "Type" TEXT,
            "StartDate" TEXT,
            "EndDate" TEXT,
            "CreatedBy" TEXT,
            "TenantId" TEXT,
            "AcademicYear" TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_project_task_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "ProjectTask" (
            "ProjectTaskId" TEXT PRIMARY KEY,
            "ProjectId" TEXT NOT NULL,
            "TaskName" TEXT,
            "ParentId" TEXT,
            "StartDate" TEXT,
            "EndDate" TEXT,
            "LearningResource" TEXT,
            "CreatedBy" TEXT,
            "UpdatedBy" TEXT,
            "CreatedAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            "UpdatedAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_project_task_tracking_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "ProjectTaskTracking" (
            "ProjectTaskTrackingId" TEXT PRIMARY KEY,
            "ProjectId" TEXT NOT NULL,
            "ProjectTaskId" TEXT NOT NULL,
            "CohortId" TEXT,
            "CreatedBy" TEXT,
            "UpdatedBy" TEXT,
            "CreatedAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            "UpdatedAt" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_assessment_tracker_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "AssessmentTracker" (
            "AssessTrackingId" TEXT PRIMARY KEY,
            "AssessmentId" TEXT,
            "CourseId" TEXT,
            "AssessmentName" TEXT,
            "UserId" TEXT,
            "TenantId" TEXT,
            "TotalMaxScore" REAL,
            "TotalScore" REAL,
            "TimeSpent" REAL,
            "AssessmentSummary" TEXT,
            "AttemptId" TEXT,
            "AssessmentType" TEXT,
            "EvaluatedBy" TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_course_tracker_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "CourseTracker" (
            "CourseTrackerId" TEXT PRIMARY KEY,
            "UserId" TEXT NOT NULL,
            "TenantId" TEXT,
            "CourseId" TEXT NOT NULL,
            "CourseName" TEXT,
            "CourseTrackingStatus" TEXT,
            "CertificateId" TEXT,
            "CourseTrackingStartDate" TEXT,
            "CourseTrackingEndDate" TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_content_tracker_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS "ContentTracker" (
            "ContentTrackerId" TEXT PRIMARY KEY,
            "UserId" TEXT,
            "TenantId" TEXT,
            "ContentId" TEXT,
            "CourseId" TEXT,
            "ContentName" TEXT,
            "ContentType" TEXT,
            "ContentTrackingStatus" TEXT,
            "TimeSpent" REAL,
            "CreatedAt" TEXT DEFAULT CURRENT_TIMESTAMP,
            "UpdatedAt" TEXT DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Declarative list of the Cohort custom-field columns
fn cohort_field_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("Type", "TEXT"),
        ColumnDefinition::new("CoStateID", "INTEGER"),
        ColumnDefinition::new("CoDistrictID", "INTEGER"),
        ColumnDefinition::new("CoBlockID", "INTEGER"),
        ColumnDefinition::new("CoVillageID", "INTEGER"),
        ColumnDefinition::new("CoBoard", "TEXT"),
        ColumnDefinition::new("CoSubject", "TEXT"),
        ColumnDefinition::new("CoGrade", "TEXT"),
        ColumnDefinition::new("CoMedium", "TEXT"),
        ColumnDefinition::new("CoIndustry", "TEXT"),
        ColumnDefinition::new("CoGoogleMapLink", "TEXT"),
        ColumnDefinition::new("CoProgram", "TEXT"),
        ColumnDefinition::new("CoCluster", "TEXT"),
        ColumnDefinition::new("CoLongitude", "TEXT"),
        ColumnDefinition::new("CoLatitude", "TEXT"),
        ColumnDefinition::new("CoSchoolType", "TEXT"),
    ]
}

/// Declarative list of the CohortMember custom-field columns
fn member_field_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("Subject", "TEXT[]"),
        ColumnDefinition::new("Fees", "TEXT[]"),
        ColumnDefinition::new("Registration", "TEXT[]"),
        ColumnDefinition::new("Board", "TEXT[]"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::{introspect_table, table_exists};

    #[tokio::test]
    async fn test_memory_database_has_all_tables() {
        let pool = init_memory_database().await.unwrap();

        for table in [
            "Users",
            "Cohort",
            "CohortMember",
            "AttendanceTracker",
            "RegistrationTracker",
            "Project",
            "ProjectTask",
            "ProjectTaskTracking",
            "AssessmentTracker",
            "CourseTracker",
            "ContentTracker",
        ] {
            assert!(
                table_exists(&pool, table).await.unwrap(),
                "missing table {}",
                table
            );
        }
    }

    #[tokio::test]
    async fn test_attendance_tracker_has_31_day_columns() {
        let pool = init_memory_database().await.unwrap();
        let columns = introspect_table(&pool, "AttendanceTracker").await.unwrap();
        let day_count = columns.iter().filter(|c| c.name.starts_with("day")).count();
        assert_eq!(day_count, 31);
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let pool = init_memory_database().await.unwrap();
        create_all_tables(&pool).await.unwrap();
        create_all_tables(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_database_created_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("edsync.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());
        assert!(table_exists(&pool, "Users").await.unwrap());
    }
}
