//! Per-entity column allow-lists
//!
//! Dynamic updates and conflict clauses are always validated against these
//! static lists before any SQL is assembled; a column name that is not
//! allow-listed for its entity never reaches query construction.

/// Users columns writable by the user transform (everything but the key)
pub const USER_COLUMNS: &[&str] = &[
    "UserName",
    "UserFullName",
    "UserEmail",
    "UserDoB",
    "UserMobile",
    "UserGender",
    "UserIsActive",
    "UserStateID",
    "UserDistrictID",
    "UserBlockID",
    "UserVillageID",
    "UserPreferredModeOfLearning",
    "UserMotherName",
    "UserWorkDomain",
    "UserFatherName",
    "UserSpouseName",
    "UserPhoneType",
    "UserWhatDoYouWantToBecome",
    "UserClass",
    "UserPreferredLanguage",
    "UserParentPhone",
    "UserGuardianRelation",
    "UserGuardianName",
    "UserSubjectTaught",
    "UserMaritalStatus",
    "UserGrade",
    "UserTrainingCheck",
    "UserDropOutReason",
    "UserOwnPhoneCheck",
    "UserEnrollmentNumber",
    "UserDesignation",
    "UserBoard",
    "UserSubject",
    "UserMainSubject",
    "UserMedium",
    "UserNumOfChildrenWorkingWith",
    "JobFamily",
    "PSU",
    "GroupMembership",
    "EMPManager",
    "ERPUserID",
    "IsManager",
    "UserAccessToWhatsApp",
    "UserProgram",
    "UserDateOfJoining",
    "UserTeacherID",
    "UserCEFRLevel",
    "UserSubprograms",
    "UserOldTeacherID",
    "UserRole",
    "UserClusterId",
    "UserSupervisors",
    "UserDateOfLeaving",
    "UserReasonForLeaving",
    "UserDepartment",
    "CreatedAt",
    "UpdatedAt",
];

/// Cohort columns fed by the custom-field mapping plus derived Type/Status
pub const COHORT_FIELD_COLUMNS: &[&str] = &[
    "Type",
    "Status",
    "CoStateID",
    "CoDistrictID",
    "CoBlockID",
    "CoVillageID",
    "CoBoard",
    "CoSubject",
    "CoGrade",
    "CoMedium",
    "CoIndustry",
    "CoGoogleMapLink",
    "CoProgram",
    "CoCluster",
    "CoLongitude",
    "CoLatitude",
    "CoSchoolType",
];

/// CohortMember columns a member custom-field event may patch
pub const MEMBER_PATCH_COLUMNS: &[&str] =
    &["Subject", "Fees", "Registration", "Board", "MemberStatus"];

/// AttendanceTracker day columns, one per day of month
pub const DAY_COLUMNS: [&str; 31] = [
    "day01", "day02", "day03", "day04", "day05", "day06", "day07", "day08", "day09", "day10",
    "day11", "day12", "day13", "day14", "day15", "day16", "day17", "day18", "day19", "day20",
    "day21", "day22", "day23", "day24", "day25", "day26", "day27", "day28", "day29", "day30",
    "day31",
];

/// Zero-padded day column name for a day of month (1-31)
pub fn day_column(day: u32) -> Option<&'static str> {
    if (1..=31).contains(&day) {
        Some(DAY_COLUMNS[(day - 1) as usize])
    } else {
        None
    }
}

/// Project columns refreshed on conflict; TenantId and AcademicYear are
/// never touched once set
pub const PROJECT_CONFLICT_COLUMNS: &[&str] = &[
    "ProjectName",
    "Board",
    "Medium",
    "Subject",
    "Grade",
    "Type",
    "StartDate",
    "EndDate",
    "CreatedBy",
];

/// ProjectTask columns refreshed on conflict
pub const PROJECT_TASK_CONFLICT_COLUMNS: &[&str] = &[
    "ProjectId",
    "TaskName",
    "ParentId",
    "StartDate",
    "EndDate",
    "LearningResource",
    "CreatedBy",
    "UpdatedBy",
];

/// AssessmentTracker columns refreshed on conflict
pub const ASSESSMENT_CONFLICT_COLUMNS: &[&str] = &[
    "TotalMaxScore",
    "TotalScore",
    "TimeSpent",
    "AssessmentSummary",
    "AssessmentType",
    "EvaluatedBy",
];

/// CourseTracker columns an enrollment upsert refreshes
pub const COURSE_UPDATE_COLUMNS: &[&str] = &[
    "CourseName",
    "CourseTrackingStatus",
    "CourseTrackingStartDate",
    "CourseTrackingEndDate",
    "CertificateId",
];

/// ContentTracker columns a tracking upsert refreshes
pub const CONTENT_UPDATE_COLUMNS: &[&str] = &[
    "ContentName",
    "ContentType",
    "ContentTrackingStatus",
    "TimeSpent",
    "UpdatedAt",
];

/// RegistrationTracker columns refreshed on re-registration
pub const REGISTRATION_UPDATE_COLUMNS: &[&str] = &[
    "PlatformRegnDate",
    "TenantRegnDate",
    "IsActive",
    "Reason",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_column_padding() {
        assert_eq!(day_column(1), Some("day01"));
        assert_eq!(day_column(9), Some("day09"));
        assert_eq!(day_column(10), Some("day10"));
        assert_eq!(day_column(31), Some("day31"));
        assert_eq!(day_column(0), None);
        assert_eq!(day_column(32), None);
    }

    #[test]
    fn test_project_conflict_columns_never_touch_tenant() {
        assert!(!PROJECT_CONFLICT_COLUMNS.contains(&"TenantId"));
        assert!(!PROJECT_CONFLICT_COLUMNS.contains(&"AcademicYear"));
    }
}
