//! Versioned field-to-column mapping tables
//!
//! The source custom-field structure is open-ended; the destination column
//! set is fixed. These tables are the single place that binds a stable
//! field identifier (or label) to its destination column and coercion.
//! Unmapped field identifiers are ignored, not stored.
//!
//! Several legacy field identifiers map to the same column; entries are
//! ordered and the first one that resolves a value wins.

/// Coercion applied to a resolved custom-field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Pass through as text
    Text,
    /// Case-insensitive "yes" becomes true
    YesNo,
    /// Parsed as a calendar date
    Date,
    /// Location hierarchy column storing an integer code
    NumericCode,
}

/// One fieldId -> destination column binding
#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub field_id: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

const fn map(field_id: &'static str, column: &'static str, kind: FieldKind) -> FieldMapping {
    FieldMapping {
        field_id,
        column,
        kind,
    }
}

/// User label -> column bindings (label lookups predate stable field ids)
pub static USER_LABEL_MAPPINGS: &[(&str, &str)] = &[
    ("JOB_FAMILY", "JobFamily"),
    ("PSU", "PSU"),
    ("NAME_OF_GUARDIAN", "UserGuardianName"),
];

/// User fieldId -> column bindings
pub static USER_FIELD_MAPPINGS: &[FieldMapping] = &[
    map("93de5cc5-9437-4ca7-95f3-3b2f31b24093", "ERPUserID", FieldKind::Text),
    map("8e8ab9b7-8ce0-4e6e-bf7e-0477a80734c8", "IsManager", FieldKind::YesNo),
    map("27589b6d-6ece-457a-8d50-d15a3db02bf6", "EMPManager", FieldKind::Text),
    map("7b43db0a-f4c3-4c77-919f-622509ca7add", "UserPreferredModeOfLearning", FieldKind::Text),
    map("2914814c-2a0f-4422-aff8-6bd3b09d3069", "UserWorkDomain", FieldKind::Text),
    map("0dd4cf0b-b774-439a-9997-5437cd78bfcd", "UserSpouseName", FieldKind::Text),
    map("a8d3d878-9b92-4231-b25c-b22726985238", "UserWhatDoYouWantToBecome", FieldKind::Text),
    map("9a4ad601-023b-467f-bbbe-bda1885f87c7", "UserClass", FieldKind::Text),
    map("4b9d798d-e8f2-4ae5-b177-a57655aa5d1c", "UserPreferredLanguage", FieldKind::Text),
    map("7ecaa845-901a-4ac7-a136-eed087f3b85b", "UserParentPhone", FieldKind::Text),
    map("3a7bf305-6bac-4377-bf09-f38af866105c", "UserGuardianRelation", FieldKind::Text),
    map("abb7f3fe-f7fa-47be-9d28-5747dd3159f2", "UserSubjectTaught", FieldKind::Text),
    map("ff472647-6c40-42e6-b200-dc74b241e915", "UserMaritalStatus", FieldKind::Text),
    map("5a2dbb89-bbe6-4aa8-b541-93e01ab07b70", "UserGrade", FieldKind::Text),
    map("0be5a8c6-92e9-4b7c-ac01-345131b06118", "UserTrainingCheck", FieldKind::YesNo),
    map("4f48571b-88fd-43b9-acb3-91afda7901ac", "UserDropOutReason", FieldKind::Text),
    map("d119d92f-fab7-4c7d-8370-8b40b5ed23dc", "UserOwnPhoneCheck", FieldKind::YesNo),
    map("e2f1fcbc-a76a-4b51-a092-ae4823bc45fd", "UserEnrollmentNumber", FieldKind::Text),
    map("4fc098c5-bec5-4afc-a15d-093805b05119", "UserDesignation", FieldKind::Text),
    map("f93c0ac3-f827-4794-9457-441fa1057b42", "UserBoard", FieldKind::Text),
    map("69a9dba2-e05e-40cd-a39c-047b9b676b5c", "UserSubject", FieldKind::Text),
    map("935bfb34-9be7-4676-b9cc-cec1ec4c0a2c", "UserMainSubject", FieldKind::Text),
    map("7b214a17-5a07-4ee0-bedc-271429862d30", "UserMedium", FieldKind::Text),
    map("da594b2e-c645-4a96-af15-6e2d24587c9a", "UserPhoneType", FieldKind::Text),
    map("a4c2dace-e052-4e78-b6ad-9ffcc035c578", "UserNumOfChildrenWorkingWith", FieldKind::Text),
    map("29c36dd1-315c-46d9-bf6a-f1858ae71c33", "GroupMembership", FieldKind::Text),
    map("679f4a27-09f9-4f78-85a0-9fe8bfd3ef18", "UserFatherName", FieldKind::Text),
    map("d3644b9e-e9df-4f08-ae7b-1a6b4413fedf", "UserMotherName", FieldKind::Text),
    map("53a44ba9-c8ed-43db-9fee-c2c81ae707b9", "UserAccessToWhatsApp", FieldKind::Text),
    map("5fce49b6-cd23-44f5-b87b-4ae0cbe2e328", "UserProgram", FieldKind::Text),
    map("cec6c953-71b6-4c53-98b8-582aaa6008b5", "UserDateOfJoining", FieldKind::Date),
    map("f9f17574-4227-4ba3-a485-f8b1269ff086", "UserTeacherID", FieldKind::Text),
    map("e2395f11-a53d-4fb6-ab89-eae6367156f5", "UserCEFRLevel", FieldKind::Text),
    map("074643e8-8d53-4f14-956b-f7d0216f63e7", "UserSubprograms", FieldKind::Text),
    map("434fcadb-8508-42a9-bbed-03be19e8dfdb", "UserOldTeacherID", FieldKind::Text),
    map("4e4864d3-7049-49d0-b52a-4c9fbe7774b8", "UserRole", FieldKind::Text),
    // Multiple legacy identifiers feed the location columns; first hit wins
    map("e4de6f2a-f4b3-4f66-b1be-fcbe8ff607d3", "UserVillageID", FieldKind::Text),
    map("5cfacade-9d56-4a1e-b4e9-cc8e8c6b04c5", "UserVillageID", FieldKind::Text),
    map("2f7e6930-0bc2-4e69-8bd4-dde205fa5471", "UserVillageID", FieldKind::Text),
    map("c3357b23-1394-48a9-afc5-7589873365ae", "UserClusterId", FieldKind::Text),
    map("26c55f7f-c691-440d-8c7f-88480c72f07b", "UserSupervisors", FieldKind::Text),
    map("d4ad6f2a-f4b3-4f66-b1be-fcbe8ff607f3", "UserDistrictID", FieldKind::Text),
    map("62340eaa-40fb-48b9-ba90-dcaa78be778e", "UserDistrictID", FieldKind::Text),
    map("800265b1-9058-482a-94f4-726197e1dfe4", "UserStateID", FieldKind::Text),
    map("b4ad6f2a-f4b3-4f66-b1be-fcbe8ff607e3", "UserStateID", FieldKind::Text),
    map("1e3e76e2-7f77-4fd7-a79f-abe5c33d4d08", "UserBlockID", FieldKind::Text),
    map("e4bc6f2a-f4b3-4f66-b1be-fcbe8ff607f3", "UserBlockID", FieldKind::Text),
    map("4fa37e71-bbd6-4dd1-9523-510edf63afb7", "UserDateOfLeaving", FieldKind::Date),
    map("11fe3a6b-3b32-43e4-bc50-1fc72bf5dd54", "UserReasonForLeaving", FieldKind::Text),
    map("0d501559-3bb2-44ed-8e33-850f6ed22666", "UserDepartment", FieldKind::Text),
];

/// The "type of center" cohort field driving Type classification
pub const COHORT_TYPE_FIELD_ID: &str = "000a7469-2721-4c7b-8180-52812a0f6fe7";

/// Cohort fieldId -> column bindings
pub static COHORT_FIELD_MAPPINGS: &[FieldMapping] = &[
    map(COHORT_TYPE_FIELD_ID, "Type", FieldKind::Text),
    map("f93c0ac3-f827-4794-9457-441fa1057b42", "CoBoard", FieldKind::Text),
    map("69a9dba2-e05e-40cd-a39c-047b9b676b5c", "CoSubject", FieldKind::Text),
    map("5a2dbb89-bbe6-4aa8-b541-93e01ab07b70", "CoGrade", FieldKind::Text),
    map("7b214a17-5a07-4ee0-bedc-271429862d30", "CoMedium", FieldKind::Text),
    map("e5277d7b-e7ef-4a11-9a54-a8e6e7975383", "CoIndustry", FieldKind::Text),
    map("e9f8acbb-b10d-4b46-9584-f5ec453c250e", "CoGoogleMapLink", FieldKind::Text),
    map("5fce49b6-cd23-44f5-b87b-4ae0cbe2e328", "CoProgram", FieldKind::Text),
    map("c3357b23-1394-48a9-afc5-7589873365ae", "CoCluster", FieldKind::Text),
    map("fe466e4e-193b-4d01-863d-cf861d8d5bf5", "CoLongitude", FieldKind::Text),
    map("fd466e4e-193b-4d01-863d-cf861d8d5bf4", "CoLatitude", FieldKind::Text),
    map("c4ad6f2a-f4b3-4f66-b1be-fcbe8ff607e3", "CoSchoolType", FieldKind::Text),
    map("d4ad6f2a-f4b3-4f66-b1be-fcbe8ff607f3", "CoDistrictID", FieldKind::NumericCode),
    map("62340eaa-40fb-48b9-ba90-dcaa78be778e", "CoDistrictID", FieldKind::NumericCode),
    map("b4ad6f2a-f4b3-4f66-b1be-fcbe8ff607e3", "CoStateID", FieldKind::NumericCode),
    map("800265b1-9058-482a-94f4-726197e1dfe4", "CoStateID", FieldKind::NumericCode),
    map("1e3e76e2-7f77-4fd7-a79f-abe5c33d4d08", "CoBlockID", FieldKind::NumericCode),
    map("e4bc6f2a-f4b3-4f66-b1be-fcbe8ff607f3", "CoBlockID", FieldKind::NumericCode),
    map("e4de6f2a-f4b3-4f66-b1be-fcbe8ff607d3", "CoVillageID", FieldKind::NumericCode),
    map("5cfacade-9d56-4a1e-b4e9-cc8e8c6b04c5", "CoVillageID", FieldKind::NumericCode),
    map("2f7e6930-0bc2-4e69-8bd4-dde205fa5471", "CoVillageID", FieldKind::NumericCode),
];

/// CohortMember labels a member event may patch, lowercased label -> column
pub static MEMBER_LABEL_MAPPINGS: &[(&str, &str)] = &[
    ("subject", "Subject"),
    ("fees", "Fees"),
    ("registration", "Registration"),
    ("board", "Board"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::columns::{COHORT_FIELD_COLUMNS, USER_COLUMNS};

    #[test]
    fn test_user_mappings_target_allow_listed_columns() {
        for mapping in USER_FIELD_MAPPINGS {
            assert!(
                USER_COLUMNS.contains(&mapping.column),
                "unmapped destination column {}",
                mapping.column
            );
        }
        for (_, column) in USER_LABEL_MAPPINGS {
            assert!(USER_COLUMNS.contains(column));
        }
    }

    #[test]
    fn test_cohort_mappings_target_allow_listed_columns() {
        for mapping in COHORT_FIELD_MAPPINGS {
            assert!(
                COHORT_FIELD_COLUMNS.contains(&mapping.column),
                "unmapped destination column {}",
                mapping.column
            );
        }
    }

    #[test]
    fn test_location_columns_are_numeric() {
        for mapping in COHORT_FIELD_MAPPINGS {
            let is_location = matches!(
                mapping.column,
                "CoStateID" | "CoDistrictID" | "CoBlockID" | "CoVillageID"
            );
            assert_eq!(is_location, mapping.kind == FieldKind::NumericCode);
        }
    }
}
