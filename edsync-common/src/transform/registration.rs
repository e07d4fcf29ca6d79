//! Registration tracker transformation
//!
//! A user event fans out to one registration row per (tenant, role) pair.
//! First-seen registration dates default to the user's creation time.

use crate::coerce::parse_datetime;
use crate::db::models::RegistrationRecord;
use crate::events::UserEventData;
use chrono::Utc;

/// Expand a user event's tenant/role assignments into registration records
pub fn transform_registrations(data: &UserEventData) -> Vec<RegistrationRecord> {
    let platform_regn_date = data
        .created_at
        .as_deref()
        .and_then(parse_datetime)
        .unwrap_or_else(Utc::now);

    let mut records = Vec::new();
    for tenant in &data.tenant_data {
        for role in &tenant.roles {
            records.push(RegistrationRecord {
                user_id: data.user_id.clone(),
                role_id: role.role_id.clone(),
                tenant_id: tenant.tenant_id.clone(),
                platform_regn_date: Some(platform_regn_date),
                // Same as the platform date for new registrations
                tenant_regn_date: Some(platform_regn_date),
                is_active: true,
                reason: tenant
                    .reason
                    .clone()
                    .or_else(|| role.reason.clone())
                    .or_else(|| data.reason.clone()),
            });
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_record_per_tenant_role_pair() {
        let data: UserEventData = serde_json::from_value(json!({
            "userId": "u-1",
            "createdAt": "2024-06-01T08:00:00.000Z",
            "tenantData": [
                { "tenantId": "t-1", "roles": [ { "roleId": "r-1" }, { "roleId": "r-2" } ] },
                { "tenantId": "t-2", "roles": [ { "roleId": "r-1" } ] },
                { "tenantId": "t-3" }
            ]
        }))
        .unwrap();

        let records = transform_registrations(&data);

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.is_active));
        assert_eq!(records[0].tenant_id, "t-1");
        assert_eq!(records[2].tenant_id, "t-2");
        let date = records[0].platform_regn_date.unwrap();
        assert_eq!(records[0].tenant_regn_date.unwrap(), date);
    }

    #[test]
    fn test_reason_precedence() {
        let data: UserEventData = serde_json::from_value(json!({
            "userId": "u-1",
            "reason": "event-level",
            "tenantData": [
                { "tenantId": "t-1", "reason": "tenant-level",
                  "roles": [ { "roleId": "r-1", "reason": "role-level" } ] },
                { "tenantId": "t-2",
                  "roles": [ { "roleId": "r-1", "reason": "role-level" } ] },
                { "tenantId": "t-3", "roles": [ { "roleId": "r-1" } ] }
            ]
        }))
        .unwrap();

        let records = transform_registrations(&data);

        assert_eq!(records[0].reason.as_deref(), Some("tenant-level"));
        assert_eq!(records[1].reason.as_deref(), Some("role-level"));
        assert_eq!(records[2].reason.as_deref(), Some("event-level"));
    }
}
