//! User event handlers

use edsync_common::coerce::{parse_datetime, status_to_bool};
use edsync_common::db::models::RegistrationStatusUpdate;
use edsync_common::db::SyncStore;
use edsync_common::error::require_str;
use edsync_common::events::UserEventData;
use edsync_common::transform::{
    transform_cohort_members, transform_registrations, transform_user,
};
use edsync_common::Result;
use serde_json::Value;
use tracing::{info, warn};

/// USER_CREATED / USER_UPDATED: upsert the profile, then fan out to
/// cohort memberships and registration rows carried on the same event
pub async fn handle_user_upsert(store: &SyncStore, data: Value) -> Result<()> {
    let event: UserEventData = serde_json::from_value(data)?;

    let record = transform_user(&event)?;
    let outcome = store.upsert_user(&record).await?;
    info!("User {} reconciled: {:?}", record.user_id, outcome);

    for member in transform_cohort_members(&event) {
        let outcome = store.upsert_cohort_member(&member).await?;
        info!(
            "Cohort member {} -> {} reconciled: {:?}",
            member.user_id, member.cohort_id, outcome
        );
    }

    for registration in transform_registrations(&event) {
        store.upsert_registration(&registration).await?;
    }

    Ok(())
}

/// USER_DELETED
pub async fn handle_user_delete(store: &SyncStore, data: Value) -> Result<()> {
    let event: UserEventData = serde_json::from_value(data)?;
    let user_id = require_str(Some(event.user_id.as_str()), "userId")?;

    if store.delete_user(&user_id).await? {
        info!("Deleted user {}", user_id);
    } else {
        warn!("USER_DELETED for unknown user {}", user_id);
    }
    Ok(())
}

/// USER_LOGIN: stamp the last-login column only
pub async fn handle_user_last_login(store: &SyncStore, data: Value) -> Result<()> {
    let event: UserEventData = serde_json::from_value(data)?;
    let user_id = require_str(Some(event.user_id.as_str()), "userId")?;

    let last_login = event.last_login.as_deref().and_then(parse_datetime);
    let affected = store.update_user_last_login(&user_id, last_login).await?;
    if affected == 0 {
        warn!("USER_LOGIN for unknown user {}", user_id);
    }
    Ok(())
}

/// USER_TENANT_STATUS_UPDATE: flips the active flag on every registration
/// row of the (user, tenant) pair; no role scope on this event
pub async fn handle_user_tenant_status_update(store: &SyncStore, data: Value) -> Result<()> {
    let event: UserEventData = serde_json::from_value(data)?;
    let user_id = require_str(Some(event.user_id.as_str()), "userId")?;

    for tenant in &event.tenant_data {
        let is_active = status_to_bool(tenant.status.as_deref()).unwrap_or(false);
        let update = RegistrationStatusUpdate {
            user_id: user_id.clone(),
            tenant_id: tenant.tenant_id.clone(),
            is_active,
            tenant_regn_date: None,
            platform_regn_date: None,
            reason: tenant.reason.clone().or_else(|| event.reason.clone()),
        };
        match store.update_registrations_for_tenant(&update).await {
            Ok(affected) => info!(
                "Registration status for user {} tenant {}: {} rows -> active={}",
                user_id, tenant.tenant_id, affected, is_active
            ),
            Err(err) => {
                // One tenant with no rows must not abort the others
                warn!("{}", err);
            }
        }
    }

    Ok(())
}

/// USER_TENANT_MAPPING: registration rows for newly assigned tenant roles
pub async fn handle_user_tenant_mapping(store: &SyncStore, data: Value) -> Result<()> {
    let event: UserEventData = serde_json::from_value(data)?;
    require_str(Some(event.user_id.as_str()), "userId")?;

    for registration in transform_registrations(&event) {
        let outcome = store.upsert_registration(&registration).await?;
        info!(
            "Registration {}/{}/{} reconciled: {:?}",
            registration.user_id, registration.role_id, registration.tenant_id, outcome
        );
    }

    Ok(())
}
