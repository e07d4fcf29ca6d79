//! Registration tracker migration

use crate::source::SourceRegistration;
use edsync_common::coerce::parse_datetime;
use edsync_common::db::models::RegistrationRecord;
use edsync_common::db::SyncStore;
use edsync_common::{BatchStats, Result};
use std::path::Path;
use tracing::{error, info, warn};

pub async fn run(store: &SyncStore, registrations_path: &Path) -> Result<BatchStats> {
    info!("=== STARTING REGISTRATION TRACKER MIGRATION ===");

    let (rows, bad_rows) = crate::source::read_ndjson::<SourceRegistration>(registrations_path)?;
    info!("Found {} registration records", rows.len());

    let mut stats = BatchStats::new();
    stats.skipped += bad_rows;

    for row in &rows {
        stats.processed += 1;

        let (Some(user_id), Some(role_id), Some(tenant_id)) = (
            row.user_id.as_deref(),
            row.role_id.as_deref(),
            row.tenant_id.as_deref(),
        ) else {
            warn!(
                "Skipping row with missing key fields | userId={:?} roleId={:?} tenantId={:?}",
                row.user_id, row.role_id, row.tenant_id
            );
            stats.skipped += 1;
            continue;
        };

        // Earliest known date doubles as the platform registration date
        let tenant_regn_date = row.tenant_regn_date.as_deref().and_then(parse_datetime);
        let platform_regn_date = tenant_regn_date
            .or_else(|| row.role_assigned_date.as_deref().and_then(parse_datetime));

        let record = RegistrationRecord {
            user_id: user_id.to_string(),
            role_id: role_id.to_string(),
            tenant_id: tenant_id.to_string(),
            platform_regn_date,
            tenant_regn_date,
            is_active: true,
            reason: None,
        };

        match store.upsert_registration(&record).await {
            Ok(outcome) => stats.record(outcome),
            Err(err) => {
                error!(
                    "Registration failed | user={} role={} tenant={}: {}",
                    user_id, role_id, tenant_id, err
                );
                stats.errors += 1;
            }
        }
    }

    info!("Registration migration summary: {}", stats.display_string());
    Ok(stats)
}
