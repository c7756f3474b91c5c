use serde_json::{json, Map, Value};

use crate::app_data::AppData;
use crate::services::BulkTrackEntry;
use crate::types::internal::{ActivityType, RequestMeta, UserRole};

/// Seed a demo dataset: three companies with distinct tracking policies,
/// a handful of users (one discarded), and sample activities pushed through
/// the real ingestion pipeline.
///
/// Safe to re-run: seeding is skipped when the first company already exists.
pub async fn run(app_data: &AppData) -> Result<(), Box<dyn std::error::Error>> {
    if app_data.company_store.find_by_name("TechCorp").await?.is_some() {
        println!("Seed data already present, skipping");
        return Ok(());
    }

    println!("Seeding database...");

    let tech_corp = app_data
        .company_store
        .create(
            "TechCorp",
            true,
            Some(json!({
                "enabled_activity_types": ActivityType::ALL.map(|t| t.as_str()),
                "retention_days": 730,
            })),
        )
        .await?;

    let startup_inc = app_data
        .company_store
        .create(
            "StartupInc",
            true,
            Some(json!({
                "enabled_activity_types": ["login", "logout", "profile_update"],
                "retention_days": 365,
            })),
        )
        .await?;

    // Tracking disabled
    app_data
        .company_store
        .create("EnterpriseCo", false, None)
        .await?;

    let tech_admin = app_data
        .user_store
        .create(tech_corp.id, "admin@techcorp.com", "Alice Admin", UserRole::CompanyAdmin)
        .await?;

    let mut tech_users = Vec::new();
    for i in 1..=5 {
        let user = app_data
            .user_store
            .create(
                tech_corp.id,
                &format!("user{i}@techcorp.com"),
                &format!("TechCorp User {i}"),
                UserRole::User,
            )
            .await?;
        tech_users.push(user);
    }

    let former = app_data
        .user_store
        .create(tech_corp.id, "former@techcorp.com", "Former Employee", UserRole::User)
        .await?;

    let startup_founder = app_data
        .user_store
        .create(startup_inc.id, "founder@startupinc.com", "Founding Member", UserRole::CompanyAdmin)
        .await?;

    seed_activities(app_data, &tech_users).await?;

    // History for the soon-to-be-discarded user, then discard them;
    // their activities stay queryable
    app_data
        .tracker
        .track_or_fail(
            Some(&former),
            ActivityType::Login.as_str(),
            serde_json::Map::new(),
            None,
        )
        .await?;
    app_data.user_store.discard(former.id).await?;

    app_data
        .tracker
        .track_or_fail(
            Some(&startup_founder),
            ActivityType::Login.as_str(),
            serde_json::Map::new(),
            None,
        )
        .await?;
    app_data
        .tracker
        .track_or_fail(
            Some(&tech_admin),
            ActivityType::AdminAction.as_str(),
            metadata(&[("action", json!("seeded"))]),
            None,
        )
        .await?;

    println!("Seed complete");
    Ok(())
}

fn metadata(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

async fn seed_activities(
    app_data: &AppData,
    users: &[crate::types::db::user::Model],
) -> Result<(), Box<dyn std::error::Error>> {
    let request = RequestMeta::generated(
        Some("203.0.113.42".to_string()),
        Some("kudos-seed/1.0".to_string()),
    );

    for user in users {
        for activity_type in [
            ActivityType::Login,
            ActivityType::GiveRecognition,
            ActivityType::ReceiveRecognition,
            ActivityType::Logout,
        ] {
            app_data
                .tracker
                .track_or_fail(
                    Some(user),
                    activity_type.as_str(),
                    metadata(&[("source", json!("seed"))]),
                    Some(&request),
                )
                .await?;
        }
    }

    // Exercise the bulk path too
    let outcome = app_data
        .tracker
        .bulk_track(
            users
                .iter()
                .map(|user| BulkTrackEntry {
                    user_id: user.id,
                    activity_type: ActivityType::ProfileUpdate.as_str().to_string(),
                    metadata: metadata(&[("bulk", json!(true))]),
                })
                .collect(),
        )
        .await;
    println!(
        "Bulk seed: {} total, {} succeeded, {} failed",
        outcome.total, outcome.succeeded, outcome.failed
    );

    Ok(())
}
