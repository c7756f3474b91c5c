// Common test utilities for integration tests

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use serde_json::{Map, Value};

use kudos_backend::app_data::AppData;
use kudos_backend::types::db::{company, user};
use kudos_backend::types::internal::UserRole;

/// Boots the full application wiring (stores, tracker, deferred worker)
/// over an in-memory database with migrations applied
pub async fn setup_app() -> Arc<AppData> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    AppData::init(db)
}

pub async fn create_company(app: &AppData, name: &str) -> company::Model {
    app.company_store
        .create(name, true, None)
        .await
        .expect("Failed to create company")
}

pub async fn create_user(app: &AppData, company_id: i64, email: &str) -> user::Model {
    app.user_store
        .create(company_id, email, "Integration User", UserRole::User)
        .await
        .expect("Failed to create user")
}

pub fn metadata(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
