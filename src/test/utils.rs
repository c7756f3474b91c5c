// Test utilities shared across unit tests

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Map, Value};

use crate::services::{ActivityTrackerService, TrackingQueue};
use crate::stores::{ActivityStore, CompanyStore, UserStore};
use crate::types::db::{company, user};
use crate::types::internal::{NewActivity, UserRole};

/// Creates a test database with migrations applied
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Creates test stores over a fresh in-memory database
///
/// Returns (db, company_store, user_store, activity_store). Callers can
/// discard what they don't need.
pub async fn setup_test_stores() -> (
    DatabaseConnection,
    Arc<CompanyStore>,
    Arc<UserStore>,
    Arc<ActivityStore>,
) {
    let db = setup_test_db().await;
    let company_store = Arc::new(CompanyStore::new(db.clone()));
    let user_store = Arc::new(UserStore::new(db.clone()));
    let activity_store = Arc::new(ActivityStore::new(db.clone()));
    (db, company_store, user_store, activity_store)
}

/// Creates the tracker service plus its queue's consumer end
///
/// The consumer end is returned unconsumed so tests can assert on queued
/// payloads (or drive a worker) deterministically.
pub async fn setup_test_tracker() -> (
    DatabaseConnection,
    Arc<CompanyStore>,
    Arc<UserStore>,
    Arc<ActivityStore>,
    Arc<ActivityTrackerService>,
    tokio::sync::mpsc::UnboundedReceiver<NewActivity>,
) {
    let (db, company_store, user_store, activity_store) = setup_test_stores().await;
    let (queue, rx) = TrackingQueue::new();
    let tracker = Arc::new(ActivityTrackerService::new(
        company_store.clone(),
        user_store.clone(),
        activity_store.clone(),
        queue,
    ));
    (db, company_store, user_store, activity_store, tracker, rx)
}

/// Creates a company with tracking enabled and no allow-list
pub async fn create_test_company(company_store: &CompanyStore, name: &str) -> company::Model {
    company_store
        .create(name, true, None)
        .await
        .expect("Failed to create test company")
}

/// Creates a regular kept user in the given company
pub async fn create_test_user(
    user_store: &UserStore,
    company_id: i64,
    email: &str,
) -> user::Model {
    user_store
        .create(company_id, email, "Test User", UserRole::User)
        .await
        .expect("Failed to create test user")
}

/// Shorthand for building a metadata map from string pairs
pub fn metadata(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
