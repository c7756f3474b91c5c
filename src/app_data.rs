use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::{ActivityTrackerService, TrackingQueue, TrackingWorker};
use crate::stores::{ActivityStore, CompanyStore, UserStore};

/// Centralized application data following the main-owned stores pattern
///
/// All dependencies are created once and shared. The deferred dispatch
/// worker is spawned here; it exits on its own once every queue producer
/// handle is gone.
pub struct AppData {
    pub db: DatabaseConnection,
    pub company_store: Arc<CompanyStore>,
    pub user_store: Arc<UserStore>,
    pub activity_store: Arc<ActivityStore>,
    pub tracker: Arc<ActivityTrackerService>,
}

impl AppData {
    /// Initialize all application data
    ///
    /// Database connection should be initialized and migrated before
    /// calling this.
    pub fn init(db: DatabaseConnection) -> Arc<Self> {
        tracing::info!("Initializing AppData...");

        let company_store = Arc::new(CompanyStore::new(db.clone()));
        let user_store = Arc::new(UserStore::new(db.clone()));
        let activity_store = Arc::new(ActivityStore::new(db.clone()));

        let (queue, rx) = TrackingQueue::new();
        tokio::spawn(TrackingWorker::new(rx, user_store.clone(), activity_store.clone()).run());

        let tracker = Arc::new(ActivityTrackerService::new(
            company_store.clone(),
            user_store.clone(),
            activity_store.clone(),
            queue,
        ));

        tracing::info!("AppData initialization complete");

        Arc::new(Self {
            db,
            company_store,
            user_store,
            activity_store,
            tracker,
        })
    }
}
