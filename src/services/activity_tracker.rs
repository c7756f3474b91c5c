use std::net::Ipv4Addr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::errors::internal::EntityError;
use crate::errors::InternalError;
use crate::stores::{ActivityStore, CompanyStore, UserStore};
use crate::tenant;
use crate::types::db::{activity, user};
use crate::types::internal::{ActivityType, NewActivity, RequestInfo};

use super::tracking_worker::TrackingQueue;

/// Above this many activities created in the trailing hour, a company's
/// events are dispatched through the deferred queue instead of written
/// inline.
const ASYNC_THRESHOLD: u64 = 1000;

/// Result reason codes reported in `TrackResult.reason`
pub mod track_reason {
    pub const USER_REQUIRED: &str = "user_required";
    pub const INVALID_TYPE: &str = "invalid_type";
    pub const TRACKING_DISABLED: &str = "tracking_disabled";
    pub const USER_NOT_FOUND: &str = "user_not_found";
    pub const QUEUED: &str = "queued";
    pub const TRACKED: &str = "tracked";
}

/// Envelope returned by `track`: expected business conditions are data,
/// not errors, so nothing here ever reaches a caller as an exception
#[derive(Debug, Clone, Serialize)]
pub struct TrackResult {
    pub success: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<activity::Model>,
}

impl TrackResult {
    fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: reason.into(),
            activity: None,
        }
    }

    fn queued() -> Self {
        Self {
            success: true,
            reason: track_reason::QUEUED.to_string(),
            activity: None,
        }
    }

    fn tracked(activity: activity::Model) -> Self {
        Self {
            success: true,
            reason: track_reason::TRACKED.to_string(),
            activity: Some(activity),
        }
    }
}

/// Error raised by the strict `track_or_fail` variant, carrying the
/// failure reason the envelope would have reported
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("activity tracking failed: {0}")]
pub struct TrackingError(pub String);

/// One entry of a bulk ingestion batch
#[derive(Debug, Clone)]
pub struct BulkTrackEntry {
    pub user_id: i64,
    pub activity_type: String,
    pub metadata: Map<String, Value>,
}

/// Tally for a bulk batch; `total = succeeded + failed` always holds
#[derive(Debug, Serialize)]
pub struct BulkTrackOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<TrackResult>,
}

/// The activity ingestion pipeline
///
/// Validates an event, checks the company's tracking policy, enriches and
/// sanitizes metadata, then either persists inline or defers to the
/// tracking queue depending on the company's recent write load.
pub struct ActivityTrackerService {
    company_store: Arc<CompanyStore>,
    user_store: Arc<UserStore>,
    activity_store: Arc<ActivityStore>,
    queue: TrackingQueue,
}

impl ActivityTrackerService {
    pub fn new(
        company_store: Arc<CompanyStore>,
        user_store: Arc<UserStore>,
        activity_store: Arc<ActivityStore>,
        queue: TrackingQueue,
    ) -> Self {
        Self {
            company_store,
            user_store,
            activity_store,
            queue,
        }
    }

    /// Record one activity for `user`
    ///
    /// Never returns an error: expected rejections (missing user, unknown
    /// type, tracking disabled) come back as unsuccessful envelopes, and
    /// an unexpected failure during persistence is logged with its context
    /// and converted to an unsuccessful envelope as well.
    pub async fn track(
        &self,
        user: Option<&user::Model>,
        activity_type: &str,
        metadata: Map<String, Value>,
        request: Option<&dyn RequestInfo>,
    ) -> TrackResult {
        let Some(user) = user else {
            return TrackResult::failure(track_reason::USER_REQUIRED);
        };
        let Some(activity_type) = ActivityType::parse(activity_type) else {
            return TrackResult::failure(track_reason::INVALID_TYPE);
        };

        let outcome = tenant::with_tenant(
            user.company_id,
            self.check_and_dispatch(user, activity_type, metadata, request),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(
                    user_id = user.id,
                    company_id = user.company_id,
                    activity_type = %activity_type,
                    error = %error,
                    detail = ?error,
                    "activity tracking failed"
                );
                TrackResult::failure(error.to_string())
            }
        }
    }

    /// Strict variant: unsuccessful envelopes become a `TrackingError`
    pub async fn track_or_fail(
        &self,
        user: Option<&user::Model>,
        activity_type: &str,
        metadata: Map<String, Value>,
        request: Option<&dyn RequestInfo>,
    ) -> Result<TrackResult, TrackingError> {
        let result = self.track(user, activity_type, metadata, request).await;
        if result.success {
            Ok(result)
        } else {
            Err(TrackingError(result.reason.clone()))
        }
    }

    /// Ingest a batch spanning arbitrary tenants
    ///
    /// Runs with the ambient tenant explicitly cleared; each entry resolves
    /// its own user and therefore its own tenant. Entries fail
    /// independently - an unknown user or invalid type never aborts the
    /// rest of the batch.
    pub async fn bulk_track(&self, entries: Vec<BulkTrackEntry>) -> BulkTrackOutcome {
        tenant::without_tenant(async {
            let mut results = Vec::with_capacity(entries.len());

            for entry in &entries {
                let user = match self.user_store.find_by_id(entry.user_id, false).await {
                    Ok(user) => user,
                    Err(error) => {
                        tracing::error!(
                            user_id = entry.user_id,
                            error = %error,
                            "bulk track user lookup failed"
                        );
                        results.push(TrackResult::failure(error.to_string()));
                        continue;
                    }
                };

                let result = match user {
                    Some(user) => {
                        self.track(
                            Some(&user),
                            &entry.activity_type,
                            entry.metadata.clone(),
                            None,
                        )
                        .await
                    }
                    None => TrackResult::failure(track_reason::USER_NOT_FOUND),
                };
                results.push(result);
            }

            let succeeded = results.iter().filter(|r| r.success).count();
            BulkTrackOutcome {
                total: entries.len(),
                succeeded,
                failed: results.len() - succeeded,
                results,
            }
        })
        .await
    }

    /// Steps that run inside the tenant scope and may fail unexpectedly
    async fn check_and_dispatch(
        &self,
        user: &user::Model,
        activity_type: ActivityType,
        metadata: Map<String, Value>,
        request: Option<&dyn RequestInfo>,
    ) -> Result<TrackResult, InternalError> {
        let company = self
            .company_store
            .find_by_id(user.company_id)
            .await?
            .ok_or(EntityError::NotFound {
                entity: "company",
                id: user.company_id,
            })?;

        if !company.tracking_enabled_for(activity_type.as_str()) {
            return Ok(TrackResult::failure(track_reason::TRACKING_DISABLED));
        }

        // Enrichment runs before the store's sanitization pass, so a
        // sensitive key smuggled in via request enrichment is still
        // stripped.
        let payload = NewActivity {
            user_id: user.id,
            company_id: user.company_id,
            activity_type,
            metadata: enrich_metadata(metadata, request),
            occurred_at: Some(Utc::now()),
        };

        if self.over_load_threshold().await? {
            self.queue.enqueue(payload)?;
            Ok(TrackResult::queued())
        } else {
            let record = self.activity_store.create(payload).await?;
            Ok(TrackResult::tracked(record))
        }
    }

    /// Load check for the sync/async split
    ///
    /// Read-count-then-branch: two concurrent events near the threshold can
    /// both observe the same count and pick the same path. This is an
    /// approximation of recent load, not an admission-control guarantee.
    async fn over_load_threshold(&self) -> Result<bool, InternalError> {
        let hour_ago = Utc::now() - chrono::Duration::hours(1);
        let recent = self.activity_store.count_created_since(hour_ago).await?;
        Ok(recent > ASYNC_THRESHOLD)
    }
}

/// Merge request facts into event metadata
///
/// The client address is anonymized first; a non-IPv4 or empty address is
/// omitted entirely rather than stored malformed.
fn enrich_metadata(
    mut metadata: Map<String, Value>,
    request: Option<&dyn RequestInfo>,
) -> Map<String, Value> {
    let Some(request) = request else {
        return metadata;
    };

    if let Some(ip) = request.remote_ip().and_then(anonymize_ip) {
        metadata.insert("ip_address".to_string(), json!(ip));
    }
    if let Some(agent) = request.user_agent() {
        metadata.insert("user_agent".to_string(), json!(agent));
    }
    if let Some(request_id) = request.request_id() {
        metadata.insert("request_id".to_string(), json!(request_id));
    }
    metadata
}

/// Zero the host octet of an IPv4 address; anything else yields None
fn anonymize_ip(ip: &str) -> Option<String> {
    let parsed: Ipv4Addr = ip.trim().parse().ok()?;
    let [a, b, c, _] = parsed.octets();
    Some(format!("{a}.{b}.{c}.0"))
}

#[cfg(test)]
#[path = "activity_tracker_tests.rs"]
mod activity_tracker_tests;
