use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::errors::internal::EntityError;
use crate::errors::InternalError;
use crate::stores::{ActivityStore, UserStore};
use crate::tenant;
use crate::types::db::activity;
use crate::types::internal::NewActivity;

/// Bounded-retry configuration for deferred writes
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

/// Producer handle for the deferred dispatch queue
///
/// Cloneable; the ingestion pipeline holds one and pushes already-validated
/// payloads onto it when a company is over its load threshold.
#[derive(Clone)]
pub struct TrackingQueue {
    tx: mpsc::UnboundedSender<NewActivity>,
}

impl TrackingQueue {
    /// Create the queue, returning the producer handle and the consumer end
    pub fn new() -> (TrackingQueue, mpsc::UnboundedReceiver<NewActivity>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TrackingQueue { tx }, rx)
    }

    pub fn enqueue(&self, payload: NewActivity) -> Result<(), InternalError> {
        self.tx
            .send(payload)
            .map_err(|_| InternalError::Dispatch("tracking queue is closed".to_string()))
    }
}

/// Consumer of the deferred dispatch queue
///
/// Processes one payload at a time; multiple workers may run in parallel
/// over clones of the stores, each on its own receiver. An event that was
/// queued may therefore not be visible to a summary computed in the same
/// instant - the aggregation side tolerates this.
pub struct TrackingWorker {
    rx: mpsc::UnboundedReceiver<NewActivity>,
    user_store: Arc<UserStore>,
    activity_store: Arc<ActivityStore>,
    retry: RetryPolicy,
}

impl TrackingWorker {
    pub fn new(
        rx: mpsc::UnboundedReceiver<NewActivity>,
        user_store: Arc<UserStore>,
        activity_store: Arc<ActivityStore>,
    ) -> Self {
        Self {
            rx,
            user_store,
            activity_store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Drain the queue until every producer handle is dropped
    ///
    /// A payload that still fails after bounded retries is reported through
    /// the error channel with its identifying context, never dropped
    /// silently, and the worker moves on to the next payload.
    pub async fn run(mut self) {
        while let Some(payload) = self.rx.recv().await {
            let context = (payload.user_id, payload.company_id, payload.activity_type);
            if let Err(error) = Self::perform(
                &self.user_store,
                &self.activity_store,
                self.retry,
                payload,
            )
            .await
            {
                tracing::error!(
                    user_id = context.0,
                    company_id = context.1,
                    activity_type = %context.2,
                    error = %error,
                    "deferred activity write failed after retries"
                );
            }
        }
        tracing::debug!("tracking queue closed, worker exiting");
    }

    /// Persist one queued payload
    ///
    /// Re-derives the tenant from the payload's user and writes through the
    /// same `ActivityStore::create` as the synchronous path, so both paths
    /// produce identical stored records. Discarded users are resolved too:
    /// queued history may drain after a user was soft-deleted.
    pub async fn perform(
        user_store: &UserStore,
        activity_store: &ActivityStore,
        retry: RetryPolicy,
        payload: NewActivity,
    ) -> Result<activity::Model, InternalError> {
        let user = user_store
            .find_by_id(payload.user_id, true)
            .await?
            .ok_or(EntityError::NotFound {
                entity: "user",
                id: payload.user_id,
            })?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome =
                tenant::with_tenant(user.company_id, activity_store.create(payload.clone())).await;

            match outcome {
                Ok(record) => return Ok(record),
                Err(error) if attempt < retry.max_attempts && is_transient(&error) => {
                    tracing::warn!(
                        attempt,
                        user_id = payload.user_id,
                        error = %error,
                        "deferred activity write failed, retrying"
                    );
                    tokio::time::sleep(retry.backoff).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Only infrastructure failures are worth retrying; a validation failure
/// will fail identically on every attempt.
fn is_transient(error: &InternalError) -> bool {
    matches!(error, InternalError::Database(_))
}

#[cfg(test)]
#[path = "tracking_worker_tests.rs"]
mod tracking_worker_tests;
