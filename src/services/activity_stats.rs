use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::errors::InternalError;
use crate::stores::{ActivityStore, MostActiveUser, UserStore};
use crate::tenant;
use crate::types::db::{activity, company};
use crate::types::internal::TimeRange;

#[derive(Debug, Serialize)]
pub struct StatsOverview {
    pub total_activities: u64,
    pub activities_today: u64,
    pub active_users_today: u64,
    pub activities_this_week: u64,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_users: u64,
    pub active_users_this_week: u64,
    pub most_active_users: Vec<MostActiveUser>,
}

#[derive(Debug, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: u64,
}

/// The fixed dashboard bundle for one company
#[derive(Debug, Serialize)]
pub struct StatsReport {
    pub overview: StatsOverview,
    /// All-time counts per activity type
    pub activity_breakdown: BTreeMap<String, u64>,
    /// The ten most recent activities, newest first
    pub recent_activities: Vec<activity::Model>,
    pub user_stats: UserStats,
    /// Daily per-type counts over the trailing seven days
    pub activity_trends: BTreeMap<NaiveDate, BTreeMap<String, u64>>,
    /// Hour-of-day histogram over the trailing seven days, hour ascending
    pub peak_times: Vec<HourCount>,
}

/// Aggregate statistics for one company's activity dashboard
pub struct ActivityStatsService {
    user_store: Arc<UserStore>,
    activity_store: Arc<ActivityStore>,
}

impl ActivityStatsService {
    pub fn new(user_store: Arc<UserStore>, activity_store: Arc<ActivityStore>) -> Self {
        Self {
            user_store,
            activity_store,
        }
    }

    /// Compute the full bundle under the company's tenant scope
    ///
    /// "Today" is the UTC calendar day. Events sitting in the deferred
    /// queue at the moment of computation are not yet visible; the view is
    /// eventually consistent for very recent activity.
    pub async fn generate(&self, company: &company::Model) -> Result<StatsReport, InternalError> {
        tenant::with_tenant(company.id, async {
            let now = Utc::now();
            // Midnight always exists, the construction cannot fail
            let today_start =
                Utc.from_utc_datetime(&now.date_naive().and_hms_opt(0, 0, 0).unwrap());
            let week_ago = now - Duration::weeks(1);
            let trailing_week = TimeRange {
                start: week_ago,
                end: now,
            };

            let overview = StatsOverview {
                total_activities: self.activity_store.count().await?,
                activities_today: self.activity_store.count_occurred_since(today_start).await?,
                active_users_today: self.activity_store.distinct_users_since(today_start).await?,
                activities_this_week: self.activity_store.count_occurred_since(week_ago).await?,
            };

            let activity_breakdown = self.activity_store.count_by_type(None).await?;
            let recent_activities = self.activity_store.recent(10).await?;

            let user_stats = UserStats {
                total_users: self.user_store.count_kept(company.id).await?,
                active_users_this_week: self.activity_store.distinct_users_since(week_ago).await?,
                most_active_users: self.activity_store.most_active_users(5).await?,
            };

            let activity_trends = self.activity_store.daily_type_counts(&trailing_week).await?;
            let peak_times = self
                .activity_store
                .hour_histogram(&trailing_week)
                .await?
                .into_iter()
                .map(|(hour, count)| HourCount { hour, count })
                .collect();

            Ok(StatsReport {
                overview,
                activity_breakdown,
                recent_activities,
                user_stats,
                activity_trends,
                peak_times,
            })
        })
        .await
    }
}

#[cfg(test)]
#[path = "activity_stats_tests.rs"]
mod activity_stats_tests;
