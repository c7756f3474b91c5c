use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::errors::InternalError;
use crate::stores::ActivityStore;
use crate::tenant;
use crate::types::db::company;
use crate::types::internal::TimeRange;

/// Reporting window keyword: `[now - period, now]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPeriod {
    Hour,
    Day,
    Week,
    Month,
}

impl SummaryPeriod {
    /// Parse a period keyword; anything unrecognized falls back to a day
    pub fn parse(value: &str) -> SummaryPeriod {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" => Self::Hour,
            "week" => Self::Week,
            "month" => Self::Month,
            _ => Self::Day,
        }
    }

    fn duration(&self) -> Duration {
        match self {
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
            Self::Week => Duration::weeks(1),
            Self::Month => Duration::days(30),
        }
    }
}

/// Grouping dimension for summaries
///
/// An unrecognized dimension is not an error: it falls back to a single
/// total count over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryGroupBy {
    ActivityType,
    User,
    Hour,
    Total,
}

impl SummaryGroupBy {
    pub fn parse(value: &str) -> SummaryGroupBy {
        match value.trim().to_ascii_lowercase().as_str() {
            "activity_type" => Self::ActivityType,
            "user" => Self::User,
            "hour" => Self::Hour,
            _ => Self::Total,
        }
    }
}

/// Grouped counts; the hour dimension keeps integer 0-23 keys
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryData {
    ByKey(BTreeMap<String, u64>),
    ByHour(BTreeMap<u32, u64>),
    Total { total: u64 },
}

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub period: SummaryPeriod,
    pub group_by: SummaryGroupBy,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub data: SummaryData,
    pub generated_at: DateTime<Utc>,
}

/// Grouped, time-windowed activity summaries for one company
pub struct ActivitySummaryService {
    activity_store: Arc<ActivityStore>,
}

impl ActivitySummaryService {
    pub fn new(activity_store: Arc<ActivityStore>) -> Self {
        Self { activity_store }
    }

    /// Count activities in `[now - period, now]` grouped by the dimension
    ///
    /// Grouping by user keys on the user's email, not the internal id;
    /// grouping by hour keys on the hour-of-day extracted from
    /// `occurred_at`.
    pub async fn generate(
        &self,
        company: &company::Model,
        period: SummaryPeriod,
        group_by: SummaryGroupBy,
    ) -> Result<SummaryReport, InternalError> {
        tenant::with_tenant(company.id, async {
            let range = TimeRange::trailing(period.duration());

            let data = match group_by {
                SummaryGroupBy::ActivityType => {
                    SummaryData::ByKey(self.activity_store.count_by_type(Some(&range)).await?)
                }
                SummaryGroupBy::User => {
                    SummaryData::ByKey(self.activity_store.count_by_user_email(&range).await?)
                }
                SummaryGroupBy::Hour => {
                    SummaryData::ByHour(self.activity_store.hour_histogram(&range).await?)
                }
                SummaryGroupBy::Total => SummaryData::Total {
                    total: self.activity_store.count_in(&range).await?,
                },
            };

            Ok(SummaryReport {
                period,
                group_by,
                start_date: range.start,
                end_date: range.end,
                data,
                generated_at: Utc::now(),
            })
        })
        .await
    }
}

#[cfg(test)]
#[path = "activity_summary_tests.rs"]
mod activity_summary_tests;
