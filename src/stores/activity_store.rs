use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::internal::{EntityError, ValidationError};
use crate::errors::InternalError;
use crate::tenant;
use crate::types::db::{activity, user};
use crate::types::internal::activity::sanitize_metadata;
use crate::types::internal::{NewActivity, TimeRange};

/// Repository for activity storage and aggregation queries
///
/// Every query resolves the ambient tenant first: a scoped extent filters to
/// that company, an explicitly-unscoped extent (`tenant::without_tenant`)
/// deliberately crosses tenants, and the absence of any scope is a
/// `NoTenantSet` failure before a single row is read.
pub struct ActivityStore {
    db: DatabaseConnection,
}

/// Filter parameters for activity history queries; every field is optional
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub user_id: Option<i64>,
    pub activity_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// One row of the most-active-users ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostActiveUser {
    pub id: i64,
    pub name: String,
    pub activity_count: u64,
}

#[derive(FromQueryResult)]
struct KeyCountRow {
    key: String,
    count: i64,
}

#[derive(FromQueryResult)]
struct UserCountRow {
    user_id: i64,
    count: i64,
}

impl ActivityStore {
    /// Create a new ActivityStore with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Base query filtered by the ambient tenant
    fn scoped(&self) -> Result<Select<activity::Entity>, InternalError> {
        let mut query = activity::Entity::find();
        if let Some(company_id) = tenant::current_company_id()? {
            query = query.filter(activity::Column::CompanyId.eq(company_id));
        }
        Ok(query)
    }

    /// Persist a validated activity payload under the ambient tenant
    ///
    /// Requires a concrete tenant scope. The payload's user must exist
    /// (discarded users included, since queued history may drain after a
    /// discard) and belong to the ambient company.
    /// `occurred_at` defaults to now when the payload leaves it unset;
    /// metadata is sanitized here so every write path strips the
    /// block-listed keys, whichever service produced the payload.
    pub async fn create(&self, new: NewActivity) -> Result<activity::Model, InternalError> {
        let company_id = tenant::require_company_id()?;

        let user = user::Entity::find_by_id(new.user_id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_activity_user", e))?
            .ok_or(EntityError::NotFound {
                entity: "user",
                id: new.user_id,
            })?;

        if user.company_id != company_id || new.company_id != company_id {
            return Err(ValidationError::UserCompanyMismatch {
                user_id: user.id,
                user_company_id: user.company_id,
                company_id,
            }
            .into());
        }

        let now = Utc::now();
        let record = activity::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            user_id: Set(new.user_id),
            company_id: Set(company_id),
            activity_type: Set(new.activity_type.as_str().to_string()),
            metadata: Set(Value::Object(sanitize_metadata(new.metadata))),
            occurred_at: Set(new.occurred_at.unwrap_or(now)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        record
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("create_activity", e))
    }

    /// Replace an activity's metadata, leaving `occurred_at` untouched
    ///
    /// The one sanctioned mutation of an existing record. The replacement
    /// map goes through the same sanitization as the create path.
    pub async fn update_metadata(
        &self,
        id: i64,
        metadata: Map<String, Value>,
    ) -> Result<activity::Model, InternalError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(EntityError::NotFound { entity: "activity", id })?;

        let mut record: activity::ActiveModel = existing.into();
        record.metadata = Set(Value::Object(sanitize_metadata(metadata)));
        record.updated_at = Set(Utc::now());

        record
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("update_activity_metadata", e))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<activity::Model>, InternalError> {
        self.scoped()?
            .filter(activity::Column::Id.eq(id))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_activity", e))
    }

    /// Whether the row is visible from the current tenant extent
    ///
    /// Under `without_tenant` this is a physical existence check across all
    /// tenants.
    pub async fn exists(&self, id: i64) -> Result<bool, InternalError> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    pub async fn count(&self) -> Result<u64, InternalError> {
        self.scoped()?
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_activities", e))
    }

    /// Count of activities whose `occurred_at` is at or after `since`
    pub async fn count_occurred_since(&self, since: DateTime<Utc>) -> Result<u64, InternalError> {
        self.scoped()?
            .filter(activity::Column::OccurredAt.gte(since))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_activities_since", e))
    }

    /// Count of rows created after `since`, used by the ingestion load check
    pub async fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, InternalError> {
        self.scoped()?
            .filter(activity::Column::CreatedAt.gt(since))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_recently_created", e))
    }

    pub async fn count_in(&self, range: &TimeRange) -> Result<u64, InternalError> {
        self.scoped()?
            .filter(activity::Column::OccurredAt.between(range.start, range.end))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_activities_in_range", e))
    }

    /// Distinct users with at least one activity at or after `since`
    pub async fn distinct_users_since(&self, since: DateTime<Utc>) -> Result<u64, InternalError> {
        let users: Vec<i64> = self
            .scoped()?
            .select_only()
            .column(activity::Column::UserId)
            .filter(activity::Column::OccurredAt.gte(since))
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("distinct_users_since", e))?;

        Ok(users.len() as u64)
    }

    /// Per-type counts, optionally restricted to a time window
    pub async fn count_by_type(
        &self,
        range: Option<&TimeRange>,
    ) -> Result<BTreeMap<String, u64>, InternalError> {
        let mut query = self
            .scoped()?
            .select_only()
            .column_as(activity::Column::ActivityType, "key")
            .column_as(activity::Column::Id.count(), "count")
            .group_by(activity::Column::ActivityType);

        if let Some(range) = range {
            query = query.filter(activity::Column::OccurredAt.between(range.start, range.end));
        }

        let rows = query
            .into_model::<KeyCountRow>()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("count_by_type", e))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.key, row.count as u64))
            .collect())
    }

    /// Per-user counts keyed by email, inside a time window
    ///
    /// Joins through the user relation, which traverses discarded users:
    /// a former employee's activities still aggregate under their email.
    pub async fn count_by_user_email(
        &self,
        range: &TimeRange,
    ) -> Result<BTreeMap<String, u64>, InternalError> {
        let rows = self
            .scoped()?
            .select_only()
            .join(JoinType::InnerJoin, activity::Relation::User.def())
            .column_as(user::Column::Email, "key")
            .column_as(activity::Column::Id.count(), "count")
            .filter(activity::Column::OccurredAt.between(range.start, range.end))
            .group_by(user::Column::Email)
            .into_model::<KeyCountRow>()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("count_by_user_email", e))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.key, row.count as u64))
            .collect())
    }

    /// Hour-of-day histogram (0-23 integer keys) inside a time window
    ///
    /// The hour is extracted in-process from a windowed projection instead
    /// of dialect-specific SQL, so the same code path serves sqlite and
    /// postgres. The projection is bounded by the window.
    pub async fn hour_histogram(
        &self,
        range: &TimeRange,
    ) -> Result<BTreeMap<u32, u64>, InternalError> {
        let stamps: Vec<DateTime<Utc>> = self
            .scoped()?
            .select_only()
            .column(activity::Column::OccurredAt)
            .filter(activity::Column::OccurredAt.between(range.start, range.end))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("hour_histogram", e))?;

        let mut histogram = BTreeMap::new();
        for stamp in stamps {
            *histogram.entry(stamp.hour()).or_insert(0u64) += 1;
        }
        Ok(histogram)
    }

    /// Daily per-type counts inside a time window, keyed by calendar date
    pub async fn daily_type_counts(
        &self,
        range: &TimeRange,
    ) -> Result<BTreeMap<NaiveDate, BTreeMap<String, u64>>, InternalError> {
        let rows: Vec<(DateTime<Utc>, String)> = self
            .scoped()?
            .select_only()
            .column(activity::Column::OccurredAt)
            .column(activity::Column::ActivityType)
            .filter(activity::Column::OccurredAt.between(range.start, range.end))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("daily_type_counts", e))?;

        let mut trends: BTreeMap<NaiveDate, BTreeMap<String, u64>> = BTreeMap::new();
        for (stamp, activity_type) in rows {
            *trends
                .entry(stamp.date_naive())
                .or_default()
                .entry(activity_type)
                .or_insert(0u64) += 1;
        }
        Ok(trends)
    }

    /// Top users by activity count, ranking pushed into the database
    ///
    /// Ties are returned in whatever order the database yields; no
    /// tie-break is defined.
    pub async fn most_active_users(
        &self,
        limit: u64,
    ) -> Result<Vec<MostActiveUser>, InternalError> {
        let rows = self
            .scoped()?
            .select_only()
            .column(activity::Column::UserId)
            .column_as(activity::Column::Id.count(), "count")
            .group_by(activity::Column::UserId)
            .order_by_desc(activity::Column::Id.count())
            .limit(limit)
            .into_model::<UserCountRow>()
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("most_active_users", e))?;

        let ids: Vec<i64> = rows.iter().map(|row| row.user_id).collect();
        let names: BTreeMap<i64, String> = user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("most_active_user_names", e))?
            .into_iter()
            .map(|u| (u.id, u.name))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| MostActiveUser {
                id: row.user_id,
                name: names.get(&row.user_id).cloned().unwrap_or_default(),
                activity_count: row.count as u64,
            })
            .collect())
    }

    /// The `limit` most recent activities, newest first
    pub async fn recent(&self, limit: u64) -> Result<Vec<activity::Model>, InternalError> {
        self.scoped()?
            .order_by_desc(activity::Column::OccurredAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("recent_activities", e))
    }

    /// Filtered activity history, newest first
    ///
    /// Empty filter parameters apply no restriction beyond the ambient
    /// tenant; the date bounds go through `TimeRange::between`, so absent
    /// bounds mean an effectively unbounded window. The user filter is on
    /// the raw id and intentionally keeps discarded users' history visible.
    pub async fn filter_by_params(
        &self,
        filter: &ActivityFilter,
    ) -> Result<Vec<activity::Model>, InternalError> {
        let range = TimeRange::between(filter.start_date.as_deref(), filter.end_date.as_deref())?;

        let mut query = self
            .scoped()?
            .filter(activity::Column::OccurredAt.between(range.start, range.end));

        if let Some(user_id) = filter.user_id {
            query = query.filter(activity::Column::UserId.eq(user_id));
        }
        if let Some(activity_type) = filter.activity_type.as_deref() {
            if !activity_type.is_empty() {
                query = query.filter(activity::Column::ActivityType.eq(activity_type));
            }
        }

        query
            .order_by_desc(activity::Column::OccurredAt)
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("filter_activities", e))
    }

    /// Count of activities belonging to `user_id`, tenant-independent
    ///
    /// Used by provisioning to refuse user hard-deletes while history exists.
    pub async fn count_for_user_unscoped(&self, user_id: i64) -> Result<u64, InternalError> {
        activity::Entity::find()
            .filter(activity::Column::UserId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_user_activities", e))
    }
}

#[cfg(test)]
#[path = "activity_store_tests.rs"]
mod activity_store_tests;
