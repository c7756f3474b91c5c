use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::internal::ActivityType;

/// SeaORM entity for the companies table
///
/// A company is the tenant: the unit of data isolation for every activity
/// query. `tracking_config` is an optional JSON map with an optional
/// `enabled_activity_types` allow-list and a `retention_days` hint.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    pub tracking_enabled: bool,
    pub tracking_config: Option<Json>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    Users,
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Tracking policy: may `activity_type` be recorded for this company?
    ///
    /// Pure function of company state. False immediately when tracking is
    /// disabled; otherwise the allow-list decides, and an absent allow-list
    /// permits every known activity type. Membership is checked on
    /// normalized lower-case names so callers may pass an `ActivityType`
    /// rendering or a raw string.
    pub fn tracking_enabled_for(&self, activity_type: &str) -> bool {
        if !self.tracking_enabled {
            return false;
        }

        let wanted = activity_type.trim().to_ascii_lowercase();
        match self.enabled_activity_types() {
            Some(allowed) => allowed.iter().any(|name| name == &wanted),
            None => ActivityType::parse(&wanted).is_some(),
        }
    }

    /// The configured allow-list, lower-cased; None when the config omits it
    fn enabled_activity_types(&self) -> Option<Vec<String>> {
        let list = self.tracking_config.as_ref()?.get("enabled_activity_types")?;
        let list = list.as_array()?;
        Some(
            list.iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.to_ascii_lowercase())
                .collect(),
        )
    }

    /// Retention hint from the tracking config, when present
    pub fn retention_days(&self) -> Option<u32> {
        self.tracking_config
            .as_ref()?
            .get("retention_days")?
            .as_u64()
            .map(|days| days as u32)
    }
}

#[cfg(test)]
#[path = "company_tests.rs"]
mod company_tests;
