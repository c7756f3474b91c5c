use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use serde_json::Value;

use crate::errors::internal::{EntityError, ValidationError};
use crate::errors::InternalError;
use crate::types::db::{activity, company, user};

/// Repository for company (tenant) provisioning
pub struct CompanyStore {
    db: DatabaseConnection,
}

impl CompanyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a company; tracking defaults to enabled with no allow-list
    pub async fn create(
        &self,
        name: &str,
        tracking_enabled: bool,
        tracking_config: Option<Value>,
    ) -> Result<company::Model, InternalError> {
        if name.trim().is_empty() {
            return Err(ValidationError::BlankName.into());
        }

        let taken = company::Entity::find()
            .filter(company::Column::Name.eq(name))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("check_company_name", e))?;
        if taken > 0 {
            return Err(ValidationError::CompanyNameTaken(name.to_string()).into());
        }

        let now = Utc::now();
        let record = company::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            name: Set(name.to_string()),
            tracking_enabled: Set(tracking_enabled),
            tracking_config: Set(tracking_config),
            created_at: Set(now),
            updated_at: Set(now),
        };

        record
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("create_company", e))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<company::Model>, InternalError> {
        company::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_company", e))
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<company::Model>, InternalError> {
        company::Entity::find()
            .filter(company::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_company_by_name", e))
    }

    /// Update the tracking flag and/or config; `None` config clears it
    pub async fn update_tracking(
        &self,
        id: i64,
        tracking_enabled: bool,
        tracking_config: Option<Value>,
    ) -> Result<company::Model, InternalError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(EntityError::NotFound { entity: "company", id })?;

        let mut record: company::ActiveModel = existing.into();
        record.tracking_enabled = Set(tracking_enabled);
        record.tracking_config = Set(tracking_config);
        record.updated_at = Set(Utc::now());
        record
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("update_company_tracking", e))
    }

    /// Hard-delete a company
    ///
    /// Refused while dependent users or activities exist, so activity
    /// history can never be cascaded away. RESTRICT foreign keys enforce
    /// the same rule at the storage layer.
    pub async fn delete(&self, id: i64) -> Result<(), InternalError> {
        let dependent_users = user::Entity::find()
            .filter(user::Column::CompanyId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_company_users", e))?;
        if dependent_users > 0 {
            return Err(EntityError::HasDependents {
                entity: "company",
                id,
                dependents: "users",
            }
            .into());
        }

        let dependent_activities = activity::Entity::find()
            .filter(activity::Column::CompanyId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_company_activities", e))?;
        if dependent_activities > 0 {
            return Err(EntityError::HasDependents {
                entity: "company",
                id,
                dependents: "activities",
            }
            .into());
        }

        company::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("delete_company", e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "company_store_tests.rs"]
mod company_store_tests;
