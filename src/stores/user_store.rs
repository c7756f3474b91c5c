use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::errors::internal::{EntityError, ValidationError};
use crate::errors::InternalError;
use crate::types::db::{activity, user};
use crate::types::internal::UserRole;

/// Repository for user provisioning and lookup
///
/// Reads take an explicit `include_discarded` flag; the default everywhere
/// is to exclude soft-deleted users, and callers that need history (the
/// activity relation, admin tooling) opt in visibly.
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Provision a user in a company
    ///
    /// # Errors
    ///
    /// `ValidationError` when the name is blank, the email is malformed, or
    /// the email is already taken within the company.
    pub async fn create(
        &self,
        company_id: i64,
        email: &str,
        name: &str,
        role: UserRole,
    ) -> Result<user::Model, InternalError> {
        if name.trim().is_empty() {
            return Err(ValidationError::BlankName.into());
        }
        if !is_plausible_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()).into());
        }

        let taken = user::Entity::find()
            .filter(user::Column::CompanyId.eq(company_id))
            .filter(user::Column::Email.eq(email))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("check_email_taken", e))?;
        if taken > 0 {
            return Err(ValidationError::EmailTaken {
                email: email.to_string(),
                company_id,
            }
            .into());
        }

        let now = Utc::now();
        let record = user::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            company_id: Set(company_id),
            email: Set(email.to_string()),
            name: Set(name.to_string()),
            role: Set(role.as_str().to_string()),
            discarded_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        record
            .insert(&self.db)
            .await
            .map_err(|e| InternalError::database("create_user", e))
    }

    pub async fn find_by_id(
        &self,
        id: i64,
        include_discarded: bool,
    ) -> Result<Option<user::Model>, InternalError> {
        let mut query = user::Entity::find().filter(user::Column::Id.eq(id));
        if !include_discarded {
            query = query.filter(user::Column::DiscardedAt.is_null());
        }
        query
            .one(&self.db)
            .await
            .map_err(|e| InternalError::database("find_user", e))
    }

    pub async fn list_for_company(
        &self,
        company_id: i64,
        include_discarded: bool,
    ) -> Result<Vec<user::Model>, InternalError> {
        let mut query = user::Entity::find().filter(user::Column::CompanyId.eq(company_id));
        if !include_discarded {
            query = query.filter(user::Column::DiscardedAt.is_null());
        }
        query
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_users", e))
    }

    /// Kept users holding an admin or company_admin role
    pub async fn admins_for_company(
        &self,
        company_id: i64,
    ) -> Result<Vec<user::Model>, InternalError> {
        user::Entity::find()
            .filter(user::Column::CompanyId.eq(company_id))
            .filter(user::Column::DiscardedAt.is_null())
            .filter(
                user::Column::Role
                    .is_in([UserRole::Admin.as_str(), UserRole::CompanyAdmin.as_str()]),
            )
            .all(&self.db)
            .await
            .map_err(|e| InternalError::database("list_admins", e))
    }

    pub async fn count_kept(&self, company_id: i64) -> Result<u64, InternalError> {
        user::Entity::find()
            .filter(user::Column::CompanyId.eq(company_id))
            .filter(user::Column::DiscardedAt.is_null())
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_kept_users", e))
    }

    /// Soft-delete: mark the user discarded, keeping the row and its history
    ///
    /// Already-discarded users keep their original marker.
    pub async fn discard(&self, id: i64) -> Result<user::Model, InternalError> {
        let existing = self
            .find_by_id(id, true)
            .await?
            .ok_or(EntityError::NotFound { entity: "user", id })?;

        if existing.is_discarded() {
            return Ok(existing);
        }

        let mut record: user::ActiveModel = existing.into();
        record.discarded_at = Set(Some(Utc::now()));
        record.updated_at = Set(Utc::now());
        record
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("discard_user", e))
    }

    /// Reverse a soft-delete
    pub async fn undiscard(&self, id: i64) -> Result<user::Model, InternalError> {
        let existing = self
            .find_by_id(id, true)
            .await?
            .ok_or(EntityError::NotFound { entity: "user", id })?;

        let mut record: user::ActiveModel = existing.into();
        record.discarded_at = Set(None);
        record.updated_at = Set(Utc::now());
        record
            .update(&self.db)
            .await
            .map_err(|e| InternalError::database("undiscard_user", e))
    }

    /// Hard-delete a user
    ///
    /// Refused while activities reference the user; soft-delete is the
    /// sanctioned path for removing a user from active use. The schema's
    /// RESTRICT foreign key rejects the write independently of this check.
    pub async fn delete(&self, id: i64) -> Result<(), InternalError> {
        let dependents = activity::Entity::find()
            .filter(activity::Column::UserId.eq(id))
            .count(&self.db)
            .await
            .map_err(|e| InternalError::database("count_user_activities", e))?;
        if dependents > 0 {
            return Err(EntityError::HasDependents {
                entity: "user",
                id,
                dependents: "activities",
            }
            .into());
        }

        user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| InternalError::database("delete_user", e))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "user_store_tests.rs"]
mod user_store_tests;

/// Cheap mailbox-shape check: one `@`, non-empty local part, dotted domain
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}
