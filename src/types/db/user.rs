use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::types::internal::UserRole;

/// SeaORM entity for the users table
///
/// A user belongs to exactly one company for its lifetime. `discarded_at`
/// is the soft-delete marker: non-null means the user is discarded but its
/// row and activity history remain.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub company_id: i64,
    pub email: String,
    pub name: String,
    pub role: String,
    pub discarded_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id"
    )]
    Company,
    #[sea_orm(has_many = "super::activity::Entity")]
    Activities,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_discarded(&self) -> bool {
        self.discarded_at.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin.as_str()
    }

    pub fn is_company_admin(&self) -> bool {
        self.role == UserRole::CompanyAdmin.as_str()
    }

    pub fn can_view_activities(&self) -> bool {
        self.is_admin() || self.is_company_admin()
    }
}
