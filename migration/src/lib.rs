pub use sea_orm_migration::prelude::*;

mod m20250610_000001_create_companies;
mod m20250610_000002_create_users;
mod m20250610_000003_create_activities;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250610_000001_create_companies::Migration),
            Box::new(m20250610_000002_create_users::Migration),
            Box::new(m20250610_000003_create_activities::Migration),
        ]
    }
}
