use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Companies::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Companies::Name).string().not_null())
                    .col(ColumnDef::new(Companies::TrackingEnabled).boolean().not_null().default(true))
                    .col(ColumnDef::new(Companies::TrackingConfig).json_binary())
                    .col(ColumnDef::new(Companies::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Companies::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_companies_name")
                    .table(Companies::Table)
                    .col(Companies::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_companies_tracking_enabled")
                    .table(Companies::Table)
                    .col(Companies::TrackingEnabled)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    TrackingEnabled,
    TrackingConfig,
    CreatedAt,
    UpdatedAt,
}
