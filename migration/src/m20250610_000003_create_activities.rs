use sea_orm_migration::prelude::*;

/// Activity types accepted by the check constraint. Must stay in sync with
/// the application-level `ActivityType` enum; the constraint exists so that
/// writes bypassing application validation are still rejected.
const ACTIVITY_TYPES: [&str; 6] = [
    "login",
    "logout",
    "give_recognition",
    "receive_recognition",
    "profile_update",
    "admin_action",
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Activities::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Activities::Id).big_integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Activities::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Activities::CompanyId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Activities::ActivityType)
                            .string()
                            .not_null()
                            .check(Expr::col(Activities::ActivityType).is_in(ACTIVITY_TYPES)),
                    )
                    .col(ColumnDef::new(Activities::Metadata).json_binary().not_null())
                    .col(ColumnDef::new(Activities::OccurredAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Activities::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Activities::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_user_id")
                            .from(Activities::Table, Activities::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activities_company_id")
                            .from(Activities::Table, Activities::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activities_activity_type")
                    .table(Activities::Table)
                    .col(Activities::ActivityType)
                    .to_owned(),
            )
            .await?;

        // Company-scoped time range queries
        manager
            .create_index(
                Index::create()
                    .name("idx_activities_company_id_occurred_at")
                    .table(Activities::Table)
                    .col(Activities::CompanyId)
                    .col(Activities::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // Per-user activity history
        manager
            .create_index(
                Index::create()
                    .name("idx_activities_user_id_activity_type")
                    .table(Activities::Table)
                    .col(Activities::UserId)
                    .col(Activities::ActivityType)
                    .to_owned(),
            )
            .await?;

        // Filtered analytics
        manager
            .create_index(
                Index::create()
                    .name("idx_activities_company_type_and_time")
                    .table(Activities::Table)
                    .col(Activities::CompanyId)
                    .col(Activities::ActivityType)
                    .col(Activities::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Activities::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Activities {
    Table,
    Id,
    UserId,
    CompanyId,
    ActivityType,
    Metadata,
    OccurredAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
}
