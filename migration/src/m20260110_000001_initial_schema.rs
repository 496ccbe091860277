use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create server_plans table
        manager
            .create_table(
                Table::create()
                    .table(ServerPlans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServerPlans::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServerPlans::ServerId).integer().not_null())
                    .col(ColumnDef::new(ServerPlans::TaskKind).string().not_null())
                    .col(ColumnDef::new(ServerPlans::IntervalMs).big_integer().not_null())
                    .col(
                        ColumnDef::new(ServerPlans::NextDueAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServerPlans::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ServerPlans::IsBlocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ServerPlans::BlockedUntil).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ServerPlans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ServerPlans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_server_plans_server_kind")
                    .table(ServerPlans::Table)
                    .col(ServerPlans::ServerId)
                    .col(ServerPlans::TaskKind)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_server_plans_next_due")
                    .table(ServerPlans::Table)
                    .col(ServerPlans::NextDueAt)
                    .to_owned(),
            )
            .await?;

        // Create execution_logs table
        manager
            .create_table(
                Table::create()
                    .table(ExecutionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExecutionLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExecutionLogs::ServerId).integer().not_null())
                    .col(ColumnDef::new(ExecutionLogs::VillageId).integer())
                    .col(ColumnDef::new(ExecutionLogs::Title).string().not_null())
                    .col(ColumnDef::new(ExecutionLogs::Description).string())
                    .col(ColumnDef::new(ExecutionLogs::Status).string().not_null())
                    .col(
                        ColumnDef::new(ExecutionLogs::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExecutionLogs::EndedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_execution_logs_server_started")
                    .table(ExecutionLogs::Table)
                    .col(ExecutionLogs::ServerId)
                    .col(ExecutionLogs::StartedAt)
                    .to_owned(),
            )
            .await?;

        // Create activity_logs table
        manager
            .create_table(
                Table::create()
                    .table(ActivityLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ActivityLogs::ExecutionLogId).uuid())
                    .col(ColumnDef::new(ActivityLogs::ServerId).integer().not_null())
                    .col(ColumnDef::new(ActivityLogs::OperationType).string().not_null())
                    .col(ColumnDef::new(ActivityLogs::EventType).string().not_null())
                    .col(ColumnDef::new(ActivityLogs::Message).string().not_null())
                    .col(ColumnDef::new(ActivityLogs::Metadata).json())
                    .col(
                        ColumnDef::new(ActivityLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_logs_execution")
                    .table(ActivityLogs::Table)
                    .col(ActivityLogs::ExecutionLogId)
                    .col(ActivityLogs::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Create scheduled_attacks table
        manager
            .create_table(
                Table::create()
                    .table(ScheduledAttacks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduledAttacks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScheduledAttacks::ServerId).integer().not_null())
                    .col(ColumnDef::new(ScheduledAttacks::VillageId).integer())
                    .col(ColumnDef::new(ScheduledAttacks::TargetId).integer().not_null())
                    .col(
                        ColumnDef::new(ScheduledAttacks::SourceCoordinates)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledAttacks::TargetCoordinates)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduledAttacks::AttackType).string().not_null())
                    .col(
                        ColumnDef::new(ScheduledAttacks::SendTimeFrom)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledAttacks::SendTimeTo)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduledAttacks::Status).string().not_null())
                    .col(ColumnDef::new(ScheduledAttacks::ExecutedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScheduledAttacks::ErrorMessage).string())
                    .col(
                        ColumnDef::new(ScheduledAttacks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScheduledAttacks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Duplicate dispatch windows are rejected at the database level
        manager
            .create_index(
                Index::create()
                    .name("idx_scheduled_attacks_window")
                    .table(ScheduledAttacks::Table)
                    .col(ScheduledAttacks::ServerId)
                    .col(ScheduledAttacks::VillageId)
                    .col(ScheduledAttacks::TargetId)
                    .col(ScheduledAttacks::SendTimeFrom)
                    .col(ScheduledAttacks::SendTimeTo)
                    .col(ScheduledAttacks::AttackType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scheduled_attacks_status")
                    .table(ScheduledAttacks::Table)
                    .col(ScheduledAttacks::ServerId)
                    .col(ScheduledAttacks::Status)
                    .to_owned(),
            )
            .await?;

        // Create account_credentials table
        manager
            .create_table(
                Table::create()
                    .table(AccountCredentials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccountCredentials::ServerId)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccountCredentials::Username).string().not_null())
                    .col(ColumnDef::new(AccountCredentials::Password).string().not_null())
                    .col(ColumnDef::new(AccountCredentials::World).string().not_null())
                    .col(ColumnDef::new(AccountCredentials::Cookies).json())
                    .col(
                        ColumnDef::new(AccountCredentials::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AccountCredentials::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScheduledAttacks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ExecutionLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServerPlans::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServerPlans {
    Table,
    Id,
    ServerId,
    TaskKind,
    IntervalMs,
    NextDueAt,
    IsActive,
    IsBlocked,
    BlockedUntil,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExecutionLogs {
    Table,
    Id,
    ServerId,
    VillageId,
    Title,
    Description,
    Status,
    StartedAt,
    EndedAt,
}

#[derive(DeriveIden)]
enum ActivityLogs {
    Table,
    Id,
    ExecutionLogId,
    ServerId,
    OperationType,
    EventType,
    Message,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ScheduledAttacks {
    Table,
    Id,
    ServerId,
    VillageId,
    TargetId,
    SourceCoordinates,
    TargetCoordinates,
    AttackType,
    SendTimeFrom,
    SendTimeTo,
    Status,
    ExecutedAt,
    ErrorMessage,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AccountCredentials {
    Table,
    ServerId,
    Username,
    Password,
    World,
    Cookies,
    UpdatedAt,
}
