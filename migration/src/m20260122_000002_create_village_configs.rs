use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VillageConfigs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VillageConfigs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VillageConfigs::ServerId).integer().not_null())
                    .col(ColumnDef::new(VillageConfigs::VillageId).integer().not_null())
                    .col(ColumnDef::new(VillageConfigs::Targets).json().not_null())
                    .col(
                        ColumnDef::new(VillageConfigs::NextTargetIndex)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VillageConfigs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(VillageConfigs::UpdatedAt)
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
                    .name("idx_village_configs_server_village")
                    .table(VillageConfigs::Table)
                    .col(VillageConfigs::ServerId)
                    .col(VillageConfigs::VillageId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VillageConfigs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VillageConfigs {
    Table,
    Id,
    ServerId,
    VillageId,
    Targets,
    NextTargetIndex,
    CreatedAt,
    UpdatedAt,
}
