use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Pets::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Pets::PetTypeId).uuid().not_null())
                    .col(ColumnDef::new(Pets::Status).string().not_null())
                    .col(
                        ColumnDef::new(Pets::Version)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Pets::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Pets::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Pets::Table, Pets::PetTypeId)
                            .to(PetTypes::Table, PetTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pets_status")
                    .table(Pets::Table)
                    .col(Pets::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pets::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Pets {
    Table,
    Id,
    Name,
    PetTypeId,
    Status,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PetTypes {
    Table,
    Id,
}
