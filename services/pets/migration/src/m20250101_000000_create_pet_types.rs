use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PetTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PetTypes::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(PetTypes::Code)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PetTypes::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(PetTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(PetTypes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PetTypes::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PetTypes::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PetTypes {
    Table,
    Id,
    Code,
    Name,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
