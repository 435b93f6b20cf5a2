use sea_orm_migration::prelude::*;

mod m20250101_000000_create_pet_types;
mod m20250101_000001_create_pets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000000_create_pet_types::Migration),
            Box::new(m20250101_000001_create_pets::Migration),
            Box::new(petadopt_core::outbox::migration::Migration),
        ]
    }
}
