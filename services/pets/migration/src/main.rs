use sea_orm_migration::prelude::*;

use petadopt_pets_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
