pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_table;
mod m20250311_000001_add_authors_and_comments;
mod m20250407_000001_add_book_creator_foreign_key;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_table::Migration),
            Box::new(m20250311_000001_add_authors_and_comments::Migration),
            Box::new(m20250407_000001_add_book_creator_foreign_key::Migration),
        ]
    }
}
