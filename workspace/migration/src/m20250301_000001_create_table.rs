use sea_orm_migration::sea_orm::DbBackend;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Username, 180).unique_key())
                    .col(string(Users::Password))
                    .col(text(Users::Roles).default("[]"))
                    .col(date_time_null(Users::LastConnectedAt))
                    .to_owned(),
            )
            .await?;

        // Create editors table
        manager
            .create_table(
                Table::create()
                    .table(Editors::Table)
                    .if_not_exists()
                    .col(pk_auto(Editors::Id))
                    .col(string(Editors::Name))
                    .col(string_null(Editors::Website))
                    .col(string_null(Editors::Country))
                    .to_owned(),
            )
            .await?;

        // Create books table
        let mut books = Table::create()
            .table(Books::Table)
            .if_not_exists()
            .col(pk_auto(Books::Id))
            .col(string(Books::Title))
            .col(string_len(Books::Isbn, 20))
            .col(string(Books::Cover))
            .col(integer(Books::PageNumber))
            .col(text(Books::Plot))
            .col(string_len(Books::Status, 20))
            .col(date_time(Books::EditedAt))
            .col(integer(Books::EditorId))
            .col(integer(Books::CreatedById))
            .foreign_key(
                ForeignKey::create()
                    .name("fk_books_editor")
                    .from(Books::Table, Books::EditorId)
                    .to(Editors::Table, Editors::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::Cascade),
            )
            .to_owned();

        // SQLite cannot add the creator constraint later on, declare it now.
        if manager.get_database_backend() == DbBackend::Sqlite {
            books.foreign_key(
                ForeignKey::create()
                    .name("fk_books_created_by")
                    .from(Books::Table, Books::CreatedById)
                    .to(Users::Table, Users::Id)
                    .on_delete(ForeignKeyAction::Restrict)
                    .on_update(ForeignKeyAction::Cascade),
            );
        }

        manager.create_table(books).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Editors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Password,
    Roles,
    LastConnectedAt,
}

#[derive(DeriveIden)]
enum Editors {
    Table,
    Id,
    Name,
    Website,
    Country,
}

#[derive(DeriveIden)]
enum Books {
    Table,
    Id,
    Title,
    Isbn,
    Cover,
    PageNumber,
    Plot,
    Status,
    EditedAt,
    EditorId,
    CreatedById,
}
