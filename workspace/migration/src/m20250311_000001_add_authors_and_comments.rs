use sea_orm_migration::sea_orm::DbBackend;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. Create authors table
        manager
            .create_table(
                Table::create()
                    .table(Authors::Table)
                    .if_not_exists()
                    .col(pk_auto(Authors::Id))
                    .col(string(Authors::Name))
                    .col(date(Authors::DateOfBirth))
                    .col(date_null(Authors::DateOfDeath))
                    .col(string_null(Authors::Nationality))
                    .to_owned(),
            )
            .await?;

        // 2. Create comments table
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(pk_auto(Comments::Id))
                    .col(integer(Comments::BookId))
                    .col(string(Comments::Name))
                    .col(string(Comments::Email))
                    .col(date_time(Comments::CreatedAt))
                    .col(date_time_null(Comments::PublishedAt))
                    .col(string_len(Comments::Status, 20))
                    .col(text(Comments::Content))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_book")
                            .from(Comments::Table, Comments::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_book")
                    .table(Comments::Table)
                    .col(Comments::BookId)
                    .to_owned(),
            )
            .await?;

        // 3. Attach every book to its author
        if manager.get_database_backend() == DbBackend::Sqlite {
            // SQLite only accepts a column-level reference on a nullable column here.
            manager
                .alter_table(
                    Table::alter()
                        .table(Books::Table)
                        .add_column(
                            ColumnDef::new(Books::AuthorId)
                                .integer()
                                .null()
                                .extra("REFERENCES authors (id)"),
                        )
                        .to_owned(),
                )
                .await?;
        } else {
            manager
                .alter_table(
                    Table::alter()
                        .table(Books::Table)
                        .add_column(ColumnDef::new(Books::AuthorId).integer().not_null())
                        .to_owned(),
                )
                .await?;
            manager
                .create_foreign_key(
                    ForeignKey::create()
                        .name("fk_books_author")
                        .from(Books::Table, Books::AuthorId)
                        .to(Authors::Table, Authors::Id)
                        .on_delete(ForeignKeyAction::Restrict)
                        .on_update(ForeignKeyAction::Cascade)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .name("idx_books_author")
                    .table(Books::Table)
                    .col(Books::AuthorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_books_author").table(Books::Table).to_owned())
            .await?;

        // SQLite cannot drop a column that takes part in a foreign key, the
        // column stays behind there.
        if manager.get_database_backend() != DbBackend::Sqlite {
            manager
                .drop_foreign_key(
                    ForeignKey::drop()
                        .name("fk_books_author")
                        .table(Books::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .alter_table(
                    Table::alter()
                        .table(Books::Table)
                        .drop_column(Books::AuthorId)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Authors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Authors {
    Table,
    Id,
    Name,
    DateOfBirth,
    DateOfDeath,
    Nationality,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    BookId,
    Name,
    Email,
    CreatedAt,
    PublishedAt,
    Status,
    Content,
}

#[derive(DeriveIden)]
enum Books {
    Table,
    Id,
    AuthorId,
}
