pub mod repository;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

use super::{author, comment, editor, user};

/// Availability of a book in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum BookStatus {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "borrowed")]
    Borrowed,
    #[sea_orm(string_value = "unavailable")]
    Unavailable,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "borrowed" => Ok(BookStatus::Borrowed),
            "unavailable" => Ok(BookStatus::Unavailable),
            other => Err(format!("unknown book status '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub isbn: String,
    /// URL of the cover picture.
    pub cover: String,
    pub page_number: i32,
    #[sea_orm(column_type = "Text")]
    pub plot: String,
    pub status: BookStatus,
    pub edited_at: NaiveDateTime,
    pub editor_id: i32,
    pub author_id: i32,
    /// The user who registered the book. Drives the creator policy.
    pub created_by_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "editor::Entity",
        from = "Column::EditorId",
        to = "editor::Column::Id"
    )]
    Editor,
    #[sea_orm(
        belongs_to = "author::Entity",
        from = "Column::AuthorId",
        to = "author::Column::Id"
    )]
    Author,
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::CreatedById",
        to = "user::Column::Id"
    )]
    CreatedBy,
    #[sea_orm(has_many = "comment::Entity")]
    Comment,
}

impl Related<editor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Editor.def()
    }
}

impl Related<author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CreatedBy.def()
    }
}

impl Related<comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Id of the user who created the book.
    pub fn created_by(&self) -> i32 {
        self.created_by_id
    }

    pub fn is_created_by(&self, user_id: i32) -> bool {
        self.created_by() == user_id
    }
}
