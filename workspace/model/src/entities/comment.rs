pub mod repository;

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

use super::book;

/// Moderation state of a reader comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum CommentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "moderated")]
    Moderated,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Published => "published",
            CommentStatus::Moderated => "moderated",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommentStatus::Pending),
            "published" => Ok(CommentStatus::Published),
            "moderated" => Ok(CommentStatus::Moderated),
            other => Err(format!("unknown comment status '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub book_id: i32,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
    /// Set when the comment is published, cleared when it is withdrawn.
    pub published_at: Option<NaiveDateTime>,
    pub status: CommentStatus,
    #[sea_orm(column_type = "Text")]
    pub content: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "book::Entity",
        from = "Column::BookId",
        to = "book::Column::Id",
        on_delete = "Cascade"
    )]
    Book,
}

impl Related<book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Publication date a comment should carry after moving to `status`.
///
/// Publishing keeps an existing date so re-publishing does not reorder the
/// thread; any other status clears it.
pub fn publication_date(
    status: CommentStatus,
    current: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    match status {
        CommentStatus::Published => Some(current.unwrap_or(now)),
        CommentStatus::Pending | CommentStatus::Moderated => None,
    }
}
