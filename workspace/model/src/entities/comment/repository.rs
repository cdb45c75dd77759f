use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select};

use super::{Column, CommentStatus, Entity};

/// Published comments of a book, most recently published first.
pub fn find_published_for_book(book_id: i32) -> Select<Entity> {
    Entity::find()
        .filter(Column::BookId.eq(book_id))
        .filter(Column::Status.eq(CommentStatus::Published))
        .order_by_desc(Column::PublishedAt)
        .order_by_asc(Column::Id)
}
