use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select};

use super::{BookStatus, Column, Entity};

/// Books ordered by most recent edition date, optionally restricted to one
/// status.
pub fn find_by_status(status: Option<BookStatus>) -> Select<Entity> {
    let mut query = Entity::find();
    if let Some(status) = status {
        query = query.filter(Column::Status.eq(status));
    }
    query
        .order_by_desc(Column::EditedAt)
        .order_by_asc(Column::Id)
}

