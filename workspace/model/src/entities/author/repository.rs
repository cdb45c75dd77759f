use chrono::NaiveDate;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select};

use super::{Column, Entity};

/// Inclusive bounds on an author's date of birth. Missing bounds are open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateOfBirthRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateOfBirthRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }
}

/// Authors born within `range`, oldest first. Ties are broken by id so that
/// pages stay stable.
pub fn find_by_date_of_birth(range: DateOfBirthRange) -> Select<Entity> {
    let mut query = Entity::find();
    if let Some(start) = range.start {
        query = query.filter(Column::DateOfBirth.gte(start));
    }
    if let Some(end) = range.end {
        query = query.filter(Column::DateOfBirth.lte(end));
    }
    query
        .order_by_asc(Column::DateOfBirth)
        .order_by_asc(Column::Id)
}
