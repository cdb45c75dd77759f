pub mod repository;

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;

/// A writer of books.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub date_of_birth: NaiveDate,
    /// Never before `date_of_birth` when present.
    pub date_of_death: Option<NaiveDate>,
    pub nationality: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book::Entity")]
    Book,
}

impl Related<super::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_alive(&self) -> bool {
        self.date_of_death.is_none()
    }
}

/// Checks that a lifespan does not end before it starts.
pub fn lifespan_is_consistent(date_of_birth: NaiveDate, date_of_death: Option<NaiveDate>) -> bool {
    date_of_death.is_none_or(|death| death >= date_of_birth)
}
