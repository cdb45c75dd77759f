use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait};

use crate::RepositoryError;

/// Loads the row with the given id or reports which entity is missing.
pub async fn find_required<E, C>(
    conn: &C,
    id: i32,
    entity: &'static str,
) -> Result<E::Model, RepositoryError>
where
    E: EntityTrait,
    E::PrimaryKey: PrimaryKeyTrait<ValueType = i32>,
    C: ConnectionTrait,
{
    E::find_by_id(id)
        .one(conn)
        .await?
        .ok_or(RepositoryError::NotFound { entity, id })
}
