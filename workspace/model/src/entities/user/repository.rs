use chrono::{Duration, NaiveDateTime};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use tracing::{debug, instrument};

use super::{ActiveModel, Column, Entity, Model, PasswordAuthenticated};
use crate::RepositoryError;

pub async fn find_by_username<C: ConnectionTrait>(
    conn: &C,
    username: &str,
) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::Username.eq(username))
        .one(conn)
        .await
}

/// Replaces the stored password hash of `identity` with `new_hash`.
///
/// Fails with [`RepositoryError::UnsupportedUser`] without touching the
/// database when the identity is not a stored user.
#[instrument(skip(conn, identity, new_hash), fields(identity = identity.identifier()))]
pub async fn upgrade_password<C: ConnectionTrait>(
    conn: &C,
    identity: &dyn PasswordAuthenticated,
    new_hash: &str,
) -> Result<Model, RepositoryError> {
    let user = identity
        .as_user()
        .ok_or(RepositoryError::UnsupportedUser(identity.kind()))?;

    let mut active: ActiveModel = user.clone().into();
    active.password = Set(new_hash.to_owned());
    let updated = active.update(conn).await?;
    debug!(user_id = updated.id, "Password hash upgraded");
    Ok(updated)
}

/// The timestamp to record for a login happening at `now`.
///
/// Clocks can step backwards, so the result is never earlier than one
/// microsecond after the previous login.
pub fn next_login_stamp(previous: Option<NaiveDateTime>, now: NaiveDateTime) -> NaiveDateTime {
    match previous {
        Some(previous) if now <= previous => previous + Duration::microseconds(1),
        _ => now,
    }
}

#[instrument(skip(conn, user), fields(user_id = user.id))]
pub async fn touch_last_connected<C: ConnectionTrait>(
    conn: &C,
    user: &Model,
    now: NaiveDateTime,
) -> Result<Model, RepositoryError> {
    let stamp = next_login_stamp(user.last_connected_at, now);
    let mut active: ActiveModel = user.clone().into();
    active.last_connected_at = Set(Some(stamp));
    let updated = active.update(conn).await?;
    debug!(%stamp, "Last connection recorded");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 4, 7)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn first_login_uses_current_time() {
        assert_eq!(next_login_stamp(None, at(10, 0, 0)), at(10, 0, 0));
    }

    #[test]
    fn later_login_uses_current_time() {
        assert_eq!(next_login_stamp(Some(at(9, 0, 0)), at(10, 0, 0)), at(10, 0, 0));
    }

    #[test]
    fn clock_going_backwards_still_moves_forward() {
        let stamp = next_login_stamp(Some(at(10, 0, 0)), at(9, 59, 0));
        assert!(stamp > at(10, 0, 0));
        assert_eq!(stamp, at(10, 0, 0) + Duration::microseconds(1));
    }

    #[test]
    fn identical_timestamps_are_bumped() {
        let stamp = next_login_stamp(Some(at(10, 0, 0)), at(10, 0, 0));
        assert!(stamp > at(10, 0, 0));
    }
}
