use anyhow::{Result, bail};
use model::entities::user;
use model::roles;
use sea_orm::{ActiveModelTrait, Database, Set};
use tracing::{debug, info};

use crate::config::Settings;

pub async fn create_user(
    database_url: &str,
    username: &str,
    password: &str,
    role_names: &[String],
    settings: &Settings,
) -> Result<()> {
    debug!("Database URL: {}", database_url);

    if let Some(unknown) = role_names.iter().find(|r| !roles::is_known(r)) {
        bail!("Unknown role '{}'; expected one of {:?}", unknown, roles::ALL);
    }
    if password.len() < 6 {
        bail!("Password must be at least 6 characters long");
    }

    let db = Database::connect(database_url).await?;
    if user::repository::find_by_username(&db, username).await?.is_some() {
        bail!("User '{}' already exists", username);
    }

    let hasher = settings.security.password_hasher()?;
    let created = user::ActiveModel {
        username: Set(username.to_string()),
        password: Set(hasher.hash(password)?),
        roles: Set(user::encode_roles(roles::normalize(role_names))),
        last_connected_at: Set(None),
        ..Default::default()
    }
    .insert(&db)
    .await?;

    info!(id = created.id, username = %created.username, roles = ?created.role_names(), "User created");
    Ok(())
}
