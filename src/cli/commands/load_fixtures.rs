use anyhow::Result;
use sea_orm::Database;
use tracing::{debug, error, info};

use crate::config::Settings;
use crate::fixtures::{self, FIXTURE_PASSWORD, FixtureCounts};

pub async fn load_fixtures(
    database_url: &str,
    counts: FixtureCounts,
    settings: &Settings,
) -> Result<()> {
    debug!("Database URL: {}", database_url);

    let db = match Database::connect(database_url).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    let hasher = settings.security.password_hasher()?;
    fixtures::load_fixtures(&db, counts, &hasher).await?;
    info!(
        "Fixtures loaded; generated users sign in with password '{}'",
        FIXTURE_PASSWORD
    );
    Ok(())
}
