use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::path::Path;
use tracing::{info, debug, trace, error};

/// Path of the database file behind a `sqlite://` URL, if any.
fn sqlite_file(database_url: &str) -> Option<&str> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split('?').next()?;
    (!path.is_empty() && !path.contains(":memory:")).then_some(path)
}

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");
    debug!("Database URL: {}", database_url);

    if let Some(parent) = sqlite_file(database_url).and_then(|file| Path::new(file).parent()) {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            info!("Creating database directory {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }

    trace!("Attempting to connect to database");
    let db: DatabaseConnection = match Database::connect(database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            debug!("Database connection established");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    info!("Running database migrations");
    trace!("Executing migration up command");
    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
            debug!("All pending migrations have been applied");
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }

    info!("Database initialization completed successfully!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_file_extraction() {
        assert_eq!(
            sqlite_file("sqlite:///var/lib/bookshelf/db.sqlite?mode=rwc"),
            Some("/var/lib/bookshelf/db.sqlite")
        );
        assert_eq!(sqlite_file("sqlite://bookshelf.db"), Some("bookshelf.db"));
        assert_eq!(sqlite_file("sqlite::memory:"), None);
        assert_eq!(sqlite_file("postgresql://localhost/books"), None);
    }

    #[tokio::test]
    async fn migrations_apply_to_a_fresh_file() {
        let dir = std::env::temp_dir().join(format!("bookshelf-initdb-{}", std::process::id()));
        let file = dir.join("nested").join("books.sqlite");
        let url = format!("sqlite://{}?mode=rwc", file.display());

        init_database(&url).await.unwrap();
        assert!(file.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
