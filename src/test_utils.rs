#[cfg(test)]
pub mod test_utils {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::auth::listener::LoginListeners;
    use crate::auth::password::PasswordHasher;
    use crate::auth::policy::PolicyRegistry;
    use crate::auth::principal::Principal;
    use crate::auth::session::SessionStore;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::Router;
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use model::entities::book::BookStatus;
    use model::entities::{author, book, editor, user};
    use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, Set};
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");
        db.execute_unprepared("PRAGMA foreign_keys = ON;")
            .await
            .expect("Failed to enable foreign keys");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Argon2 with the smallest parameters, so tests hash quickly.
    pub fn test_hasher() -> PasswordHasher {
        PasswordHasher::new(1024, 1, 1).expect("Invalid test hasher parameters")
    }

    pub async fn create_user<C: ConnectionTrait>(
        db: &C,
        username: &str,
        password: &str,
        roles: &[&str],
    ) -> user::Model {
        create_user_with_hasher(db, username, password, roles, &test_hasher()).await
    }

    pub async fn create_user_with_hasher<C: ConnectionTrait>(
        db: &C,
        username: &str,
        password: &str,
        roles: &[&str],
        hasher: &PasswordHasher,
    ) -> user::Model {
        user::ActiveModel {
            username: Set(username.to_string()),
            password: Set(hasher.hash(password).expect("Failed to hash password")),
            roles: Set(user::encode_roles(roles)),
            last_connected_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create user")
    }

    pub async fn create_author<C: ConnectionTrait>(db: &C, name: &str) -> author::Model {
        author::ActiveModel {
            name: Set(name.to_string()),
            date_of_birth: Set(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()),
            date_of_death: Set(None),
            nationality: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create author")
    }

    pub async fn create_editor<C: ConnectionTrait>(db: &C, name: &str) -> editor::Model {
        editor::ActiveModel {
            name: Set(name.to_string()),
            website: Set(None),
            country: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create editor")
    }

    pub async fn create_book<C: ConnectionTrait>(
        db: &C,
        title: &str,
        author_id: i32,
        editor_id: i32,
        created_by_id: i32,
    ) -> book::Model {
        book::ActiveModel {
            title: Set(title.to_string()),
            isbn: Set("9782070360024".to_string()),
            cover: Set("https://covers.example.com/1.jpg".to_string()),
            page_number: Set(186),
            plot: Set("A plot.".to_string()),
            status: Set(BookStatus::Available),
            edited_at: Set(Utc::now().naive_utc()),
            editor_id: Set(editor_id),
            author_id: Set(author_id),
            created_by_id: Set(created_by_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create book")
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;

        AppState {
            db,
            sessions: SessionStore::new(100, Duration::from_secs(60)),
            policies: Arc::new(PolicyRegistry::with_defaults()),
            login_listeners: Arc::new(LoginListeners::with_defaults()),
            hasher: test_hasher(),
        }
    }

    /// Opens a session for `user` without going through `/login`.
    pub async fn login_as(state: &AppState, user: &user::Model) -> String {
        state.sessions.open(Principal::from_user(user)).await
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing, returning the state it shares.
    pub async fn setup_test_app() -> (Router, AppState) {
        let _guard = init_test_tracing();

        let state = setup_test_app_state().await;
        let router = create_router(state.clone(), Duration::from_secs(30));
        (router, state)
    }
}
