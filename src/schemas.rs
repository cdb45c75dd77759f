use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::auth::listener::LoginListeners;
use crate::auth::password::PasswordHasher;
use crate::auth::policy::PolicyRegistry;
use crate::auth::session::SessionStore;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Open sessions keyed by bearer token
    pub sessions: SessionStore,
    /// Authorization policies consulted by every protected handler
    pub policies: Arc<PolicyRegistry>,
    /// Hooks run inside the login transaction
    pub login_listeners: Arc<LoginListeners>,
    /// Hashes and verifies user passwords
    pub hasher: PasswordHasher,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// A single rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Name of the offending field, `__all__` for whole-object rules
    pub field: String,
    /// Human readable explanation
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Per-field validation failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
    /// Username of the failed login attempt, echoed back for the login form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_username: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::security::login,
        crate::handlers::security::logout,
        crate::handlers::authors::list_authors,
        crate::handlers::authors::get_author,
        crate::handlers::authors::create_author,
        crate::handlers::authors::update_author,
        crate::handlers::editors::list_editors,
        crate::handlers::editors::get_editor,
        crate::handlers::editors::create_editor,
        crate::handlers::editors::update_editor,
        crate::handlers::books::list_books,
        crate::handlers::books::get_book,
        crate::handlers::books::create_book,
        crate::handlers::books::update_book,
        crate::handlers::books::delete_book,
        crate::handlers::comments::list_book_comments,
        crate::handlers::comments::create_comment,
        crate::handlers::comments::moderate_comment,
        crate::handlers::registration::register_user,
    ),
    components(
        schemas(
            ErrorResponse,
            FieldError,
            HealthResponse,
            crate::pagination::PageQuery,
            crate::handlers::security::LoginRequest,
            crate::handlers::security::LoginResponse,
            crate::handlers::authors::AuthorRequest,
            crate::handlers::authors::AuthorResponse,
            crate::handlers::authors::AuthorListQuery,
            crate::handlers::editors::EditorRequest,
            crate::handlers::editors::EditorResponse,
            crate::handlers::books::BookRequest,
            crate::handlers::books::BookResponse,
            crate::handlers::books::BookListQuery,
            crate::handlers::comments::CommentRequest,
            crate::handlers::comments::CommentResponse,
            crate::handlers::comments::CommentStatusRequest,
            crate::handlers::registration::RegistrationRequest,
            crate::handlers::registration::UserResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "security", description = "Login and logout"),
        (name = "authors", description = "Author administration"),
        (name = "editors", description = "Editor administration"),
        (name = "books", description = "Book administration"),
        (name = "comments", description = "Reader comments and moderation"),
        (name = "users", description = "User registration"),
    ),
    info(
        title = "Bookshelf API",
        description = "Book catalog back office: authors, editors, books and reader comments",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Declares the bearer token scheme issued by `/login`.
struct BearerSecurity;

impl utoipa::Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}
