use crate::auth::session::logout_interceptor;
use crate::handlers::{
    authors::{create_author, get_author, list_authors, update_author},
    books::{create_book, delete_book, get_book, list_books, update_book},
    comments::{create_comment, list_book_comments, moderate_comment},
    editors::{create_editor, get_editor, list_editors, update_editor},
    health::health_check,
    registration::register_user,
    security::{login, logout},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Security
        .route("/login", post(login))
        .route("/logout", get(logout))
        // Author administration
        .route("/admin/author", get(list_authors))
        .route("/admin/author/new", post(create_author))
        .route("/admin/author/:author_id", get(get_author))
        .route("/admin/author/:author_id/edit", put(update_author))
        // Editor administration
        .route("/admin/editor", get(list_editors))
        .route("/admin/editor/new", post(create_editor))
        .route("/admin/editor/:editor_id", get(get_editor))
        .route("/admin/editor/:editor_id/edit", put(update_editor))
        // Book administration
        .route("/admin/book", get(list_books))
        .route("/admin/book/new", post(create_book))
        .route("/admin/book/:book_id", get(get_book))
        .route("/admin/book/:book_id", delete(delete_book))
        .route("/admin/book/:book_id/edit", put(update_book))
        // Comments
        .route("/book/:book_id/comments", get(list_book_comments))
        .route("/book/:book_id/comments", post(create_comment))
        .route("/admin/comment/:comment_id/status", put(moderate_comment))
        // Users
        .route("/admin/user/new", post(register_user))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Session termination happens before routing reaches the logout handler
        .layer(middleware::from_fn_with_state(state.clone(), logout_interceptor))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
