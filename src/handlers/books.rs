use crate::auth::policy::{BOOK_IS_CREATOR, Resource};
use crate::auth::principal::Principal;
use crate::auth::session::{CurrentPrincipal, RequirePrincipal};
use crate::error::ApiError;
use crate::handlers::{ApiJson, WithLocation, with_location};
use crate::pagination::{Page, paginate};
use crate::schemas::{ApiResponse, AppState, FieldError};
use crate::validation::{one_of, validate_isbn, validate_request};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use model::entities::book::{self, BookStatus};
use model::entities::{author, editor};
use model::repository::find_required;
use model::roles::{ROLE_BOOK_CREATE, ROLE_BOOK_EDIT};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, Iterable, ModelTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

fn validate_book_status(status: &str) -> Result<(), ValidationError> {
    let names: Vec<&str> = BookStatus::iter().map(|s| s.as_str()).collect();
    one_of(status, &names)
}

fn parse_status(status: &str) -> Result<BookStatus, ApiError> {
    status
        .parse::<BookStatus>()
        .map_err(|message| ApiError::validation("status", message))
}

/// Query parameters for the book listing
#[derive(Debug, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct BookListQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Only books with this status (available, borrowed, unavailable)
    #[validate(custom(function = "validate_book_status"))]
    pub status: Option<String>,
}

/// Request body for creating or editing a book
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct BookRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// ISBN-10 or ISBN-13, hyphens allowed
    #[validate(custom(function = "validate_isbn"))]
    pub isbn: String,
    /// URL of the cover picture
    #[validate(url, length(max = 255))]
    pub cover: String,
    #[validate(range(min = 1, max = 100000))]
    pub page_number: i32,
    #[validate(length(min = 1))]
    pub plot: String,
    /// available, borrowed or unavailable
    #[validate(custom(function = "validate_book_status"))]
    pub status: String,
    pub author_id: i32,
    pub editor_id: i32,
}

/// Book response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub cover: String,
    pub page_number: i32,
    pub plot: String,
    pub status: String,
    pub edited_at: NaiveDateTime,
    pub author_id: i32,
    pub editor_id: i32,
    pub created_by_id: i32,
}

impl From<book::Model> for BookResponse {
    fn from(model: book::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            isbn: model.isbn,
            cover: model.cover,
            page_number: model.page_number,
            plot: model.plot,
            status: model.status.to_string(),
            edited_at: model.edited_at,
            author_id: model.author_id,
            editor_id: model.editor_id,
            created_by_id: model.created_by_id,
        }
    }
}

fn book_location(id: i32) -> String {
    format!("/admin/book/{id}")
}

/// Reports unknown author or editor ids as field errors.
async fn check_references<C: ConnectionTrait>(
    conn: &C,
    request: &BookRequest,
) -> Result<(), ApiError> {
    let mut details = Vec::new();
    if author::Entity::find_by_id(request.author_id).one(conn).await?.is_none() {
        details.push(FieldError::new("author_id", "unknown author"));
    }
    if editor::Entity::find_by_id(request.editor_id).one(conn).await?.is_none() {
        details.push(FieldError::new("editor_id", "unknown editor"));
    }
    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(details))
    }
}

/// Editing or deleting requires the edit role or being the book's creator.
fn ensure_may_modify(
    state: &AppState,
    principal: &Principal,
    book: &book::Model,
) -> Result<(), ApiError> {
    let policies = &state.policies;
    if policies.is_granted(Some(principal), &Resource::Any, ROLE_BOOK_EDIT)
        || policies.is_granted(Some(principal), &Resource::Book(book), BOOK_IS_CREATOR)
    {
        return Ok(());
    }
    warn!(
        "User {} may not modify book {} created by {}",
        principal.id,
        book.id,
        book.created_by()
    );
    Err(policies.denial(Some(principal), BOOK_IS_CREATOR))
}

/// List books, most recently edited first
#[utoipa::path(
    get,
    path = "/admin/book",
    tag = "books",
    params(BookListQuery),
    responses(
        (status = 200, description = "Books retrieved successfully", body = ApiResponse<Page<BookResponse>>),
        (status = 404, description = "Page out of range", body = ErrorResponse),
        (status = 422, description = "Invalid query", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_books(
    Valid(Query(query)): Valid<Query<BookListQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Page<BookResponse>>>, ApiError> {
    trace!("Entering list_books function");
    let page = query.page.unwrap_or(1);
    let status = query.status.as_deref().map(parse_status).transpose()?;
    debug!("Fetching books - page: {}, status: {:?}", page, status);

    let books = paginate(&state.db, book::repository::find_by_status(status), page).await?;
    info!("Successfully retrieved {} books", books.items.len());
    Ok(Json(ApiResponse::ok(books, "Books retrieved successfully")))
}

/// Get a specific book by ID
#[utoipa::path(
    get,
    path = "/admin/book/{book_id}",
    tag = "books",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
    ),
    responses(
        (status = 200, description = "Book retrieved successfully", body = ApiResponse<BookResponse>),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_book(
    Path(book_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BookResponse>>, ApiError> {
    trace!("Entering get_book function for book_id: {}", book_id);
    let book = find_required::<book::Entity, _>(&state.db, book_id, "Book").await?;
    Ok(Json(ApiResponse::ok(
        BookResponse::from(book),
        "Book retrieved successfully",
    )))
}

/// Create a new book owned by the caller
#[utoipa::path(
    post,
    path = "/admin/book/new",
    tag = "books",
    request_body = BookRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Book created successfully", body = ApiResponse<BookResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Missing ROLE_AJOUT_DE_LIVRE", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_book(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<ApiJson<BookRequest>, ApiError>,
) -> Result<WithLocation<BookResponse>, ApiError> {
    trace!("Entering create_book function");
    state
        .policies
        .deny_unless_granted(principal.as_ref(), &Resource::Any, ROLE_BOOK_CREATE)?;
    let Some(principal) = principal else {
        return Err(ApiError::Unauthenticated);
    };
    let ApiJson(request) = body?;
    validate_request(&request)?;
    let status = parse_status(&request.status)?;

    let txn = state.db.begin().await?;
    check_references(&txn, &request).await?;
    debug!("Creating book '{}' for user {}", request.title, principal.id);

    let book = book::ActiveModel {
        title: Set(request.title),
        isbn: Set(request.isbn),
        cover: Set(request.cover),
        page_number: Set(request.page_number),
        plot: Set(request.plot),
        status: Set(status),
        edited_at: Set(Utc::now().naive_utc()),
        editor_id: Set(request.editor_id),
        author_id: Set(request.author_id),
        created_by_id: Set(principal.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Book created successfully with ID: {}", book.id);
    Ok(with_location(
        StatusCode::CREATED,
        book_location(book.id),
        BookResponse::from(book),
        "Book created successfully",
    ))
}

/// Edit an existing book
#[utoipa::path(
    put,
    path = "/admin/book/{book_id}/edit",
    tag = "books",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
    ),
    request_body = BookRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Book updated successfully", body = ApiResponse<BookResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Neither editor nor creator of the book", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_book(
    Path(book_id): Path<i32>,
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    body: Result<ApiJson<BookRequest>, ApiError>,
) -> Result<WithLocation<BookResponse>, ApiError> {
    trace!("Entering update_book function for book_id: {}", book_id);

    let txn = state.db.begin().await?;
    let existing = find_required::<book::Entity, _>(&txn, book_id, "Book").await?;
    ensure_may_modify(&state, &principal, &existing)?;
    let ApiJson(request) = body?;
    validate_request(&request)?;
    let status = parse_status(&request.status)?;
    check_references(&txn, &request).await?;
    debug!("Updating book {} ({})", existing.id, existing.title);

    let mut active: book::ActiveModel = existing.into();
    active.title = Set(request.title);
    active.isbn = Set(request.isbn);
    active.cover = Set(request.cover);
    active.page_number = Set(request.page_number);
    active.plot = Set(request.plot);
    active.status = Set(status);
    active.edited_at = Set(Utc::now().naive_utc());
    active.editor_id = Set(request.editor_id);
    active.author_id = Set(request.author_id);
    let book = active.update(&txn).await?;
    txn.commit().await?;

    info!("Book with ID {} updated successfully", book.id);
    Ok(with_location(
        StatusCode::OK,
        book_location(book.id),
        BookResponse::from(book),
        "Book updated successfully",
    ))
}

/// Delete a book and its comments
#[utoipa::path(
    delete,
    path = "/admin/book/{book_id}",
    tag = "books",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
    ),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Book deleted successfully"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Neither editor nor creator of the book", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_book(
    Path(book_id): Path<i32>,
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
) -> Result<StatusCode, ApiError> {
    trace!("Entering delete_book function for book_id: {}", book_id);

    let txn = state.db.begin().await?;
    let existing = find_required::<book::Entity, _>(&txn, book_id, "Book").await?;
    ensure_may_modify(&state, &principal, &existing)?;
    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("Book with ID {} deleted successfully", book_id);
    Ok(StatusCode::NO_CONTENT)
}
