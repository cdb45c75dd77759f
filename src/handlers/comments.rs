use crate::auth::policy::Resource;
use crate::auth::session::RequirePrincipal;
use crate::error::ApiError;
use crate::handlers::{ApiJson, WithLocation, with_location};
use crate::pagination::{Page, PageQuery, paginate};
use crate::schemas::{ApiResponse, AppState};
use crate::validation::{one_of, validate_request};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use model::entities::book;
use model::entities::comment::{self, CommentStatus};
use model::repository::find_required;
use model::roles::ROLE_ADMIN;
use sea_orm::{ActiveModelTrait, Iterable, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn validate_comment_status(status: &str) -> Result<(), ValidationError> {
    let names: Vec<&str> = CommentStatus::iter().map(|s| s.as_str()).collect();
    one_of(status, &names)
}

/// Request body for posting a comment on a book
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
}

/// Request body for moderating a comment
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CommentStatusRequest {
    /// pending, published or moderated
    #[validate(custom(function = "validate_comment_status"))]
    pub status: String,
}

/// Comment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub book_id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
    pub published_at: Option<NaiveDateTime>,
    pub status: String,
    pub content: String,
}

// The email address is never echoed back.
impl From<comment::Model> for CommentResponse {
    fn from(model: comment::Model) -> Self {
        Self {
            id: model.id,
            book_id: model.book_id,
            name: model.name,
            created_at: model.created_at,
            published_at: model.published_at,
            status: model.status.to_string(),
            content: model.content,
        }
    }
}

/// List the published comments of a book
#[utoipa::path(
    get,
    path = "/book/{book_id}/comments",
    tag = "comments",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
        PageQuery,
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = ApiResponse<Page<CommentResponse>>),
        (status = 404, description = "Book not found or page out of range", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_book_comments(
    Path(book_id): Path<i32>,
    Valid(Query(query)): Valid<Query<PageQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Page<CommentResponse>>>, ApiError> {
    trace!("Entering list_book_comments function for book_id: {}", book_id);
    let book = find_required::<book::Entity, _>(&state.db, book_id, "Book").await?;
    let page = query.page.unwrap_or(1);
    debug!("Fetching comments of book {} - page: {}", book.id, page);

    let comments = paginate(
        &state.db,
        comment::repository::find_published_for_book(book.id),
        page,
    )
    .await?;
    info!("Successfully retrieved {} comments", comments.items.len());
    Ok(Json(ApiResponse::ok(comments, "Comments retrieved successfully")))
}

/// Post a comment on a book; it awaits moderation
#[utoipa::path(
    post,
    path = "/book/{book_id}/comments",
    tag = "comments",
    params(
        ("book_id" = i32, Path, description = "Book ID"),
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment submitted for moderation", body = ApiResponse<CommentResponse>),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_comment(
    Path(book_id): Path<i32>,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CommentRequest>,
) -> Result<WithLocation<CommentResponse>, ApiError> {
    trace!("Entering create_comment function for book_id: {}", book_id);
    validate_request(&request)?;

    let txn = state.db.begin().await?;
    let book = find_required::<book::Entity, _>(&txn, book_id, "Book").await?;
    let comment = comment::ActiveModel {
        book_id: Set(book.id),
        name: Set(request.name),
        email: Set(request.email),
        created_at: Set(Utc::now().naive_utc()),
        published_at: Set(None),
        status: Set(CommentStatus::Pending),
        content: Set(request.content),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Comment {} submitted on book {}", comment.id, book.id);
    Ok(with_location(
        StatusCode::CREATED,
        format!("/book/{}/comments", book.id),
        CommentResponse::from(comment),
        "Comment submitted for moderation",
    ))
}

/// Change the moderation status of a comment
#[utoipa::path(
    put,
    path = "/admin/comment/{comment_id}/status",
    tag = "comments",
    params(
        ("comment_id" = i32, Path, description = "Comment ID"),
    ),
    request_body = CommentStatusRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Comment status updated", body = ApiResponse<CommentResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Missing ROLE_ADMIN", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn moderate_comment(
    Path(comment_id): Path<i32>,
    State(state): State<AppState>,
    RequirePrincipal(principal): RequirePrincipal,
    body: Result<ApiJson<CommentStatusRequest>, ApiError>,
) -> Result<Json<ApiResponse<CommentResponse>>, ApiError> {
    trace!("Entering moderate_comment function for comment_id: {}", comment_id);
    state
        .policies
        .deny_unless_granted(Some(&principal), &Resource::Any, ROLE_ADMIN)?;
    let ApiJson(request) = body?;
    validate_request(&request)?;
    let status = request
        .status
        .parse::<CommentStatus>()
        .map_err(|message| ApiError::validation("status", message))?;

    let txn = state.db.begin().await?;
    let existing = find_required::<comment::Entity, _>(&txn, comment_id, "Comment").await?;
    debug!("Moving comment {} from {} to {}", existing.id, existing.status, status);

    let published_at =
        comment::publication_date(status, existing.published_at, Utc::now().naive_utc());
    let mut active: comment::ActiveModel = existing.into();
    active.status = Set(status);
    active.published_at = Set(published_at);
    let comment = active.update(&txn).await?;
    txn.commit().await?;

    info!("Comment {} is now {}", comment.id, comment.status);
    Ok(Json(ApiResponse::ok(
        CommentResponse::from(comment),
        "Comment status updated",
    )))
}
