use crate::auth::policy::{IS_AUTHENTICATED, Resource};
use crate::auth::session::CurrentPrincipal;
use crate::error::ApiError;
use crate::handlers::{ApiJson, WithLocation, with_location};
use crate::pagination::{Page, paginate};
use crate::schemas::{ApiResponse, AppState};
use crate::validation::{rule_violation, validate_request_with};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::NaiveDate;
use model::entities::author::{self, repository::DateOfBirthRange};
use model::repository::find_required;
use model::roles::ROLE_BOOK_EDIT;
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

/// Query parameters for the author listing
#[derive(Debug, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct AuthorListQuery {
    /// Page number (default: 1)
    #[validate(range(min = 1, max = 10000))]
    pub page: Option<u64>,
    /// Earliest date of birth, inclusive (YYYY-MM-DD)
    pub start: Option<NaiveDate>,
    /// Latest date of birth, inclusive (YYYY-MM-DD)
    pub end: Option<NaiveDate>,
}

/// Request body for creating or editing an author
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct AuthorRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub date_of_birth: NaiveDate,
    /// Must not be before the date of birth
    pub date_of_death: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255))]
    pub nationality: Option<String>,
}

impl AuthorRequest {
    fn check(&self) -> Result<(), ApiError> {
        validate_request_with(self, |request, errors: &mut ValidationErrors| {
            if !author::lifespan_is_consistent(request.date_of_birth, request.date_of_death) {
                errors.add(
                    "date_of_death",
                    rule_violation("lifespan", "date of death cannot precede date of birth"),
                );
            }
        })
    }
}

/// Author response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorResponse {
    pub id: i32,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub date_of_death: Option<NaiveDate>,
    pub nationality: Option<String>,
}

impl From<author::Model> for AuthorResponse {
    fn from(model: author::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            date_of_birth: model.date_of_birth,
            date_of_death: model.date_of_death,
            nationality: model.nationality,
        }
    }
}

fn author_location(id: i32) -> String {
    format!("/admin/author/{id}")
}

/// List authors ordered by date of birth
#[utoipa::path(
    get,
    path = "/admin/author",
    tag = "authors",
    params(AuthorListQuery),
    responses(
        (status = 200, description = "Authors retrieved successfully", body = ApiResponse<Page<AuthorResponse>>),
        (status = 404, description = "Page out of range", body = ErrorResponse),
        (status = 422, description = "Invalid query", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_authors(
    Valid(Query(query)): Valid<Query<AuthorListQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Page<AuthorResponse>>>, ApiError> {
    trace!("Entering list_authors function");
    if let (Some(start), Some(end)) = (query.start, query.end) {
        if start > end {
            return Err(ApiError::validation("start", "start must not be after end"));
        }
    }

    let page = query.page.unwrap_or(1);
    let range = DateOfBirthRange::new(query.start, query.end);
    debug!("Fetching authors - page: {}, range: {:?}", page, range);

    let authors = paginate(&state.db, author::repository::find_by_date_of_birth(range), page).await?;
    info!("Successfully retrieved {} authors", authors.items.len());
    Ok(Json(ApiResponse::ok(authors, "Authors retrieved successfully")))
}

/// Get a specific author by ID
#[utoipa::path(
    get,
    path = "/admin/author/{author_id}",
    tag = "authors",
    params(
        ("author_id" = i32, Path, description = "Author ID"),
    ),
    responses(
        (status = 200, description = "Author retrieved successfully", body = ApiResponse<AuthorResponse>),
        (status = 404, description = "Author not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_author(
    Path(author_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AuthorResponse>>, ApiError> {
    trace!("Entering get_author function for author_id: {}", author_id);
    let author = find_required::<author::Entity, _>(&state.db, author_id, "Author").await?;
    info!("Successfully retrieved author with ID: {}", author.id);
    Ok(Json(ApiResponse::ok(
        AuthorResponse::from(author),
        "Author retrieved successfully",
    )))
}

/// Create a new author
#[utoipa::path(
    post,
    path = "/admin/author/new",
    tag = "authors",
    request_body = AuthorRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Author created successfully", body = ApiResponse<AuthorResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_author(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<ApiJson<AuthorRequest>, ApiError>,
) -> Result<WithLocation<AuthorResponse>, ApiError> {
    trace!("Entering create_author function");
    state
        .policies
        .deny_unless_granted(principal.as_ref(), &Resource::Any, IS_AUTHENTICATED)?;
    let ApiJson(request) = body?;
    request.check()?;
    debug!("Creating author with name: {}", request.name);

    let txn = state.db.begin().await?;
    let author = author::ActiveModel {
        name: Set(request.name),
        date_of_birth: Set(request.date_of_birth),
        date_of_death: Set(request.date_of_death),
        nationality: Set(request.nationality),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Author created successfully with ID: {}", author.id);
    Ok(with_location(
        StatusCode::CREATED,
        author_location(author.id),
        AuthorResponse::from(author),
        "Author created successfully",
    ))
}

/// Edit an existing author
#[utoipa::path(
    put,
    path = "/admin/author/{author_id}/edit",
    tag = "authors",
    params(
        ("author_id" = i32, Path, description = "Author ID"),
    ),
    request_body = AuthorRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Author updated successfully", body = ApiResponse<AuthorResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Missing ROLE_EDITION_DE_LIVRE", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_author(
    Path(author_id): Path<i32>,
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<ApiJson<AuthorRequest>, ApiError>,
) -> Result<WithLocation<AuthorResponse>, ApiError> {
    trace!("Entering update_author function for author_id: {}", author_id);
    state
        .policies
        .deny_unless_granted(principal.as_ref(), &Resource::Any, ROLE_BOOK_EDIT)?;
    let ApiJson(request) = body?;
    request.check()?;

    let txn = state.db.begin().await?;
    let existing = find_required::<author::Entity, _>(&txn, author_id, "Author").await?;
    debug!("Updating author {} ({})", existing.id, existing.name);

    let mut active: author::ActiveModel = existing.into();
    active.name = Set(request.name);
    active.date_of_birth = Set(request.date_of_birth);
    active.date_of_death = Set(request.date_of_death);
    active.nationality = Set(request.nationality);
    let author = active.update(&txn).await?;
    txn.commit().await?;

    info!("Author with ID {} updated successfully", author.id);
    Ok(with_location(
        StatusCode::OK,
        author_location(author.id),
        AuthorResponse::from(author),
        "Author updated successfully",
    ))
}
