use crate::auth::policy::Resource;
use crate::auth::session::CurrentPrincipal;
use crate::error::ApiError;
use crate::handlers::{ApiJson, WithLocation, with_location};
use crate::pagination::{Page, PageQuery, paginate};
use crate::schemas::{ApiResponse, AppState};
use crate::validation::validate_request;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use model::entities::editor;
use model::repository::find_required;
use model::roles::{ROLE_BOOK_CREATE, ROLE_BOOK_EDIT};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating or editing an editor
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct EditorRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(url, length(max = 255))]
    pub website: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub country: Option<String>,
}

/// Editor response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EditorResponse {
    pub id: i32,
    pub name: String,
    pub website: Option<String>,
    pub country: Option<String>,
}

impl From<editor::Model> for EditorResponse {
    fn from(model: editor::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            website: model.website,
            country: model.country,
        }
    }
}

fn editor_location(id: i32) -> String {
    format!("/admin/editor/{id}")
}

/// List editors
#[utoipa::path(
    get,
    path = "/admin/editor",
    tag = "editors",
    params(PageQuery),
    responses(
        (status = 200, description = "Editors retrieved successfully", body = ApiResponse<Page<EditorResponse>>),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_editors(
    Valid(Query(query)): Valid<Query<PageQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Page<EditorResponse>>>, ApiError> {
    trace!("Entering list_editors function");
    let page = query.page.unwrap_or(1);
    debug!("Fetching editors - page: {}", page);

    let select = editor::Entity::find()
        .order_by_asc(editor::Column::Name)
        .order_by_asc(editor::Column::Id);
    let editors = paginate(&state.db, select, page).await?;
    info!("Successfully retrieved {} editors", editors.items.len());
    Ok(Json(ApiResponse::ok(editors, "Editors retrieved successfully")))
}

/// Get a specific editor by ID
#[utoipa::path(
    get,
    path = "/admin/editor/{editor_id}",
    tag = "editors",
    params(
        ("editor_id" = i32, Path, description = "Editor ID"),
    ),
    responses(
        (status = 200, description = "Editor retrieved successfully", body = ApiResponse<EditorResponse>),
        (status = 404, description = "Editor not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_editor(
    Path(editor_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<EditorResponse>>, ApiError> {
    trace!("Entering get_editor function for editor_id: {}", editor_id);
    let editor = find_required::<editor::Entity, _>(&state.db, editor_id, "Editor").await?;
    Ok(Json(ApiResponse::ok(
        EditorResponse::from(editor),
        "Editor retrieved successfully",
    )))
}

/// Create a new editor
#[utoipa::path(
    post,
    path = "/admin/editor/new",
    tag = "editors",
    request_body = EditorRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Editor created successfully", body = ApiResponse<EditorResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Missing ROLE_AJOUT_DE_LIVRE", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_editor(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<ApiJson<EditorRequest>, ApiError>,
) -> Result<WithLocation<EditorResponse>, ApiError> {
    trace!("Entering create_editor function");
    state
        .policies
        .deny_unless_granted(principal.as_ref(), &Resource::Any, ROLE_BOOK_CREATE)?;
    let ApiJson(request) = body?;
    validate_request(&request)?;
    debug!("Creating editor with name: {}", request.name);

    let txn = state.db.begin().await?;
    let editor = editor::ActiveModel {
        name: Set(request.name),
        website: Set(request.website),
        country: Set(request.country),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!("Editor created successfully with ID: {}", editor.id);
    Ok(with_location(
        StatusCode::CREATED,
        editor_location(editor.id),
        EditorResponse::from(editor),
        "Editor created successfully",
    ))
}

/// Edit an existing editor
#[utoipa::path(
    put,
    path = "/admin/editor/{editor_id}/edit",
    tag = "editors",
    params(
        ("editor_id" = i32, Path, description = "Editor ID"),
    ),
    request_body = EditorRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Editor updated successfully", body = ApiResponse<EditorResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Missing ROLE_AJOUT_DE_LIVRE or ROLE_EDITION_DE_LIVRE", body = ErrorResponse),
        (status = 404, description = "Editor not found", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_editor(
    Path(editor_id): Path<i32>,
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<ApiJson<EditorRequest>, ApiError>,
) -> Result<WithLocation<EditorResponse>, ApiError> {
    trace!("Entering update_editor function for editor_id: {}", editor_id);
    // Renaming an editor needs both book roles.
    for role in [ROLE_BOOK_CREATE, ROLE_BOOK_EDIT] {
        state
            .policies
            .deny_unless_granted(principal.as_ref(), &Resource::Any, role)?;
    }
    let ApiJson(request) = body?;
    validate_request(&request)?;

    let txn = state.db.begin().await?;
    let existing = find_required::<editor::Entity, _>(&txn, editor_id, "Editor").await?;
    debug!("Updating editor {} ({})", existing.id, existing.name);

    let mut active: editor::ActiveModel = existing.into();
    active.name = Set(request.name);
    active.website = Set(request.website);
    active.country = Set(request.country);
    let editor = active.update(&txn).await?;
    txn.commit().await?;

    info!("Editor with ID {} updated successfully", editor.id);
    Ok(with_location(
        StatusCode::OK,
        editor_location(editor.id),
        EditorResponse::from(editor),
        "Editor updated successfully",
    ))
}
