use crate::auth::policy::Resource;
use crate::auth::session::CurrentPrincipal;
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::schemas::{ApiResponse, AppState};
use crate::validation::validate_request;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::NaiveDateTime;
use model::entities::user;
use model::roles::{self, ROLE_ADMIN};
use sea_orm::{ActiveModelTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn validate_roles(names: &[String]) -> Result<(), ValidationError> {
    match names.iter().find(|name| !roles::is_known(name)) {
        None => Ok(()),
        Some(unknown) => {
            let mut error = ValidationError::new("role");
            error.message = Some(format!("unknown role '{unknown}'").into());
            Err(error)
        }
    }
}

/// Request body for registering a user
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct RegistrationRequest {
    #[validate(length(min = 3, max = 180))]
    pub username: String,
    /// Hashed before storage, never persisted as is
    #[validate(length(
        min = 6,
        max = 4096,
        message = "your password should be at least 6 characters"
    ))]
    pub plain_password: String,
    /// Extra roles; ROLE_USER is always implied
    #[serde(default)]
    #[validate(custom(function = "validate_roles"))]
    pub roles: Vec<String>,
}

impl std::fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("username", &self.username)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// User response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub roles: Vec<String>,
    pub last_connected_at: Option<NaiveDateTime>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            roles: model.role_names(),
            username: model.username,
            last_connected_at: model.last_connected_at,
        }
    }
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/admin/user/new",
    tag = "users",
    request_body = RegistrationRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "User registered successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Missing ROLE_ADMIN", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse),
        (status = 422, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn register_user(
    State(state): State<AppState>,
    CurrentPrincipal(principal): CurrentPrincipal,
    body: Result<ApiJson<RegistrationRequest>, ApiError>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    trace!("Entering register_user function");
    state
        .policies
        .deny_unless_granted(principal.as_ref(), &Resource::Any, ROLE_ADMIN)?;
    let ApiJson(request) = body?;
    validate_request(&request)?;

    let txn = state.db.begin().await?;
    if user::repository::find_by_username(&txn, &request.username)
        .await?
        .is_some()
    {
        warn!("Username '{}' is already taken", request.username);
        return Err(ApiError::Conflict(format!(
            "username '{}' already exists",
            request.username
        )));
    }

    debug!("Hashing password for new user '{}'", request.username);
    let password = state.hasher.hash(&request.plain_password)?;
    let user = user::ActiveModel {
        username: Set(request.username),
        password: Set(password),
        roles: Set(user::encode_roles(&request.roles)),
        last_connected_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(
        "User registered successfully with ID: {}, username: {}",
        user.id, user.username
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            UserResponse::from(user),
            "User registered successfully",
        )),
    ))
}
