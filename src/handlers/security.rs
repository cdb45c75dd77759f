use crate::auth::principal::Principal;
use crate::error::ApiError;
use crate::handlers::ApiJson;
use crate::schemas::{ApiResponse, AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use model::entities::user;
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace, warn};
use utoipa::ToSchema;

/// Credentials posted to `/login`
#[derive(Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// An open session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token to send in the Authorization header
    pub token: String,
    pub username: String,
    pub roles: Vec<String>,
}

fn invalid_credentials(username: &str) -> ApiError {
    ApiError::InvalidCredentials {
        last_username: username.to_string(),
    }
}

/// Sign in with a username and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "security",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials, last username echoed back", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    trace!("Entering login function");

    let txn = state.db.begin().await?;
    let Some(stored) = user::repository::find_by_username(&txn, &request.username).await? else {
        warn!("Login attempt for unknown user '{}'", request.username);
        return Err(invalid_credentials(&request.username));
    };

    if !state.hasher.verify(&request.password, &stored.password)? {
        warn!("Wrong password for user '{}'", request.username);
        return Err(invalid_credentials(&request.username));
    }

    let stored = if state.hasher.needs_rehash(&stored.password)? {
        debug!("Upgrading password hash of user {}", stored.id);
        let new_hash = state.hasher.hash(&request.password)?;
        user::repository::upgrade_password(&txn, &stored, &new_hash).await?
    } else {
        stored
    };

    if let Err(e) = state.login_listeners.dispatch(&txn, &stored).await {
        error!("Login listener failed for user {}: {}", stored.id, e);
        return Err(e.into());
    }
    txn.commit().await?;

    let principal = Principal::from_user(&stored);
    let roles = principal.roles.clone();
    let token = state.sessions.open(principal).await;

    info!("User '{}' logged in", stored.username);
    Ok(Json(ApiResponse::ok(
        LoginResponse {
            token,
            username: stored.username,
            roles,
        },
        "Logged in successfully",
    )))
}

/// Sign out. Answered by the session layer with 204.
#[utoipa::path(
    get,
    path = "/logout",
    tag = "security",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Session closed")
    )
)]
#[instrument]
pub async fn logout() -> Result<StatusCode, ApiError> {
    error!("Logout handler reached, the session layer is not installed");
    Err(ApiError::Misconfigured(
        "logout must be intercepted by the session layer",
    ))
}
