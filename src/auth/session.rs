use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use moka::future::Cache;
use tracing::{debug, info, trace};
use uuid::Uuid;

use super::principal::Principal;
use crate::error::ApiError;
use crate::schemas::AppState;

/// Path whose requests are answered by [`logout_interceptor`].
pub const LOGOUT_PATH: &str = "/logout";

/// Bearer-token sessions expiring a fixed time after login.
#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Cache<String, Principal>,
}

impl SessionStore {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { sessions }
    }

    /// Opens a session for `principal` and returns its token.
    pub async fn open(&self, principal: Principal) -> String {
        let token = Uuid::new_v4().to_string();
        debug!(user_id = principal.id, "Opening session");
        self.sessions.insert(token.clone(), principal).await;
        token
    }

    pub async fn principal(&self, token: &str) -> Option<Principal> {
        self.sessions.get(token).await
    }

    /// Closes the session. Returns whether it was open.
    pub async fn close(&self, token: &str) -> bool {
        self.sessions.remove(token).await.is_some()
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The principal of the request, if any. Unknown or expired tokens count
/// as anonymous.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(CurrentPrincipal(None));
        };
        let principal = state.sessions.principal(token).await;
        if principal.is_none() {
            trace!("Bearer token does not match an open session");
        }
        Ok(CurrentPrincipal(principal))
    }
}

/// Like [`CurrentPrincipal`] but rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct RequirePrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for RequirePrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentPrincipal::from_request_parts(parts, state).await? {
            CurrentPrincipal(Some(principal)) => Ok(RequirePrincipal(principal)),
            CurrentPrincipal(None) => Err(ApiError::Unauthenticated),
        }
    }
}

/// Terminates the caller's session on `GET /logout` without reaching the
/// route handler.
pub async fn logout_interceptor(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() != LOGOUT_PATH {
        return next.run(request).await;
    }

    if let Some(token) = bearer_token(request.headers()) {
        if state.sessions.close(token).await {
            info!("Session closed");
        }
    }
    StatusCode::NO_CONTENT.into_response()
}
