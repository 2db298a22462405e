use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

use crate::{
    auth::{
        claims::SessionIdentity,
        cookies::{read_cookie, TOKEN_COOKIE},
        jwt::JwtKeys,
    },
    error::AppError,
    state::AppState,
};

/// Verifies the `token` cookie and stores the caller's identity on the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = read_cookie(req.headers(), TOKEN_COOKIE).ok_or(AppError::MissingToken)?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify(&token).map_err(|e| {
        warn!(
            error = %e,
            method = %req.method(),
            path = %req.uri().path(),
            "token verification failed"
        );
        AppError::InvalidToken
    })?;

    let identity = SessionIdentity::from(claims);
    info!(user_id = %identity.id, email = %identity.email, "user authenticated");
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Identity placed by [`require_auth`]. Rejects with 401 when absent.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionIdentity>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated("Authentication required"))
    }
}
