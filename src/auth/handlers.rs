use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::SessionIdentity,
        cookies::{cleared_cookie, session_cookie},
        dto::{AuthResponse, MessageResponse, SignInBody, SignUpBody},
        jwt::JwtKeys,
        password,
    },
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::{NewUser, User},
    validation,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}

fn issue_cookie(state: &AppState, user: &User) -> AppResult<String> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(&SessionIdentity::from(user))?;
    Ok(session_cookie(
        &token,
        keys.ttl.as_secs(),
        state.config.cookie.secure,
    ))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignUpBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let body = validation::json_body(payload)?;
    let input = validation::sign_up(&body).map_err(AppError::Validation)?;

    if state.users.find_by_email(&input.email).await?.is_some() {
        warn!(email = %input.email, "email already registered");
        return Err(AppError::DuplicateEmail);
    }

    let password_hash = password::hash(input.password, state.config.password.clone()).await?;

    let user = state
        .users
        .insert(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
            role: input.role,
        })
        .await?;

    let cookie = issue_cookie(&state, &user)?;
    info!(user_id = %user.id, email = %user.email, role = %user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User registered",
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SignInBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let body = validation::json_body(payload)?;
    let input = validation::sign_in(&body).map_err(AppError::Validation)?;

    let Some(stored) = state.users.find_by_email(&input.email).await? else {
        warn!(email = %input.email, "signin unknown email");
        return Err(AppError::NotFound);
    };

    if !password::verify(input.password, stored.password_hash).await? {
        warn!(email = %input.email, user_id = %stored.user.id, "signin invalid password");
        return Err(AppError::CredentialMismatch);
    }

    let user = stored.user;
    let cookie = issue_cookie(&state, &user)?;
    info!(user_id = %user.id, email = %user.email, "user signed in");
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User signed in successfully",
            user,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn signout(State(state): State<AppState>) -> impl IntoResponse {
    info!("user signed out");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cleared_cookie(state.config.cookie.secure))],
        Json(MessageResponse {
            message: "User signed out successfully",
        }),
    )
}
