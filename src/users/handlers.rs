use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::{require_auth, AuthUser},
    error::{AppError, AppResult, FieldError},
    state::AppState,
    users::{
        dto::{UpdateUserBody, UserResponse, UsersResponse},
        policy::{authorize, Action},
    },
    validation,
};

/// Every route here sits behind [`require_auth`].
pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[instrument(skip(state, caller), fields(caller = %caller.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> AppResult<Json<UsersResponse>> {
    info!("getting users");
    let users = state.users.find_all().await?;
    Ok(Json(UsersResponse {
        message: "Successfully retrieved users",
        count: users.len(),
        users,
    }))
}

#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let id = validation::user_id(&id).map_err(AppError::Validation)?;
    info!(%id, "getting user by id");
    let user = state.users.find_by_id(id).await?;
    Ok(Json(UserResponse {
        message: "User retrieved successfully",
        user,
    }))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserBody>, JsonRejection>,
) -> AppResult<Json<UserResponse>> {
    let id = validation::user_id(&id).map_err(AppError::Validation)?;
    let body = validation::json_body(payload)?;
    let changes = validation::update_user(&body).map_err(AppError::Validation)?;

    let caller = caller.map(|AuthUser(identity)| identity);
    if let Err(e) = authorize(caller.as_ref(), id, Action::Update(&changes)) {
        warn!(%id, caller = ?caller.as_ref().map(|c| c.id), error = %e, "update denied");
        return Err(e);
    }

    if changes.is_empty() {
        return Err(AppError::Validation(vec![FieldError::new(
            "body",
            "At least one of name, email or role must be provided",
        )]));
    }

    info!(
        %id,
        updated_by = ?caller.as_ref().map(|c| c.id),
        fields = ?changes.fields(),
        "updating user"
    );
    let user = state.users.update(id, changes).await?;
    Ok(Json(UserResponse {
        message: "User updated successfully",
        user,
    }))
}

#[instrument(skip(state, caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let id = validation::user_id(&id).map_err(AppError::Validation)?;

    let caller = caller.map(|AuthUser(identity)| identity);
    if let Err(e) = authorize(caller.as_ref(), id, Action::Delete) {
        warn!(%id, caller = ?caller.as_ref().map(|c| c.id), error = %e, "delete denied");
        return Err(e);
    }

    if let Some(me) = caller.as_ref().filter(|c| c.id == id && c.is_admin()) {
        // No last-admin check exists; an admin can remove the final admin account.
        warn!(user_id = %me.id, "admin deleting their own account");
    }

    info!(%id, deleted_by = ?caller.as_ref().map(|c| c.id), "deleting user");
    let user = state.users.remove(id).await?;
    Ok(Json(UserResponse {
        message: "User deleted successfully",
        user,
    }))
}
