use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    error::AccountResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    users::dto::{LinkExternalIdentityParams, RegisterRequest, UpdateUserRequest, UserResponse},
    validation::require_non_blank,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/:id", get(get_user).put(update_user))
        .route(
            "/users/external/:external_id",
            get(get_user_by_external_identity),
        )
        .route(
            "/users/_internal/link-external-identity",
            post(link_external_identity),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AccountResult<(StatusCode, Json<UserResponse>)> {
    let input = payload.validate()?;
    let user = state.accounts.register(input).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AccountResult<Json<UserResponse>> {
    let user = state.accounts.get_by_id(id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> AccountResult<Json<UserResponse>> {
    let changes = payload.validate()?;
    let user = state.accounts.update(id, changes).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_user_by_external_identity(
    State(state): State<AppState>,
    ApiPath(external_id): ApiPath<String>,
) -> AccountResult<Json<UserResponse>> {
    require_non_blank("external_id", &external_id)?;
    let user = state.accounts.get_by_external_identity_id(&external_id).await?;
    Ok(Json(user.into()))
}

/// Called by the identity provider's post-registration hook; expected to be
/// reachable only from inside the network.
#[instrument(skip(state))]
pub async fn link_external_identity(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<LinkExternalIdentityParams>,
) -> AccountResult<Json<UserResponse>> {
    params.validate()?;
    info!(external_id = %params.external_id, "linking external identity");
    let user = state
        .accounts
        .link_external_identity(&params.email, &params.external_id)
        .await?;
    Ok(Json(user.into()))
}
