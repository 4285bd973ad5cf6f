use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::dto::{ChangePasswordRequest, LoginRequest, LoginResponse, MessageResponse},
    error::{AccountError, AccountResult},
    extract::{ApiJson, ApiPath},
    state::AppState,
    users::dto::RegisterRequest,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/change-password/:user_id", put(change_password))
}

/// Older client entry point; answers 200 with a message rather than the user.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AccountResult<Json<MessageResponse>> {
    let input = payload.validate()?;
    state.accounts.register(input).await?;
    Ok(Json(MessageResponse::new("User registered successfully")))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AccountResult<Json<LoginResponse>> {
    payload.validate()?;

    let outcome = state
        .auth
        .login(&payload.email, &payload.password)
        .await
        .map_err(|e| match e {
            AccountError::NotFound(_) if !state.config.auth.reveal_unknown_email => {
                AccountError::InvalidCredentials
            }
            other => other,
        })?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        user_id: outcome.user_id,
        email: outcome.email,
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> AccountResult<Json<MessageResponse>> {
    payload.validate()?;
    state
        .auth
        .change_password(user_id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
