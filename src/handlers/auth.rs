// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    common::{error::AppError, json::ValidatedJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{auth::LoginUserPayload, user::UserResponse},
};

// Handler de login
pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    // `required` já garantiu os dois campos
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let response = app_state.auth_service.login_user(&email, &password).await?;

    Ok((StatusCode::OK, Json(response)))
}

// Handler da rota protegida /me
pub async fn get_me(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<Json<UserResponse>, AppError> {
    let user = app_state
        .user_service
        .get_user(&principal, principal.id)
        .await?;
    Ok(Json(user))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
