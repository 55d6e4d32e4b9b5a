// src/handlers/sectors.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::{error::AppError, json::ValidatedJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::sector::SectorPayload,
};

pub async fn list_sectors(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let sectors = app_state.sector_service.list_sectors(&principal).await?;
    Ok((StatusCode::OK, Json(sectors)))
}

pub async fn get_sector(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let sector = app_state.sector_service.get_sector(&principal, id).await?;
    Ok((StatusCode::OK, Json(sector)))
}

pub async fn create_sector(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<SectorPayload>,
) -> Result<impl IntoResponse, AppError> {
    let sector = app_state
        .sector_service
        .create_sector(&principal, payload.normalized_name())
        .await?;
    Ok((StatusCode::CREATED, Json(sector)))
}

pub async fn update_sector(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<SectorPayload>,
) -> Result<impl IntoResponse, AppError> {
    let sector = app_state
        .sector_service
        .update_sector(&principal, id, payload.normalized_name())
        .await?;
    Ok((StatusCode::OK, Json(sector)))
}

pub async fn delete_sector(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.sector_service.delete_sector(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
