// src/handlers/products.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::{error::AppError, json::ValidatedJson},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::product::{CreateProductPayload, ProductQuery, UpdateProductPayload},
};

// GET /products?sectorId=
pub async fn list_products(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state
        .product_service
        .list_products(&principal, query)
        .await?;
    Ok((StatusCode::OK, Json(products)))
}

pub async fn get_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.product_service.get_product(&principal, id).await?;
    Ok((StatusCode::OK, Json(product)))
}

pub async fn create_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state
        .product_service
        .create_product(&principal, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state
        .product_service
        .update_product(&principal, id, payload)
        .await?;
    Ok((StatusCode::OK, Json(product)))
}

pub async fn delete_product(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.product_service.delete_product(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
