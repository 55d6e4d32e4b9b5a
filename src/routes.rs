// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    config::AppState,
    handlers,
    middleware::auth::auth_guard,
    services::pictures::MAX_PICTURE_BYTES,
};

// Foto de até 5MB mais os campos de texto do formulário
const BODY_LIMIT: usize = MAX_PICTURE_BYTES + 1024 * 1024;

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin.map(str::parse::<HeaderValue>) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("CORS_ORIGIN inválido, requisições de outras origens serão bloqueadas");
            layer
        }
        None => layer.allow_origin(Any),
    }
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(handlers::auth::health))
        .route("/login", post(handlers::auth::login));

    // Rotas protegidas pelo auth_guard
    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route(
            "/sectors",
            get(handlers::sectors::list_sectors).post(handlers::sectors::create_sector),
        )
        .route(
            "/sectors/{id}",
            get(handlers::sectors::get_sector)
                .put(handlers::sectors::update_sector)
                .delete(handlers::sectors::delete_sector),
        )
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let uploads = ServeDir::new(&app_state.config.upload_dir);
    let cors = cors_layer(app_state.config.cors_origin.as_deref());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
