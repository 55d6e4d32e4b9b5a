// src/main.rs

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use sectorflow::{
    config::{AppState, Config},
    routes::build_router,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sectorflow=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;
    tracing::info!("migrações do banco de dados executadas");

    tokio::fs::create_dir_all(&app_state.config.upload_dir)
        .await
        .with_context(|| format!("Falha ao criar o diretório {}", app_state.config.upload_dir))?;

    if let Some(seed) = &app_state.config.admin_seed {
        app_state
            .user_service
            .seed_admin(&seed.name, &seed.email, &seed.password)
            .await
            .context("Falha ao criar o administrador inicial")?;
    }

    let addr = app_state.config.bind_addr.clone();
    let app = build_router(app_state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Falha ao escutar em {addr}"))?;
    tracing::info!("servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}
