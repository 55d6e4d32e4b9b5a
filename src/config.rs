// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{MembershipRegistry, ProductRepository, SectorRepository, UserRepository},
    services::{
        AuthService, ProductService, SectorService, UserService,
        pictures::{LocalPictureStore, PictureStore},
    },
};

/// Credenciais do ADMIN criado na primeira subida.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub upload_dir: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub cors_origin: Option<String>,
    pub admin_seed: Option<AdminSeed>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let jwt_expiration_hours = var_or("JWT_EXPIRATION_HOURS", "8")
            .parse()
            .context("JWT_EXPIRATION_HOURS deve ser um número inteiro")?;
        let db_max_connections = var_or("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS deve ser um número inteiro")?;

        let admin_seed = match (optional_var("ADMIN_EMAIL"), optional_var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: var_or("ADMIN_NAME", "Administrador"),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            upload_dir: var_or("UPLOAD_DIR", "uploads"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            db_max_connections,
            cors_origin: optional_var("CORS_ORIGIN"),
            admin_seed,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub sector_service: SectorService,
    pub user_service: UserService,
    pub product_service: ProductService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("conexão com o banco de dados estabelecida");

        Ok(Self::from_pool(config, db_pool))
    }

    // Monta o grafo de dependências sobre um pool já criado
    pub fn from_pool(config: Config, db_pool: PgPool) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let sector_repo = SectorRepository::new(db_pool.clone());
        let product_repo = ProductRepository::new(db_pool.clone());
        let membership = MembershipRegistry::new(db_pool.clone());
        let pictures: Arc<dyn PictureStore> = Arc::new(LocalPictureStore::new(&config.upload_dir));

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_expiration_hours,
        );
        let sector_service = SectorService::new(sector_repo, membership.clone(), db_pool.clone());
        let user_service = UserService::new(user_repo, membership.clone(), pictures, db_pool.clone());
        let product_service = ProductService::new(product_repo, membership, db_pool.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            sector_service,
            user_service,
            product_service,
        }
    }
}
