// src/db/sector_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{
        db_utils::{is_foreign_key_violation, unique_violation},
        error::AppError,
    },
    models::sector::Sector,
};

#[derive(Clone)]
pub struct SectorRepository {
    pool: PgPool,
}

impl SectorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Sector>, AppError> {
        let sectors = sqlx::query_as::<_, Sector>(
            "SELECT id, name, created_at, updated_at FROM sectors ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sectors)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Sector>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sector = sqlx::query_as::<_, Sector>(
            "SELECT id, name, created_at, updated_at FROM sectors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(sector)
    }

    // Trava o setor para exclusão (bloqueia quem tenta vinculá-lo com FOR SHARE)
    pub async fn lock_for_delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found = sqlx::query_scalar::<_, i32>("SELECT id FROM sectors WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(found.is_some())
    }

    // Unicidade do nome sem diferenciar maiúsculas/minúsculas
    pub async fn name_taken<'e, E>(
        &self,
        executor: E,
        name: &str,
        except_id: Option<i32>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM sectors
                WHERE LOWER(name) = LOWER($1)
                  AND ($2::int4 IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(name)
        .bind(except_id)
        .fetch_one(executor)
        .await?;
        Ok(taken)
    }

    pub async fn create<'e, E>(&self, executor: E, name: &str) -> Result<Sector, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Sector>(
            r#"
            INSERT INTO sectors (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::SectorNameAlreadyExists(name.to_string()),
            None => e.into(),
        })
    }

    pub async fn update<'e, E>(&self, executor: E, id: i32, name: &str) -> Result<Option<Sector>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Sector>(
            r#"
            UPDATE sectors SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => AppError::SectorNameAlreadyExists(name.to_string()),
            None => e.into(),
        })
    }

    pub async fn count_products<'e, E>(&self, executor: E, id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE sector_id = $1")
            .bind(id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    /// Vendedores cujo único setor é este: excluí-lo os deixaria sem setor.
    pub async fn count_exclusive_vendors<'e, E>(&self, executor: E, id: i32) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users u
            JOIN user_sectors us ON us.user_id = u.id AND us.sector_id = $1
            WHERE u.role = 'VENDEDOR'
              AND NOT EXISTS (
                  SELECT 1 FROM user_sectors other
                  WHERE other.user_id = u.id AND other.sector_id <> $1
              )
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM sectors WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await
            .map_err(|e| {
                // ON DELETE RESTRICT em products.sector_id
                if is_foreign_key_violation(&e) {
                    return AppError::SectorInUse("O setor possui produtos vinculados.");
                }
                e.into()
            })?;
        Ok(result.rows_affected() > 0)
    }
}
