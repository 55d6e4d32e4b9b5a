// src/db/product_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::is_foreign_key_violation, error::AppError},
    models::product::{Product, ProductFields},
};

const PRODUCT_COLUMNS: &str = r#"
    p.id, p.name, p.price, p.quantity, p.description, p.sector_id,
    s.name AS sector_name, p.created_at, p.updated_at
"#;

fn map_write_error(e: sqlx::Error, sector_id: i32) -> AppError {
    if is_foreign_key_violation(&e) {
        return AppError::InvalidSectorIds(vec![sector_id]);
    }
    e.into()
}

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// `sector_filter = None` lista tudo; `Some(ids)` restringe aos setores.
    pub async fn list(&self, sector_filter: Option<&[i32]>) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN sectors s ON s.id = p.sector_id
            WHERE ($1::int4[] IS NULL OR p.sector_id = ANY($1))
            ORDER BY p.name, p.id
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(sector_filter)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Product>, AppError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p JOIN sectors s ON s.id = p.sector_id WHERE p.id = $1"
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    // Mesmo que `find_by_id`, mas trava o produto até o fim da transação
    pub async fn find_for_update<'e, E>(&self, executor: E, id: i32) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN sectors s ON s.id = p.sector_id
            WHERE p.id = $1
            FOR UPDATE OF p
            "#
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn create<'e, E>(&self, executor: E, fields: &ProductFields) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            WITH p AS (
                INSERT INTO products (name, price, quantity, description, sector_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT p.id, p.name, p.price, p.quantity, p.description, p.sector_id,
                   s.name AS sector_name, p.created_at, p.updated_at
            FROM p
            JOIN sectors s ON s.id = p.sector_id
            "#,
        )
        .bind(&fields.name)
        .bind(fields.price)
        .bind(fields.quantity)
        .bind(fields.description.as_deref())
        .bind(fields.sector_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_write_error(e, fields.sector_id))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        fields: &ProductFields,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            WITH p AS (
                UPDATE products SET
                    name = $2, price = $3, quantity = $4, description = $5,
                    sector_id = $6, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT p.id, p.name, p.price, p.quantity, p.description, p.sector_id,
                   s.name AS sector_name, p.created_at, p.updated_at
            FROM p
            JOIN sectors s ON s.id = p.sector_id
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(fields.price)
        .bind(fields.quantity)
        .bind(fields.description.as_deref())
        .bind(fields.sector_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_write_error(e, fields.sector_id))
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
