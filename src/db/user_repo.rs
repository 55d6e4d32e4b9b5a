// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{db_utils::unique_violation, error::AppError},
    models::{auth::Role, user::User},
};

// Usuário + setores agregados a partir do registro de vínculos
const USER_SELECT: &str = r#"
    SELECT
        u.id, u.name, u.email, u.password_hash, u.role, u.profile_picture,
        u.created_at, u.updated_at,
        COALESCE(
            ARRAY_AGG(us.sector_id ORDER BY us.sector_id) FILTER (WHERE us.sector_id IS NOT NULL),
            '{}'
        ) AS sector_ids
    FROM users u
    LEFT JOIN user_sectors us ON us.user_id = u.id
"#;

/// Campos já prontos para gravar (senha já com hash).
#[derive(Debug, Default)]
pub struct UserRecord<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub role: Option<Role>,
    pub profile_picture: Option<&'a str>,
}

fn map_write_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some("users_email_lower_key") => AppError::EmailAlreadyInUse,
        Some(constraint) => AppError::UniqueConstraintViolation(constraint.to_string()),
        None => e.into(),
    }
}

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Busca um usuário pelo e-mail, sem diferenciar maiúsculas/minúsculas
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("{USER_SELECT} WHERE LOWER(u.email) = LOWER($1) GROUP BY u.id");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: i32) -> Result<Option<User>, AppError> {
        self.find_by_id(&self.pool, id).await
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("{USER_SELECT} WHERE u.id = $1 GROUP BY u.id");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("{USER_SELECT} GROUP BY u.id ORDER BY u.name, u.id");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;
        Ok(users)
    }

    /// Trava a linha do usuário até o fim da transação. Serializa edições
    /// concorrentes do mesmo usuário (inclusive dos vínculos de setor).
    pub async fn lock<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let found = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(found.is_some())
    }

    pub async fn email_taken<'e, E>(
        &self,
        executor: E,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1)
                  AND ($2::int4 IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(executor)
        .await?;
        Ok(taken)
    }

    // Cria o usuário e devolve o ID. O índice único em LOWER(email) é a
    // última barreira contra e-mails duplicados em cadastros concorrentes.
    pub async fn create_user<'e, E>(
        &self,
        executor: E,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
        profile_picture: Option<&str>,
    ) -> Result<i32, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO users (name, email, password_hash, role, profile_picture)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(profile_picture)
        .fetch_one(executor)
        .await
        .map_err(map_write_error)
    }

    // Atualização parcial: `None` mantém o valor atual
    pub async fn update_user<'e, E>(
        &self,
        executor: E,
        id: i32,
        record: &UserRecord<'_>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                role = COALESCE($5, role),
                profile_picture = COALESCE($6, profile_picture),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(record.name)
        .bind(record.email)
        .bind(record.password_hash)
        .bind(record.role)
        .bind(record.profile_picture)
        .execute(executor)
        .await
        .map_err(map_write_error)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_user<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
