// src/db/membership_repo.rs

//! Registro de vínculos usuário <-> setor.
//!
//! É a única fonte de verdade da relação; `User.sector_ids` e os membros de
//! um setor são apenas projeções de leitura sobre a tabela `user_sectors`.

use std::collections::{BTreeMap, BTreeSet};

use sqlx::{Executor, PgConnection, PgPool, Postgres};

use crate::{
    common::{
        db_utils::{is_foreign_key_violation, missing_ids},
        error::AppError,
    },
    models::sector::SectorSummary,
};

#[derive(sqlx::FromRow)]
struct UserSectorRow {
    user_id: i32,
    id: i32,
    name: String,
}

#[derive(Clone)]
pub struct MembershipRegistry {
    pool: PgPool,
}

impl MembershipRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Confere que todos os setores existem e os trava (`FOR SHARE`) até o
    /// fim da transação, impedindo que sejam excluídos no meio do caminho.
    pub async fn ensure_sectors_exist(
        &self,
        conn: &mut PgConnection,
        sector_ids: &BTreeSet<i32>,
    ) -> Result<(), AppError> {
        if sector_ids.is_empty() {
            return Ok(());
        }
        let ids: Vec<i32> = sector_ids.iter().copied().collect();
        let found = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM sectors WHERE id = ANY($1) ORDER BY id FOR SHARE",
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let missing = missing_ids(sector_ids, &found);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidSectorIds(missing))
        }
    }

    /// Substitui o conjunto inteiro de setores do usuário. Tudo ou nada:
    /// nenhuma linha é escrita se algum setor não existir.
    pub async fn set_membership(
        &self,
        conn: &mut PgConnection,
        user_id: i32,
        sector_ids: &[i32],
    ) -> Result<(), AppError> {
        let requested: BTreeSet<i32> = sector_ids.iter().copied().collect();
        self.ensure_sectors_exist(conn, &requested).await?;

        sqlx::query("DELETE FROM user_sectors WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *conn)
            .await?;

        if requested.is_empty() {
            return Ok(());
        }

        let ids: Vec<i32> = requested.into_iter().collect();
        sqlx::query(
            r#"
            INSERT INTO user_sectors (user_id, sector_id)
            SELECT $1, UNNEST($2::int4[])
            "#,
        )
        .bind(user_id)
        .bind(&ids)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return AppError::NotFound("Usuário");
            }
            e.into()
        })?;

        tracing::debug!(user_id, sectors = ?ids, "vínculos de setor substituídos");
        Ok(())
    }

    pub async fn clear<'e, E>(&self, executor: E, user_id: i32) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM user_sectors WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn sectors_of(&self, user_id: i32) -> Result<BTreeSet<i32>, AppError> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT sector_id FROM user_sectors WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn members_of(&self, sector_id: i32) -> Result<BTreeSet<i32>, AppError> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT user_id FROM user_sectors WHERE sector_id = $1",
        )
        .bind(sector_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// Setores (com nome) de cada usuário pedido, para montar as respostas.
    pub async fn summaries_for(
        &self,
        user_ids: &[i32],
    ) -> Result<BTreeMap<i32, Vec<SectorSummary>>, AppError> {
        let rows = sqlx::query_as::<_, UserSectorRow>(
            r#"
            SELECT us.user_id, s.id, s.name
            FROM user_sectors us
            JOIN sectors s ON s.id = us.sector_id
            WHERE us.user_id = ANY($1)
            ORDER BY us.user_id, s.name
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut summaries: BTreeMap<i32, Vec<SectorSummary>> = BTreeMap::new();
        for row in rows {
            summaries.entry(row.user_id).or_default().push(SectorSummary {
                id: row.id,
                name: row.name,
            });
        }
        Ok(summaries)
    }
}
