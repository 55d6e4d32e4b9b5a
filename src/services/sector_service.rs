// src/services/sector_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{MembershipRegistry, SectorRepository},
    models::{
        auth::Principal,
        sector::{Sector, SectorDetail},
    },
    services::access::{Action, Resource, decide},
};

#[derive(Clone)]
pub struct SectorService {
    sector_repo: SectorRepository,
    membership: MembershipRegistry,
    pool: PgPool,
}

impl SectorService {
    pub fn new(sector_repo: SectorRepository, membership: MembershipRegistry, pool: PgPool) -> Self {
        Self {
            sector_repo,
            membership,
            pool,
        }
    }

    pub async fn list_sectors(&self, principal: &Principal) -> Result<Vec<Sector>, AppError> {
        decide(principal, Action::ListSectors, &Resource::Any).into_result()?;
        self.sector_repo.list().await
    }

    pub async fn get_sector(&self, principal: &Principal, id: i32) -> Result<SectorDetail, AppError> {
        decide(principal, Action::ReadSector, &Resource::Any).into_result()?;

        let sector = self
            .sector_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Setor"))?;
        let user_ids = self.membership.members_of(id).await?.into_iter().collect();

        Ok(SectorDetail { sector, user_ids })
    }

    /// O nome já chega validado e aparado. A unicidade ignora maiúsculas.
    pub async fn create_sector(&self, principal: &Principal, name: &str) -> Result<Sector, AppError> {
        decide(principal, Action::CreateSector, &Resource::Any).into_result()?;

        if self.sector_repo.name_taken(&self.pool, name, None).await? {
            return Err(AppError::SectorNameAlreadyExists(name.to_string()));
        }

        let sector = self.sector_repo.create(&self.pool, name).await?;
        tracing::info!(sector_id = sector.id, name = %sector.name, created_by = principal.id, "setor criado");
        Ok(sector)
    }

    pub async fn update_sector(
        &self,
        principal: &Principal,
        id: i32,
        name: &str,
    ) -> Result<Sector, AppError> {
        decide(principal, Action::UpdateSector, &Resource::Any).into_result()?;

        if self.sector_repo.find_by_id(&self.pool, id).await?.is_none() {
            return Err(AppError::NotFound("Setor"));
        }
        if self.sector_repo.name_taken(&self.pool, name, Some(id)).await? {
            return Err(AppError::SectorNameAlreadyExists(name.to_string()));
        }

        let sector = self
            .sector_repo
            .update(&self.pool, id, name)
            .await?
            .ok_or(AppError::NotFound("Setor"))?;
        tracing::info!(sector_id = id, name = %sector.name, updated_by = principal.id, "setor atualizado");
        Ok(sector)
    }

    /// Exclusão restrita: recusa setores com produtos e setores que são o
    /// único vínculo de algum vendedor. Os vínculos restantes caem em cascata.
    pub async fn delete_sector(&self, principal: &Principal, id: i32) -> Result<(), AppError> {
        decide(principal, Action::DeleteSector, &Resource::Any).into_result()?;

        let mut tx = self.pool.begin().await?;

        if !self.sector_repo.lock_for_delete(&mut *tx, id).await? {
            return Err(AppError::NotFound("Setor"));
        }
        if self.sector_repo.count_products(&mut *tx, id).await? > 0 {
            return Err(AppError::SectorInUse("O setor possui produtos vinculados."));
        }
        if self.sector_repo.count_exclusive_vendors(&mut *tx, id).await? > 0 {
            return Err(AppError::SectorInUse(
                "O setor é o único setor de um ou mais vendedores.",
            ));
        }

        self.sector_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(sector_id = id, deleted_by = principal.id, "setor excluído");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;

    use crate::{
        db::{ProductRepository, UserRepository},
        models::{auth::Role, product::ProductFields},
        services::access::DenyReason,
    };

    fn admin() -> Principal {
        Principal::new(1, Role::Admin, [])
    }

    fn service(pool: PgPool) -> SectorService {
        SectorService::new(
            SectorRepository::new(pool.clone()),
            MembershipRegistry::new(pool.clone()),
            pool,
        )
    }

    #[tokio::test]
    async fn only_admin_manages_sectors() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(300))
            .connect_lazy("postgres://ninguem@127.0.0.1:1/inexistente")
            .unwrap();
        let sectors = service(pool);
        let vendedor = Principal::new(2, Role::Vendedor, [1]);

        for result in [
            sectors.create_sector(&vendedor, "Vendas").await.map(|_| ()),
            sectors.update_sector(&vendedor, 1, "Vendas").await.map(|_| ()),
            sectors.delete_sector(&vendedor, 1).await,
        ] {
            assert!(matches!(result, Err(AppError::Forbidden(DenyReason::InsufficientRole))));
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn names_are_unique_ignoring_case(pool: PgPool) {
        let sectors = service(pool);

        sectors.create_sector(&admin(), "Vendas").await.unwrap();
        let result = sectors.create_sector(&admin(), "vendas").await;
        assert!(matches!(result, Err(AppError::SectorNameAlreadyExists(_))));

        let compras = sectors.create_sector(&admin(), "Compras").await.unwrap();
        let result = sectors.update_sector(&admin(), compras.id, "VENDAS").await;
        assert!(matches!(result, Err(AppError::SectorNameAlreadyExists(_))));

        // renomear para o próprio nome com outra caixa é permitido
        let renamed = sectors.update_sector(&admin(), compras.id, "COMPRAS").await.unwrap();
        assert_eq!(renamed.name, "COMPRAS");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn delete_is_restricted(pool: PgPool) {
        let sectors = service(pool.clone());
        let with_product = sectors.create_sector(&admin(), "Papelaria").await.unwrap();
        let only_sector = sectors.create_sector(&admin(), "Vendas").await.unwrap();
        let empty = sectors.create_sector(&admin(), "Compras").await.unwrap();

        let fields = ProductFields {
            name: "Caneta".into(),
            price: Decimal::new(250, 2),
            quantity: 10,
            description: None,
            sector_id: with_product.id,
        };
        ProductRepository::new(pool.clone()).create(&pool, &fields).await.unwrap();

        let vendedor = UserRepository::new(pool.clone())
            .create_user(&pool, "Carla Souza", "carla@example.com", "hash", Role::Vendedor, None)
            .await
            .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        MembershipRegistry::new(pool.clone())
            .set_membership(&mut *conn, vendedor, &[only_sector.id])
            .await
            .unwrap();
        drop(conn);

        assert!(matches!(
            sectors.delete_sector(&admin(), with_product.id).await,
            Err(AppError::SectorInUse(_))
        ));
        assert!(matches!(
            sectors.delete_sector(&admin(), only_sector.id).await,
            Err(AppError::SectorInUse(_))
        ));

        sectors.delete_sector(&admin(), empty.id).await.unwrap();
        assert!(matches!(
            sectors.get_sector(&admin(), empty.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            sectors.delete_sector(&admin(), empty.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requer PostgreSQL em DATABASE_URL"]
    async fn detail_lists_members(pool: PgPool) {
        let sectors = service(pool.clone());
        let vendas = sectors.create_sector(&admin(), "Vendas").await.unwrap();

        let carla = UserRepository::new(pool.clone())
            .create_user(&pool, "Carla Souza", "carla@example.com", "hash", Role::Vendedor, None)
            .await
            .unwrap();
        let mut conn = pool.acquire().await.unwrap();
        MembershipRegistry::new(pool.clone())
            .set_membership(&mut *conn, carla, &[vendas.id])
            .await
            .unwrap();
        drop(conn);

        let detail = sectors.get_sector(&admin(), vendas.id).await.unwrap();
        assert_eq!(detail.user_ids, vec![carla]);
    }
}
