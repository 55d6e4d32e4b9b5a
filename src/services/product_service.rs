// src/services/product_service.rs

use std::collections::BTreeSet;

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{MembershipRegistry, ProductRepository},
    models::{
        auth::Principal,
        product::{CreateProductPayload, Product, ProductQuery, UpdateProductPayload},
    },
    services::access::{Action, Resource, decide, product_scope},
};

#[derive(Clone)]
pub struct ProductService {
    product_repo: ProductRepository,
    membership: MembershipRegistry,
    pool: PgPool,
}

impl ProductService {
    pub fn new(product_repo: ProductRepository, membership: MembershipRegistry, pool: PgPool) -> Self {
        Self {
            product_repo,
            membership,
            pool,
        }
    }

    /// Lista os produtos visíveis ao principal, opcionalmente de um setor.
    pub async fn list_products(
        &self,
        principal: &Principal,
        query: ProductQuery,
    ) -> Result<Vec<Product>, AppError> {
        decide(principal, Action::ListProducts, &Resource::Any).into_result()?;

        match product_scope(principal).sector_filter(query.sector_id) {
            // Vendedor sem acesso ao setor pedido: nem consulta o banco
            Some(ids) if ids.is_empty() => Ok(Vec::new()),
            Some(ids) => self.product_repo.list(Some(&ids)).await,
            None => self.product_repo.list(None).await,
        }
    }

    pub async fn get_product(&self, principal: &Principal, id: i32) -> Result<Product, AppError> {
        let product = self
            .product_repo
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        decide(principal, Action::ReadProduct, &Resource::product(product.sector_id)).into_result()?;
        Ok(product)
    }

    pub async fn create_product(
        &self,
        principal: &Principal,
        payload: CreateProductPayload,
    ) -> Result<Product, AppError> {
        let fields = payload.into_fields();
        decide(principal, Action::CreateProduct, &Resource::product(fields.sector_id)).into_result()?;

        let mut tx = self.pool.begin().await?;
        self.membership
            .ensure_sectors_exist(&mut *tx, &BTreeSet::from([fields.sector_id]))
            .await?;
        let product = self.product_repo.create(&mut *tx, &fields).await?;
        tx.commit().await?;

        tracing::info!(
            product_id = product.id,
            sector_id = product.sector_id,
            created_by = principal.id,
            "produto criado"
        );
        Ok(product)
    }

    /// Atualização parcial. O setor atual é lido com o produto travado, e só
    /// então a regra de setor do vendedor é aplicada.
    pub async fn update_product(
        &self,
        principal: &Principal,
        id: i32,
        payload: UpdateProductPayload,
    ) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .product_repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;

        let resource = Resource::Product {
            sector_id: current.sector_id,
            proposed_sector_id: payload.sector_id,
        };
        decide(principal, Action::UpdateProduct, &resource).into_result()?;

        let fields = payload.merge_into(&current);
        if fields.sector_id != current.sector_id {
            self.membership
                .ensure_sectors_exist(&mut *tx, &BTreeSet::from([fields.sector_id]))
                .await?;
        }

        let product = self
            .product_repo
            .update(&mut *tx, id, &fields)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;
        tx.commit().await?;

        tracing::info!(product_id = id, sector_id = product.sector_id, updated_by = principal.id, "produto atualizado");
        Ok(product)
    }

    pub async fn delete_product(&self, principal: &Principal, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .product_repo
            .find_for_update(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Produto"))?;
        decide(principal, Action::DeleteProduct, &Resource::product(current.sector_id)).into_result()?;

        self.product_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(product_id = id, deleted_by = principal.id, "produto excluído");
        Ok(())
    }
}
