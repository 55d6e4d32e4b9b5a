// src/services/access.rs

//! Motor de autorização.
//!
//! Função pura sobre (principal, ação, recurso): não acessa o banco e não
//! suspende. Os serviços consultam `decide` antes de qualquer escrita.

use std::collections::BTreeSet;

use crate::models::auth::{Principal, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListSectors,
    ReadSector,
    CreateSector,
    UpdateSector,
    DeleteSector,
    ListUsers,
    ReadUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
    ListProducts,
    ReadProduct,
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
}

/// Os campos do recurso alvo que importam para a decisão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Coleção ou setor: decisões que só dependem do papel.
    Any,
    User {
        target_id: Option<i32>,
        /// Papel enviado no payload (já canonicalizado), se houver.
        requested_role: Option<Role>,
    },
    Product {
        /// Setor atual do produto, ou o setor proposto na criação.
        sector_id: i32,
        /// Setor enviado numa atualização, se houver.
        proposed_sector_id: Option<i32>,
    },
}

impl Resource {
    pub fn user(target_id: i32) -> Self {
        Resource::User {
            target_id: Some(target_id),
            requested_role: None,
        }
    }

    pub fn product(sector_id: i32) -> Self {
        Resource::Product {
            sector_id,
            proposed_sector_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    InsufficientRole,
    ForbiddenSelfRoleChange,
    SelfDeletionForbidden,
    SectorNotAssigned,
    SectorReassignmentForbidden,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::InsufficientRole => "INSUFFICIENT_ROLE",
            DenyReason::ForbiddenSelfRoleChange => "FORBIDDEN_SELF_ROLE_CHANGE",
            DenyReason::SelfDeletionForbidden => "SELF_DELETION_FORBIDDEN",
            DenyReason::SectorNotAssigned => "SECTOR_NOT_ASSIGNED",
            DenyReason::SectorReassignmentForbidden => "SECTOR_REASSIGNMENT_FORBIDDEN",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::InsufficientRole => "Você não tem permissão para realizar esta ação.",
            DenyReason::ForbiddenSelfRoleChange => "Você não pode alterar o seu próprio papel.",
            DenyReason::SelfDeletionForbidden => "Você não pode excluir a sua própria conta.",
            DenyReason::SectorNotAssigned => "Você não está associado ao setor deste produto.",
            DenyReason::SectorReassignmentForbidden => {
                "Vendedores não podem mover produtos para outro setor."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

fn require_admin(principal: &Principal) -> Decision {
    if principal.is_admin() {
        Decision::Allow
    } else {
        Decision::Deny(DenyReason::InsufficientRole)
    }
}

fn user_target(resource: &Resource) -> Option<i32> {
    match resource {
        Resource::User { target_id, .. } => *target_id,
        _ => None,
    }
}

pub fn decide(principal: &Principal, action: Action, resource: &Resource) -> Decision {
    use Action::*;

    match action {
        ListSectors | ReadSector | CreateSector | UpdateSector | DeleteSector | ListUsers
        | CreateUser => require_admin(principal),

        ReadUser => match user_target(resource) {
            Some(id) if id == principal.id => Decision::Allow,
            _ => require_admin(principal),
        },

        UpdateUser => match resource {
            Resource::User {
                target_id: Some(id),
                requested_role,
            } if *id == principal.id => match requested_role {
                Some(role) if *role != principal.role => {
                    Decision::Deny(DenyReason::ForbiddenSelfRoleChange)
                }
                _ => Decision::Allow,
            },
            _ => require_admin(principal),
        },

        // Autoexclusão é negada antes mesmo da checagem de papel.
        DeleteUser => match user_target(resource) {
            Some(id) if id == principal.id => Decision::Deny(DenyReason::SelfDeletionForbidden),
            _ => require_admin(principal),
        },

        // A visibilidade é aplicada pelo filtro de `product_scope`.
        ListProducts => Decision::Allow,

        ReadProduct => match (principal.role, resource) {
            (Role::Admin | Role::User, _) => Decision::Allow,
            (Role::Vendedor, Resource::Product { sector_id, .. }) => {
                if principal.has_sector(*sector_id) {
                    Decision::Allow
                } else {
                    Decision::Deny(DenyReason::SectorNotAssigned)
                }
            }
            (Role::Vendedor, _) => Decision::Deny(DenyReason::InsufficientRole),
        },

        CreateProduct | UpdateProduct | DeleteProduct => {
            decide_product_mutation(principal, resource, action == UpdateProduct)
        }
    }
}

fn decide_product_mutation(principal: &Principal, resource: &Resource, is_update: bool) -> Decision {
    match principal.role {
        Role::Admin => Decision::Allow,
        Role::User => Decision::Deny(DenyReason::InsufficientRole),
        Role::Vendedor => {
            let Resource::Product {
                sector_id,
                proposed_sector_id,
            } = resource
            else {
                return Decision::Deny(DenyReason::InsufficientRole);
            };

            if !principal.has_sector(*sector_id) {
                return Decision::Deny(DenyReason::SectorNotAssigned);
            }
            if is_update && proposed_sector_id.is_some_and(|proposed| proposed != *sector_id) {
                return Decision::Deny(DenyReason::SectorReassignmentForbidden);
            }
            Decision::Allow
        }
    }
}

/// Quais produtos um principal enxerga.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductScope {
    All,
    Sectors(BTreeSet<i32>),
}

impl ProductScope {
    pub fn allows(&self, sector_id: i32) -> bool {
        match self {
            ProductScope::All => true,
            ProductScope::Sectors(ids) => ids.contains(&sector_id),
        }
    }

    /// Filtro de setores para a consulta. `None` significa sem filtro;
    /// uma lista vazia significa que nada é visível.
    pub fn sector_filter(&self, requested: Option<i32>) -> Option<Vec<i32>> {
        match (self, requested) {
            (ProductScope::All, None) => None,
            (ProductScope::All, Some(id)) => Some(vec![id]),
            (ProductScope::Sectors(ids), None) => Some(ids.iter().copied().collect()),
            (scope @ ProductScope::Sectors(_), Some(id)) if scope.allows(id) => Some(vec![id]),
            (ProductScope::Sectors(_), Some(_)) => Some(Vec::new()),
        }
    }
}

pub fn product_scope(principal: &Principal) -> ProductScope {
    match principal.role {
        Role::Admin | Role::User => ProductScope::All,
        Role::Vendedor => ProductScope::Sectors(principal.sector_ids.clone()),
    }
}
