// src/models/sector.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::common::validation::validate_sector_name;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Resumo usado dentro das respostas de usuário
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct SectorSummary {
    pub id: i32,
    pub name: String,
}

// Detalhe de um setor com os membros vindos do registro de vínculos
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorDetail {
    #[serde(flatten)]
    pub sector: Sector,
    pub user_ids: Vec<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SectorPayload {
    #[validate(custom(function = "validate_sector_name"))]
    pub name: String,
}

impl SectorPayload {
    pub fn normalized_name(&self) -> &str {
        self.name.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_rejects_short_names() {
        let payload = SectorPayload { name: " ab ".into() };
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn payload_trims_name() {
        let payload = SectorPayload { name: "  Vendas ".into() };
        assert!(payload.validate().is_ok());
        assert_eq!(payload.normalized_name(), "Vendas");
    }
}
