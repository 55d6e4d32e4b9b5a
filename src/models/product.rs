// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::common::validation::{
    MAX_QUANTITY, validate_price, validate_product_description, validate_product_name,
};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub description: Option<String>,
    pub sector_id: i32,
    pub sector_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub sector_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(custom(function = "validate_product_name"))]
    pub name: String,

    #[validate(custom(function = "validate_price"))]
    pub price: Decimal,

    #[validate(range(min = 0, max = MAX_QUANTITY, message = "A quantidade deve estar entre 0 e 999.999.999."))]
    pub quantity: i32,

    #[validate(custom(function = "validate_product_description"))]
    pub description: Option<String>,

    #[validate(required(message = "O setor é obrigatório."))]
    pub sector_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(custom(function = "validate_product_name"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_price"))]
    pub price: Option<Decimal>,

    #[validate(range(min = 0, max = MAX_QUANTITY, message = "A quantidade deve estar entre 0 e 999.999.999."))]
    pub quantity: Option<i32>,

    #[validate(custom(function = "validate_product_description"))]
    pub description: Option<String>,

    pub sector_id: Option<i32>,
}

/// Estado final dos campos de um produto, já mesclado e aparado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    pub description: Option<String>,
    pub sector_id: i32,
}

fn trim_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

impl CreateProductPayload {
    pub fn into_fields(self) -> ProductFields {
        ProductFields {
            name: self.name.trim().to_string(),
            price: self.price,
            quantity: self.quantity,
            description: trim_description(self.description),
            sector_id: self.sector_id.unwrap_or_default(),
        }
    }
}

impl UpdateProductPayload {
    /// Aplica os campos presentes sobre o produto atual.
    pub fn merge_into(self, current: &Product) -> ProductFields {
        ProductFields {
            name: self
                .name
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| current.name.clone()),
            price: self.price.unwrap_or(current.price),
            quantity: self.quantity.unwrap_or(current.quantity),
            description: match self.description {
                Some(d) => trim_description(Some(d)),
                None => current.description.clone(),
            },
            sector_id: self.sector_id.unwrap_or(current.sector_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product() -> Product {
        Product {
            id: 10,
            name: "Caneta".into(),
            price: Decimal::from_str("2.50").unwrap(),
            quantity: 100,
            description: Some("Caneta azul".into()),
            sector_id: 1,
            sector_name: "Papelaria".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn create_payload_bounds() {
        let payload: CreateProductPayload = serde_json::from_value(serde_json::json!({
            "name": "Ca",
            "price": -1,
            "quantity": 1_000_000_000,
            "description": "ok",
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "price", "quantity", "description"] {
            assert!(fields.contains_key(field), "faltou erro para {field}");
        }
        // o setor ausente também é reportado
        assert_eq!(fields.len(), 5);
    }

    fn create_payload(name: &str, description: &str) -> CreateProductPayload {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "price": 1,
            "quantity": 1,
            "description": description,
            "sectorId": 1,
        }))
        .unwrap()
    }

    #[test]
    fn create_rejects_blank_name_and_padded_short_description() {
        let errors = create_payload("     ", "Caneta azul").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let errors = create_payload("Caneta", "  ab  ").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("description"));

        let payload = create_payload("  Caneta  ", "  Caneta azul ");
        assert!(payload.validate().is_ok());
        let fields = payload.into_fields();
        assert_eq!(fields.name, "Caneta");
        assert_eq!(fields.description.as_deref(), Some("Caneta azul"));
    }

    #[test]
    fn update_rejects_blank_name_and_padded_short_description() {
        let blank = UpdateProductPayload {
            name: Some("     ".into()),
            ..Default::default()
        };
        assert!(blank.validate().unwrap_err().field_errors().contains_key("name"));

        let short = UpdateProductPayload {
            description: Some("  ab  ".into()),
            ..Default::default()
        };
        assert!(short.validate().unwrap_err().field_errors().contains_key("description"));
    }

    #[test]
    fn fractional_quantity_is_rejected_by_deserialization() {
        let parsed: Result<CreateProductPayload, _> = serde_json::from_value(serde_json::json!({
            "name": "Caneta",
            "price": 1,
            "quantity": 1.5,
            "sectorId": 1,
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn update_merges_present_fields_only() {
        let payload = UpdateProductPayload {
            quantity: Some(7),
            description: Some("   ".into()),
            ..Default::default()
        };
        let fields = payload.merge_into(&product());
        assert_eq!(fields.name, "Caneta");
        assert_eq!(fields.quantity, 7);
        assert_eq!(fields.description, None);
        assert_eq!(fields.sector_id, 1);
    }
}
