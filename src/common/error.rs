use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::access::DenyReason;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Corpo malformado, multipart inválido, campo com tipo errado...
    #[error("Requisição inválida: {0}")]
    BadRequest(String),

    #[error("Setores inexistentes: {0:?}")]
    InvalidSectorIds(Vec<i32>),

    #[error("Vendedor sem setor")]
    VendorWithoutSector,

    #[error("Arquivo de imagem inválido: {0}")]
    InvalidPicture(&'static str),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado: {0:?}")]
    Forbidden(DenyReason),

    #[error("{0} não encontrado")]
    NotFound(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyInUse,

    #[error("Setor já existe: {0}")]
    SectorNameAlreadyExists(String),

    #[error("Setor em uso: {0}")]
    SectorInUse(&'static str),

    #[error("Violação de restrição única: {0}")]
    UniqueConstraintViolation(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro de E/S: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<DenyReason> for AppError {
    fn from(reason: DenyReason) -> Self {
        AppError::Forbidden(reason)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::BadRequest(_)
            | AppError::InvalidSectorIds(_)
            | AppError::VendorWithoutSector
            | AppError::InvalidPicture(_)
            | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailAlreadyInUse
            | AppError::SectorNameAlreadyExists(_)
            | AppError::SectorInUse(_)
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_)
            | AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            // Retorna todos os detalhes da validação, campo a campo.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                })
            }
            AppError::BadRequest(message) => json!({ "error": message }),
            AppError::InvalidSectorIds(ids) => json!({
                "error": "Um ou mais setores informados não existem.",
                "invalidSectorIds": ids,
            }),
            AppError::VendorWithoutSector => {
                json!({ "error": "Vendedores devem ser associados a pelo menos um setor." })
            }
            AppError::InvalidPicture(message) => json!({ "error": message }),
            AppError::InvalidCredentials => json!({ "error": "E-mail ou senha incorretos!" }),
            AppError::InvalidToken => {
                json!({ "error": "Token de autenticação inválido ou ausente." })
            }
            AppError::Forbidden(reason) => json!({
                "error": reason.message(),
                "code": reason.code(),
            }),
            AppError::NotFound(entity) => json!({ "error": format!("{} não encontrado.", entity) }),
            AppError::EmailAlreadyInUse => json!({ "error": "Este e-mail já está em uso." }),
            AppError::SectorNameAlreadyExists(name) => {
                json!({ "error": format!("Já existe um setor com o nome '{}'.", name) })
            }
            AppError::SectorInUse(message) => json!({ "error": message }),
            AppError::UniqueConstraintViolation(message) => json!({ "error": message }),

            // Todos os outros erros viram 500. O detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                json!({ "error": "Ocorreu um erro inesperado." })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: AppError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn login_failure_is_a_generic_bad_request() {
        let (status, body) = body_json(AppError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "E-mail ou senha incorretos!");
    }

    #[tokio::test]
    async fn vendor_without_sector_message() {
        let (status, body) = body_json(AppError::VendorWithoutSector).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Vendedores devem ser associados a pelo menos um setor.");
    }

    #[tokio::test]
    async fn forbidden_carries_reason_code() {
        let (status, body) =
            body_json(AppError::Forbidden(DenyReason::SectorReassignmentForbidden)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "SECTOR_REASSIGNMENT_FORBIDDEN");
    }

    #[tokio::test]
    async fn invalid_sector_ids_are_listed() {
        let (status, body) = body_json(AppError::InvalidSectorIds(vec![4, 9])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["invalidSectorIds"], json!([4, 9]));
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) =
            body_json(AppError::InternalServerError(anyhow::anyhow!("senha do banco: 123"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Ocorreu um erro inesperado.");
    }

    #[test]
    fn conflicts_map_to_409() {
        assert_eq!(AppError::EmailAlreadyInUse.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::SectorNameAlreadyExists("Vendas".into()).status(),
            StatusCode::CONFLICT
        );
    }
}
