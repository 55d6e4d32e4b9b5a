// src/models/auth.rs

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

// Papel do usuário. Guardado no banco como o tipo enum `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Vendedor,
    User,
}

impl Role {
    /// Único ponto de canonicalização de papéis vindos de fora
    /// (formulários, claims). Ignora espaços e maiúsculas/minúsculas.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "VENDEDOR" => Some(Role::Vendedor),
            "USER" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Vendedor => "VENDEDOR",
            Role::User => "USER",
        }
    }

    // Papéis que podem ser atribuídos pelo cadastro de usuários
    pub fn is_assignable(&self) -> bool {
        matches!(self, Role::Admin | Role::Vendedor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// O ator autenticado de uma requisição.
///
/// É reconstruído a cada requisição a partir do banco (papel e setores
/// atuais), nunca a partir dos dados enviados pelo cliente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
    pub sector_ids: BTreeSet<i32>,
}

impl Principal {
    pub fn new(id: i32, role: Role, sector_ids: impl IntoIterator<Item = i32>) -> Self {
        Self {
            id,
            role,
            sector_ids: sector_ids.into_iter().collect(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn has_sector(&self, sector_id: i32) -> bool {
        self.sector_ids.contains(&sector_id)
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginUserPayload {
    #[validate(required(message = "O e-mail é obrigatório."))]
    pub email: Option<String>,
    #[validate(required(message = "A senha é obrigatória."))]
    pub password: Option<String>,
}

// Usuário devolvido junto com o token
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub sector_ids: Vec<i32>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: i32,          // ID do usuário
    pub role: Role,        // Informativo: o guard relê o papel do banco
    pub sector_ids: Vec<i32>,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_and_space_insensitive() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("  Vendedor "), Some(Role::Vendedor));
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("gerente"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn only_admin_and_vendedor_are_assignable() {
        assert!(Role::Admin.is_assignable());
        assert!(Role::Vendedor.is_assignable());
        assert!(!Role::User.is_assignable());
    }

    #[test]
    fn role_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Vendedor).unwrap(), "\"VENDEDOR\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn principal_deduplicates_sectors() {
        let principal = Principal::new(7, Role::Vendedor, [3, 1, 3]);
        assert_eq!(principal.sector_ids.len(), 2);
        assert!(principal.has_sector(1));
        assert!(!principal.has_sector(2));
        assert!(!principal.is_admin());
    }
}
