// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::{
    common::validation::{validate_password, validate_person_name},
    models::{
        auth::{Principal, Role, SessionUser},
        sector::SectorSummary,
    },
};

/// Prefixo público das fotos de perfil servidas como arquivo estático.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

pub fn picture_url(file_name: &str) -> String {
    format!("{}/{}", UPLOADS_URL_PREFIX, file_name)
}

// Representa um usuário vindo do banco de dados, já com os setores do registro
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub sector_ids: Vec<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.role, self.sector_ids.iter().copied())
    }

    pub fn session(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
            profile_picture: self.profile_picture.as_deref().map(picture_url),
            sector_ids: self.sector_ids.clone(),
        }
    }
}

// O que a API devolve: nunca inclui a senha
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub sector_ids: Vec<i32>,
    pub sectors: Vec<SectorSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserResponse {
    pub fn new(user: User, sectors: Vec<SectorSummary>) -> Self {
        Self {
            id: user.id,
            profile_picture: user.profile_picture.as_deref().map(picture_url),
            name: user.name,
            email: user.email,
            role: user.role,
            sector_ids: user.sector_ids,
            sectors,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn validate_assignable_role(value: &str) -> Result<(), ValidationError> {
    match Role::parse(value) {
        Some(role) if role.is_assignable() => Ok(()),
        _ => {
            let mut err = ValidationError::new("role");
            err.message = Some("O papel deve ser ADMIN ou VENDEDOR.".into());
            Err(err)
        }
    }
}

// Na atualização qualquer papel conhecido passa aqui; autoedição com o
// próprio papel é válida e o serviço recusa USER vindo de um ADMIN.
fn validate_known_role(value: &str) -> Result<(), ValidationError> {
    if Role::parse(value).is_some() {
        return Ok(());
    }
    let mut err = ValidationError::new("role");
    err.message = Some("Papel desconhecido.".into());
    Err(err)
}

// Dados para criar um usuário (vindos do formulário multipart)
#[derive(Debug, Default, Validate)]
pub struct CreateUserPayload {
    #[validate(
        required(message = "O nome é obrigatório."),
        custom(function = "validate_person_name")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "O e-mail é obrigatório."),
        email(message = "O e-mail fornecido é inválido."),
        length(max = 255, message = "O e-mail deve ter no máximo 255 caracteres.")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "A senha é obrigatória."),
        custom(function = "validate_password")
    )]
    pub password: Option<String>,

    #[validate(
        required(message = "O papel é obrigatório."),
        custom(function = "validate_assignable_role")
    )]
    pub role: Option<String>,

    pub sector_ids: Vec<i32>,
}

/// Versão já validada e normalizada do cadastro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub sector_ids: Vec<i32>,
}

impl CreateUserPayload {
    /// Valida e normaliza (nome aparado, e-mail em minúsculas, papel canônico).
    pub fn into_new_user(self) -> Result<NewUser, validator::ValidationErrors> {
        self.validate()?;

        let mut sector_ids = self.sector_ids;
        sector_ids.sort_unstable();
        sector_ids.dedup();

        // `validate` garante que os campos obrigatórios estão presentes.
        Ok(NewUser {
            name: self.name.unwrap_or_default().trim().to_string(),
            email: normalize_email(&self.email.unwrap_or_default()),
            password: self.password.unwrap_or_default(),
            role: self.role.as_deref().and_then(Role::parse).unwrap_or(Role::User),
            sector_ids,
        })
    }
}

// Atualização parcial: só os campos presentes são validados e aplicados
#[derive(Debug, Default, Validate)]
pub struct UpdateUserPayload {
    #[validate(custom(function = "validate_person_name"))]
    pub name: Option<String>,

    #[validate(
        email(message = "O e-mail fornecido é inválido."),
        length(max = 255, message = "O e-mail deve ter no máximo 255 caracteres.")
    )]
    pub email: Option<String>,

    #[validate(custom(function = "validate_password"))]
    pub password: Option<String>,

    #[validate(custom(function = "validate_known_role"))]
    pub role: Option<String>,

    /// `Some` somente quando o formulário traz a lista explicitamente.
    pub sector_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub sector_ids: Option<Vec<i32>>,
}

impl UpdateUserPayload {
    pub fn into_changes(self) -> Result<UserChanges, validator::ValidationErrors> {
        self.validate()?;

        Ok(UserChanges {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            password: self.password,
            role: self.role.as_deref().and_then(Role::parse),
            sector_ids: self.sector_ids.map(|mut ids| {
                ids.sort_unstable();
                ids.dedup();
                ids
            }),
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> CreateUserPayload {
        CreateUserPayload {
            name: Some("  Maria Souza ".into()),
            email: Some("Maria@Example.COM".into()),
            password: Some("Senha@12".into()),
            role: Some("vendedor".into()),
            sector_ids: vec![3, 1, 3],
        }
    }

    #[test]
    fn create_payload_is_normalized() {
        let user = valid_payload().into_new_user().unwrap();
        assert_eq!(user.name, "Maria Souza");
        assert_eq!(user.email, "maria@example.com");
        assert_eq!(user.role, Role::Vendedor);
        assert_eq!(user.sector_ids, vec![1, 3]);
    }

    #[test]
    fn create_payload_requires_fields() {
        let errors = CreateUserPayload::default().into_new_user().unwrap_err();
        let fields = errors.field_errors();
        for field in ["name", "email", "password", "role"] {
            assert!(fields.contains_key(field), "faltou erro para {field}");
        }
    }

    #[test]
    fn user_role_cannot_be_assigned() {
        let payload = CreateUserPayload {
            role: Some("USER".into()),
            ..valid_payload()
        };
        let errors = payload.into_new_user().unwrap_err();
        assert!(errors.field_errors().contains_key("role"));
    }

    #[test]
    fn invalid_email_is_rejected() {
        let payload = CreateUserPayload {
            email: Some("maria@".into()),
            ..valid_payload()
        };
        assert!(payload.into_new_user().is_err());
    }

    #[test]
    fn update_validates_only_present_fields() {
        let changes = UpdateUserPayload {
            email: Some("NOVO@Example.com".into()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.email.as_deref(), Some("novo@example.com"));
        assert_eq!(changes.name, None);
        assert_eq!(changes.sector_ids, None);

        let bad = UpdateUserPayload {
            password: Some("fraca".into()),
            ..Default::default()
        };
        assert!(bad.into_changes().is_err());
    }

    #[test]
    fn update_accepts_any_known_role() {
        let changes = UpdateUserPayload {
            role: Some(" user ".into()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.role, Some(Role::User));

        let bad = UpdateUserPayload {
            role: Some("gerente".into()),
            ..Default::default()
        };
        assert!(bad.into_changes().unwrap_err().field_errors().contains_key("role"));
    }

    #[test]
    fn update_keeps_explicit_empty_sector_list() {
        let changes = UpdateUserPayload {
            sector_ids: Some(vec![]),
            ..Default::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.sector_ids, Some(vec![]));
    }

    #[test]
    fn session_exposes_picture_url() {
        let user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password_hash: "hash".into(),
            role: Role::Admin,
            profile_picture: Some("abc.png".into()),
            sector_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(user.session().profile_picture.as_deref(), Some("/uploads/abc.png"));
        assert_eq!(user.principal().role, Role::Admin);
    }
}
