// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::{Claims, LoginResponse, Principal},
        user::{User, normalize_email},
    },
};

pub fn create_token(user: &User, secret: &str, expiration_hours: i64) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now + chrono::Duration::hours(expiration_hours);

    let claims = Claims {
        sub: user.id,
        role: user.role,
        sector_ids: user.sector_ids.clone(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

// Assinatura inválida, token expirado ou malformado: tudo vira 401
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::InvalidToken)
}

// bcrypt é caro: roda fora das threads do runtime
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    expiration_hours: i64,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, expiration_hours: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            expiration_hours,
        }
    }

    /// Login. E-mail desconhecido e senha errada dão o mesmo erro genérico.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            tracing::info!(user_id = user.id, "tentativa de login com senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        let token = create_token(&user, &self.jwt_secret, self.expiration_hours)?;
        tracing::info!(user_id = user.id, role = %user.role, "login realizado");

        Ok(LoginResponse {
            token,
            user: user.session(),
        })
    }

    /// Valida o token e reconstrói o principal a partir do banco: papel e
    /// setores atuais valem mais que os gravados nas claims.
    pub async fn principal_from_token(&self, token: &str) -> Result<Principal, AppError> {
        let claims = decode_token(token, &self.jwt_secret)?;

        let user = self
            .user_repo
            .get(claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok(user.principal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn user() -> User {
        User {
            id: 42,
            name: "Carla".into(),
            email: "carla@example.com".into(),
            password_hash: String::new(),
            role: Role::Vendedor,
            profile_picture: None,
            sector_ids: vec![1, 2],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn token_round_trip() {
        let token = create_token(&user(), "segredo", 1).unwrap();
        let claims = decode_token(&token, "segredo").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Vendedor);
        assert_eq!(claims.sector_ids, vec![1, 2]);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(&user(), "segredo", 1).unwrap();
        assert!(matches!(decode_token(&token, "outro"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token(&user(), "segredo", -2).unwrap();
        assert!(matches!(decode_token(&token, "segredo"), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode_token("abc.def.ghi", "segredo"), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hashed = hash_password("Senha@12").await.unwrap();
        assert!(verify_password("Senha@12", &hashed).await.unwrap());
        assert!(!verify_password("Senha@13", &hashed).await.unwrap());
    }
}
