// src/handlers/users.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::{error::AppError, validation::field_error},
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::user::{CreateUserPayload, UpdateUserPayload},
    services::pictures::PictureUpload,
};

const PICTURE_FIELD: &str = "profilePicture";

/// Campos do formulário multipart de cadastro/edição de usuário.
#[derive(Debug, Default)]
pub struct UserForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub sector_ids: Option<Vec<i32>>,
    pub picture: Option<PictureUpload>,
}

// Aceita `[1,2]`, `1,2` ou um id por campo repetido
fn parse_sector_ids(raw: &str) -> Result<Vec<i32>, AppError> {
    let invalid = || AppError::from(field_error("sectorIds", "invalid", "Lista de setores inválida."));
    let raw = raw.trim();

    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<i32>>(raw).map_err(|_| invalid());
    }

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i32>().map_err(|_| invalid()))
        .collect()
}

impl UserForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UserForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == PICTURE_FIELD {
                let content_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // Navegadores mandam a parte vazia quando nenhum arquivo é escolhido
                if !bytes.is_empty() {
                    form.picture = Some(PictureUpload::new(&content_type, bytes.to_vec())?);
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.apply_text(&name, value)?;
        }

        Ok(form)
    }

    fn apply_text(&mut self, field: &str, value: String) -> Result<(), AppError> {
        if value.trim().is_empty() {
            return Ok(());
        }
        match field {
            "name" => self.name = Some(value),
            "email" => self.email = Some(value),
            "password" => self.password = Some(value),
            "role" => self.role = Some(value),
            "sectorIds" | "sectorIds[]" => {
                let ids = parse_sector_ids(&value)?;
                self.sector_ids.get_or_insert_with(Vec::new).extend(ids);
            }
            other => tracing::debug!(field = %other, "campo de formulário ignorado"),
        }
        Ok(())
    }

    pub fn into_create(self) -> (CreateUserPayload, Option<PictureUpload>) {
        let payload = CreateUserPayload {
            name: self.name,
            email: self.email,
            password: self.password,
            role: self.role,
            sector_ids: self.sector_ids.unwrap_or_default(),
        };
        (payload, self.picture)
    }

    pub fn into_update(self) -> (UpdateUserPayload, Option<PictureUpload>) {
        let payload = UpdateUserPayload {
            name: self.name,
            email: self.email,
            password: self.password,
            role: self.role,
            sector_ids: self.sector_ids,
        };
        (payload, self.picture)
    }
}

pub async fn list_users(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.user_service.list_users(&principal).await?;
    Ok((StatusCode::OK, Json(users)))
}

pub async fn get_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let user = app_state.user_service.get_user(&principal, id).await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn create_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (payload, picture) = UserForm::from_multipart(multipart).await?.into_create();

    let user = app_state
        .user_service
        .create_user(&principal, payload, picture)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (payload, picture) = UserForm::from_multipart(multipart).await?.into_update();

    let user = app_state
        .user_service
        .update_user(&principal, id, payload, picture)
        .await?;
    Ok((StatusCode::OK, Json(user)))
}

pub async fn delete_user(
    State(app_state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    app_state.user_service.delete_user(&principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::{FromRequest, Request},
    };

    const BOUNDARY: &str = "XBOUNDARYX";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn file_part(name: &str, content_type: &str, data: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"foto\"\r\nContent-Type: {content_type}\r\n\r\n{data}\r\n"
        )
    }

    async fn form_from(parts: &[String]) -> Result<UserForm, AppError> {
        let body = format!("{}--{BOUNDARY}--\r\n", parts.concat());
        let request = Request::builder()
            .method("POST")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let multipart = Multipart::from_request(request, &()).await.unwrap();
        UserForm::from_multipart(multipart).await
    }

    #[test]
    fn sector_ids_accept_json_and_comma_lists() {
        assert_eq!(parse_sector_ids("[1, 2]").unwrap(), vec![1, 2]);
        assert_eq!(parse_sector_ids(" 3,4 ,").unwrap(), vec![3, 4]);
        assert_eq!(parse_sector_ids("[]").unwrap(), Vec::<i32>::new());
        assert!(matches!(parse_sector_ids("a,b"), Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn reads_text_fields_and_repeated_sectors() {
        let form = form_from(&[
            text_part("name", "Maria Souza"),
            text_part("email", "maria@example.com"),
            text_part("role", "VENDEDOR"),
            text_part("sectorIds[]", "1"),
            text_part("sectorIds[]", "2"),
            text_part("desconhecido", "x"),
        ])
        .await
        .unwrap();

        assert_eq!(form.name.as_deref(), Some("Maria Souza"));
        assert_eq!(form.role.as_deref(), Some("VENDEDOR"));
        assert_eq!(form.sector_ids, Some(vec![1, 2]));
        assert!(form.password.is_none());
        assert!(form.picture.is_none());
    }

    #[tokio::test]
    async fn missing_sector_field_stays_absent() {
        let form = form_from(&[text_part("name", "Ana Lima"), text_part("sectorIds", "")])
            .await
            .unwrap();
        let (payload, _) = form.into_update();
        assert_eq!(payload.sector_ids, None);
    }

    #[tokio::test]
    async fn picture_must_be_an_image() {
        let result = form_from(&[file_part(PICTURE_FIELD, "text/plain", "abc")]).await;
        assert!(matches!(result, Err(AppError::InvalidPicture(_))));

        let form = form_from(&[file_part(PICTURE_FIELD, "image/png", "png")])
            .await
            .unwrap();
        assert_eq!(form.picture.map(|p| p.extension().to_string()).as_deref(), Some("png"));
    }
}
