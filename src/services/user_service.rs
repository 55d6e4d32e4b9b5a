// src/services/user_service.rs

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    common::{error::AppError, validation::field_error},
    db::{MembershipRegistry, UserRepository, user_repo::UserRecord},
    models::{
        auth::{Principal, Role},
        user::{CreateUserPayload, NewUser, UpdateUserPayload, User, UserChanges, UserResponse},
    },
    services::{
        access::{Action, Resource, decide},
        auth::hash_password,
        pictures::{PictureStore, PictureUpload, discard_picture},
    },
};

/// Decide o que fazer com os vínculos de setor numa atualização.
///
/// Devolve `Some(conjunto)` quando o registro precisa ser reescrito e
/// `None` quando os vínculos atuais ficam como estão.
pub fn resolve_membership(
    final_role: Role,
    current: &[i32],
    requested: Option<&[i32]>,
) -> Result<Option<Vec<i32>>, AppError> {
    match final_role {
        // ADMIN enxerga tudo: vínculos são descartados
        Role::Admin => Ok((!current.is_empty()).then(Vec::new)),
        Role::Vendedor => {
            let resulting = requested.unwrap_or(current);
            if resulting.is_empty() {
                return Err(AppError::VendorWithoutSector);
            }
            Ok(requested.map(<[i32]>::to_vec))
        }
        Role::User => Ok(requested.map(<[i32]>::to_vec)),
    }
}

/// Só ADMIN e VENDEDOR podem ser atribuídos; reenviar o papel atual é aceito.
pub fn check_role_change(current: Role, requested: Option<Role>) -> Result<(), AppError> {
    match requested {
        Some(role) if role != current && !role.is_assignable() => {
            Err(field_error("role", "role", "O papel deve ser ADMIN ou VENDEDOR.").into())
        }
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    user_repo: UserRepository,
    membership: MembershipRegistry,
    pictures: Arc<dyn PictureStore>,
}

impl UserService {
    pub fn new(
        user_repo: UserRepository,
        membership: MembershipRegistry,
        pictures: Arc<dyn PictureStore>,
        pool: PgPool,
    ) -> Self {
        Self {
            pool,
            user_repo,
            membership,
            pictures,
        }
    }

    async fn respond(&self, user: User) -> Result<UserResponse, AppError> {
        let mut summaries = self.membership.summaries_for(&[user.id]).await?;
        let sectors = summaries.remove(&user.id).unwrap_or_default();
        Ok(UserResponse::new(user, sectors))
    }

    async fn load(&self, id: i32) -> Result<User, AppError> {
        self.user_repo.get(id).await?.ok_or(AppError::NotFound("Usuário"))
    }

    pub async fn list_users(&self, principal: &Principal) -> Result<Vec<UserResponse>, AppError> {
        decide(principal, Action::ListUsers, &Resource::Any).into_result()?;

        let users = self.user_repo.list().await?;
        let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
        let mut summaries = self.membership.summaries_for(&ids).await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let sectors = summaries.remove(&user.id).unwrap_or_default();
                UserResponse::new(user, sectors)
            })
            .collect())
    }

    pub async fn get_user(&self, principal: &Principal, id: i32) -> Result<UserResponse, AppError> {
        decide(principal, Action::ReadUser, &Resource::user(id)).into_result()?;
        let user = self.load(id).await?;
        self.respond(user).await
    }

    /// Cadastro: valida, autoriza, grava usuário + vínculos numa transação.
    /// Se algo falhar depois da foto ter sido gravada, a foto é removida.
    pub async fn create_user(
        &self,
        principal: &Principal,
        payload: CreateUserPayload,
        picture: Option<PictureUpload>,
    ) -> Result<UserResponse, AppError> {
        let mut new_user = payload.into_new_user()?;
        decide(principal, Action::CreateUser, &Resource::Any).into_result()?;

        match new_user.role {
            Role::Vendedor if new_user.sector_ids.is_empty() => {
                return Err(AppError::VendorWithoutSector);
            }
            Role::Vendedor => {}
            _ => new_user.sector_ids.clear(),
        }

        let password_hash = hash_password(&new_user.password).await?;

        let stored_picture = match &picture {
            Some(upload) => Some(self.pictures.save(upload).await?),
            None => None,
        };

        let result = self
            .insert_user(&new_user, &password_hash, stored_picture.as_deref())
            .await;

        let user_id = match result {
            Ok(id) => id,
            Err(e) => {
                if let Some(file) = &stored_picture {
                    discard_picture(self.pictures.as_ref(), file).await;
                }
                tracing::info!(email = %new_user.email, error = %e, "cadastro de usuário rejeitado");
                return Err(e);
            }
        };

        tracing::info!(user_id, role = %new_user.role, created_by = principal.id, "usuário criado");
        let user = self.load(user_id).await?;
        self.respond(user).await
    }

    async fn insert_user(
        &self,
        new_user: &NewUser,
        password_hash: &str,
        picture: Option<&str>,
    ) -> Result<i32, AppError> {
        let mut tx = self.pool.begin().await?;

        if self.user_repo.email_taken(&mut *tx, &new_user.email, None).await? {
            return Err(AppError::EmailAlreadyInUse);
        }

        let user_id = self
            .user_repo
            .create_user(
                &mut *tx,
                &new_user.name,
                &new_user.email,
                password_hash,
                new_user.role,
                picture,
            )
            .await?;

        if !new_user.sector_ids.is_empty() {
            // Se algum setor não existir, o drop do `tx` desfaz o INSERT acima
            self.membership
                .set_membership(&mut *tx, user_id, &new_user.sector_ids)
                .await?;
        }

        tx.commit().await?;
        Ok(user_id)
    }

    /// Atualização parcial. Na autoedição, papel diferente do atual é
    /// negado e a lista de setores é ignorada.
    pub async fn update_user(
        &self,
        principal: &Principal,
        id: i32,
        payload: UpdateUserPayload,
        picture: Option<PictureUpload>,
    ) -> Result<UserResponse, AppError> {
        let mut changes = payload.into_changes()?;

        let resource = Resource::User {
            target_id: Some(id),
            requested_role: changes.role,
        };
        decide(principal, Action::UpdateUser, &resource).into_result()?;

        if id == principal.id {
            changes.role = None;
            changes.sector_ids = None;
        }

        let password_hash = match &changes.password {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let stored_picture = match &picture {
            Some(upload) => Some(self.pictures.save(upload).await?),
            None => None,
        };

        let result = self
            .apply_update(id, &changes, password_hash.as_deref(), stored_picture.as_deref())
            .await;

        match result {
            Ok(previous_picture) => {
                // A foto antiga só sai depois do commit, e sem derrubar a resposta
                if let (Some(_), Some(old)) = (&stored_picture, &previous_picture) {
                    discard_picture(self.pictures.as_ref(), old).await;
                }
                tracing::info!(user_id = id, updated_by = principal.id, "usuário atualizado");
                let user = self.load(id).await?;
                self.respond(user).await
            }
            Err(e) => {
                if let Some(file) = &stored_picture {
                    discard_picture(self.pictures.as_ref(), file).await;
                }
                Err(e)
            }
        }
    }

    // Devolve o nome da foto anterior do usuário
    async fn apply_update(
        &self,
        id: i32,
        changes: &UserChanges,
        password_hash: Option<&str>,
        picture: Option<&str>,
    ) -> Result<Option<String>, AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.user_repo.lock(&mut *tx, id).await? {
            return Err(AppError::NotFound("Usuário"));
        }
        let current = self
            .user_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        if let Some(email) = &changes.email {
            if email != &current.email
                && self.user_repo.email_taken(&mut *tx, email, Some(id)).await?
            {
                return Err(AppError::EmailAlreadyInUse);
            }
        }

        check_role_change(current.role, changes.role)?;

        let final_role = changes.role.unwrap_or(current.role);
        let membership = resolve_membership(
            final_role,
            &current.sector_ids,
            changes.sector_ids.as_deref(),
        )?;

        let record = UserRecord {
            name: changes.name.as_deref(),
            email: changes.email.as_deref(),
            password_hash,
            role: changes.role,
            profile_picture: picture,
        };
        self.user_repo.update_user(&mut *tx, id, &record).await?;

        if let Some(sector_ids) = membership {
            self.membership.set_membership(&mut *tx, id, &sector_ids).await?;
        }

        tx.commit().await?;
        Ok(current.profile_picture)
    }

    /// Exclusão: vínculos e usuário numa transação; a foto sai depois,
    /// como efeito colateral que só gera aviso se falhar.
    pub async fn delete_user(&self, principal: &Principal, id: i32) -> Result<(), AppError> {
        decide(principal, Action::DeleteUser, &Resource::user(id)).into_result()?;

        let mut tx = self.pool.begin().await?;

        if !self.user_repo.lock(&mut *tx, id).await? {
            return Err(AppError::NotFound("Usuário"));
        }
        let user = self
            .user_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Usuário"))?;

        let removed = self.membership.clear(&mut *tx, id).await?;
        self.user_repo.delete_user(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(user_id = id, memberships = removed, deleted_by = principal.id, "usuário excluído");

        if let Some(file) = &user.profile_picture {
            discard_picture(self.pictures.as_ref(), file).await;
        }
        Ok(())
    }

    /// Cria o primeiro ADMIN se ainda não houver usuário com esse e-mail.
    pub async fn seed_admin(&self, name: &str, email: &str, password: &str) -> Result<(), AppError> {
        let payload = CreateUserPayload {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            role: Some(Role::Admin.as_str().to_string()),
            sector_ids: Vec::new(),
        };
        let new_user = payload.into_new_user()?;

        if self.user_repo.find_by_email(&new_user.email).await?.is_some() {
            tracing::debug!(email = %new_user.email, "administrador inicial já existe");
            return Ok(());
        }

        let password_hash = hash_password(&new_user.password).await?;
        let id = self.insert_user(&new_user, &password_hash, None).await?;
        tracing::info!(user_id = id, email = %new_user.email, "administrador inicial criado");
        Ok(())
    }
}
