// src/services/pictures.rs

use std::path::PathBuf;

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::AppError;

pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

/// Imagem recebida no formulário, já checada (tipo e tamanho).
#[derive(Debug, Clone)]
pub struct PictureUpload {
    content_type: String,
    bytes: Vec<u8>,
}

impl PictureUpload {
    pub fn new(content_type: &str, bytes: Vec<u8>) -> Result<Self, AppError> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            return Err(AppError::InvalidPicture("Apenas arquivos de imagem são permitidos."));
        }
        if bytes.len() > MAX_PICTURE_BYTES {
            return Err(AppError::InvalidPicture("A imagem deve ter no máximo 5MB."));
        }
        Ok(Self { content_type, bytes })
    }

    pub fn extension(&self) -> &str {
        match self.content_type.as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            "image/bmp" => "bmp",
            _ => "img",
        }
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Onde as fotos de perfil ficam guardadas.
#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Grava a imagem e devolve o nome do arquivo.
    async fn save(&self, upload: &PictureUpload) -> Result<String, AppError>;

    /// Remove a imagem. Arquivo inexistente não é erro.
    async fn delete(&self, file_name: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct LocalPictureStore {
    dir: PathBuf,
}

impl LocalPictureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    // Só aceita nomes simples, gerados por `save`
    fn path_for(&self, file_name: &str) -> Option<PathBuf> {
        let valid = !file_name.is_empty()
            && file_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
            && !file_name.starts_with('.');
        valid.then(|| self.dir.join(file_name))
    }
}

#[async_trait]
impl PictureStore for LocalPictureStore {
    async fn save(&self, upload: &PictureUpload) -> Result<String, AppError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{}", Uuid::new_v4(), upload.extension());
        tokio::fs::write(self.dir.join(&file_name), &upload.bytes).await?;
        tracing::debug!(file = %file_name, bytes = upload.len(), "foto de perfil gravada");
        Ok(file_name)
    }

    async fn delete(&self, file_name: &str) -> Result<(), AppError> {
        let Some(path) = self.path_for(file_name) else {
            tracing::warn!(file = %file_name, "nome de arquivo inválido ignorado");
            return Ok(());
        };
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Remoção que não pode derrubar a operação: falhas só vão para o log.
pub async fn discard_picture(store: &dyn PictureStore, file_name: &str) {
    if let Err(e) = store.delete(file_name).await {
        tracing::warn!(file = %file_name, error = %e, "falha ao remover foto de perfil");
    }
}
