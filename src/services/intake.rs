use crate::services::staging::{StagedFile, StagingArea};
use axum::extract::Multipart;
use axum::extract::multipart::Field;
use axum::http::StatusCode;
use futures::TryStreamExt;
use std::collections::HashMap;
use thiserror::Error;
use tokio_util::io::StreamReader;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Unexpected file field '{0}'")]
    UnexpectedFile(String),

    #[error("Too many files: at most {limit} are accepted")]
    TooManyFiles { limit: usize },

    #[error("{message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Failed to stage upload: {0:#}")]
    Staging(anyhow::Error),
}

/// What the multipart body contained: staged files in arrival order plus the
/// text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<StagedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Text field value; empty values count as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Reads the whole multipart body, staging every file part sent under
/// `file_field` and collecting text fields.
///
/// File parts under any other name, or more than `max_files` of them, reject
/// the request. On error the files staged so far are deleted and the rest of
/// the body is drained so the client sees the response instead of a reset.
pub async fn receive_upload(
    multipart: &mut Multipart,
    staging: &StagingArea,
    file_field: &str,
    max_files: usize,
) -> Result<UploadForm, IntakeError> {
    let mut form = UploadForm::default();

    let result = read_fields(multipart, staging, file_field, max_files, &mut form).await;

    match result {
        Ok(()) => Ok(form),
        Err(e) => {
            tracing::warn!("Upload rejected during intake: {}. Consuming remaining stream...", e);
            staging.discard(std::mem::take(&mut form.files)).await;
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    staging: &StagingArea,
    file_field: &str,
    max_files: usize,
    form: &mut UploadForm,
) -> Result<(), IntakeError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| IntakeError::Multipart {
            status: e.status(),
            message: e.body_text(),
        })?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .file_name()
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        match file_name {
            Some(original_name) => {
                if name != file_field {
                    return Err(IntakeError::UnexpectedFile(name));
                }
                if form.files.len() >= max_files {
                    return Err(IntakeError::TooManyFiles { limit: max_files });
                }
                let staged = stage_field(staging, &original_name, field).await?;
                form.files.push(staged);
            }
            None => {
                let text = field.text().await.map_err(|e| IntakeError::Multipart {
                    status: e.status(),
                    message: e.body_text(),
                })?;
                form.fields.insert(name, text);
            }
        }
    }

    Ok(())
}

async fn stage_field(
    staging: &StagingArea,
    original_name: &str,
    field: Field<'_>,
) -> Result<StagedFile, IntakeError> {
    let body_with_io_error = field.map_err(std::io::Error::other);
    let reader = StreamReader::new(body_with_io_error);

    staging
        .stage(original_name, reader)
        .await
        .map_err(IntakeError::Staging)
}
