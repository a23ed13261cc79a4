use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{DocType, FormattedDocument, ResumeReport, Skill};
use crate::pipeline::ingest::ingest_bytes;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub doc_id: String,
    pub doc_type: DocType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub skills: Vec<Skill>,
    pub status: String,
}

/// The multipart body: a `file` part plus optional `job_title` / `company` text parts.
struct Upload {
    file_name: String,
    bytes: Vec<u8>,
    job_title: Option<String>,
    company: Option<String>,
}

/// POST /api/v1/resumes
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    upload(&state, multipart, DocType::Resume).await
}

/// POST /api/v1/jobs
pub async fn handle_upload_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    upload(&state, multipart, DocType::Job).await
}

/// GET /api/v1/documents/:doc_id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<FormattedDocument>, AppError> {
    state
        .pipeline
        .document(&doc_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Document {doc_id} not found")))
}

/// GET /api/v1/matches/:doc_id
pub async fn handle_get_matches(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<ResumeReport>, AppError> {
    state
        .pipeline
        .match_report(&doc_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No matches stored for {doc_id}")))
}

async fn upload(
    state: &AppState,
    mut multipart: Multipart,
    doc_type: DocType,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_upload(&mut multipart).await?;
    let mut input = ingest_bytes(&upload.file_name, upload.bytes, doc_type).await?;
    input.job_title = upload.job_title;
    input.company = upload.company;

    let doc = state.pipeline.ingest(input).await?;
    Ok(Json(UploadResponse {
        doc_id: doc.doc_id,
        doc_type: doc.doc_type,
        job_title: doc.job_title,
        company: doc.company,
        skills: doc.skills,
        status: "Uploaded and processed successfully".to_string(),
    }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Upload, AppError> {
    let malformed =
        |e: MultipartError| AppError::Validation(format!("Malformed multipart body: {e}"));

    let mut file = None;
    let mut job_title = None;
    let mut company = None;
    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_owned).ok_or_else(|| {
                    AppError::Validation("Uploaded file has no file name".to_string())
                })?;
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Could not read uploaded file: {e}"))
                })?;
                file = Some((file_name, bytes.to_vec()));
            }
            Some("job_title") => job_title = text_field(field.text().await.map_err(malformed)?),
            Some("company") => company = text_field(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }

    let (file_name, bytes) = file
        .ok_or_else(|| AppError::Validation("Missing multipart field 'file'".to_string()))?;
    Ok(Upload {
        file_name,
        bytes,
        job_title,
        company,
    })
}

fn text_field(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
