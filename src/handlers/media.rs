use crate::models::{InsertResponse, MediaKind, MediaRecord, MediaSummary};
use crate::{AppError, AppState, Result};
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Multipart part carrying the uploaded file.
const FILE_FIELD: &str = "file";

static FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._-]{1,100}$").expect("filename pattern is valid"));

/// Filenames accepted in lookup paths: 1-100 chars of `[a-zA-Z0-9._-]`.
pub fn is_valid_filename(filename: &str) -> bool {
    FILENAME_RE.is_match(filename)
}

pub async fn upload_sprite(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<InsertResponse>> {
    upload(&state, MediaKind::Sprite, multipart).await
}

pub async fn upload_audio(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<InsertResponse>> {
    upload(&state, MediaKind::Audio, multipart).await
}

async fn upload(
    state: &AppState,
    kind: MediaKind,
    mut multipart: Multipart,
) -> Result<Json<InsertResponse>> {
    let record = read_file_field(&mut multipart).await?;
    tracing::info!(
        "Received {} upload '{}' ({} bytes)",
        kind,
        record.filename,
        record.size
    );

    let id = state.store.insert_media(kind, record).await?;

    Ok(Json(InsertResponse {
        message: kind.upload_message().to_string(),
        id,
    }))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<MediaRecord> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::Validation(format!("Failed to read form field: {}", e))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {}", e)))?;

        return Ok(MediaRecord::new(filename, content_type, data.to_vec()));
    }

    Err(AppError::BadRequest(format!(
        "Missing '{}' part in upload",
        FILE_FIELD
    )))
}

pub async fn list_sprites(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MediaSummary>>> {
    list(&state, MediaKind::Sprite).await
}

pub async fn list_audio(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MediaSummary>>> {
    list(&state, MediaKind::Audio).await
}

async fn list(state: &AppState, kind: MediaKind) -> Result<Json<Vec<MediaSummary>>> {
    let records = state.store.list_media(kind).await?;
    Ok(Json(records.into_iter().map(MediaSummary::from).collect()))
}

pub async fn get_sprite(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<MediaSummary>> {
    find(&state, MediaKind::Sprite, &filename).await
}

pub async fn get_audio(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Json<MediaSummary>> {
    find(&state, MediaKind::Audio, &filename).await
}

async fn find(state: &AppState, kind: MediaKind, filename: &str) -> Result<Json<MediaSummary>> {
    if !is_valid_filename(filename) {
        return Err(AppError::Validation("Invalid filename".to_string()));
    }

    state
        .store
        .find_media(kind, filename)
        .await?
        .map(|record| Json(MediaSummary::from(record)))
        .ok_or_else(|| AppError::NotFound(format!("No {} named '{}'", kind, filename)))
}
