use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use bytes::Bytes;
use serde_json::json;

use crate::errors::AppError;
use crate::models::token::{CreateTokenRequest, TokenRecord};
use crate::models::verdict::Verdict;
use crate::pipeline::moderation::Upload;
use crate::state::AppState;

/// GET / — service identity probe.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "message": "modgate image moderation API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /health — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// POST /auth/tokens — issue a new token (admin only). The one place the
/// plaintext secret of a freshly minted token leaves the service.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenRecord>), AppError> {
    let token = state
        .authority
        .issue(payload.is_admin, payload.description)
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// GET /auth/tokens — list active tokens (admin only). Secrets come back in
/// plaintext; admins are trusted with the full set.
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TokenRecord>>, AppError> {
    Ok(Json(state.authority.list_active().await?))
}

/// DELETE /auth/tokens/:secret — soft-delete (admin only). 404 unless a
/// record actually changed state, so a repeat delete is visible as such.
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    Path(secret): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if state.authority.revoke(&secret).await? {
        Ok(Json(json!({ "message": "token deleted successfully" })))
    } else {
        Err(AppError::NotFound)
    }
}

/// POST /moderate — analyze one uploaded image.
pub async fn moderate(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<TokenRecord>,
    mut multipart: Multipart,
) -> Result<Json<Verdict>, AppError> {
    let upload = read_file_field(&mut multipart).await?;
    let verdict = state.pipeline.handle(upload, &caller).await?;
    Ok(Json(verdict))
}

/// Pull the first file field out of a multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::InvalidInput("malformed multipart body".into()))?
    {
        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|_| AppError::InvalidInput("failed to read upload".into()))?;

        return Ok(Upload {
            bytes,
            filename,
            content_type,
        });
    }

    Err(AppError::InvalidInput(
        "multipart upload with one file field required".into(),
    ))
}
