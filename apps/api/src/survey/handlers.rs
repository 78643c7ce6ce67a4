use axum::{
    extract::{rejection::BytesRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::serialize;
use crate::models::survey::format_timestamp;
use crate::state::AppState;
use crate::survey::{normalize, validate};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub id: Uuid,
    pub stored_at: String,
}

/// POST /api/survey
pub async fn handle_submit(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::MalformedPayload(rejection.body_text())
        }
    })?;

    let payload: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::MalformedPayload(e.to_string()))?
    };

    let submission = validate(&payload)?;
    // The store may adjust createdAt, so the reply echoes what it kept.
    let record = state
        .store
        .append(normalize(&submission))
        .await
        .map_err(AppError::Store)?;
    info!("Stored survey response {}", record.id);

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: record.id,
            stored_at: format_timestamp(record.created_at),
        }),
    ))
}

/// GET /api/survey/export
/// Streams every stored response, newest first, as a CSV attachment.
pub async fn handle_export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let records = state.store.read_all().await.map_err(AppError::Export)?;
    info!("Exporting {} survey responses", records.len());

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_filename(Utc::now().date_naive())
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        serialize(&records),
    ))
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("survey-responses-{}.csv", date.format("%Y-%m-%d"))
}
