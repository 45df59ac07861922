use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use shelf_http::{ApiError, Envelope};
use shelf_store::{KeyValueStore, PONG};
use time::OffsetDateTime;

use super::models::{KeyValueEntry, PopulateResponse};
use crate::modules::books::seed::{self, IdStrategy, SampleData};

/// Shared by every redis handler.
#[derive(Clone)]
pub struct RedisState {
    pub store: Arc<dyn KeyValueStore>,
    pub ids: IdStrategy,
}

/// `GET /redis/health`
pub async fn health(State(state): State<RedisState>) -> Result<Json<Envelope>, ApiError> {
    match state.store.ping().await {
        Ok(token) if token == PONG => Ok(Json(Envelope::ok("Redis is healthy", token))),
        Ok(token) => {
            tracing::warn!(token = %token, "unexpected ping reply");
            Err(ApiError::service_unavailable("Redis health check failed"))
        }
        Err(err) => Err(ApiError::service_unavailable(format!(
            "Redis is not available: {err}"
        ))),
    }
}

/// `POST /redis/set`
pub async fn set_value(
    State(state): State<RedisState>,
    payload: Result<Json<KeyValueEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope>), ApiError> {
    let Json(entry) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let ack = state
        .store
        .set(&entry.key, &entry.value)
        .await
        .map_err(|err| ApiError::internal(format!("Error: {err}")))?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok("Value saved successfully", ack)),
    ))
}

/// `GET /redis/{key}`
pub async fn get_value(
    State(state): State<RedisState>,
    Path(key): Path<String>,
) -> Result<Json<Envelope>, ApiError> {
    let value = state
        .store
        .get(&key)
        .await
        .map_err(|err| ApiError::internal(format!("Error: {err}")))?;

    match value {
        Some(value) => Ok(Json(Envelope::ok("Value retrieved successfully", value))),
        None => Err(ApiError::not_found("Key not found")),
    }
}

/// `GET /redis/`: no key in the path, so the store is not contacted.
pub async fn missing_key() -> ApiError {
    ApiError::bad_request("Key parameter is required")
}

/// `GET /redis/populate`
pub async fn populate(State(state): State<RedisState>) -> (StatusCode, Json<PopulateResponse>) {
    let data = SampleData::generate(state.ids, OffsetDateTime::now_utc());

    match seed::write(state.store.as_ref(), &data).await {
        Ok(report) => (
            StatusCode::OK,
            Json(PopulateResponse {
                success: true,
                message: "Database populated successfully with sample data".to_string(),
                books_created: report.books_created,
                chapters_created: report.chapters_created,
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "populate aborted; earlier writes were kept");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PopulateResponse {
                    success: false,
                    message: format!("Error populating database: {err}"),
                    books_created: 0,
                    chapters_created: 0,
                }),
            )
        }
    }
}
