use std::convert::Infallible;

use axum::{
	Json, Router,
	body::Body,
	extract::{State, rejection::JsonRejection},
	http::{StatusCode, header::CONTENT_TYPE},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use futures_util::StreamExt;
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;
use rag_service::{ChatRequest, Error as ServiceError, QueryResponse};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/rag/query", post(query))
		.route("/rag/stream", post(stream))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn query(
	State(state): State<AppState>,
	payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
	let Json(payload) = payload?;
	let request_id = Uuid::new_v4();

	tracing::info!(%request_id, messages = payload.messages.len(), "Handling RAG query.");

	let response = state.service.query(payload).await.map_err(|err| {
		tracing::warn!(%request_id, error = %err, "RAG query failed.");

		ApiError::from(err)
	})?;

	Ok(Json(response))
}

/// Streams a finished answer as plain-text word chunks.
async fn stream(
	State(state): State<AppState>,
	payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
	let Json(payload) = payload?;
	let request_id = Uuid::new_v4();

	tracing::info!(%request_id, messages = payload.messages.len(), "Handling RAG stream.");

	let chunks = state.service.stream(payload).await.map_err(|err| {
		tracing::warn!(%request_id, error = %err, "RAG stream failed.");

		ApiError::from(err)
	})?;
	let body = Body::from_stream(chunks.map(Ok::<_, Infallible>));

	Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	error_code: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidRequest { .. } =>
				Self::new(StatusCode::BAD_REQUEST, "invalid_request", message),
			ServiceError::Retrieval { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "retrieval_failed", message),
			ServiceError::Generation { .. } =>
				Self::new(StatusCode::BAD_GATEWAY, "generation_failed", message),
		}
	}
}
/// Body errors keep axum's status (400, 415 or 422) but use the JSON error shape.
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		tracing::warn!(error = %rejection.body_text(), "Rejected request body.");

		Self::new(rejection.status(), "invalid_request", rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: self.message, error_code: self.error_code };

		(self.status, Json(body)).into_response()
	}
}
