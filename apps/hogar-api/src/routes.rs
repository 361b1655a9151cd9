use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use hogar_service::{ChatRequest, ChatResponse, Error};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new().route("/health", get(health)).route("/chat", post(chat)).with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthBody {
	status: &'static str,
	model: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
	Json(HealthBody {
		status: "OK",
		model: state.service.cfg.providers.llm_extractor.model.clone(),
	})
}

async fn chat(
	State(state): State<AppState>,
	payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
	let Json(payload) = payload.map_err(|rejection| {
		json_error(rejection.status(), "INVALID_REQUEST", rejection.body_text(), None)
	})?;
	let response = state.service.chat(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => json_error(
				StatusCode::UNPROCESSABLE_ENTITY,
				"INVALID_REQUEST",
				message,
				Some(vec!["$.message".to_string()]),
			),
			Error::Provider { message } => {
				tracing::error!(error = %message, "Chat turn failed in a provider.");

				json_error(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message, None)
			},
			Error::Storage { message } => {
				tracing::error!(error = %message, "Chat turn failed in storage.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message, None)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
