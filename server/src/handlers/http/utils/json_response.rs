use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use std::convert::Infallible;
use tracing::{debug, warn};

use shared::types::{ErrorResponse, SuccessResponse};

use crate::error::{ServiceError, ServiceResult};

pub type ApiResponse = Response<BoxBody<Bytes, Infallible>>;

/// Serialize any `Serialize` type and deliver it as a JSON response.
pub fn deliver_serialized_json<T: Serialize>(data: &T, status: StatusCode) -> Result<ApiResponse> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)).boxed())
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))
}

/// Delivers a JSON error response with the specified error code, message, and status.
pub fn deliver_error_json(error_code: &str, message: &str, status: StatusCode) -> Result<ApiResponse> {
    warn!(
        "Delivering error JSON: {} - {} ({})",
        status.as_u16(),
        error_code,
        message
    );
    deliver_serialized_json(&ErrorResponse::new(error_code, message), status)
}

/// Delivers a success JSON response with optional data.
pub fn deliver_success_json<T: Serialize>(data: Option<T>, status: StatusCode) -> Result<ApiResponse> {
    deliver_serialized_json(&SuccessResponse::new(data), status)
}

/// Turn an operation's outcome into its HTTP response.
pub fn respond<T: Serialize>(result: ServiceResult<T>, status: StatusCode) -> Result<ApiResponse> {
    match result {
        Ok(data) => deliver_success_json(Some(data), status),
        Err(e) => deliver_service_error(&e),
    }
}

/// As `respond` for operations without a payload.
pub fn respond_empty(result: ServiceResult<()>) -> Result<ApiResponse> {
    match result {
        Ok(()) => deliver_success_json::<()>(None, StatusCode::OK),
        Err(e) => deliver_service_error(&e),
    }
}

pub fn deliver_service_error(err: &ServiceError) -> Result<ApiResponse> {
    deliver_error_json(err.to_code(), err.message(), err.status())
}
