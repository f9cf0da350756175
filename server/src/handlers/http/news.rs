use anyhow::Result;
use bytes::Bytes;
use hyper::{Request, StatusCode};

use shared::types::{CreateNewsRequest, GameClaims, UpdateNewsRequest};

use crate::AppState;
use crate::handlers::http::routes::PathParams;
use crate::handlers::http::utils::*;

pub async fn handle_list(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    _params: PathParams,
) -> Result<ApiResponse> {
    respond(state.news.list_news().await, StatusCode::OK)
}

pub async fn handle_create(
    req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    _params: PathParams,
) -> Result<ApiResponse> {
    let result = match parse_json::<CreateNewsRequest>(&req) {
        Ok(data) => state.news.create_news(&data).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::CREATED)
}

pub async fn handle_read(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("id") {
        Ok(id) => state.news.read_news(id).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_update(
    req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let data = match parse_json::<UpdateNewsRequest>(&req) {
        Ok(data) => data,
        Err(e) => return deliver_service_error(&e),
    };
    let result = match params.require("id") {
        Ok(id) => state.news.update_news(id, &data).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}
