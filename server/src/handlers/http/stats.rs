use anyhow::Result;
use bytes::Bytes;
use hyper::{Request, StatusCode};

use shared::types::{GameClaims, UpdateStatsRequest};

use crate::AppState;
use crate::handlers::http::routes::PathParams;
use crate::handlers::http::utils::*;

pub async fn handle_get(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("username") {
        Ok(username) => state.stats.get_stats(username).await,
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
    let delta = match parse_json::<UpdateStatsRequest>(&req) {
        Ok(delta) => delta,
        Err(e) => return deliver_service_error(&e),
    };
    let result = match params.require("username") {
        Ok(username) => state.stats.update_stats(username, &delta).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}
