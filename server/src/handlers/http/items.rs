use anyhow::Result;
use bytes::Bytes;
use hyper::{Request, StatusCode};

use shared::types::{
    CreateStoreItemRequest, GameClaims, UpdateStoreItemRequest, UserItemsResponse,
};

use crate::AppState;
use crate::error::ServiceResult;
use crate::handlers::http::routes::PathParams;
use crate::handlers::http::utils::*;

/// The `:id` and `:item_id` segments of a possession route.
fn user_and_item(params: &PathParams) -> ServiceResult<(&str, &str)> {
    Ok((params.require("id")?, params.require("item_id")?))
}

// ── Catalogue ─────────────────────────────────────────────────────────────────

pub async fn handle_list(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    _params: PathParams,
) -> Result<ApiResponse> {
    respond(state.store.list_items().await, StatusCode::OK)
}

pub async fn handle_create(
    req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    _params: PathParams,
) -> Result<ApiResponse> {
    let result = match parse_json::<CreateStoreItemRequest>(&req) {
        Ok(data) => state.store.create_item(&data).await,
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
        Ok(id) => state.store.read_item(id).await,
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
    let data = match parse_json::<UpdateStoreItemRequest>(&req) {
        Ok(data) => data,
        Err(e) => return deliver_service_error(&e),
    };
    let result = match params.require("id") {
        Ok(id) => state.store.update_item(id, &data).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_delete(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("id") {
        Ok(id) => state.store.delete_item(id).await,
        Err(e) => Err(e),
    };
    respond_empty(result)
}

// ── Possessions ───────────────────────────────────────────────────────────────

/// POST /v1/users/:id/items/:item_id/buy. Returns the balances left.
pub async fn handle_buy(
    _req: Request<Bytes>,
    state: AppState,
    claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match user_and_item(&params) {
        Ok((user_id, item_id)) => state.store.buy_by_user(&claims, user_id, item_id).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_equip(
    _req: Request<Bytes>,
    state: AppState,
    claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match user_and_item(&params) {
        Ok((user_id, item_id)) => state.store.equip_by_user(&claims, user_id, item_id).await,
        Err(e) => Err(e),
    };
    respond_empty(result)
}

/// DELETE /v1/users/:id/items/:item_id. Returns the balances after refund.
pub async fn handle_throw_away(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match user_and_item(&params) {
        Ok((user_id, item_id)) => state.store.throw_away_by_user(user_id, item_id).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_user_items(
    _req: Request<Bytes>,
    state: AppState,
    claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("id") {
        Ok(user_id) => state.store.get_user_items_ids(&claims, user_id).await,
        Err(e) => Err(e),
    };
    respond(result.map(|items| UserItemsResponse { items }), StatusCode::OK)
}

pub async fn handle_equipped_user_items(
    _req: Request<Bytes>,
    state: AppState,
    claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("id") {
        Ok(user_id) => state.store.get_equipped_user_items_ids(&claims, user_id).await,
        Err(e) => Err(e),
    };
    respond(result.map(|items| UserItemsResponse { items }), StatusCode::OK)
}
