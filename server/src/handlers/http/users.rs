use anyhow::Result;
use bytes::Bytes;
use hyper::{Request, StatusCode};
use tracing::info;

use shared::types::{
    CreateUserRequest, GameClaims, GrantCurrenciesRequest, LoginData, VersionResponse,
};

use crate::AppState;
use crate::handlers::http::routes::PathParams;
use crate::handlers::http::utils::*;

/// POST /v1/users
pub async fn handle_create(req: Request<Bytes>, state: AppState) -> Result<ApiResponse> {
    let result = match parse_json::<CreateUserRequest>(&req) {
        Ok(data) => state.users.create_user(&data).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::CREATED)
}

/// POST /v1/users/login
pub async fn handle_login(req: Request<Bytes>, state: AppState) -> Result<ApiResponse> {
    let result = match parse_json::<LoginData>(&req) {
        Ok(data) => state.users.login(&data).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_list(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    _params: PathParams,
) -> Result<ApiResponse> {
    respond(state.users.list_users().await, StatusCode::OK)
}

pub async fn handle_read(
    _req: Request<Bytes>,
    state: AppState,
    claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("id") {
        Ok(id) => state.users.read_user(&claims, id).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_update(
    _req: Request<Bytes>,
    state: AppState,
    _claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("id") {
        Ok(id) => state.users.update_user(id).await,
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_delete(
    _req: Request<Bytes>,
    state: AppState,
    claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let result = match params.require("id") {
        Ok(id) => state.users.delete_user(&claims, id).await,
        Err(e) => Err(e),
    };
    respond_empty(result)
}

/// POST /v1/users/:id/currencies. `:id` may be an id, a name or an email.
pub async fn handle_grant_currencies(
    req: Request<Bytes>,
    state: AppState,
    claims: GameClaims,
    params: PathParams,
) -> Result<ApiResponse> {
    let grant = match parse_json::<GrantCurrenciesRequest>(&req) {
        Ok(grant) => grant,
        Err(e) => return deliver_service_error(&e),
    };
    let result = match params.require("id") {
        Ok(id) => {
            info!(
                "GrantCurrencies on '{}' requested by '{}' (aud {})",
                id, claims.user_id, claims.aud
            );
            state.users.grant_currencies(id, &grant).await
        }
        Err(e) => Err(e),
    };
    respond(result, StatusCode::OK)
}

pub async fn handle_version(
    _req: Request<Bytes>,
    _state: AppState,
    _claims: GameClaims,
    _params: PathParams,
) -> Result<ApiResponse> {
    deliver_success_json(
        Some(VersionResponse {
            version: crate::VERSION.to_string(),
        }),
        StatusCode::OK,
    )
}
