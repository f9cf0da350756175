use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use shared::types::GameClaims;

use crate::AppState;
use crate::auth::guard::INVALID_TOKEN;
use crate::auth::{ClaimsDecoder, Operation, check_call};
use crate::database::get_timestamp;
use crate::error::{ServiceError, ServiceResult};
use crate::handlers::http::utils::*;
use crate::handlers::http::{items, news, stats, users};

// ---------------------------------------------------------------------------
// Handler type aliases
// ---------------------------------------------------------------------------
//
// Two tiers:
//
//   OpenHandler     no token. Receives (req, state).
//                   Use for: register, login, health.
//
//   GuardedHandler  bearer token decoded into claims and checked against the
//                   route's `Operation` (expiry, high-privilege list) before
//                   the handler runs. Receives (req, state, claims, params).

type HandlerFuture = Pin<Box<dyn Future<Output = Result<ApiResponse>> + Send>>;

type OpenHandler = Box<dyn Fn(Request<Bytes>, AppState) -> HandlerFuture + Send + Sync>;

type GuardedHandler =
    Box<dyn Fn(Request<Bytes>, AppState, GameClaims, PathParams) -> HandlerFuture + Send + Sync>;

enum RouteKind {
    Open(OpenHandler),
    Guarded(Operation, GuardedHandler),
}

struct Route {
    method: Method,
    path: String,
    kind: RouteKind,
}

/// Values captured by `:name` segments of a route path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn require(&self, name: &str) -> ServiceResult<&str> {
        self.get(name)
            .ok_or_else(|| ServiceError::InvalidArgument(format!("Missing path parameter {}", name)))
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    fn open<F, Fut>(mut self, method: Method, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Open(Box::new(move |req, state| Box::pin(handler(req, state)))),
        });
        self
    }

    fn guarded<F, Fut>(mut self, method: Method, path: &str, operation: Operation, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, GameClaims, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            kind: RouteKind::Guarded(
                operation,
                Box::new(move |req, state, claims, params| {
                    Box::pin(handler(req, state, claims, params))
                }),
            ),
        });
        self
    }

    // ── Open (no token) ───────────────────────────────────────────────────────

    pub fn get<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.open(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.open(Method::POST, path, handler)
    }

    // ── Guarded (token + operation check) ────────────────────────────────────

    pub fn get_guarded<F, Fut>(self, path: &str, operation: Operation, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, GameClaims, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.guarded(Method::GET, path, operation, handler)
    }

    pub fn post_guarded<F, Fut>(self, path: &str, operation: Operation, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, GameClaims, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.guarded(Method::POST, path, operation, handler)
    }

    pub fn put_guarded<F, Fut>(self, path: &str, operation: Operation, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, GameClaims, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.guarded(Method::PUT, path, operation, handler)
    }

    pub fn delete_guarded<F, Fut>(self, path: &str, operation: Operation, handler: F) -> Self
    where
        F: Fn(Request<Bytes>, AppState, GameClaims, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ApiResponse>> + Send + 'static,
    {
        self.guarded(Method::DELETE, path, operation, handler)
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Entry point for the connection loop. Never fails: handler errors
    /// become a 500 JSON body, and every response gets no-cache headers.
    pub async fn handle<B>(&self, req: Request<B>, state: AppState) -> Result<ApiResponse, Infallible>
    where
        B: Body<Data = Bytes>,
        B::Error: Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = match self.route(req, state).await {
            Ok(response) => response,
            Err(e) => {
                error!("{} {} failed: {:#}", method, path, e);
                internal_error()
            }
        };
        Ok(add_no_cache_headers(response))
    }

    pub async fn route<B>(&self, req: Request<B>, state: AppState) -> Result<ApiResponse>
    where
        B: Body<Data = Bytes>,
        B::Error: Display,
    {
        let (parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!("Failed to read body of {} {}: {}", parts.method, parts.uri, e);
                return deliver_error_json(
                    "INVALID_ARGUMENT",
                    "Could not read request body",
                    StatusCode::BAD_REQUEST,
                );
            }
        };
        let req = Request::from_parts(parts, body);

        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!("{} {}", method, path);

        for route in &self.routes {
            if route.method != method {
                continue;
            }
            let Some(params) = Self::match_path(&route.path, &path) else {
                continue;
            };

            return match &route.kind {
                RouteKind::Open(h) => h(req, state).await,

                RouteKind::Guarded(operation, h) => {
                    match authenticate(req.headers(), &state.decoder, *operation, get_timestamp()) {
                        Ok(claims) => h(req, state, claims, params).await,
                        Err(e) => {
                            warn!("{} {} rejected for {}: {}", method, path, operation, e);
                            deliver_service_error(&e)
                        }
                    }
                }
            };
        }

        deliver_error_json("NOT_FOUND", "Endpoint not found", StatusCode::NOT_FOUND)
    }

    // ── Path matching ─────────────────────────────────────────────────────────

    pub fn path_matches(route_path: &str, request_path: &str) -> bool {
        Self::match_path(route_path, request_path).is_some()
    }

    /// Segment-by-segment match where `:name` captures one non-empty segment.
    /// e.g. "/v1/users/:id" matches "/v1/users/42" with `id = "42"`.
    pub fn match_path(route_path: &str, request_path: &str) -> Option<PathParams> {
        // Strip query string from incoming request path before comparing.
        let clean = request_path.split('?').next().unwrap_or(request_path);

        let route_segs: Vec<&str> = route_path.split('/').collect();
        let path_segs: Vec<&str> = clean.split('/').collect();

        if route_segs.len() != path_segs.len() {
            return None;
        }

        let mut params = Vec::new();
        for (r, p) in route_segs.iter().zip(path_segs.iter()) {
            match r.strip_prefix(':') {
                Some(name) if !p.is_empty() => params.push((name.to_string(), p.to_string())),
                Some(_) => return None,
                None if r == p => {}
                None => return None,
            }
        }
        Some(PathParams(params))
    }
}

/// Bearer credential → claims → call-level guard for `operation`.
pub fn authenticate(
    headers: &HeaderMap,
    decoder: &ClaimsDecoder,
    operation: Operation,
    now: i64,
) -> ServiceResult<GameClaims> {
    let token = extract_bearer_credential(headers)
        .ok_or_else(|| ServiceError::Unauthenticated(INVALID_TOKEN.to_string()))?;

    let claims = decoder.decode(&token).map_err(|e| {
        warn!("Could not decode claims for {}: {}", operation, e);
        ServiceError::Unauthenticated(INVALID_TOKEN.to_string())
    })?;

    check_call(operation, &claims, now)?;
    Ok(claims)
}

fn internal_error() -> ApiResponse {
    deliver_error_json(
        "INTERNAL",
        "Internal server error",
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .unwrap_or_else(|_| {
        let mut res = Response::new(Full::new(Bytes::from_static(b"Internal server error")).boxed());
        *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        res
    })
}

// ---------------------------------------------------------------------------
// API router
//
// The token check runs here at the routing level; handlers receive the
// decoded claims and apply only the subject-level policy of their operation.
// Literal segments are registered before `:param` siblings.
// ---------------------------------------------------------------------------

pub fn build_api_router() -> Router {
    Router::new()
        // ── Public ───────────────────────────────────────────────────────────
        .get("/health", |_req, _state| async move {
            deliver_serialized_json(
                &serde_json::json!({ "status": "success", "health": "ok" }),
                StatusCode::OK,
            )
        })
        .post("/v1/users", users::handle_create)
        .post("/v1/users/login", users::handle_login)
        // ── Users ────────────────────────────────────────────────────────────
        .get_guarded("/v1/users", Operation::ListUsers, users::handle_list)
        .get_guarded("/v1/users/:id", Operation::ReadUser, users::handle_read)
        .put_guarded("/v1/users/:id", Operation::UpdateUser, users::handle_update)
        .delete_guarded("/v1/users/:id", Operation::DeleteUser, users::handle_delete)
        .post_guarded(
            "/v1/users/:id/currencies",
            Operation::GrantCurrencies,
            users::handle_grant_currencies,
        )
        .get_guarded("/v1/version", Operation::GetVersion, users::handle_version)
        // ── Possessions ──────────────────────────────────────────────────────
        .get_guarded(
            "/v1/users/:id/items",
            Operation::GetUserItemsIds,
            items::handle_user_items,
        )
        .get_guarded(
            "/v1/users/:id/items/equipped",
            Operation::GetEquippedUserItemsIds,
            items::handle_equipped_user_items,
        )
        .post_guarded(
            "/v1/users/:id/items/:item_id/buy",
            Operation::BuyByUser,
            items::handle_buy,
        )
        .post_guarded(
            "/v1/users/:id/items/:item_id/equip",
            Operation::EquipByUser,
            items::handle_equip,
        )
        .delete_guarded(
            "/v1/users/:id/items/:item_id",
            Operation::ThrowAwayByUser,
            items::handle_throw_away,
        )
        // ── Catalogue ────────────────────────────────────────────────────────
        .get_guarded("/v1/items", Operation::ListItems, items::handle_list)
        .post_guarded("/v1/items", Operation::CreateItem, items::handle_create)
        .get_guarded("/v1/items/:id", Operation::ReadItem, items::handle_read)
        .put_guarded("/v1/items/:id", Operation::UpdateItem, items::handle_update)
        .delete_guarded("/v1/items/:id", Operation::DeleteItem, items::handle_delete)
        // ── Stats ────────────────────────────────────────────────────────────
        .get_guarded("/v1/stats/:username", Operation::GetStats, stats::handle_get)
        .post_guarded(
            "/v1/stats/:username",
            Operation::UpdateStats,
            stats::handle_update,
        )
        // ── News ─────────────────────────────────────────────────────────────
        .get_guarded("/v1/news", Operation::ListNews, news::handle_list)
        .post_guarded("/v1/news", Operation::CreateNews, news::handle_create)
        .get_guarded("/v1/news/:id", Operation::ReadNews, news::handle_read)
        .put_guarded("/v1/news/:id", Operation::UpdateNews, news::handle_update)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
