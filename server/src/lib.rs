pub mod auth;
pub mod database;
pub mod error;
pub mod handlers;
pub mod services;
pub mod tower_middle;

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use shared::config::LiveConfig;
use shared::types::server_config::AppConfig;

use crate::auth::{ClaimsDecoder, TokenIssuer};
use crate::services::{NewsService, StatsService, StoreService, UsersService};

/// Crate version reported by `UsersService/GetVersion`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a request handler needs. Cheap to clone: every field is a
/// pool handle or an `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: LiveConfig,
    pub decoder: Arc<ClaimsDecoder>,
    pub users: UsersService,
    pub store: StoreService,
    pub stats: StatsService,
    pub news: NewsService,
}

impl AppState {
    /// Wire the services to one pool and one token secret.
    pub fn build(config: AppConfig, db: SqlitePool) -> Result<Self> {
        let secret = config
            .auth
            .resolved_jwt_secret()
            .context("No JWT secret configured: set auth.jwt_secret or JWT_SECRET")?;

        let decoder = Arc::new(ClaimsDecoder::new(config.auth.verify_signature, &secret));
        let live = LiveConfig::new(config);

        Ok(Self {
            users: UsersService::new(db.clone(), live.clone(), TokenIssuer::new(secret)),
            store: StoreService::new(db.clone()),
            stats: StatsService::new(db.clone()),
            news: NewsService::new(db),
            decoder,
            config: live,
        })
    }
}
