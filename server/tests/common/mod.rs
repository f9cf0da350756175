#![allow(dead_code)]

use std::path::Path;

use sqlx::SqlitePool;

use server::AppState;
use server::database::open_database;
use shared::types::server_config::AppConfig;
use shared::types::{
    CreateStoreItemRequest, CreateUserRequest, GameClaims, GrantCurrenciesRequest, StoreItemView,
    UserView,
};

pub const SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const PASSWORD: &str = "hunter22pass";

pub fn config(url: &str) -> AppConfig {
    let raw = format!(
        "[server]\nbind = \"127.0.0.1\"\n\
         [database]\nurl = \"{}\"\n\
         [auth]\njwt_secret = \"{}\"\n",
        url, SECRET
    );
    toml::from_str(&raw).unwrap()
}

/// One connection: every pooled connection to `sqlite::memory:` would be a
/// separate database otherwise.
pub async fn memory_state() -> AppState {
    memory_state_with_pool().await.0
}

/// As `memory_state`, also handing back the pool for raw SQL fixtures.
pub async fn memory_state_with_pool() -> (AppState, SqlitePool) {
    let url = "sqlite::memory:";
    let db = open_database(url, 1).await.unwrap();
    (AppState::build(config(url), db.clone()).unwrap(), db)
}

/// A file database shared by several connections, for concurrency tests.
pub async fn file_state(dir: &Path, connections: u32) -> AppState {
    let url = format!("sqlite://{}?mode=rwc", dir.join("users.db").display());
    let db = open_database(&url, connections).await.unwrap();
    AppState::build(config(&url), db).unwrap()
}

pub async fn register(state: &AppState, name: &str) -> UserView {
    state
        .users
        .create_user(&CreateUserRequest {
            name: name.to_string(),
            email: format!("{}@example.com", name),
            password: PASSWORD.to_string(),
        })
        .await
        .unwrap()
}

pub async fn fund(state: &AppState, user_id: &str, coins: i64, gems: i64) {
    state
        .users
        .grant_currencies(
            user_id,
            &GrantCurrenciesRequest {
                add_coins: coins,
                add_gems: gems,
            },
        )
        .await
        .unwrap();
}

pub async fn add_item(
    state: &AppState,
    name: &str,
    item_type: i32,
    coins: i64,
    gems: i64,
) -> StoreItemView {
    state
        .store
        .create_item(&CreateStoreItemRequest {
            name: name.to_string(),
            item_type,
            coins_price: coins,
            gems_price: gems,
            image_id: format!("img-{}", name),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn balances(state: &AppState, user: &UserView) -> (i64, i64) {
    let view = state.users.read_user(&admin(), &user.id).await.unwrap();
    (view.coins, view.gems)
}

pub fn player(user: &UserView) -> GameClaims {
    GameClaims {
        user_id: user.id.clone(),
        username: user.name.clone(),
        user_email: user.email.clone(),
        aud: "medieval".into(),
        exp: i64::MAX,
        ..Default::default()
    }
}

pub fn admin() -> GameClaims {
    GameClaims {
        user_id: "root".into(),
        is_admin: true,
        aud: "medieval".into(),
        exp: i64::MAX,
        ..Default::default()
    }
}

pub fn service() -> GameClaims {
    GameClaims {
        aud: "svc".into(),
        sub: "matchmaker".into(),
        exp: i64::MAX,
        ..Default::default()
    }
}
