use serde::{Deserialize, Serialize};

/// Body of `POST /v1/users`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateUserRequest {
    #[serde(alias = "username")]
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A user as returned to callers. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub coins: i64,
    pub gems: i64,
    pub is_admin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Body of `POST /v1/users/:id/currencies`. Both deltas default to zero.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GrantCurrenciesRequest {
    #[serde(default)]
    pub add_coins: i64,
    #[serde(default)]
    pub add_gems: i64,
}

/// Balances after a ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub coins: i64,
    pub gems: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}
