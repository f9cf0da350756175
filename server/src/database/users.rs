use sqlx::{Executor, Sqlite};
use tracing::info;

use shared::types::{Balances, UserView};

/// A full `users` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub coins: i64,
    pub gems: i64,
    pub is_admin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    pub fn balances(&self) -> Balances {
        Balances {
            coins: self.coins,
            gems: self.gems,
        }
    }

    pub fn to_view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            coins: self.coins,
            gems: self.gems,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

const USER_COLUMNS: &str =
    "id, name, email, password, coins, gems, is_admin, created_at, updated_at";

/// Insert a user with empty balances.
pub async fn insert_user<'e, E>(executor: E, new_user: &NewUser) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO users (id, name, email, password, coins, gems, is_admin, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?5)",
    )
    .bind(&new_user.id)
    .bind(&new_user.name)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.created_at)
    .execute(executor)
    .await?;
    info!("New user made! {}", new_user.name);
    Ok(())
}

/// Get user by ID
pub async fn get_user_by_id<'e, E>(executor: E, user_id: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Get user by name
pub async fn get_user_by_name<'e, E>(executor: E, name: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE name = ?1", USER_COLUMNS))
        .bind(name)
        .fetch_optional(executor)
        .await
}

/// Resolve a user from an id, a name or an email, tried in that order.
pub async fn find_user_by_identifier<'e, E>(
    executor: E,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users
         WHERE id = ?1 OR name = ?1 OR email = ?1
         ORDER BY CASE WHEN id = ?1 THEN 0 WHEN name = ?1 THEN 1 ELSE 2 END
         LIMIT 1",
        USER_COLUMNS
    ))
    .bind(identifier)
    .fetch_optional(executor)
    .await
}

/// Check if name exists
pub async fn name_exists<'e, E>(executor: E, name: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE name = ?1")
        .bind(name)
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}

/// Check if email exists
pub async fn email_exists<'e, E>(executor: E, email: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
        .bind(email)
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}

/// Take the SQLite write lock on behalf of the user's row.
///
/// Must be the first statement of the transaction: every read after it sees
/// the latest committed balances and no other writer can interleave until
/// commit or rollback. Returns the number of matching rows (0 or 1).
pub async fn lock_user<'e, E>(executor: E, user_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE users SET coins = coins WHERE id = ?1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Overwrite both balances. Callers hold the user lock.
pub async fn set_balances<'e, E>(
    executor: E,
    user_id: &str,
    balances: Balances,
    now: i64,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE users SET coins = ?2, gems = ?3, updated_at = ?4 WHERE id = ?1")
        .bind(user_id)
        .bind(balances.coins)
        .bind(balances.gems)
        .bind(now)
        .execute(executor)
        .await?;
    Ok(())
}

/// Delete a user. Possessions and stats go with it.
pub async fn delete_user<'e, E>(executor: E, user_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM users WHERE id = ?1")
        .bind(user_id)
        .execute(executor)
        .await?;
    if result.rows_affected() > 0 {
        info!("User deleted! {}", user_id);
    }
    Ok(result.rows_affected())
}

/// Promote a user to admin.
pub async fn promote_user<'e, E>(executor: E, user_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?1")
        .bind(user_id)
        .execute(executor)
        .await?;
    info!("User promoted! {}", user_id);
    Ok(result.rows_affected())
}
