use sqlx::{Executor, Sqlite};

use shared::types::UserItemInfo;

#[derive(Debug, Clone, sqlx::FromRow)]
struct PossessionRow {
    store_item_id: String,
    equipped: bool,
}

impl From<PossessionRow> for UserItemInfo {
    fn from(row: PossessionRow) -> Self {
        UserItemInfo {
            item_id: row.store_item_id,
            equipped: row.equipped,
        }
    }
}

/// Record that the user owns the item. Owning it already is not an error
/// and leaves the existing row (and its equip flag) untouched.
pub async fn insert_possession<'e, E>(
    executor: E,
    user_id: &str,
    item_id: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO users_store_items (user_id, store_item_id, equipped)
         VALUES (?1, ?2, 0)
         ON CONFLICT(user_id, store_item_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(item_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn delete_possession<'e, E>(
    executor: E,
    user_id: &str,
    item_id: &str,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result =
        sqlx::query("DELETE FROM users_store_items WHERE user_id = ?1 AND store_item_id = ?2")
            .bind(user_id)
            .bind(item_id)
            .execute(executor)
            .await?;
    Ok(result.rows_affected())
}

pub async fn list_user_items<'e, E>(
    executor: E,
    user_id: &str,
    equipped_only: bool,
) -> Result<Vec<UserItemInfo>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, PossessionRow>(
        "SELECT store_item_id, equipped FROM users_store_items
         WHERE user_id = ?1 AND (?2 = 0 OR equipped = 1)
         ORDER BY store_item_id",
    )
    .bind(user_id)
    .bind(equipped_only)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(UserItemInfo::from).collect())
}

/// Ids of the user's equipped items of one type. At most one by invariant.
pub async fn equipped_of_type<'e, E>(
    executor: E,
    user_id: &str,
    item_type: i32,
) -> Result<Vec<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(
        "SELECT usi.store_item_id
         FROM users_store_items usi
         JOIN store_items si ON si.id = usi.store_item_id
         WHERE si.item_type = ?1 AND usi.user_id = ?2 AND usi.equipped = 1
         ORDER BY usi.store_item_id",
    )
    .bind(item_type)
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Take the SQLite write lock on behalf of the user's possessions of one
/// type. Must open the transaction, like `users::lock_user`.
pub async fn lock_possessions_of_type<'e, E>(
    executor: E,
    user_id: &str,
    item_type: i32,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE users_store_items SET equipped = equipped
         WHERE user_id = ?1
           AND store_item_id IN (SELECT id FROM store_items WHERE item_type = ?2)",
    )
    .bind(user_id)
    .bind(item_type)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn set_equipped<'e, E>(
    executor: E,
    user_id: &str,
    item_id: &str,
    equipped: bool,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE users_store_items SET equipped = ?3 WHERE user_id = ?1 AND store_item_id = ?2",
    )
    .bind(user_id)
    .bind(item_id)
    .bind(equipped)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Un-equip `item_id` for every user who has another item of `item_type`
/// equipped. Run when an item moves to a new type.
pub async fn unequip_conflicting<'e, E>(
    executor: E,
    item_id: &str,
    item_type: i32,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE users_store_items SET equipped = 0
         WHERE store_item_id = ?1 AND equipped = 1
           AND user_id IN (
               SELECT usi.user_id
               FROM users_store_items usi
               JOIN store_items si ON si.id = usi.store_item_id
               WHERE si.item_type = ?2 AND usi.store_item_id <> ?1 AND usi.equipped = 1
           )",
    )
    .bind(item_id)
    .bind(item_type)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
