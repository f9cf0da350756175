use sqlx::{Executor, Sqlite};
use tracing::info;

use shared::types::{Balances, StoreItemView};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub item_type: i32,
    pub coins_price: i64,
    pub gems_price: i64,
    pub image_id: String,
    pub on_sale: bool,
    pub sale_coins_price: i64,
    pub sale_gems_price: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl StoreItem {
    /// The price a purchase is charged right now: the sale pair while the
    /// item is on sale, the base pair otherwise.
    pub fn active_price(&self) -> Balances {
        if self.on_sale {
            Balances {
                coins: self.sale_coins_price,
                gems: self.sale_gems_price,
            }
        } else {
            Balances {
                coins: self.coins_price,
                gems: self.gems_price,
            }
        }
    }

    pub fn to_view(&self) -> StoreItemView {
        StoreItemView {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            item_type: self.item_type,
            coins_price: self.coins_price,
            gems_price: self.gems_price,
            image_id: self.image_id.clone(),
            on_sale: self.on_sale,
            sale_coins_price: self.sale_coins_price,
            sale_gems_price: self.sale_gems_price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const ITEM_COLUMNS: &str = "id, name, description, item_type, coins_price, gems_price, image_id, \
     on_sale, sale_coins_price, sale_gems_price, created_at, updated_at";

pub async fn insert_item<'e, E>(executor: E, item: &StoreItem) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO store_items (id, name, description, item_type, coins_price, gems_price,
                                  image_id, on_sale, sale_coins_price, sale_gems_price,
                                  created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )
    .bind(&item.id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.item_type)
    .bind(item.coins_price)
    .bind(item.gems_price)
    .bind(&item.image_id)
    .bind(item.on_sale)
    .bind(item.sale_coins_price)
    .bind(item.sale_gems_price)
    .bind(item.created_at)
    .bind(item.updated_at)
    .execute(executor)
    .await?;
    info!("Store item created! {} ({})", item.name, item.id);
    Ok(())
}

/// Rewrite every mutable column of an existing item.
pub async fn update_item<'e, E>(executor: E, item: &StoreItem) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE store_items
         SET name = ?2, description = ?3, item_type = ?4, coins_price = ?5, gems_price = ?6,
             image_id = ?7, on_sale = ?8, sale_coins_price = ?9, sale_gems_price = ?10,
             updated_at = ?11
         WHERE id = ?1",
    )
    .bind(&item.id)
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.item_type)
    .bind(item.coins_price)
    .bind(item.gems_price)
    .bind(&item.image_id)
    .bind(item.on_sale)
    .bind(item.sale_coins_price)
    .bind(item.sale_gems_price)
    .bind(item.updated_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn get_item_by_id<'e, E>(executor: E, item_id: &str) -> Result<Option<StoreItem>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, StoreItem>(&format!(
        "SELECT {} FROM store_items WHERE id = ?1",
        ITEM_COLUMNS
    ))
    .bind(item_id)
    .fetch_optional(executor)
    .await
}

pub async fn list_items<'e, E>(executor: E) -> Result<Vec<StoreItem>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, StoreItem>(&format!(
        "SELECT {} FROM store_items ORDER BY name, item_type",
        ITEM_COLUMNS
    ))
    .fetch_all(executor)
    .await
}

/// Whether another item already uses this (name, type) pair.
pub async fn name_and_type_taken<'e, E>(
    executor: E,
    name: &str,
    item_type: i32,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM store_items WHERE name = ?1 AND item_type = ?2 AND id != ?3",
    )
    .bind(name)
    .bind(item_type)
    .bind(except_id.unwrap_or(""))
    .fetch_one(executor)
    .await?;
    Ok(count > 0)
}

/// Whether another item already uses this image.
pub async fn image_id_taken<'e, E>(
    executor: E,
    image_id: &str,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM store_items WHERE image_id = ?1 AND id != ?2")
            .bind(image_id)
            .bind(except_id.unwrap_or(""))
            .fetch_one(executor)
            .await?;
    Ok(count > 0)
}

pub async fn delete_item<'e, E>(executor: E, item_id: &str) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM store_items WHERE id = ?1")
        .bind(item_id)
        .execute(executor)
        .await?;
    if result.rows_affected() > 0 {
        info!("Store item deleted! {}", item_id);
    }
    Ok(result.rows_affected())
}
