use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use shared::types::{CreateStoreItemRequest, StoreItemView, UpdateStoreItemRequest};

use crate::database::possessions;
use crate::database::store_items::{self, StoreItem};
use crate::database::{generate_uuid, get_timestamp, sanitize_string};
use crate::error::{ServiceError, ServiceResult, is_unique_violation, storage};

pub const NAME_AND_TYPE_TAKEN: &str = "Item with such name and type already exists";
pub const IMAGE_ID_TAKEN: &str = "Item with such image id already exists";

/// Catalogue management plus the possession and ledger operations, which
/// live in `ledger.rs` and `equip.rs`.
#[derive(Clone, Debug)]
pub struct StoreService {
    pub(crate) db: SqlitePool,
}

impl StoreService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_item(&self, req: &CreateStoreItemRequest) -> ServiceResult<StoreItemView> {
        let name = sanitize_string(&req.name);
        let image_id = sanitize_string(&req.image_id);
        debug!("Create item '{}' (image {})", name, image_id);

        if name.is_empty() || image_id.is_empty() {
            return Err(ServiceError::invalid("Item name and image id are required"));
        }
        validate_prices(&[
            req.coins_price,
            req.gems_price,
            req.sale_coins_price,
            req.sale_gems_price,
        ])?;

        self.check_unique(&name, req.item_type, &image_id, None)
            .await?;

        let now = get_timestamp();
        let item = StoreItem {
            id: generate_uuid(),
            name,
            description: req.description.clone(),
            item_type: req.item_type,
            coins_price: req.coins_price,
            gems_price: req.gems_price,
            image_id,
            on_sale: req.on_sale,
            sale_coins_price: req.sale_coins_price,
            sale_gems_price: req.sale_gems_price,
            created_at: now,
            updated_at: now,
        };

        store_items::insert_item(&self.db, &item)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    warn!("Item '{}' raced with a concurrent create", item.name);
                    ServiceError::invalid(NAME_AND_TYPE_TAKEN)
                } else {
                    storage("Could not create new item", e)
                }
            })?;

        Ok(item.to_view())
    }

    pub async fn read_item(&self, item_id: &str) -> ServiceResult<StoreItemView> {
        debug!("Read item {}", item_id);
        self.load(item_id).await.map(|item| item.to_view())
    }

    /// Patch an item. Zero numbers and empty strings keep the stored value.
    pub async fn update_item(
        &self,
        item_id: &str,
        req: &UpdateStoreItemRequest,
    ) -> ServiceResult<StoreItemView> {
        debug!("Update item {}", item_id);
        validate_prices(&[
            req.coins_price,
            req.gems_price,
            req.sale_coins_price,
            req.sale_gems_price,
        ])?;

        let mut item = self.load(item_id).await?;
        let previous_type = item.item_type;

        let name = sanitize_string(&req.name);
        let image_id = sanitize_string(&req.image_id);

        if !name.is_empty() {
            item.name = name;
        }
        if req.item_type != 0 {
            item.item_type = req.item_type;
        }
        if !image_id.is_empty() {
            item.image_id = image_id;
        }
        if !req.description.is_empty() {
            item.description = req.description.clone();
        }
        if req.coins_price != 0 {
            item.coins_price = req.coins_price;
        }
        if req.gems_price != 0 {
            item.gems_price = req.gems_price;
        }
        if req.sale_coins_price != 0 || req.sale_gems_price != 0 {
            item.on_sale = true;
            item.sale_coins_price = req.sale_coins_price;
            item.sale_gems_price = req.sale_gems_price;
        }
        if let Some(on_sale) = req.on_sale {
            item.on_sale = on_sale;
        }

        self.check_unique(&item.name, item.item_type, &item.image_id, Some(&item.id))
            .await?;

        item.updated_at = get_timestamp();

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage("Could not update item", e))?;

        store_items::update_item(&mut *tx, &item)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::invalid(NAME_AND_TYPE_TAKEN)
                } else {
                    storage("Could not update item", e)
                }
            })?;

        // A user may hold one equipped item per type: whoever already wears
        // something of the new type loses this item from their equipment.
        if item.item_type != previous_type {
            let unequipped = possessions::unequip_conflicting(&mut *tx, &item.id, item.item_type)
                .await
                .map_err(|e| storage("Could not update item", e))?;
            if unequipped > 0 {
                info!(
                    "Item {} moved to type {}: un-equipped for {} users",
                    item.id, item.item_type, unequipped
                );
            }
        }

        tx.commit()
            .await
            .map_err(|e| storage("Could not update item", e))?;

        info!("Store item updated! {}", item.id);
        Ok(item.to_view())
    }

    /// Deleting an unknown item is not an error.
    pub async fn delete_item(&self, item_id: &str) -> ServiceResult<()> {
        debug!("Delete item {}", item_id);
        store_items::delete_item(&self.db, item_id)
            .await
            .map_err(|e| storage("Could not delete item", e))?;
        Ok(())
    }

    pub async fn list_items(&self) -> ServiceResult<Vec<StoreItemView>> {
        let items = store_items::list_items(&self.db)
            .await
            .map_err(|e| storage("Could not list items", e))?;
        Ok(items.iter().map(StoreItem::to_view).collect())
    }

    pub(crate) async fn load(&self, item_id: &str) -> ServiceResult<StoreItem> {
        store_items::get_item_by_id(&self.db, item_id)
            .await
            .map_err(|e| storage("Could not read item", e))?
            .ok_or_else(|| {
                warn!("Item {} not found", item_id);
                ServiceError::not_found("Item not found")
            })
    }

    async fn check_unique(
        &self,
        name: &str,
        item_type: i32,
        image_id: &str,
        except_id: Option<&str>,
    ) -> ServiceResult<()> {
        if store_items::name_and_type_taken(&self.db, name, item_type, except_id)
            .await
            .map_err(|e| storage("Could not check item uniqueness", e))?
        {
            warn!("{}: '{}' type {}", NAME_AND_TYPE_TAKEN, name, item_type);
            return Err(ServiceError::invalid(NAME_AND_TYPE_TAKEN));
        }

        if store_items::image_id_taken(&self.db, image_id, except_id)
            .await
            .map_err(|e| storage("Could not check item uniqueness", e))?
        {
            warn!("{}: '{}'", IMAGE_ID_TAKEN, image_id);
            return Err(ServiceError::invalid(IMAGE_ID_TAKEN));
        }

        Ok(())
    }
}

fn validate_prices(prices: &[i64]) -> ServiceResult<()> {
    if prices.iter().any(|p| *p < 0) {
        return Err(ServiceError::invalid("Prices must not be negative"));
    }
    Ok(())
}
