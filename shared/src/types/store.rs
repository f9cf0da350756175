use serde::{Deserialize, Serialize};

/// A catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreItemView {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
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

/// Body of `POST /v1/items`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateStoreItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: i32,
    #[serde(default)]
    pub coins_price: i64,
    #[serde(default)]
    pub gems_price: i64,
    pub image_id: String,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub sale_coins_price: i64,
    #[serde(default)]
    pub sale_gems_price: i64,
}

/// Body of `PUT /v1/items/:id`.
///
/// Zero numbers and empty strings leave the stored value untouched. A
/// non-zero sale price starts a sale; `on_sale` set explicitly wins over that.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateStoreItemRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "type")]
    pub item_type: i32,
    #[serde(default)]
    pub coins_price: i64,
    #[serde(default)]
    pub gems_price: i64,
    #[serde(default)]
    pub image_id: String,
    #[serde(default)]
    pub sale_coins_price: i64,
    #[serde(default)]
    pub sale_gems_price: i64,
    #[serde(default)]
    pub on_sale: Option<bool>,
}

/// One possession of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserItemInfo {
    pub item_id: String,
    pub equipped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserItemsResponse {
    pub items: Vec<UserItemInfo>,
}
