use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_link: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreateNewsRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_link: String,
}

/// Empty fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateNewsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_link: String,
}
