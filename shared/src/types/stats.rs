use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatsView {
    pub username: String,
    pub games: i64,
    pub wins: i64,
    pub top5: i64,
    pub kills: i64,
}

/// Body of `POST /v1/stats/:username`. Deltas are added to the stored totals.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateStatsRequest {
    #[serde(default)]
    pub add_kills: i64,
    #[serde(default)]
    pub add_games: i64,
    #[serde(default)]
    pub add_top5: i64,
    #[serde(default)]
    pub add_wins: i64,
}
