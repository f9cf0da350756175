use sqlx::SqlitePool;
use tracing::{debug, error, info};

use shared::types::{UpdateStatsRequest, UserStatsView};

use crate::database::stats::{self, UserStats};
use crate::database::users;
use crate::error::{ServiceError, ServiceResult, storage};

pub const PROFILE_CORRUPTED: &str = "Profile is corrupted. Contact support.";

#[derive(Clone, Debug)]
pub struct StatsService {
    db: SqlitePool,
}

impl StatsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn get_stats(&self, username: &str) -> ServiceResult<UserStatsView> {
        debug!("Read user stats for '{}'", username);
        let mut conn = self
            .db
            .acquire()
            .await
            .map_err(|e| storage("Could not fetch user stats", e))?;
        load(&mut conn, username).await.map(|s| s.to_view())
    }

    /// Add non-negative deltas to the user's totals.
    pub async fn update_stats(
        &self,
        username: &str,
        delta: &UpdateStatsRequest,
    ) -> ServiceResult<UserStatsView> {
        debug!("Update user stats for '{}': {:?}", username, delta);

        if [delta.add_kills, delta.add_games, delta.add_top5, delta.add_wins]
            .iter()
            .any(|d| *d < 0)
        {
            return Err(ServiceError::invalid("Stats deltas must not be negative"));
        }

        let current = {
            let mut conn = self
                .db
                .acquire()
                .await
                .map_err(|e| storage("Could not update user stats", e))?;
            load(&mut conn, username).await?
        };

        // The additive UPDATE is the first statement, so it takes the write
        // lock before anything is read back.
        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage("Could not update user stats", e))?;

        stats::add_stats(&mut *tx, &current.user_id, delta)
            .await
            .map_err(|e| storage("Could not update user stats", e))?;

        let updated = load(&mut tx, username).await?;

        tx.commit()
            .await
            .map_err(|e| storage("Could not update user stats", e))?;

        info!("Stats of {} updated", updated.user_id);
        Ok(updated.to_view())
    }
}

/// The single stats row of `username`.
async fn load(conn: &mut sqlx::SqliteConnection, username: &str) -> ServiceResult<UserStats> {
    if users::get_user_by_name(&mut *conn, username)
        .await
        .map_err(|e| storage("Could not fetch user stats", e))?
        .is_none()
    {
        return Err(ServiceError::not_found("User not found"));
    }

    let mut rows = stats::stats_by_username(&mut *conn, username)
        .await
        .map_err(|e| storage("Could not fetch user stats", e))?;

    if rows.len() != 1 {
        error!(
            "Corrupted user '{}' - has {} stats rows instead of 1",
            username,
            rows.len()
        );
        return Err(ServiceError::Internal(PROFILE_CORRUPTED.into()));
    }
    Ok(rows.remove(0))
}
