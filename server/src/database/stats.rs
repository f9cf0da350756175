use sqlx::{Executor, Sqlite};

use shared::types::{UpdateStatsRequest, UserStatsView};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserStats {
    pub user_id: String,
    pub username: String,
    pub games: i64,
    pub wins: i64,
    pub top5: i64,
    pub kills: i64,
}

impl UserStats {
    pub fn to_view(&self) -> UserStatsView {
        UserStatsView {
            username: self.username.clone(),
            games: self.games,
            wins: self.wins,
            top5: self.top5,
            kills: self.kills,
        }
    }
}

/// Create the zeroed stats row that accompanies every user.
pub async fn insert_stats<'e, E>(executor: E, user_id: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("INSERT INTO user_stats (user_id, games, wins, top5, kills) VALUES (?1, 0, 0, 0, 0)")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Every stats row attached to the named user. Exactly one is expected.
pub async fn stats_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Vec<UserStats>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, UserStats>(
        "SELECT s.user_id, u.name AS username, s.games, s.wins, s.top5, s.kills
         FROM user_stats s
         JOIN users u ON u.id = s.user_id
         WHERE u.name = ?1",
    )
    .bind(username)
    .fetch_all(executor)
    .await
}

/// Add the deltas to the user's totals.
pub async fn add_stats<'e, E>(
    executor: E,
    user_id: &str,
    delta: &UpdateStatsRequest,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE user_stats
         SET kills = kills + ?2, games = games + ?3, top5 = top5 + ?4, wins = wins + ?5
         WHERE user_id = ?1",
    )
    .bind(user_id)
    .bind(delta.add_kills)
    .bind(delta.add_games)
    .bind(delta.add_top5)
    .bind(delta.add_wins)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
