use sqlx::{Executor, Sqlite};
use tracing::info;

use shared::types::NewsView;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct News {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_link: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl News {
    pub fn to_view(&self) -> NewsView {
        NewsView {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            image_link: self.image_link.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub async fn insert_news<'e, E>(executor: E, news: &News) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO news (id, title, description, image_link, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )
    .bind(&news.id)
    .bind(&news.title)
    .bind(&news.description)
    .bind(&news.image_link)
    .bind(news.created_at)
    .bind(news.updated_at)
    .execute(executor)
    .await?;
    info!("News created! {} ({})", news.title, news.id);
    Ok(())
}

pub async fn update_news<'e, E>(executor: E, news: &News) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE news SET title = ?2, description = ?3, image_link = ?4, updated_at = ?5
         WHERE id = ?1",
    )
    .bind(&news.id)
    .bind(&news.title)
    .bind(&news.description)
    .bind(&news.image_link)
    .bind(news.updated_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn get_news_by_id<'e, E>(executor: E, news_id: &str) -> Result<Option<News>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, News>(
        "SELECT id, title, description, image_link, created_at, updated_at
         FROM news WHERE id = ?1",
    )
    .bind(news_id)
    .fetch_optional(executor)
    .await
}

/// Newest first.
pub async fn list_news<'e, E>(executor: E) -> Result<Vec<News>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, News>(
        "SELECT id, title, description, image_link, created_at, updated_at
         FROM news ORDER BY created_at DESC, title",
    )
    .fetch_all(executor)
    .await
}

/// Whether news other than `except_id` already uses this title.
pub async fn title_taken<'e, E>(
    executor: E,
    title: &str,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news WHERE title = ?1 AND id != ?2")
        .bind(title)
        .bind(except_id.unwrap_or(""))
        .fetch_one(executor)
        .await?;
    Ok(count > 0)
}
