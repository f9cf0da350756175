use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use shared::types::{CreateNewsRequest, NewsView, UpdateNewsRequest};

use crate::database::news::{self, News};
use crate::database::{generate_uuid, get_timestamp, sanitize_string};
use crate::error::{ServiceError, ServiceResult, is_unique_violation, storage};

pub const TITLE_TAKEN: &str = "News with such title already exists";
pub const NEWS_NOT_FOUND: &str = "News not found";

#[derive(Clone, Debug)]
pub struct NewsService {
    db: SqlitePool,
}

impl NewsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn create_news(&self, req: &CreateNewsRequest) -> ServiceResult<NewsView> {
        let title = sanitize_string(&req.title);
        debug!("Create news '{}'", title);

        if title.is_empty() {
            return Err(ServiceError::invalid("News title is required"));
        }
        self.check_title(&title, None).await?;

        let now = get_timestamp();
        let item = News {
            id: generate_uuid(),
            title,
            description: req.description.clone(),
            image_link: sanitize_string(&req.image_link),
            created_at: now,
            updated_at: now,
        };

        news::insert_news(&self.db, &item).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::invalid(TITLE_TAKEN)
            } else {
                storage("Could not create news", e)
            }
        })?;

        Ok(item.to_view())
    }

    pub async fn read_news(&self, news_id: &str) -> ServiceResult<NewsView> {
        debug!("Read news {}", news_id);
        self.load(news_id).await.map(|n| n.to_view())
    }

    /// Newest first.
    pub async fn list_news(&self) -> ServiceResult<Vec<NewsView>> {
        let all = news::list_news(&self.db)
            .await
            .map_err(|e| storage("Could not list news", e))?;
        Ok(all.iter().map(News::to_view).collect())
    }

    /// Patch the non-empty fields.
    pub async fn update_news(
        &self,
        news_id: &str,
        req: &UpdateNewsRequest,
    ) -> ServiceResult<NewsView> {
        debug!("Update news {}", news_id);
        let mut item = self.load(news_id).await?;

        let title = sanitize_string(&req.title);
        if !title.is_empty() && title != item.title {
            self.check_title(&title, Some(news_id)).await?;
            item.title = title;
        }
        if !req.description.is_empty() {
            item.description = req.description.clone();
        }
        let image_link = sanitize_string(&req.image_link);
        if !image_link.is_empty() {
            item.image_link = image_link;
        }
        item.updated_at = get_timestamp();

        let updated = news::update_news(&self.db, &item).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::invalid(TITLE_TAKEN)
            } else {
                storage("Could not update news", e)
            }
        })?;
        if updated == 0 {
            return Err(ServiceError::not_found(NEWS_NOT_FOUND));
        }

        info!("News updated! {}", item.id);
        Ok(item.to_view())
    }

    async fn load(&self, news_id: &str) -> ServiceResult<News> {
        news::get_news_by_id(&self.db, news_id)
            .await
            .map_err(|e| storage("Could not read news", e))?
            .ok_or_else(|| {
                warn!("News {} not found", news_id);
                ServiceError::not_found(NEWS_NOT_FOUND)
            })
    }

    async fn check_title(&self, title: &str, except_id: Option<&str>) -> ServiceResult<()> {
        if news::title_taken(&self.db, title, except_id)
            .await
            .map_err(|e| storage("Could not check news title", e))?
        {
            warn!("{}: '{}'", TITLE_TAKEN, title);
            return Err(ServiceError::invalid(TITLE_TAKEN));
        }
        Ok(())
    }
}
