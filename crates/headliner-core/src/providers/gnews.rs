// GNews provider implementation - bridges the API client with NewsSource
use async_trait::async_trait;
use headliner_api::{GNewsArticle, GNewsClient};

use crate::{models::Article, source::NewsSource, Result};

/// Wrapper around GNewsClient that implements NewsSource
pub struct GNewsProvider {
    client: GNewsClient,
}

impl GNewsProvider {
    pub fn new(client: GNewsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NewsSource for GNewsProvider {
    async fn top_headlines(&self) -> Result<Vec<Article>> {
        let articles = self.client.top_headlines(None, None).await?;
        Ok(articles.into_iter().map(gnews_to_article).collect())
    }

    async fn headlines_by_country(
        &self,
        country: &str,
        topic: Option<&str>,
    ) -> Result<Vec<Article>> {
        let articles = self.client.top_headlines(Some(country), topic).await?;
        Ok(articles.into_iter().map(gnews_to_article).collect())
    }

    async fn search(&self, query: &str, country: Option<&str>) -> Result<Vec<Article>> {
        let articles = self.client.search(query, country).await?;
        Ok(articles.into_iter().map(gnews_to_article).collect())
    }
}

/// Convert a GNews wire article to our internal Article model
pub fn gnews_to_article(wire: GNewsArticle) -> Article {
    Article::new(
        wire.title,
        wire.description,
        wire.url,
        wire.image,
        wire.source.name,
        wire.published_at,
    )
}
