use crate::{models::Article, Result};

/// Trait for news backends - lets the feeds run against fakes in tests
///
/// All three calls are reads. Implementations surface transport and
/// decoding failures as-is; retrying or falling back is the feed's call.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Unfiltered top headlines
    async fn top_headlines(&self) -> Result<Vec<Article>>;

    /// Headlines for one country; `None` topic means the provider default
    async fn headlines_by_country(
        &self,
        country: &str,
        topic: Option<&str>,
    ) -> Result<Vec<Article>>;

    /// Free-text search, optionally narrowed to a country
    async fn search(&self, query: &str, country: Option<&str>) -> Result<Vec<Article>>;
}
