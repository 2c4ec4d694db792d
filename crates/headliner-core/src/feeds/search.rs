// Search feed: local headlines that mention the query, then global hits
use crate::{
    feeds::{search_cache_key, ArticleCache},
    locale::normalize_country,
    models::{dedup_by_id, Article, FeedState},
    source::NewsSource,
    Result,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct SearchFeed {
    source: Arc<dyn NewsSource>,
    cache: Arc<ArticleCache>,
    state: watch::Sender<FeedState>,
}

impl SearchFeed {
    pub fn new(source: Arc<dyn NewsSource>, cache: Arc<ArticleCache>) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            source,
            cache,
            state,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Search with the local-first merge
    ///
    /// With a country: that country's headlines filtered by the query come
    /// first, then global search results, deduplicated by id so a local
    /// match beats its global twin. Without one: global search only.
    /// A blank query returns nothing and touches neither network nor cache.
    pub async fn fetch(&self, query: &str, country: Option<&str>) -> Result<Vec<Article>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let country = country.and_then(normalize_country);
        let key = search_cache_key(query, country.as_deref());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.articles);
        }

        let articles = match country.as_deref() {
            Some(country) => self.local_first(query, country).await?,
            None => {
                info!("Searching globally for {:?}", query);
                self.source.search(query, None).await?
            }
        };

        self.cache.put(&key, articles.clone().into());
        Ok(articles)
    }

    async fn local_first(&self, query: &str, country: &str) -> Result<Vec<Article>> {
        let local: Vec<Article> = match self.source.headlines_by_country(country, None).await {
            Ok(headlines) => headlines
                .into_iter()
                .filter(|article| article.mentions(query))
                .collect(),
            Err(err) => {
                warn!("Local headlines for {} failed: {}", country, err);
                Vec::new()
            }
        };
        debug!("{} local matches for {:?} in {}", local.len(), query, country);

        let global = self.source.search(query, None).await?;
        Ok(dedup_by_id(local.into_iter().chain(global)))
    }

    /// Run a search into the published state; blank queries are ignored
    pub async fn refresh(&self, query: &str, country: Option<&str>) {
        if query.trim().is_empty() {
            return;
        }

        self.state
            .send_modify(|state| *state = FeedState::loading_from(state));

        let next = match self.fetch(query, country).await {
            Ok(articles) => FeedState {
                articles,
                country: country.and_then(normalize_country),
                ..FeedState::default()
            },
            Err(err) => {
                warn!("Search for {:?} failed: {}", query, err);
                FeedState::failed(err.user_message())
            }
        };

        self.state.send_replace(next);
    }
}
