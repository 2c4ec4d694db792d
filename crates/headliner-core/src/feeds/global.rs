// Global feed: cache first, then unfiltered top headlines
use crate::{
    feeds::{ArticleCache, GLOBAL_CACHE_KEY},
    models::{Article, FeedState},
    source::NewsSource,
    Result,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct GlobalFeed {
    source: Arc<dyn NewsSource>,
    cache: Arc<ArticleCache>,
    state: watch::Sender<FeedState>,
}

impl GlobalFeed {
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

    /// Cached headlines if fresh, otherwise fetch and write through
    pub async fn fetch(&self) -> Result<Vec<Article>> {
        if let Some(cached) = self.cache.get(GLOBAL_CACHE_KEY) {
            return Ok(cached.articles);
        }

        info!("Fetching global headlines");
        let articles = self.source.top_headlines().await?;
        self.cache.put(GLOBAL_CACHE_KEY, articles.clone().into());
        Ok(articles)
    }

    /// Load into the published state; failures become one readable message
    pub async fn refresh(&self) {
        self.state
            .send_modify(|state| *state = FeedState::loading_from(state));

        let next = match self.fetch().await {
            Ok(articles) => FeedState {
                articles,
                ..FeedState::default()
            },
            Err(err) => {
                warn!("Global feed failed: {}", err);
                FeedState::failed(err.user_message())
            }
        };

        self.state.send_replace(next);
    }
}
