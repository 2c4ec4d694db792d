// The three user-facing feeds: global, location and search
pub mod global;
pub mod location;
pub mod search;

#[cfg(test)]
pub(crate) mod fake;

use crate::models::Article;
use headliner_cache::ExpiringCache;

pub use global::GlobalFeed;
pub use location::{CountryOrigin, LocationFeed, LocationNews, Strategy, STRATEGIES};
pub use search::SearchFeed;

/// The one cache every feed shares
pub type ArticleCache = ExpiringCache<CachedArticles>;

/// A cached article list plus the label it was shown under, if any
#[derive(Debug, Clone, PartialEq)]
pub struct CachedArticles {
    pub articles: Vec<Article>,
    pub label: Option<String>,
}

impl CachedArticles {
    pub fn labelled(label: &str, articles: Vec<Article>) -> Self {
        Self {
            articles,
            label: Some(label.to_string()),
        }
    }
}

impl From<Vec<Article>> for CachedArticles {
    fn from(articles: Vec<Article>) -> Self {
        Self {
            articles,
            label: None,
        }
    }
}

pub const GLOBAL_CACHE_KEY: &str = "global_news";

pub fn location_cache_key(country: &str) -> String {
    format!("location_{}", country)
}

/// `None` country gets its own sentinel so it never collides with a code
pub fn search_cache_key(query: &str, country: Option<&str>) -> String {
    format!("search_{}_{}", query, country.unwrap_or("none"))
}
