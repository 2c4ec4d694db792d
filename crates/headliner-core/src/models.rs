use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Normalized news article - what every feed hands back
///
/// `id` is the canonical URL, so two articles pointing at the same page are
/// the same article no matter what else differs between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    /// Empty when the provider sent no description
    pub summary: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
}

impl Article {
    pub fn new(
        title: String,
        summary: Option<String>,
        url: String,
        image_url: Option<String>,
        source_name: String,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: url.clone(),
            title,
            summary: summary.unwrap_or_default(),
            url,
            image_url,
            source_name,
            published_at,
        }
    }

    /// Case-insensitive substring match against title or summary
    pub fn mentions(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(&needle) || self.summary.to_lowercase().contains(&needle)
    }
}

/// Drop repeated ids, keeping the first occurrence and the original order
pub fn dedup_by_id<I>(articles: I) -> Vec<Article>
where
    I: IntoIterator<Item = Article>,
{
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(article.id.clone()))
        .collect()
}

/// Snapshot of one feed, ready for display
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedState {
    pub articles: Vec<Article>,
    /// Which strategy produced the articles ("world", "global", "cached", ...)
    pub label: Option<String>,
    pub country: Option<String>,
    pub is_loading: bool,
    /// Human-readable failure, never a raw error
    pub error: Option<String>,
}

impl FeedState {
    pub fn loading_from(previous: &FeedState) -> Self {
        Self {
            is_loading: true,
            error: None,
            ..previous.clone()
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }
}
