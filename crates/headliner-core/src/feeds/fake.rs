// Scripted NewsSource for feed tests
use crate::{models::Article, source::NewsSource, Error, Result};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Reply {
    Articles(Vec<Article>),
    Fail,
}

impl Reply {
    fn into_result(self) -> Result<Vec<Article>> {
        match self {
            Reply::Articles(articles) => Ok(articles),
            Reply::Fail => Err(Error::Transport("connection reset".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Global,
    Country(String, Option<String>),
    Search(String, Option<String>),
}

/// Anything not scripted answers with an empty list
#[derive(Default)]
pub struct FakeSource {
    global: Option<Reply>,
    by_country: HashMap<(String, Option<String>), Reply>,
    searches: HashMap<String, Reply>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<Call>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(mut self, reply: Reply) -> Self {
        self.global = Some(reply);
        self
    }

    pub fn country(mut self, country: &str, topic: Option<&str>, reply: Reply) -> Self {
        self.by_country
            .insert((country.to_string(), topic.map(str::to_string)), reply);
        self
    }

    pub fn search_reply(mut self, query: &str, reply: Reply) -> Self {
        self.searches.insert(query.to_string(), reply);
        self
    }

    /// Every country call for `country` sleeps this long first
    pub fn delay_country(mut self, country: &str, delay: Duration) -> Self {
        self.delays.insert(country.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn country_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Country(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl NewsSource for FakeSource {
    async fn top_headlines(&self) -> Result<Vec<Article>> {
        self.record(Call::Global);
        self.global
            .clone()
            .unwrap_or(Reply::Articles(Vec::new()))
            .into_result()
    }

    async fn headlines_by_country(
        &self,
        country: &str,
        topic: Option<&str>,
    ) -> Result<Vec<Article>> {
        self.record(Call::Country(country.to_string(), topic.map(str::to_string)));
        if let Some(delay) = self.delays.get(country) {
            tokio::time::sleep(*delay).await;
        }
        self.by_country
            .get(&(country.to_string(), topic.map(str::to_string)))
            .cloned()
            .unwrap_or(Reply::Articles(Vec::new()))
            .into_result()
    }

    async fn search(&self, query: &str, country: Option<&str>) -> Result<Vec<Article>> {
        self.record(Call::Search(query.to_string(), country.map(str::to_string)));
        self.searches
            .get(query)
            .cloned()
            .unwrap_or(Reply::Articles(Vec::new()))
            .into_result()
    }
}

pub fn article(slug: &str, title: &str, summary: &str) -> Article {
    Article::new(
        title.to_string(),
        Some(summary.to_string()),
        format!("https://news.test/{}", slug),
        None,
        "Test Wire".to_string(),
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    )
}

/// `count` distinct filler articles
pub fn articles(prefix: &str, count: usize) -> Vec<Article> {
    (0..count)
        .map(|i| article(&format!("{}-{}", prefix, i), &format!("{} story {}", prefix, i), ""))
        .collect()
}
