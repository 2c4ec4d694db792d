use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const GNEWS_API_BASE: &str = "https://gnews.io/api/v4";
const DEFAULT_MAX_ARTICLES: u32 = 10;

#[derive(Error, Debug)]
pub enum GNewsError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid or missing API token")]
    AuthRequired,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl GNewsError {
    /// True when the body arrived but didn't match the envelope schema
    pub fn is_decoding(&self) -> bool {
        matches!(self, GNewsError::ParseError(_))
    }
}

pub type Result<T> = std::result::Result<T, GNewsError>;

/// Client for the GNews v4 article index
///
/// Every call is a plain read. No retries here: a failed request goes
/// straight back to the caller, which decides whether to fall back.
pub struct GNewsClient {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
    language: Option<String>,
    max_articles: u32,
}

impl GNewsClient {
    pub fn new(token: Option<String>) -> Result<Self> {
        Self::with_base_url(token, GNEWS_API_BASE.to_string())
    }

    /// Point the client at a different host (proxies, test servers)
    pub fn with_base_url(token: Option<String>, base_url: String) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("Headliner/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: None,
            max_articles: DEFAULT_MAX_ARTICLES,
        })
    }

    /// Restrict results to one article language (e.g. "en")
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Upper bound on articles returned per call
    pub fn with_max_articles(mut self, max: u32) -> Self {
        self.max_articles = max.max(1);
        self
    }

    pub fn max_articles(&self) -> u32 {
        self.max_articles
    }

    /// Top headlines, optionally narrowed to a country and a topic
    ///
    /// `topic = None` leaves the category to the provider's default.
    pub async fn top_headlines(
        &self,
        country: Option<&str>,
        topic: Option<&str>,
    ) -> Result<Vec<GNewsArticle>> {
        let mut params = Vec::new();
        if let Some(country) = country {
            params.push(("country", country));
        }
        if let Some(topic) = topic {
            params.push(("category", topic));
        }

        let url = self.endpoint_url("top-headlines", &params);
        debug!(?country, ?topic, "Fetching top headlines");
        self.fetch(&url).await
    }

    /// Free-text search; the query is only encoded, never rewritten
    pub async fn search(&self, query: &str, country: Option<&str>) -> Result<Vec<GNewsArticle>> {
        let mut params = vec![("q", query)];
        if let Some(country) = country {
            params.push(("country", country));
        }

        let url = self.endpoint_url("search", &params);
        debug!(query, ?country, "Searching articles");
        self.fetch(&url).await
    }

    /// Build a full request URL with every parameter percent-encoded
    fn endpoint_url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let max = self.max_articles.to_string();
        let mut pairs: Vec<(&str, &str)> = params.to_vec();
        if let Some(ref lang) = self.language {
            pairs.push(("lang", lang.as_str()));
        }
        pairs.push(("max", max.as_str()));
        if let Some(ref token) = self.token {
            pairs.push(("apikey", token.as_str()));
        }

        let query = pairs
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/{}?{}", self.base_url, path, query)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<GNewsArticle>> {
        let response = self.client.get(url).send().await?;

        if response.status() == 401 || response.status() == 403 {
            return Err(GNewsError::AuthRequired);
        }

        if response.status() == 429 {
            return Err(GNewsError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GNewsError::RequestFailed(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let envelope = decode_envelope(&body)?;
        debug!(
            "Decoded {} of {} articles",
            envelope.articles.len(),
            envelope.total_articles
        );

        let mut articles = envelope.articles;
        articles.truncate(self.max_articles as usize);
        Ok(articles)
    }
}

/// Parse a response body; any schema mismatch fails the whole batch
pub fn decode_envelope(body: &str) -> Result<ArticlesEnvelope> {
    Ok(serde_json::from_str(body)?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlesEnvelope {
    #[serde(default)]
    pub total_articles: u64,
    pub articles: Vec<GNewsArticle>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GNewsArticle {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source: GNewsSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GNewsSource {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const ENVELOPE: &str = r#"{
        "totalArticles": 2,
        "articles": [
            {
                "title": "Chip exports climb",
                "description": "Semiconductor shipments rose again.",
                "content": "Full text...",
                "url": "https://example.com/chips",
                "image": "https://example.com/chips.jpg",
                "publishedAt": "2024-05-01T12:30:00Z",
                "source": { "name": "Example Wire", "url": "https://example.com" }
            },
            {
                "title": "Quiet day at the markets",
                "url": "https://example.com/markets",
                "publishedAt": "2024-05-01T09:00:00Z",
                "source": { "name": "Example Wire" }
            }
        ]
    }"#;

    fn client() -> GNewsClient {
        GNewsClient::with_base_url(Some("secret".into()), "https://news.test/v4/".into())
            .unwrap()
            .with_language("en")
    }

    #[test]
    fn test_decode_envelope() {
        let envelope = decode_envelope(ENVELOPE).unwrap();
        assert_eq!(envelope.total_articles, 2);
        assert_eq!(envelope.articles.len(), 2);

        let first = &envelope.articles[0];
        assert_eq!(first.source.name, "Example Wire");
        assert_eq!(first.image.as_deref(), Some("https://example.com/chips.jpg"));
        assert_eq!(first.published_at.to_rfc3339(), "2024-05-01T12:30:00+00:00");

        let second = &envelope.articles[1];
        assert!(second.description.is_none());
        assert!(second.image.is_none());
    }

    #[test]
    fn test_decode_rejects_schema_mismatch() {
        // One bad article sinks the whole response
        let body = r#"{"totalArticles": 1, "articles": [{"title": "no url"}]}"#;
        let err = decode_envelope(body).unwrap_err();
        assert!(err.is_decoding());

        assert!(decode_envelope("<html>oops</html>").unwrap_err().is_decoding());
    }

    #[test]
    fn test_search_query_is_percent_encoded() {
        let url = client().endpoint_url("search", &[("q", "rust & tech/ai?")]);
        assert_eq!(
            url,
            "https://news.test/v4/search?q=rust%20%26%20tech%2Fai%3F&lang=en&max=10&apikey=secret"
        );
    }

    #[test]
    fn test_query_round_trips_through_encoding() {
        let query = "élection 2024 \"live\"";
        let encoded = urlencoding::encode(query);
        assert_eq!(urlencoding::decode(&encoded).unwrap(), query);
    }

    #[test]
    fn test_headlines_url_without_token() {
        let client = GNewsClient::with_base_url(None, "https://news.test/v4".into())
            .unwrap()
            .with_max_articles(5);
        let url = client.endpoint_url("top-headlines", &[("country", "us"), ("category", "world")]);
        assert_eq!(
            url,
            "https://news.test/v4/top-headlines?country=us&category=world&max=5"
        );
    }

    #[test]
    fn test_max_articles_never_zero() {
        let client = GNewsClient::new(None).unwrap().with_max_articles(0);
        assert_eq!(client.max_articles(), 1);
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Answers a single request with a canned response, returns the base URL
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/v4", addr)
    }

    async fn headlines_from(response: String) -> Result<Vec<GNewsArticle>> {
        let base_url = serve_once(response).await;
        GNewsClient::with_base_url(Some("secret".into()), base_url)
            .unwrap()
            .top_headlines(Some("us"), None)
            .await
    }

    #[tokio::test]
    async fn test_server_error_is_request_failed() {
        // A JSON body on a 500 must not be decoded
        let result = headlines_from(http_response("500 Internal Server Error", ENVELOPE)).await;

        match result {
            Err(GNewsError::RequestFailed(msg)) => assert!(msg.contains("500")),
            other => panic!("expected RequestFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_status() {
        let result = headlines_from(http_response("429 Too Many Requests", "{}")).await;
        assert!(matches!(result, Err(GNewsError::RateLimitExceeded)));
    }

    #[tokio::test]
    async fn test_auth_statuses() {
        let unauthorized = headlines_from(http_response("401 Unauthorized", "{}")).await;
        assert!(matches!(unauthorized, Err(GNewsError::AuthRequired)));

        let forbidden = headlines_from(http_response("403 Forbidden", "{}")).await;
        assert!(matches!(forbidden, Err(GNewsError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_success_is_decoded_and_truncated() {
        let base_url = serve_once(http_response("200 OK", ENVELOPE)).await;
        let articles = GNewsClient::with_base_url(None, base_url)
            .unwrap()
            .with_max_articles(1)
            .search("chips", None)
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].url, "https://example.com/chips");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decoding_error() {
        let result = headlines_from(http_response("200 OK", r#"{"articles": [{}]}"#)).await;
        assert!(result.unwrap_err().is_decoding());
    }
}
