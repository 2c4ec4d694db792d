// Location feed: device region first, precise location when it arrives,
// and a fixed ladder of fallbacks per country.
use crate::{
    feeds::{location_cache_key, ArticleCache, CachedArticles},
    locale::{normalize_country, LocaleProvider},
    location::{LocationFailure, LocationResolver, LocationSignal},
    models::{Article, FeedState},
    source::NewsSource,
    Error, Result,
};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// One country-scoped attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub topic: Option<&'static str>,
    pub label: &'static str,
}

/// Tried in order, stopping at the first non-empty result
pub const STRATEGIES: [Strategy; 5] = [
    Strategy {
        topic: None,
        label: "top headlines",
    },
    Strategy {
        topic: Some("general"),
        label: "general",
    },
    Strategy {
        topic: Some("world"),
        label: "world",
    },
    Strategy {
        topic: Some("breaking-news"),
        label: "breaking-news",
    },
    Strategy {
        topic: Some("nation"),
        label: "nation",
    },
];

pub const GLOBAL_FALLBACK_LABEL: &str = "global";
pub const GLOBAL_FALLBACK_LIMIT: usize = 10;

/// Where a country code came from; later variants outrank earlier ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CountryOrigin {
    DeviceRegion,
    Geolocation,
}

/// A successful location load
#[derive(Debug, Clone, PartialEq)]
pub struct LocationNews {
    pub country: String,
    pub articles: Vec<Article>,
    pub label: String,
}

#[derive(Debug, Default)]
struct Tracking {
    /// Origin of whatever is on screen right now
    shown: Option<CountryOrigin>,
    /// Latest code from the resolver
    resolved: Option<String>,
    /// Loads started but not yet published or dropped
    in_flight: usize,
}

/// Local news, resolved from device region and precise location
///
/// A geolocation result always replaces a device-region one; a
/// device-region result that lands after a geolocation one is dropped.
/// Loads of equal origin publish in arrival order.
pub struct LocationFeed {
    source: Arc<dyn NewsSource>,
    cache: Arc<ArticleCache>,
    locale: Arc<dyn LocaleProvider>,
    state: watch::Sender<FeedState>,
    tracking: Mutex<Tracking>,
}

impl LocationFeed {
    pub fn new(
        source: Arc<dyn NewsSource>,
        cache: Arc<ArticleCache>,
        locale: Arc<dyn LocaleProvider>,
    ) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            source,
            cache,
            locale,
            state,
            tracking: Mutex::new(Tracking::default()),
        }
    }

    pub fn state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Best country we know of: resolved location, else device region
    pub fn current_country(&self) -> Option<String> {
        self.lock_tracking()
            .resolved
            .clone()
            .or_else(|| self.device_region())
    }

    fn device_region(&self) -> Option<String> {
        self.locale
            .region_code()
            .and_then(|code| normalize_country(&code))
    }

    /// Fast path: load for the device region without waiting on location
    ///
    /// Returns the region used, if there was one.
    pub async fn load_device_region(&self) -> Option<String> {
        let region = self.device_region();
        match region {
            Some(ref code) => {
                debug!("Loading news for device region {}", code);
                self.load(code, CountryOrigin::DeviceRegion).await;
            }
            None => debug!("No device region configured"),
        }
        region
    }

    /// React to one resolver signal
    pub async fn handle_signal(&self, signal: LocationSignal) {
        match signal {
            LocationSignal::Resolved(code) => {
                self.remember_resolved(&code);
                self.load(&code, CountryOrigin::Geolocation).await;
            }
            LocationSignal::Failed(failure) => self.handle_failure(failure),
        }
    }

    fn remember_resolved(&self, code: &str) {
        self.lock_tracking().resolved = Some(code.to_string());
    }

    fn handle_failure(&self, failure: LocationFailure) {
        if self.device_region().is_some() || self.lock_tracking().shown.is_some() {
            debug!("Location failed ({:?}), keeping current results", failure);
            return;
        }

        let err = Error::from(failure);
        warn!("No country available: {}", err);
        self.state
            .send_replace(FeedState::failed(err.user_message()));
    }

    /// Pull-to-refresh: device region and a fresh detection run, side by side
    ///
    /// The resolver emits once per run, so this starts its own run instead
    /// of waiting on a signal someone else has to trigger.
    pub async fn refresh(&self, resolver: &LocationResolver) {
        let detect_and_load = async {
            let signal = resolver.detect().await;
            self.handle_signal(signal).await;
        };

        tokio::join!(self.load_device_region(), detect_and_load);
    }

    async fn load(&self, country: &str, origin: CountryOrigin) {
        self.begin_load();
        let outcome = self.fetch_for_country(country).await;
        self.publish(origin, country, outcome);
    }

    fn begin_load(&self) {
        self.lock_tracking().in_flight += 1;
        self.state
            .send_modify(|state| *state = FeedState::loading_from(state));
    }

    fn publish(&self, origin: CountryOrigin, country: &str, outcome: Result<LocationNews>) {
        let mut tracking = self.lock_tracking();
        tracking.in_flight = tracking.in_flight.saturating_sub(1);
        let still_loading = tracking.in_flight > 0;

        if matches!(tracking.shown, Some(shown) if shown > origin) {
            debug!(
                "Dropping {:?} result for {}, a more precise one is showing",
                origin, country
            );
            self.state
                .send_modify(|state| state.is_loading = still_loading);
            return;
        }
        tracking.shown = Some(origin);

        let next = match outcome {
            Ok(news) => FeedState {
                articles: news.articles,
                label: Some(news.label),
                country: Some(news.country),
                is_loading: still_loading,
                error: None,
            },
            Err(err) => FeedState {
                country: Some(country.to_string()),
                is_loading: still_loading,
                ..FeedState::failed(err.user_message())
            },
        };
        self.state.send_replace(next);
    }

    /// Cache, then each strategy in turn, then global headlines
    ///
    /// Strategies run one after another, never concurrently: the first
    /// non-empty answer wins and the rest are never sent.
    pub async fn fetch_for_country(&self, country: &str) -> Result<LocationNews> {
        let country = country.trim().to_lowercase();
        let key = location_cache_key(&country);

        if let Some(cached) = self.cache.get(&key) {
            debug!("Serving {} from cache", key);
            return Ok(LocationNews {
                country,
                label: cached.label.unwrap_or_else(|| GLOBAL_FALLBACK_LABEL.to_string()),
                articles: cached.articles,
            });
        }

        for strategy in STRATEGIES.iter() {
            match self
                .source
                .headlines_by_country(&country, strategy.topic)
                .await
            {
                Ok(articles) if !articles.is_empty() => {
                    info!(
                        "Loaded {} articles for {} via {}",
                        articles.len(),
                        country,
                        strategy.label
                    );
                    self.cache
                        .put(&key, CachedArticles::labelled(strategy.label, articles.clone()));
                    return Ok(LocationNews {
                        country,
                        articles,
                        label: strategy.label.to_string(),
                    });
                }
                Ok(_) => debug!("No articles for {} via {}", country, strategy.label),
                Err(err) => warn!("{} strategy failed for {}: {}", strategy.label, country, err),
            }
        }

        info!("Nothing local for {}, falling back to global headlines", country);
        match self.source.top_headlines().await {
            Ok(mut articles) if !articles.is_empty() => {
                articles.truncate(GLOBAL_FALLBACK_LIMIT);
                self.cache.put(
                    &key,
                    CachedArticles::labelled(GLOBAL_FALLBACK_LABEL, articles.clone()),
                );
                Ok(LocationNews {
                    country,
                    articles,
                    label: GLOBAL_FALLBACK_LABEL.to_string(),
                })
            }
            Ok(_) => {
                warn!("Global fallback was empty too");
                Err(Error::NewsUnavailable)
            }
            Err(err) => {
                warn!("Global fallback failed: {}", err);
                Err(Error::NewsUnavailable)
            }
        }
    }

    fn lock_tracking(&self) -> std::sync::MutexGuard<'_, Tracking> {
        self.tracking
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
