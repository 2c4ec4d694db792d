// Precise location: permission -> fix -> reverse geocode -> country code
use crate::{locale::normalize_country, Error};
use async_trait::async_trait;
use headliner_api::GeoFix;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const SIGNAL_BUFFER: usize = 16;

/// Whether we may ask the device where it is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// Never asked
    #[default]
    NotDetermined,
    Granted,
    Denied,
}

/// Why a resolve attempt produced no country
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationFailure {
    PermissionDenied,
    Geocoding(String),
    Transport(String),
}

impl From<LocationFailure> for Error {
    fn from(failure: LocationFailure) -> Self {
        match failure {
            LocationFailure::PermissionDenied => Error::PermissionDenied,
            LocationFailure::Geocoding(msg) | LocationFailure::Transport(msg) => {
                Error::LocationUnavailable(msg)
            }
        }
    }
}

/// What the resolver tells its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationSignal {
    /// Lowercase ISO country code
    Resolved(String),
    Failed(LocationFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverState {
    Unresolved,
    PermissionPending,
    Locating,
    Resolved(String),
    Denied,
    Unavailable,
}

/// Device location access
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationProvider: Send + Sync {
    fn permission(&self) -> PermissionState;

    /// Ask for access; returns the state after the user (or policy) answered
    async fn request_permission(&self) -> PermissionState;

    async fn current_fix(&self) -> Result<GeoFix, LocationFailure>;
}

/// Position -> country lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn country_code(&self, fix: GeoFix) -> Result<String, LocationFailure>;
}

/// Turns device location into a country code and broadcasts the outcome
///
/// One signal per detection run: either a resolved code or a failure.
/// Nothing here retries; call `detect` again to take another shot.
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
    geocoder: Arc<dyn ReverseGeocoder>,
    state: Mutex<ResolverState>,
    signals: broadcast::Sender<LocationSignal>,
}

impl LocationResolver {
    pub fn new(provider: Arc<dyn LocationProvider>, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_BUFFER);
        Self {
            provider,
            geocoder,
            state: Mutex::new(ResolverState::Unresolved),
            signals,
        }
    }

    /// Build a resolver and kick off detection right away
    ///
    /// A previously denied permission is reported before this returns, so
    /// the receiver handed back already holds the denial. Anything else
    /// runs on a spawned task; must be called inside a tokio runtime.
    pub fn spawn(
        provider: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> (Arc<Self>, broadcast::Receiver<LocationSignal>) {
        let resolver = Arc::new(Self::new(provider, geocoder));
        let receiver = resolver.subscribe();

        if resolver.provider.permission() == PermissionState::Denied {
            resolver.deny();
        } else {
            let task = Arc::clone(&resolver);
            tokio::spawn(async move {
                task.detect().await;
            });
        }

        (resolver, receiver)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LocationSignal> {
        self.signals.subscribe()
    }

    pub fn state(&self) -> ResolverState {
        self.lock_state().clone()
    }

    /// Run one detection pass and return the signal it emitted
    pub async fn detect(&self) -> LocationSignal {
        let permission = match self.provider.permission() {
            PermissionState::NotDetermined => {
                self.set_state(ResolverState::PermissionPending);
                debug!("Requesting location permission");
                self.provider.request_permission().await
            }
            granted_or_denied => granted_or_denied,
        };

        match permission {
            PermissionState::Granted => self.locate().await,
            PermissionState::Denied | PermissionState::NotDetermined => self.deny(),
        }
    }

    async fn locate(&self) -> LocationSignal {
        self.set_state(ResolverState::Locating);

        let fix = match self.provider.current_fix().await {
            Ok(fix) => fix,
            Err(failure) => return self.fail(failure),
        };

        match self.geocoder.country_code(fix).await {
            Ok(raw) => match normalize_country(&raw) {
                Some(code) => {
                    info!("Resolved location to {}", code);
                    self.set_state(ResolverState::Resolved(code.clone()));
                    self.emit(LocationSignal::Resolved(code))
                }
                None => self.fail(LocationFailure::Geocoding(format!(
                    "not a country code: {:?}",
                    raw
                ))),
            },
            Err(failure) => self.fail(failure),
        }
    }

    fn deny(&self) -> LocationSignal {
        info!("Location permission denied");
        self.set_state(ResolverState::Denied);
        self.emit(LocationSignal::Failed(LocationFailure::PermissionDenied))
    }

    fn fail(&self, failure: LocationFailure) -> LocationSignal {
        warn!("Location lookup failed: {:?}", failure);
        self.set_state(ResolverState::Unavailable);
        self.emit(LocationSignal::Failed(failure))
    }

    fn emit(&self, signal: LocationSignal) -> LocationSignal {
        if self.signals.send(signal.clone()).is_err() {
            debug!("No one listening for location signals");
        }
        signal
    }

    fn set_state(&self, state: ResolverState) {
        *self.lock_state() = state;
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
