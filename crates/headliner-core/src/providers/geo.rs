// Geolocation providers backed by GeoClient
use async_trait::async_trait;
use headliner_api::{GeoClient, GeoError, GeoFix};
use std::sync::{Arc, Mutex};

use crate::location::{LocationFailure, LocationProvider, PermissionState, ReverseGeocoder};

/// IP-based "device" location for the terminal client
///
/// There's no OS prompt to show, so the permission answer comes from
/// config: `grant_on_request` decides what asking returns.
pub struct IpLocationProvider {
    client: Arc<GeoClient>,
    permission: Mutex<PermissionState>,
    grant_on_request: bool,
}

impl IpLocationProvider {
    pub fn new(client: Arc<GeoClient>, permission: PermissionState, grant_on_request: bool) -> Self {
        Self {
            client,
            permission: Mutex::new(permission),
            grant_on_request,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PermissionState> {
        self.permission.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    fn permission(&self) -> PermissionState {
        *self.lock()
    }

    async fn request_permission(&self) -> PermissionState {
        let mut permission = self.lock();
        if *permission == PermissionState::NotDetermined {
            *permission = if self.grant_on_request {
                PermissionState::Granted
            } else {
                PermissionState::Denied
            };
        }
        *permission
    }

    async fn current_fix(&self) -> Result<GeoFix, LocationFailure> {
        self.client.current_fix().await.map_err(geo_failure)
    }
}

/// Nominatim reverse lookup
pub struct NominatimGeocoder {
    client: Arc<GeoClient>,
}

impl NominatimGeocoder {
    pub fn new(client: Arc<GeoClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn country_code(&self, fix: GeoFix) -> Result<String, LocationFailure> {
        self.client.reverse_country(fix).await.map_err(geo_failure)
    }
}

fn geo_failure(err: GeoError) -> LocationFailure {
    match err {
        GeoError::NoCountry { .. } | GeoError::ParseError(_) => {
            LocationFailure::Geocoding(err.to_string())
        }
        GeoError::RequestFailed(_) | GeoError::NetworkError(_) => {
            LocationFailure::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(permission: PermissionState, grant_on_request: bool) -> IpLocationProvider {
        IpLocationProvider::new(Arc::new(GeoClient::new().unwrap()), permission, grant_on_request)
    }

    #[tokio::test]
    async fn test_request_permission_follows_policy() {
        let granting = provider(PermissionState::NotDetermined, true);
        assert_eq!(granting.request_permission().await, PermissionState::Granted);
        assert_eq!(granting.permission(), PermissionState::Granted);

        let refusing = provider(PermissionState::NotDetermined, false);
        assert_eq!(refusing.request_permission().await, PermissionState::Denied);
    }

    #[tokio::test]
    async fn test_prior_answer_sticks() {
        let denied = provider(PermissionState::Denied, true);
        assert_eq!(denied.request_permission().await, PermissionState::Denied);
    }

    #[test]
    fn test_geo_errors_classified() {
        let no_country = GeoError::NoCountry { lat: 0.0, lon: 0.0 };
        assert!(matches!(geo_failure(no_country), LocationFailure::Geocoding(_)));

        let failed = GeoError::RequestFailed("Status 503".into());
        assert!(matches!(geo_failure(failed), LocationFailure::Transport(_)));
    }
}
