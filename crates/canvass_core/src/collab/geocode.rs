//! Reverse geocoding contract and fallback policy.

use crate::model::address::coordinate_label;
use crate::model::entry::Coordinates;
use async_trait::async_trait;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reverse geocoding failure reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    /// Provider returned no address for the position.
    NoResult,
    /// Provider could not be reached or rejected the request.
    Provider(String),
}

impl Display for GeocodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoResult => write!(f, "no address found"),
            Self::Provider(message) => write!(f, "geocoder failed: {message}"),
        }
    }
}

impl Error for GeocodeError {}

/// Coordinates to human-readable address.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, location: Coordinates) -> Result<String, GeocodeError>;
}

/// Resolves a display address, falling back to the coordinate label when
/// the provider fails or returns blank text.
pub async fn resolve_address(geocoder: &dyn Geocoder, location: Coordinates) -> String {
    match geocoder.reverse_geocode(location).await {
        Ok(address) if !address.trim().is_empty() => address.trim().to_string(),
        Ok(_) => {
            warn!("event=geocode module=collab status=fallback reason=blank_result");
            coordinate_label(location)
        }
        Err(err) => {
            warn!("event=geocode module=collab status=fallback reason=provider_error error={err}");
            coordinate_label(location)
        }
    }
}

/// Geocoder that never resolves; every lookup uses the coordinate label.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGeocoder;

#[async_trait]
impl Geocoder for OfflineGeocoder {
    async fn reverse_geocode(&self, _location: Coordinates) -> Result<String, GeocodeError> {
        Err(GeocodeError::NoResult)
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_address, GeocodeError, Geocoder, OfflineGeocoder};
    use crate::model::entry::Coordinates;
    use async_trait::async_trait;

    struct FixedGeocoder(&'static str);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn reverse_geocode(&self, _location: Coordinates) -> Result<String, GeocodeError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn provider_address_is_trimmed() {
        let address = resolve_address(&FixedGeocoder(" 12 Oak Ave "), Coordinates::new(1.0, 2.0)).await;
        assert_eq!(address, "12 Oak Ave");
    }

    #[tokio::test]
    async fn failures_and_blank_results_fall_back_to_coordinates() {
        let at = Coordinates::new(51.5, -0.125);
        assert_eq!(resolve_address(&OfflineGeocoder, at).await, "(51.5000, -0.1250)");
        assert_eq!(resolve_address(&FixedGeocoder("  "), at).await, "(51.5000, -0.1250)");
    }
}
