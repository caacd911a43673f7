//! Directions provider trait and HTTP implementation.
//!
//! The [`DirectionsProvider`] trait abstracts over the external route
//! computation service, allowing the navigation session to work with any
//! backend that can produce a walking route between two points. The
//! [`HttpDirectionsClient`] implementation posts to the app's directions
//! endpoint via `reqwest`.

use std::future::Future;
use std::time::Duration;

use crate::geo::GeoPoint;
use crate::route::{normalize, Route};

use super::error::DirectionsError;
use super::types::{DirectionsRequest, RawDirectionsResponse};

/// Default HTTP timeout for route requests.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for computing a walking route between two points.
///
/// Implementations are best-effort: a failed fetch must come back as a
/// typed error, never crash the session.
pub trait DirectionsProvider: Send + Sync {
    /// Fetch and normalize a walking route from `origin` to `destination`.
    fn fetch_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> impl Future<Output = Result<Route, DirectionsError>> + Send;
}

/// Directions client using direct HTTP requests.
///
/// Posts a walking request to the configured endpoint, picks the first
/// returned route and normalizes it. Uses a reusable `reqwest::Client`
/// with connection pooling and timeouts.
pub struct HttpDirectionsClient {
    /// Reusable HTTP client with connection pooling.
    http: reqwest::Client,

    /// URL of the directions endpoint.
    endpoint_url: String,
}

impl HttpDirectionsClient {
    /// Create a new client for the given directions endpoint.
    pub fn new(endpoint_url: String) -> Result<Self, DirectionsError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| DirectionsError::HttpError(e.to_string()))?;

        Ok(Self { http, endpoint_url })
    }
}

impl DirectionsProvider for HttpDirectionsClient {
    async fn fetch_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<Route, DirectionsError> {
        let request = DirectionsRequest::walking(origin, destination);

        let response = self
            .http
            .post(&self.endpoint_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DirectionsError::HttpError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectionsError::HttpError(format!(
                "directions endpoint returned {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DirectionsError::HttpError(e.to_string()))?;

        let data: RawDirectionsResponse =
            serde_json::from_slice(&bytes).map_err(|e| DirectionsError::JsonError(e.to_string()))?;

        let raw = data.routes.first().ok_or(DirectionsError::NoRoute)?;

        tracing::debug!(
            distance_m = raw.summary.distance,
            sections = raw.sections.len(),
            "walking route fetched"
        );

        Ok(normalize(raw, destination)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpDirectionsClient::new("http://localhost:3000/api/directions".to_string())
            .expect("client should build");
        assert_eq!(client.endpoint_url, "http://localhost:3000/api/directions");
    }

    #[test]
    fn test_empty_routes_is_no_route() {
        let data: RawDirectionsResponse = serde_json::from_str(r#"{"routes": []}"#).unwrap();
        assert!(data.routes.first().is_none());
    }
}
