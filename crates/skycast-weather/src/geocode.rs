//! Forward geocoding: resolve free-text city queries to candidate places.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use reqwest::Client;
use serde_json::Value;

use skycast_core::{location, City, LookupError, ReqwestErrorExt};

const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1/search";

/// Client for the geocoding search endpoint.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl Default for GeocodingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeocodingClient {
    pub fn new() -> Self {
        Self::with_base_url(GEOCODING_URL)
    }

    /// Point the client at a different endpoint (tests, mirrors).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Search candidate places by name. The response is treated as opaque
    /// JSON: a missing `results` array yields an empty candidate list, not
    /// an error. Candidates are normalized, deduplicated, and capped at
    /// `count`.
    pub async fn search(&self, name: &str, count: usize) -> Result<Vec<City>, LookupError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("name", name),
                ("count", &count.to_string()),
                ("language", "en"),
                ("format", "json"),
            ])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(ReqwestErrorExt::into_lookup_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpStatus(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))?;

        let Some(results) = body.get("results").and_then(Value::as_array) else {
            tracing::debug!(query = name, "geocoding response had no results array");
            return Ok(Vec::new());
        };

        let candidates: Vec<City> = results
            .iter()
            .filter_map(location::normalize)
            .take(count)
            .collect();
        Ok(location::dedupe(candidates))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paris_result() -> Value {
        json!({
            "name": "Paris",
            "country": "France",
            "admin1": "Ile-de-France",
            "latitude": 48.8566,
            "longitude": 2.3522,
            "timezone": "Europe/Paris"
        })
    }

    #[tokio::test]
    async fn test_search_normalizes_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("name", "Paris"))
            .and(query_param("count", "8"))
            .and(query_param("language", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    paris_result(),
                    paris_result(),
                    { "name": "", "latitude": 1.0, "longitude": 2.0 }
                ]
            })))
            .mount(&server)
            .await;

        let client = GeocodingClient::with_base_url(server.uri());
        let cities = client.search("Paris", 8).await.unwrap();
        // Duplicates and malformed entries are dropped.
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Paris");
        assert_eq!(cities[0].timezone, "Europe/Paris");
    }

    #[tokio::test]
    async fn test_search_missing_results_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generationtime_ms": 0.5 })))
            .mount(&server)
            .await;

        let client = GeocodingClient::with_base_url(server.uri());
        assert!(client.search("Nowhere", 8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_http_error_is_categorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GeocodingClient::with_base_url(server.uri());
        let err = client.search("Paris", 8).await.unwrap_err();
        assert!(matches!(err, LookupError::HttpStatus(503)));
    }

    #[tokio::test]
    async fn test_search_invalid_body_is_categorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = GeocodingClient::with_base_url(server.uri());
        let err = client.search("Paris", 8).await.unwrap_err();
        assert!(matches!(err, LookupError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_search_caps_at_count() {
        let server = MockServer::start().await;
        let results: Vec<Value> = (0..5)
            .map(|i| {
                json!({
                    "name": format!("Paris{i}"),
                    "latitude": 48.0 + f64::from(i),
                    "longitude": 2.0
                })
            })
            .collect();
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .mount(&server)
            .await;

        let client = GeocodingClient::with_base_url(server.uri());
        let cities = client.search("Paris", 2).await.unwrap();
        assert_eq!(cities.len(), 2);
    }
}
