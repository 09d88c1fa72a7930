//! Rate-limited adapter to a Nominatim-compatible geocoding service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::Throttle;
use crate::error::Result;
use crate::models::Coordinate;

pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_USER_AGENT: &str = "member_geocoder";

/// Result of a single geocoding attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    Found(Coordinate),
    NotFound,
}

/// External geocoding service. Implementations do not retry: a no-match
/// and a transport failure both come back as `NotFound`.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> GeocodeOutcome;
}

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub endpoint: String,
    pub user_agent: String,
    /// Minimum spacing between requests
    pub min_interval: Duration,
    pub timeout: Duration,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(10),
        }
    }
}

/// One search hit. Nominatim returns coordinates as decimal strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

pub struct NominatimClient {
    client: Client,
    endpoint: Url,
    throttle: Throttle,
}

impl NominatimClient {
    pub fn new(config: NominatimConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)?;
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint,
            throttle: Throttle::new(config.min_interval),
        })
    }

    fn search_url(&self, address: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        url
    }

    async fn search(&self, address: &str) -> std::result::Result<Vec<SearchHit>, reqwest::Error> {
        self.client
            .get(self.search_url(address))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<SearchHit>>()
            .await
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn resolve(&self, address: &str) -> GeocodeOutcome {
        info!("Geocoding: {}", address);

        let hits = match self.throttle.run(self.search(address)).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Error geocoding address '{}': {}", address, e);
                return GeocodeOutcome::NotFound;
            }
        };

        match first_coordinate(&hits) {
            Some(coordinate) => {
                debug!("Geocoded '{}' to {}", address, coordinate);
                GeocodeOutcome::Found(coordinate)
            }
            None => {
                warn!("Could not geocode address '{}'", address);
                GeocodeOutcome::NotFound
            }
        }
    }
}

fn first_coordinate(hits: &[SearchHit]) -> Option<Coordinate> {
    let hit = hits.first()?;
    let lat = hit.lat.trim().parse::<f64>().ok()?;
    let lon = hit.lon.trim().parse::<f64>().ok()?;
    Some(Coordinate::new(lat, lon)).filter(Coordinate::is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<Coordinate> {
        let hits: Vec<SearchHit> = serde_json::from_str(body).unwrap();
        first_coordinate(&hits)
    }

    #[test]
    fn test_parse_first_hit() {
        let body = r#"[
            {"place_id": 1, "lat": "55.7333", "lon": "12.4667", "display_name": "Gladsaxe"},
            {"place_id": 2, "lat": "1.0", "lon": "2.0"}
        ]"#;
        assert_eq!(parse(body), Some(Coordinate::new(55.7333, 12.4667)));
    }

    #[test]
    fn test_parse_empty_is_none() {
        assert_eq!(parse("[]"), None);
    }

    #[test]
    fn test_parse_garbage_coordinate_is_none() {
        assert_eq!(parse(r#"[{"lat": "north", "lon": "12.0"}]"#), None);
    }

    #[test]
    fn test_parse_non_finite_coordinate_is_none() {
        assert_eq!(parse(r#"[{"lat": "NaN", "lon": "12.0"}]"#), None);
        assert_eq!(parse(r#"[{"lat": "55.7", "lon": "inf"}]"#), None);
        assert_eq!(parse(r#"[{"lat": "-infinity", "lon": "12.0"}]"#), None);
    }

    #[test]
    fn test_parse_out_of_range_coordinate_is_none() {
        assert_eq!(parse(r#"[{"lat": "95.0", "lon": "12.0"}]"#), None);
        assert_eq!(parse(r#"[{"lat": "55.0", "lon": "181.0"}]"#), None);
    }

    #[test]
    fn test_search_url() {
        let client = NominatimClient::new(NominatimConfig::default()).unwrap();
        let url = client.search_url("Søborg Hovedgade 1, 2860 Søborg");

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(url.path(), "/search");
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "Søborg Hovedgade 1, 2860 Søborg".to_string()),
                ("format".to_string(), "json".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        let config = NominatimConfig {
            endpoint: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            NominatimClient::new(config),
            Err(crate::Error::Endpoint(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_not_found() {
        let config = NominatimConfig {
            // Nothing listens on the discard port
            endpoint: "http://127.0.0.1:9/search".to_string(),
            min_interval: Duration::ZERO,
            timeout: Duration::from_secs(2),
            ..Default::default()
        };
        let client = NominatimClient::new(config).unwrap();
        assert_eq!(client.resolve("Vej 1, 2800 X").await, GeocodeOutcome::NotFound);
    }
}
