//! HTTP providers for Mapbox Directions and Map Matching.
//!
//! This module provides:
//! - Connection pooling across directions and map-matching calls
//! - Automatic retry with exponential backoff on 429 and transport errors
//! - Timing breakdown per request (headers, body, parse)
//!
//! Both providers can share one connection pool and plug into the session
//! through [`DirectionsProvider`] and [`MapMatchingProvider`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{NavigationError, Result};
use crate::providers::{DirectionsProvider, MapMatchingProvider, ProviderFuture};
use crate::route::RouteSet;
use crate::session::{RequestPurpose, RouteRequest, SnapRequest};
use crate::GpsPoint;

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";
const MAX_IDLE_PER_HOST: usize = 8;

/// Connection settings shared by the Mapbox providers.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub access_token: String,
    /// Scheme and host, without a trailing slash
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Instruction language for directions
    pub language: String,
}

impl HttpProviderConfig {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            language: "en".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

/// Pooled HTTP client with retry and backoff.
struct MapboxClient {
    client: Client,
    config: HttpProviderConfig,
    consecutive_429s: AtomicU32,
}

impl MapboxClient {
    fn new(config: HttpProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(30))
            .timeout(config.timeout)
            .build()
            .map_err(|e| NavigationError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            consecutive_429s: AtomicU32::new(0),
        })
    }

    fn record_429(&self) -> Duration {
        let count = self.consecutive_429s.fetch_add(1, Ordering::Relaxed) + 1;
        // Exponential backoff: 1s, 2s, 4s max
        let backoff = Duration::from_millis(500 * (1 << count.min(3)));
        warn!("[Http] Got 429! Consecutive: {}, backing off {:?}", count, backoff);
        backoff
    }

    /// GET `url` with `query`, returning the body of a 2xx response.
    async fn get_bytes(&self, label: &str, url: &str, query: &[(&str, String)]) -> Result<Vec<u8>> {
        let mut retries = 0;
        let req_start = Instant::now();

        loop {
            let response = self
                .client
                .get(url)
                .query(query)
                .query(&[("access_token", self.config.access_token.as_str())])
                .send()
                .await;
            let headers_elapsed = req_start.elapsed();

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        retries += 1;
                        if retries > self.config.max_retries {
                            return Err(NavigationError::Http("Max retries exceeded (429)".to_string()));
                        }
                        let wait = self.record_429();
                        warn!(
                            "[{}] 429 Too Many Requests after {:?}, retry {} with {:?} backoff",
                            label, headers_elapsed, retries, wait
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }

                    self.consecutive_429s.store(0, Ordering::Relaxed);

                    let body_start = Instant::now();
                    let bytes = resp
                        .bytes()
                        .await
                        .map_err(|e| NavigationError::Http(format!("Body download error: {}", e)))?;

                    // Directions reports NoRoute and friends as 4xx with a JSON body
                    if !status.is_success() && !status.is_client_error() {
                        return Err(NavigationError::Http(format!("HTTP {}", status)));
                    }

                    info!(
                        "[{}] HTTP {} headers={:?} body={:?}({:.1}KB) total={:?}",
                        label,
                        status.as_u16(),
                        headers_elapsed,
                        body_start.elapsed(),
                        bytes.len() as f64 / 1024.0,
                        req_start.elapsed()
                    );
                    return Ok(bytes.to_vec());
                }
                Err(e) => {
                    retries += 1;
                    if retries > self.config.max_retries {
                        return Err(NavigationError::Http(format!("Request error: {}", e)));
                    }
                    let wait = Duration::from_millis(200 * (1 << retries));
                    warn!("[{}] Error: {}, retry {} after {:?}", label, e, retries, wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

// ============================================================================
// Directions
// ============================================================================

/// Mapbox Directions v5 provider.
pub struct MapboxDirections {
    inner: Arc<MapboxClient>,
}

impl MapboxDirections {
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(MapboxClient::new(config)?),
        })
    }

    fn url(&self, request: &RouteRequest) -> String {
        format!(
            "{}/directions/v5/{}/{},{};{},{}",
            self.inner.config.base_url,
            request.profile.provider_id(),
            request.origin.longitude,
            request.origin.latitude,
            request.destination.longitude,
            request.destination.latitude
        )
    }

    fn query(&self, request: &RouteRequest) -> Vec<(&'static str, String)> {
        vec![
            ("alternatives", request.include_alternatives.to_string()),
            ("geometries", "geojson".to_string()),
            ("overview", "full".to_string()),
            ("steps", "true".to_string()),
            ("continue_straight", "false".to_string()),
            ("language", self.inner.config.language.clone()),
        ]
    }
}

impl DirectionsProvider for MapboxDirections {
    fn get_route<'a>(&'a self, request: &'a RouteRequest) -> ProviderFuture<'a, Option<RouteSet>> {
        async move {
            let label = format!("Directions {:?}", request.purpose);
            let body = self
                .inner
                .get_bytes(&label, &self.url(request), &self.query(request))
                .await
                .map_err(|e| match request.purpose {
                    RequestPurpose::Reroute => NavigationError::RerouteFailure(e.to_string()),
                    _ => e,
                })?;

            let parse_start = Instant::now();
            let routes = RouteSet::from_directions_json(&body);
            debug!(
                "[Directions] Parsed {} route(s) in {:?}",
                routes.as_ref().map_or(0, |r| 1 + r.alternates.len()),
                parse_start.elapsed()
            );
            Ok(routes)
        }
        .boxed()
    }
}

// ============================================================================
// Map Matching
// ============================================================================

#[derive(Debug, Deserialize)]
struct MatchingResponse {
    code: String,
    #[serde(default)]
    matchings: Vec<serde_json::Value>,
    #[serde(default)]
    tracepoints: Vec<Option<Tracepoint>>,
}

#[derive(Debug, Deserialize)]
struct Tracepoint {
    /// [lng, lat]
    location: [f64; 2],
}

/// Snapped position of the last fix from a Map Matching v5 body.
///
/// When the service matched the trace but dropped the final fix, the raw
/// `last_fix` is returned unchanged.
fn parse_matching_response(body: &[u8], last_fix: GpsPoint) -> Option<GpsPoint> {
    let response: MatchingResponse = match serde_json::from_slice(body) {
        Ok(r) => r,
        Err(e) => {
            warn!("[MapMatching] Malformed response: {}", e);
            return None;
        }
    };
    if response.code != "Ok" || response.matchings.is_empty() {
        debug!("[MapMatching] No matching ({})", response.code);
        return None;
    }

    let snapped = response
        .tracepoints
        .last()
        .and_then(|t| t.as_ref())
        .map(|t| GpsPoint::new(t.location[1], t.location[0]))
        .filter(|p| p.is_valid());
    Some(snapped.unwrap_or(last_fix))
}

/// Mapbox Map Matching v5 provider.
pub struct MapboxMapMatching {
    inner: Arc<MapboxClient>,
}

impl MapboxMapMatching {
    pub fn new(config: HttpProviderConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(MapboxClient::new(config)?),
        })
    }

    /// Share the connection pool of a directions provider.
    pub fn sharing(directions: &MapboxDirections) -> Self {
        Self {
            inner: Arc::clone(&directions.inner),
        }
    }

    fn url(&self, request: &SnapRequest) -> String {
        let coordinates: Vec<String> = request
            .fixes
            .iter()
            .map(|f| format!("{},{}", f.longitude, f.latitude))
            .collect();
        format!(
            "{}/matching/v5/{}/{}",
            self.inner.config.base_url,
            request.profile.provider_id(),
            coordinates.join(";")
        )
    }

    fn query(request: &SnapRequest) -> Vec<(&'static str, String)> {
        let radiuses: Vec<String> = request
            .fixes
            .iter()
            .map(|_| format!("{}", request.radius_m.round() as u64))
            .collect();
        let timestamps: Vec<String> = request
            .fixes
            .iter()
            .map(|f| (f.timestamp_ms / 1000).to_string())
            .collect();
        vec![
            ("geometries", "geojson".to_string()),
            ("radiuses", radiuses.join(";")),
            ("steps", "false".to_string()),
            ("overview", "full".to_string()),
            ("timestamps", timestamps.join(";")),
        ]
    }
}

impl MapMatchingProvider for MapboxMapMatching {
    fn snap<'a>(&'a self, request: &'a SnapRequest) -> ProviderFuture<'a, Option<GpsPoint>> {
        async move {
            let Some(last_fix) = request.fixes.last().map(|f| f.point()) else {
                return Ok(None);
            };
            if request.fixes.len() < 2 {
                return Ok(None);
            }
            let body = self
                .inner
                .get_bytes("MapMatching", &self.url(request), &Self::query(request))
                .await
                .map_err(|e| NavigationError::MapMatchingFailure(e.to_string()))?;
            Ok(parse_matching_response(&body, last_fix))
        }
        .boxed()
    }
}
