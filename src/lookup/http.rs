//! HTTP client for the hosted geolocation API

use crate::core::{LocationEstimate, TowerIdentity};
use crate::lookup::{GeolocationService, LookupError, LookupResult};
use crate::utils::config::LookupConfig;
use crate::validation::error::{GeocellError, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CellTower {
    cell_id: u64,
    location_area_code: u32,
    mobile_country_code: u16,
    mobile_network_code: u16,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeolocateRequest {
    cell_towers: Vec<CellTower>,
}

impl GeolocateRequest {
    fn single(identity: &TowerIdentity) -> Self {
        Self {
            cell_towers: vec![CellTower {
                cell_id: identity.cell_id,
                location_area_code: identity.location_area_code,
                mobile_country_code: identity.mobile_country_code,
                mobile_network_code: identity.mobile_network_code,
            }],
        }
    }
}

/// Geolocation lookups over HTTP, one tower per request
pub struct HttpGeolocationService {
    client: Client,
    url: String,
    timeout_ms: u64,
}

impl HttpGeolocationService {
    /// Build a client from lookup settings
    ///
    /// Every request carries `config.timeout_ms` as its total timeout.
    pub fn new(config: &LookupConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_millis(config.timeout_ms));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| GeocellError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.request_url(),
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(&self, error: reqwest::Error) -> LookupError {
        if error.is_timeout() {
            LookupError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            LookupError::Connection {
                details: error.to_string(),
            }
        }
    }
}

impl GeolocationService for HttpGeolocationService {
    fn lookup(&self, identity: &TowerIdentity) -> LookupResult<LocationEstimate> {
        let response = self
            .client
            .post(&self.url)
            .json(&GeolocateRequest::single(identity))
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LookupError::from_status(status.as_u16()));
        }

        let location: LocationEstimate = response.json().map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                LookupError::Decode { details: e.to_string() }
            }
        })?;

        Ok(location.stripped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GeoPoint;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve a single canned HTTP response on a local port
    fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(value) = lower.strip_prefix("content-length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8(request_body).unwrap()
        });

        (format!("http://{}/geolocate?key={{key}}", addr), handle)
    }

    fn config_for(endpoint: String) -> LookupConfig {
        LookupConfig {
            endpoint,
            api_key: "test-key".to_string(),
            timeout_ms: 2000,
            use_system_proxy: false,
            ..LookupConfig::default()
        }
    }

    #[test]
    fn test_request_body_shape() {
        let request = GeolocateRequest::single(&TowerIdentity::new(286, 2, 54110, 51861));
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"cellTowers": [{
                "cellId": 51861,
                "locationAreaCode": 54110,
                "mobileCountryCode": 286,
                "mobileNetworkCode": 2
            }]})
        );
    }

    #[test]
    fn test_url_carries_api_key() {
        let config = config_for("https://example.invalid/geo?key={key}".into());
        let service = HttpGeolocationService::new(&config).unwrap();
        assert_eq!(service.url(), "https://example.invalid/geo?key=test-key");
    }

    #[test]
    fn test_successful_lookup() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"location":{"lat":40.7018894,"lng":29.8912659},"accuracy":3243.0}"#,
        );
        let service = HttpGeolocationService::new(&config_for(endpoint)).unwrap();

        let location = service.lookup(&TowerIdentity::new(286, 2, 54110, 51861)).unwrap();
        assert_eq!(location.position, GeoPoint::new(40.7018894, 29.8912659));
        assert_eq!(location.accuracy, 3243.0);

        let request: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(request["cellTowers"][0]["cellId"], 51861);
    }

    #[test]
    fn test_not_found_maps_reason() {
        let (endpoint, server) = serve_once("HTTP/1.1 404 Not Found", r#"{"error":{}}"#);
        let service = HttpGeolocationService::new(&config_for(endpoint)).unwrap();

        let err = service.lookup(&TowerIdentity::new(286, 2, 54108, 0)).unwrap_err();
        assert_eq!(err, LookupError::from_status(404));
        server.join().unwrap();
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK", r#"{"unexpected":true}"#);
        let service = HttpGeolocationService::new(&config_for(endpoint)).unwrap();

        let err = service.lookup(&TowerIdentity::new(286, 2, 54108, 0)).unwrap_err();
        assert!(matches!(err, LookupError::Decode { .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}/geolocate?key={{key}}", listener.local_addr().unwrap());
        let server = thread::spawn(move || {
            // Hold the connection open without answering
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(600));
            drop(stream);
        });

        let config = LookupConfig {
            timeout_ms: 150,
            ..config_for(endpoint)
        };
        let service = HttpGeolocationService::new(&config).unwrap();

        let err = service.lookup(&TowerIdentity::new(286, 2, 54108, 0)).unwrap_err();
        assert_eq!(err, LookupError::Timeout { timeout_ms: 150 });
        server.join().unwrap();
    }
}
