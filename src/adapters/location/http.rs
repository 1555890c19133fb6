//! HTTP location source. Reads a fix from a device-local positioning bridge
//! (a small service in front of the GNSS receiver) that answers
//! `GET <url>?high_accuracy=<bool>` with `{"latitude": .., "longitude": ..}`.

use crate::domain::{Coordinate, LocationError};
use crate::ports::{LocationPort, LocationRequest};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Fix {
    latitude: f64,
    longitude: f64,
}

pub struct HttpLocationSource {
    client: Client,
    url: String,
}

impl HttpLocationSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    fn cache_control(request: &LocationRequest) -> String {
        if request.maximum_age.is_zero() {
            "no-cache".to_string()
        } else {
            format!("max-age={}", request.maximum_age.as_secs())
        }
    }
}

fn map_reqwest(e: reqwest::Error) -> LocationError {
    if e.is_timeout() {
        LocationError::Timeout
    } else {
        LocationError::Unavailable(format!("positioning bridge unreachable: {}", e))
    }
}

#[async_trait::async_trait]
impl LocationPort for HttpLocationSource {
    async fn current_position(
        &self,
        request: &LocationRequest,
    ) -> Result<Coordinate, LocationError> {
        let res = self
            .client
            .get(&self.url)
            .query(&[("high_accuracy", request.high_accuracy)])
            .header(header::CACHE_CONTROL, Self::cache_control(request))
            .timeout(request.timeout)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            let text = text.trim();
            return Err(match status {
                StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                    LocationError::PermissionDenied(if text.is_empty() {
                        "User denied location access.".to_string()
                    } else {
                        text.to_string()
                    })
                }
                StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => LocationError::Timeout,
                _ => LocationError::Unavailable(format!(
                    "positioning bridge error {}: {}",
                    status, text
                )),
            });
        }

        let fix: Fix = res.json().await.map_err(|e| {
            LocationError::Unavailable(format!("positioning bridge sent a bad reading: {}", e))
        })?;
        let coordinate = Coordinate::new(fix.latitude, fix.longitude);
        if !coordinate.is_valid() {
            return Err(LocationError::Unavailable(format!(
                "positioning bridge sent an impossible reading {}",
                coordinate
            )));
        }
        debug!(position = %coordinate, "bridge location reading");
        Ok(coordinate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the bridge URL plus the raw request.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = sock.read(&mut buf).await.unwrap();
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            sock.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (format!("http://{}/position", addr), handle)
    }

    #[tokio::test]
    async fn reads_fix_and_asks_for_fresh_reading() {
        let (url, server) =
            serve_once("200 OK", r#"{"latitude":-23.6675,"longitude":-46.4608}"#).await;
        let source = HttpLocationSource::new(url);
        let got = source
            .current_position(&LocationRequest::default())
            .await
            .unwrap();
        assert_eq!(got, Coordinate::new(-23.6675, -46.4608));

        let raw = server.await.unwrap().to_lowercase();
        assert!(raw.contains("high_accuracy=true"));
        assert!(raw.contains("cache-control: no-cache"));
    }

    #[tokio::test]
    async fn forbidden_is_permission_denied() {
        let (url, _server) = serve_once("403 Forbidden", "User denied Geolocation").await;
        let err = HttpLocationSource::new(url)
            .current_position(&LocationRequest::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LocationError::PermissionDenied("User denied Geolocation".into())
        );
    }

    #[tokio::test]
    async fn out_of_range_reading_is_rejected() {
        let (url, _server) = serve_once("200 OK", r#"{"latitude":123.0,"longitude":0.0}"#).await;
        let err = HttpLocationSource::new(url)
            .current_position(&LocationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LocationError::Unavailable(_)));
    }

    #[test]
    fn cache_control_honours_maximum_age() {
        let mut req = LocationRequest::default();
        assert_eq!(HttpLocationSource::cache_control(&req), "no-cache");
        req.maximum_age = Duration::from_secs(30);
        assert_eq!(HttpLocationSource::cache_control(&req), "max-age=30");
    }
}
