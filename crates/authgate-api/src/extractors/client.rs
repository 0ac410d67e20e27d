//! Client IP and device label.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;

const UNKNOWN: &str = "unknown";

/// Where a request came from, recorded on sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    /// First `X-Forwarded-For` hop, else `X-Real-IP`.
    pub ip: String,
    /// `User-Agent` header.
    pub device: String,
}

impl ClientInfo {
    /// Pick a device label, preferring the one sent in the body.
    pub fn device_or(&self, body_device: Option<String>) -> String {
        body_device
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| self.device.clone())
    }

    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let ip = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .or_else(|| header("x-real-ip"))
            .unwrap_or(UNKNOWN)
            .to_string();

        let device = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Self { ip, device }
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_first_forwarded_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        headers.insert(USER_AGENT, HeaderValue::from_static("curl/8.5"));

        let info = ClientInfo::from_headers(&headers);
        assert_eq!(info.ip, "203.0.113.7");
        assert_eq!(info.device, "curl/8.5");
    }

    #[test]
    fn test_missing_headers_fall_back() {
        let info = ClientInfo::from_headers(&HeaderMap::new());
        assert_eq!(info.ip, UNKNOWN);
        assert_eq!(info.device, UNKNOWN);
        assert_eq!(info.device_or(Some("  Pixel 8 ".into())), "Pixel 8");
        assert_eq!(info.device_or(Some("".into())), UNKNOWN);
    }
}
