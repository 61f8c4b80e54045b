//! OData Client module
//!
//! HTTP client for downloading `$metadata` from Dynamics 365 endpoints
//! (Dataverse and Finance & Operations)

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// OData client errors
#[derive(Error, Debug)]
pub enum ODataError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unauthorized ({0}): check the bearer token. {1}")]
    Unauthorized(u16, String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Metadata client for D365 APIs
#[derive(Debug)]
pub struct MetadataClient {
    http_client: Client,
}

impl MetadataClient {
    /// Create a new metadata client
    ///
    /// # Arguments
    /// * `timeout` - Request timeout; `$metadata` for large orgs runs to tens of MB
    /// * `insecure_ssl` - Skip SSL certificate verification
    pub fn new(timeout: Duration, insecure_ssl: bool) -> Result<Self, ODataError> {
        let mut builder = Client::builder().timeout(timeout);
        if insecure_ssl {
            tracing::warn!("SSL certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http_client: builder.build()?,
        })
    }

    /// Resolve the `$metadata` URL for an endpoint
    ///
    /// Accepts either a service root (e.g. "https://org.crm.dynamics.com/api/data/v9.2")
    /// or a URL that already points at `$metadata`.
    pub fn metadata_url(endpoint: &str) -> String {
        let endpoint = endpoint.trim();
        if endpoint.ends_with("$metadata") {
            return endpoint.to_string();
        }

        if endpoint.ends_with('/') {
            format!("{}$metadata", endpoint)
        } else {
            format!("{}/$metadata", endpoint)
        }
    }

    /// Fetch $metadata XML
    pub async fn fetch_metadata(&self, url: &str, token: &str) -> Result<String, ODataError> {
        tracing::info!("Fetching metadata from {}", url);

        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Metadata request failed: {}", status);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ODataError::Unauthorized(status.as_u16(), body)
                }
                _ => ODataError::ServerError(status.as_u16(), body),
            });
        }

        // Get response as bytes to handle large XML and encoding issues
        let bytes = response.bytes().await.map_err(|e| {
            ODataError::ParseError(format!("Failed to read metadata bytes: {}", e))
        })?;

        tracing::info!("Received {} KB of metadata", bytes.len() / 1024);

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odata::test_server::serve_once;

    #[test]
    fn test_metadata_url_from_service_root() {
        assert_eq!(
            MetadataClient::metadata_url("https://org.crm.dynamics.com/api/data/v9.2/"),
            "https://org.crm.dynamics.com/api/data/v9.2/$metadata"
        );
        assert_eq!(
            MetadataClient::metadata_url("https://org.operations.dynamics.com/data"),
            "https://org.operations.dynamics.com/data/$metadata"
        );
    }

    #[test]
    fn test_metadata_url_verbatim() {
        let url = "https://org.crm.dynamics.com/api/data/v9.2/$metadata";
        assert_eq!(MetadataClient::metadata_url(url), url);
    }

    #[test]
    fn test_connection_refused_is_http_error() {
        let client = MetadataClient::new(Duration::from_secs(5), false).unwrap();
        let result = tokio_test::block_on(
            client.fetch_metadata("http://127.0.0.1:1/api/data/v9.2/$metadata", "token"),
        );
        assert!(matches!(result, Err(ODataError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_and_returns_body() {
        let (url, request) = serve_once("200 OK", "<Edmx/>").await;
        let client = MetadataClient::new(Duration::from_secs(5), false).unwrap();

        let xml = client.fetch_metadata(&url, "secret-token").await.unwrap();
        assert_eq!(xml, "<Edmx/>");

        let request = request.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /api/data/v9.2/$metadata "));
        assert!(request.contains("authorization: bearer secret-token"));
        assert!(request.contains("accept: application/xml"));
    }

    #[tokio::test]
    async fn test_unauthorized_statuses() {
        for (status, code) in [("401 Unauthorized", 401), ("403 Forbidden", 403)] {
            let (url, _request) = serve_once(status, "denied").await;
            let client = MetadataClient::new(Duration::from_secs(5), false).unwrap();

            match client.fetch_metadata(&url, "expired").await {
                Err(ODataError::Unauthorized(got, body)) => {
                    assert_eq!(got, code);
                    assert_eq!(body, "denied");
                }
                other => panic!("expected Unauthorized for {}, got {:?}", status, other),
            }
        }
    }

    #[tokio::test]
    async fn test_other_failures_are_server_errors() {
        for (status, code) in [("500 Internal Server Error", 500), ("404 Not Found", 404)] {
            let (url, _request) = serve_once(status, "boom").await;
            let client = MetadataClient::new(Duration::from_secs(5), false).unwrap();

            match client.fetch_metadata(&url, "token").await {
                Err(ODataError::ServerError(got, body)) => {
                    assert_eq!(got, code);
                    assert_eq!(body, "boom");
                }
                other => panic!("expected ServerError for {}, got {:?}", status, other),
            }
        }
    }
}
