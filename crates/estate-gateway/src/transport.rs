//! HTTP transport
//!
//! The transport only moves bytes: no retries, no credential handling
//! beyond attaching the bearer it is given.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

use crate::error::TransportError;
use crate::request::{ApiRequest, ApiResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request`, attaching `Authorization: Bearer <bearer>` when given.
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError>;
}

/// `reqwest`-backed transport against a fixed base URL.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Self::with_client(client, base_url, timeout)
    }

    pub fn with_client(
        client: Client,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }
        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.endpoint(&request.path)?;

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .timeout(self.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::trace!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "HTTP exchange"
        );

        Ok(ApiResponse { status, body })
    }
}
