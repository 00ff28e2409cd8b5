//! HTTP request executor for the CredHub REST API
//!
//! `HttpClient` is the seam the store issues logical requests through.
//! `ReqwestHttpClient` is the production implementation; tests plug in a fake.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::de::DeserializeOwned;

use super::config::CredHubConfig;
use crate::logging::Logger;
use crate::store::{StoreError, StoreResult};
use crate::types::CancellationToken;
use crate::log_debug;

const APPLICATION_JSON: &str = "application/json";

/// Response body, read chunk by chunk
pub type BodyStream = Pin<Box<dyn Stream<Item = StoreResult<Vec<u8>>> + Send>>;

/// Status line and body of one HTTP exchange
///
/// The response owns the body stream. Reading it (`bytes`, `text`, `json`)
/// consumes the response; dropping it unread releases the connection.
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    body: BodyStream,
}

impl HttpResponse {
    pub fn new(status: u16, status_text: impl Into<String>, body: BodyStream) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body,
        }
    }

    /// Response with a fully buffered body
    pub fn from_bytes(
        status: u16,
        status_text: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        let body = body.into();
        let stream = futures::stream::once(async move { Ok::<_, StoreError>(body) });
        Self::new(status, status_text, Box::pin(stream))
    }

    /// True for 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Read the whole body
    pub async fn bytes(mut self, cancel: &CancellationToken) -> StoreResult<Vec<u8>> {
        let mut buf = Vec::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(StoreError::Cancelled),
                chunk = self.body.next() => chunk,
            };
            match chunk {
                Some(chunk) => buf.extend_from_slice(&chunk?),
                None => return Ok(buf),
            }
        }
    }

    /// Read the body as text, replacing invalid UTF-8
    pub async fn text(self, cancel: &CancellationToken) -> StoreResult<String> {
        let bytes = self.bytes(cancel).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read and deserialize a JSON body
    pub async fn json<T: DeserializeOwned>(self, cancel: &CancellationToken) -> StoreResult<T> {
        let bytes = self.bytes(cancel).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("status_text", &self.status_text)
            .finish()
    }
}

/// Issues one HTTP request against the configured server
///
/// `path` includes the query string and is appended verbatim to the base URL.
/// Transport failures and cancellation come back as `Err`; any HTTP status,
/// including 4xx/5xx, comes back as `Ok(HttpResponse)`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn do_request(
        &self,
        cancel: &CancellationToken,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> StoreResult<HttpResponse>;
}

/// `HttpClient` over reqwest with rustls
pub struct ReqwestHttpClient {
    base_url: String,
    client: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl ReqwestHttpClient {
    /// Validate the config and build a TLS client from it
    pub fn new(config: &CredHubConfig, logger: Arc<dyn Logger>) -> StoreResult<Self> {
        let certs = config.validate()?;

        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if config.server_insecure_skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(ca) = certs.server_ca_cert {
            builder = builder.tls_built_in_root_certs(false).add_root_certificate(ca);
        }
        if let Some(identity) = certs.client_identity {
            builder = builder.identity(identity);
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
            logger,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn do_request(
        &self,
        cancel: &CancellationToken,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> StoreResult<HttpResponse> {
        cancel.check()?;

        let url = format!("{}{}", self.base_url, path);
        log_debug!(self.logger, "credhub request: {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, APPLICATION_JSON).body(body);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StoreError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        log_debug!(self.logger, "credhub response: {} {}", status.as_u16(), url);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StoreError::from));
        Ok(HttpResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            Box::pin(body),
        ))
    }
}

impl std::fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestHttpClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use std::time::Duration;

    #[tokio::test]
    async fn test_buffered_response() {
        let resp = HttpResponse::from_bytes(200, "OK", r#"{"status":"UP"}"#);
        assert!(resp.is_success());
        assert!(!resp.is_not_found());

        #[derive(serde::Deserialize)]
        struct Health {
            status: String,
        }
        let health: Health = resp.json(&CancellationToken::new()).await.unwrap();
        assert_eq!(health.status, "UP");
    }

    #[tokio::test]
    async fn test_chunked_body_is_joined() {
        let chunks: Vec<StoreResult<Vec<u8>>> =
            vec![Ok(b"hello ".to_vec()), Ok(b"world".to_vec())];
        let body = Box::pin(futures::stream::iter(chunks));
        let resp = HttpResponse::new(500, "Internal Server Error", body);
        assert!(!resp.is_success());
        assert_eq!(resp.text(&CancellationToken::new()).await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_body_read_is_cancellable() {
        let body = Box::pin(futures::stream::pending::<StoreResult<Vec<u8>>>());
        let resp = HttpResponse::new(200, "OK", body);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(resp.bytes(&cancel).await, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_malformed_json_is_protocol_error() {
        let resp = HttpResponse::from_bytes(200, "OK", "{oops");
        let result: StoreResult<serde_json::Value> = resp.json(&CancellationToken::new()).await;
        assert!(matches!(result, Err(StoreError::Protocol(_))));
    }

    #[test]
    fn test_client_trims_base_url() {
        let mut config = CredHubConfig::new("https://localhost:8844/", "/ns");
        config.server_insecure_skip_verify = true;
        let client = ReqwestHttpClient::new(&config, Arc::new(NoOpLogger::new())).unwrap();
        assert_eq!(client.base_url(), "https://localhost:8844");
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let mut config = CredHubConfig::new("https://localhost:8844", "/ns");
        config.server_insecure_skip_verify = true;
        let client = ReqwestHttpClient::new(&config, Arc::new(NoOpLogger::new())).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = client.do_request(&cancel, Method::GET, "/health", None).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_request() {
        // Accepts the connection and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let mut config = CredHubConfig::new(format!("http://{}", addr), "/ns");
        config.server_insecure_skip_verify = true;
        let client = ReqwestHttpClient::new(&config, Arc::new(NoOpLogger::new())).unwrap();

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.do_request(&cancel, Method::GET, "/health", None),
        )
        .await
        .expect("cancellation should end the request");
        assert!(matches!(result, Err(StoreError::Cancelled)));
        server.abort();
    }
}
