// ABOUTME: Single-attempt HTTP reachability probe.
// ABOUTME: Success means the request completed; the status code and body are not inspected.

use async_trait::async_trait;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use super::HealthEndpoint;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    #[error("HTTP handshake with {endpoint} failed: {message}")]
    Handshake { endpoint: String, message: String },

    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },
}

/// One health probe attempt.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, endpoint: &HealthEndpoint) -> Result<(), ProbeError>;
}

/// HTTP/1.1 GET over a fresh TCP connection per attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpProbe;

impl HttpProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, endpoint: &HealthEndpoint) -> Result<(), ProbeError> {
        let url = endpoint.to_string();

        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(|source| ProbeError::Connect {
                endpoint: url.clone(),
                source,
            })?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ProbeError::Handshake {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("health probe connection error: {}", e);
            }
        });

        let req = hyper::Request::builder()
            .method("GET")
            .uri(&endpoint.path)
            .header("Host", endpoint.authority())
            .header("User-Agent", concat!("deckhand/", env!("CARGO_PKG_VERSION")))
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| ProbeError::Request {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ProbeError::Request {
                endpoint: url.clone(),
                message: e.to_string(),
            })?;

        tracing::debug!(endpoint = %url, status = %resp.status(), "health probe answered");
        Ok(())
    }
}
