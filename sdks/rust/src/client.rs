//! HTTP client for interacting with the server.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::{
    error::{Error, Result},
    types::{FaqStats, IncomingResponse, OutgoingMessage},
    widget::ChatTransport,
};

/// Per-request timeout used by [`Client::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the API.
///
/// # Example
///
/// ```rust,no_run
/// use faq_chat_sdk::Client;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("http://localhost:5000")?;
///
/// let reply = client.chat().send("student", "When are exams?").await?;
/// println!("{:?}", reply.answer);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:5000")
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new client whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(base_url, http)
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        Ok(Self { base_url, http })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Access the Chat API.
    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi { client: self }
    }

    /// Fetch statistics about the FAQ table being served.
    pub async fn faq_stats(&self) -> Result<FaqStats> {
        let response = self.http.get(self.url("api/faq/stats")).send().await?;
        Self::handle_response(response).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path)
            .unwrap_or_else(|_| self.base_url.clone())
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

// =============================================================================
// Chat API
// =============================================================================

/// Chat API client.
#[derive(Debug)]
pub struct ChatApi<'a> {
    client: &'a Client,
}

impl ChatApi<'_> {
    /// Ask a question as `role`.
    pub async fn send(
        &self,
        role: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<IncomingResponse> {
        let req = OutgoingMessage {
            role: role.into(),
            message: message.into(),
        };
        self.send_message(&req).await
    }

    /// Post a prepared message.
    ///
    /// The status code is not inspected: any JSON body other than `null` is a
    /// response (an error body simply has no `answer`), anything else is an
    /// error.
    pub async fn send_message(&self, req: &OutgoingMessage) -> Result<IncomingResponse> {
        let response = self
            .client
            .http
            .post(self.client.url("chat"))
            .json(req)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            status = status.as_u16(),
            body_length = body.len(),
            "Chat response received"
        );

        IncomingResponse::from_body(&body)
    }
}

#[async_trait]
impl ChatTransport for Client {
    async fn send(&self, message: &OutgoingMessage) -> Result<IncomingResponse> {
        self.chat().send_message(message).await
    }
}
