//! HTTP dispatcher for the print gateway.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use zpl_labels_core::BatchPrintRequest;

use crate::config::GatewayConfig;
use crate::error::DispatchError;
use crate::result::{GatewayResponse, PrintJobResult};
use crate::retry::retry_op;
use crate::status::PrinterStatus;

/// Longest error body kept in [`DispatchError::Status`].
const MAX_ERROR_BODY: usize = 512;

// ── Traits ──────────────────────────────────────────────────────────────

/// Send a batch request to a print backend.
///
/// Implementations resolve transport faults into [`DispatchError`]; a
/// partially printed batch is a successful dispatch whose result carries the
/// counts.
#[async_trait]
pub trait BatchDispatcher: Send + Sync {
    /// Dispatch `request`, aborting when `cancel` fires.
    async fn dispatch(
        &self,
        request: &BatchPrintRequest,
        cancel: &CancellationToken,
    ) -> Result<PrintJobResult, DispatchError>;
}

// ── Gateway client ──────────────────────────────────────────────────────

/// [`BatchDispatcher`] speaking JSON over HTTP to the print gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Build a client for `config`.
    pub fn new(config: GatewayConfig) -> Result<Self, DispatchError> {
        let base = config.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(DispatchError::InvalidConfig(format!(
                "gateway URL must start with http:// or https:// (got '{base}')"
            )));
        }
        if config.retry.max_attempts == 0 {
            return Err(DispatchError::InvalidConfig(
                "max_attempts must be >= 1".into(),
            ));
        }
        let client = Client::builder()
            .connect_timeout(config.timeouts.connect)
            .timeout(config.timeouts.request)
            .build()
            .map_err(|e| DispatchError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Query the gateway's printer status endpoint.
    pub async fn printer_status(
        &self,
        cancel: &CancellationToken,
    ) -> Result<PrinterStatus, DispatchError> {
        let url = self.config.status_url();
        retry_op(&self.config.retry, cancel, |attempt| {
            let url = url.clone();
            async move {
                debug!(%url, attempt, "querying printer status");
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| self.classify(&url, e))?;
                self.handle_response(&url, response).await
            }
        })
        .await
    }

    async fn send_once(
        &self,
        url: &str,
        request: &BatchPrintRequest,
        attempt: u32,
    ) -> Result<PrintJobResult, DispatchError> {
        debug!(
            url,
            attempt,
            batch_id = request.batch_id,
            labels = request.len(),
            "posting batch"
        );
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;
        let body: GatewayResponse = self.handle_response(url, response).await?;
        let result = body.into_result()?;
        if result.total_labels as usize != request.len() {
            return Err(DispatchError::InconsistentResult(format!(
                "gateway reported {} labels for a batch of {}",
                result.total_labels,
                request.len()
            )));
        }
        Ok(result)
    }

    /// Non-success statuses become [`DispatchError::Status`]; success bodies
    /// are decoded as `T`.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, DispatchError> {
        let status = response.status();
        let text = response.text().await.map_err(|e| self.classify(url, e))?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                code: status.as_u16(),
                body: truncate(text, MAX_ERROR_BODY),
            });
        }

        serde_json::from_str(&text).map_err(|e| DispatchError::Decode(e.to_string()))
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> DispatchError {
        DispatchError::from_reqwest(url, self.config.timeouts.request, err)
    }
}

#[async_trait]
impl BatchDispatcher for GatewayClient {
    async fn dispatch(
        &self,
        request: &BatchPrintRequest,
        cancel: &CancellationToken,
    ) -> Result<PrintJobResult, DispatchError> {
        let url = self.config.batch_url();
        let result = retry_op(&self.config.retry, cancel, |attempt| {
            self.send_once(&url, request, attempt)
        })
        .await?;
        info!(
            batch_id = result.batch_id,
            total = result.total_labels,
            successful = result.successful_prints,
            failed = result.failed_prints,
            simulated = result.simulated,
            "gateway processed batch"
        );
        Ok(result)
    }
}

fn truncate(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
        s.push_str("...");
    }
    s
}
