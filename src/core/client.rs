//! Outbound HTTP calls with classification and retry.
//!
//! [`DownstreamClient`] performs one GET against a configured upstream,
//! turns the outcome into either a decoded value or a [`RemoteError`], and
//! repeats the call according to its [`RetrySpec`]. Transport failures and
//! timeouts count as `ServerError`; decode failures are `ValidationError`
//! and are never retried.

use crate::core::retry::RetrySpec;
use crate::utils::error::{GatewayError, RemoteError, Result};
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct DownstreamClient {
    client: Client,
    base_url: Url,
    label: String,
    retry: Arc<RetrySpec>,
    timeout: Duration,
}

impl DownstreamClient {
    /// `label` names the upstream resource in log lines and not-found
    /// messages, e.g. "movie info".
    pub fn new(label: &str, base_url: &str, retry: RetrySpec, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| GatewayError::InvalidConfigValueError {
            field: format!("{} url", label),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            label: label.to_string(),
            retry: Arc::new(retry),
            timeout,
        })
    }

    /// Build `{base_url}/{segment}?{query}`; the segment is percent-encoded.
    pub fn endpoint(&self, segment: Option<&str>, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Some(segment) = segment {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push(segment);
            }
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Fetch and decode one JSON document, retrying per the policy.
    ///
    /// `key` is only used to describe a 404 that came back without a body.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        url: Url,
        key: &str,
    ) -> std::result::Result<T, RemoteError> {
        let target = url.to_string();
        self.retry
            .run(&target, |attempt| {
                let url = url.clone();
                async move {
                    tracing::debug!(upstream = %self.label, %url, attempt, "Calling downstream");
                    let response = self.open(url, Some(key)).await?;
                    let body = tokio::time::timeout(self.timeout, response.bytes())
                        .await
                        .map_err(|_| self.timed_out())?
                        .map_err(|e| RemoteError::transport(e.to_string()))?;
                    serde_json::from_slice(&body).map_err(|e| {
                        RemoteError::validation(format!(
                            "Malformed {} payload: {}",
                            self.label, e
                        ))
                    })
                }
            })
            .await
    }

    /// Open a newline-delimited JSON stream and decode one item per line.
    ///
    /// Only opening the stream is retried. The stream ends when the upstream
    /// closes it, or after yielding the first error.
    pub fn invoke_stream<T>(&self, url: Url) -> BoxStream<'static, std::result::Result<T, RemoteError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let this = self.clone();

        Box::pin(async_stream::stream! {
            let target = url.to_string();
            let opened = this
                .retry
                .run(&target, |_| this.open(url.clone(), None))
                .await;

            let response = match opened {
                Ok(response) => response,
                Err(err) => {
                    yield Err(err);
                    return;
                }
            };

            tracing::info!(upstream = %this.label, url = %target, "Downstream stream opened");
            let mut chunks = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = chunks.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(RemoteError::transport(e.to_string()));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    match this.decode_line::<T>(&line) {
                        Some(Ok(item)) => yield Ok(item),
                        Some(Err(err)) => {
                            yield Err(err);
                            return;
                        }
                        None => {}
                    }
                }
            }

            if let Some(item) = this.decode_line::<T>(&buffer) {
                yield item;
            }
            tracing::info!(upstream = %this.label, url = %target, "Downstream stream closed");
        })
    }

    fn decode_line<T: DeserializeOwned>(&self, line: &[u8]) -> Option<std::result::Result<T, RemoteError>> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }
        Some(serde_json::from_slice(line).map_err(|e| {
            RemoteError::validation(format!("Malformed {} stream item: {}", self.label, e))
        }))
    }

    /// Send the request and classify the status. A successful response is
    /// returned with its body unread.
    ///
    /// `key` is `None` when opening a stream endpoint.
    async fn open(&self, url: Url, key: Option<&str>) -> std::result::Result<Response, RemoteError> {
        let target = url.to_string();
        let response = tokio::time::timeout(self.timeout, self.client.get(url).send())
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| RemoteError::transport(format!("{} unreachable: {}", self.label, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = tokio::time::timeout(self.timeout, response.text())
            .await
            .map_err(|_| self.timed_out())?
            .unwrap_or_default();

        if status.is_server_error() {
            tracing::error!(upstream = %self.label, status = status.as_u16(), "Downstream server error");
        }

        if status.as_u16() == 404 && body.trim().is_empty() {
            let message = match key {
                Some(key) => format!("There is no {} available for passed in id: {}", self.label, key),
                None => format!("There is no {} stream available at {}", self.label, target),
            };
            return Err(RemoteError::not_found(message));
        }
        Err(RemoteError::classify(status.as_u16(), &body))
    }

    fn timed_out(&self) -> RemoteError {
        RemoteError::transport(format!(
            "{} did not answer within {} ms",
            self.label,
            self.timeout.as_millis()
        ))
    }
}
