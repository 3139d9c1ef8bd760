pub mod error;
pub mod types;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use rand::{thread_rng, Rng};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::{GenerationSettings, KeyPlacement};

pub use error::ProviderError;
pub use types::{GenerateContentRequest, GenerateContentResponse, GenerationConfig};

const API_KEY_HEADER: &str = "x-goog-api-key";
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Lifecycle of one provider call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallState {
    Idle,
    AwaitingProvider,
}

/// Holds a call in `AwaitingProvider`; dropping it (completion, error or a
/// cancelled future) moves the call back to `Idle`.
struct AwaitingProvider {
    in_flight: Arc<AtomicUsize>,
}

impl AwaitingProvider {
    fn enter(in_flight: &Arc<AtomicUsize>) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(in_flight = now, "generation call -> AwaitingProvider");
        Self {
            in_flight: Arc::clone(in_flight),
        }
    }
}

impl Drop for AwaitingProvider {
    fn drop(&mut self) {
        let left = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(in_flight = left, "generation call -> Idle");
    }
}

/// Outbound client for the text-generation backend.
#[derive(Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    settings: GenerationSettings,
    in_flight: Arc<AtomicUsize>,
}

impl GenerationClient {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> CallState {
        if self.in_flight() == 0 {
            CallState::Idle
        } else {
            CallState::AwaitingProvider
        }
    }

    /// Sends `prompt` and returns the first candidate's text.
    ///
    /// `Ok(None)` means the backend answered 2xx without usable text; callers
    /// substitute their own placeholder. Transient failures are retried up to
    /// `max_retries` times with jittered exponential backoff.
    pub async fn generate(
        &self,
        prompt: &str,
        config: Option<GenerationConfig>,
    ) -> Result<Option<String>, ProviderError> {
        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey)?;
        let body = GenerateContentRequest::single_prompt(prompt, config);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt(api_key, &body).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_transient() && attempt <= self.settings.max_retries => {
                    let delay = backoff_delay(self.settings.retry_base, attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient generation failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(
        &self,
        api_key: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<Option<String>, ProviderError> {
        let _call = AwaitingProvider::enter(&self.in_flight);

        let request = self.http.post(&self.settings.endpoint).json(body);
        let request = match self.settings.key_placement {
            KeyPlacement::Query => request.query(&[("key", api_key)]),
            KeyPlacement::Header => request.header(API_KEY_HEADER, api_key),
        };

        let exchange = async {
            // without_url: the query string may carry the key
            let response = request
                .send()
                .await
                .map_err(|e| ProviderError::Transport(e.without_url()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<unable to read response body>".to_string());
                return Err(ProviderError::Status { status, body });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| ProviderError::Transport(e.without_url()))?;

            match serde_json::from_slice::<GenerateContentResponse>(&bytes) {
                Ok(envelope) => Ok(envelope.first_text()),
                Err(err) => {
                    warn!(error = %err, "generation response was not a candidate envelope");
                    Ok(None)
                }
            }
        };

        timeout(self.settings.timeout, exchange)
            .await
            .map_err(|_| ProviderError::Timeout(self.settings.timeout.as_millis()))?
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let exp = base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
    let jitter_ms = thread_rng().gen_range(0..=base.as_millis().min(u64::MAX as u128) as u64);
    exp.saturating_add(Duration::from_millis(jitter_ms))
        .min(MAX_BACKOFF)
}
