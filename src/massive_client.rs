use crate::config::{self, AppConfig};
use crate::error::FetchError;
use anyhow::{Context, Result};
use reqwest::{Client, header};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// -----------------------------------------------
// MASSIVE SNAPSHOT CLIENT
// -----------------------------------------------
pub struct MassiveClient {
    client: Client,
    config: Arc<AppConfig>,
}

impl MassiveClient {
    pub fn new(config: Arc<AppConfig>) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout)?,
            config,
        })
    }

    /// Fetch the raw options snapshot for one underlying.
    ///
    /// Single attempt, no retries. The body must be a JSON object or array.
    pub async fn fetch_snapshot(&self, symbol: &str) -> Result<Value, FetchError> {
        let base_url = self
            .config
            .screener_url
            .as_deref()
            .ok_or(FetchError::ConfigMissing("MASSIVE_SCREENER_URL"))?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(FetchError::ConfigMissing("MASSIVE_API_KEY"))?;

        let symbol = match symbol.trim() {
            "" => config::DEFAULT_SYMBOL,
            s => s,
        };
        let url = config::massive_snapshot_url(base_url, symbol);
        let limit = self.config.page_limit.to_string();
        let start_time = Instant::now();

        debug!("GET {} (symbol {})", url, symbol);

        let res = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", api_key),
                ("order", config::SNAPSHOT_ORDER),
                ("limit", limit.as_str()),
                ("sort", config::SNAPSHOT_SORT),
            ])
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = res.status();
        info!(
            symbol,
            status = status.as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Massive snapshot response"
        );

        let res = res.error_for_status().map_err(|e| self.classify(e))?;
        let text = res.text().await.map_err(|e| self.classify(e))?;

        let data: Value = serde_json::from_str(&text).map_err(|e| {
            let preview: String = text.chars().take(200).collect();
            warn!("Non-JSON body from Massive: {}", preview);
            FetchError::MalformedResponse(format!("invalid JSON ({})", e))
        })?;

        match data {
            Value::Object(_) | Value::Array(_) => Ok(data),
            _ => Err(FetchError::MalformedResponse(
                "expected a JSON object or array".to_string(),
            )),
        }
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            warn!("Massive request timed out after {:?}", self.config.timeout);
            FetchError::Timeout {
                seconds: self.config.timeout.as_secs_f64(),
            }
        } else {
            // Drop the URL from the message so the API key never leaks into responses
            let err = err.without_url();
            warn!("Massive request failed: {}", err);
            FetchError::RequestFailed(err.to_string())
        }
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(config::USER_AGENT)
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}
