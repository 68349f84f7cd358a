use crate::answer::{self, ScreenerLookup};
use crate::config::{self, AppConfig};
use crate::error::FetchError;
use crate::massive_client::MassiveClient;
use crate::models::{OptionRecord, Payload, RequestParameters, ScoringMode};
use crate::processor;
use crate::prompt::{self, AugmentedPrompt};
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of one screener query
#[derive(Debug, Clone, Serialize)]
pub struct ScreenerResult {
    pub symbol: String,
    pub option_side: String,
    pub risk_profile: String,
    pub raw_count: usize,
    pub top_signals_count: usize,
    pub top_signals: Vec<OptionRecord>,
}

/// Fetch, normalize, score and select, shared by every HTTP entry point.
pub struct ScreenerService {
    client: MassiveClient,
    config: Arc<AppConfig>,
}

impl ScreenerService {
    pub fn new(config: Arc<AppConfig>) -> Result<Self> {
        Ok(Self {
            client: MassiveClient::new(Arc::clone(&config))?,
            config,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn run(&self, params: &RequestParameters) -> Result<ScreenerResult, FetchError> {
        let (raw_count, top_signals) = self
            .select(&params.symbol, params.scoring_mode(), params.max_signals)
            .await?;

        Ok(ScreenerResult {
            symbol: params.symbol.clone(),
            option_side: params.option_side.to_string(),
            risk_profile: params.risk_profile.to_string(),
            raw_count,
            top_signals_count: top_signals.len(),
            top_signals,
        })
    }

    async fn select(
        &self,
        symbol: &str,
        mode: ScoringMode,
        k: i64,
    ) -> Result<(usize, Vec<OptionRecord>), FetchError> {
        let start_time = Instant::now();
        let payload = Payload::from(self.client.fetch_snapshot(symbol).await?);
        let raw_count = payload.raw_count();
        let top_signals = processor::rank_signals(&payload, mode, k);

        info!(
            symbol,
            raw_count,
            selected = top_signals.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "screener run complete"
        );

        Ok((raw_count, top_signals))
    }

    /// Answer a chat prompt, pulling screener data when the question asks for it.
    /// Fetch failures only drop the screener block.
    pub async fn chat(&self, raw_prompt: &str, max_tokens: u32) -> Result<String, std::fmt::Error> {
        let question = prompt::extract_question(raw_prompt);
        let symbol = self.config.chat_symbol.as_str();

        // Triggers count anywhere in the prompt, including wrapper context
        let (block, lookup) = if prompt::wants_screener(raw_prompt) {
            match self
                .select(symbol, self.config.chat_scoring.mode(), config::CHAT_MAX_SIGNALS)
                .await
            {
                Ok((_, signals)) if signals.is_empty() => (None, ScreenerLookup::Empty),
                Ok((_, signals)) => (
                    Some(prompt::format_signals_for_prompt(&signals)),
                    ScreenerLookup::Loaded,
                ),
                Err(e) => {
                    warn!("Screener data unavailable for chat: {}", e);
                    (None, ScreenerLookup::Unavailable)
                }
            }
        } else {
            (None, ScreenerLookup::Skipped)
        };

        let augmented = AugmentedPrompt::new(question, block);
        debug!("augmented prompt:\n{}", augmented.render());

        let answer = answer::generate_answer(&augmented, symbol, lookup)?;
        Ok(answer::truncate_answer(answer, max_tokens))
    }
}
