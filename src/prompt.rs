use crate::config;
use crate::models::OptionRecord;
use serde_json::Value;

pub const SIGNALS_HEADER: &str = "Top option signals from Massive (pre-filtered):";

pub const SCREENER_INSTRUCTIONS: &str = "Use only the option signals listed above when discussing \
specific contracts. Explain what the numbers mean for learning purposes and do not present any \
contract as a recommendation to trade.";

const NOT_AVAILABLE: &str = "N/A";

/// Render selected signals as a text block. No signals, no block.
pub fn format_signals_for_prompt(signals: &[OptionRecord]) -> String {
    if signals.is_empty() {
        return String::new();
    }

    let lines: Vec<String> = signals.iter().map(format_signal_line).collect();
    format!("{}\n{}", SIGNALS_HEADER, lines.join("\n"))
}

fn format_signal_line(row: &OptionRecord) -> String {
    format!(
        "- {} | expiry={}, strike={}, volume={}, OI={}, IV={}, delta={}, premium={}",
        display(row.ticker()),
        display(row.expiration_date()),
        display(row.strike_price()),
        display(row.day("volume")),
        display(row.get("open_interest")),
        display(row.get("implied_volatility")),
        display(row.greeks("delta")),
        display(row.get("fmv")),
    )
}

fn display(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Does the question ask for live screener data?
pub fn wants_screener(question: &str) -> bool {
    let lowered = question.to_lowercase();
    config::SCREENER_TRIGGER_KEYWORDS
        .iter()
        .any(|kw| lowered.contains(kw))
}

/// Pull the user's question out of a wrapped prompt.
///
/// Frontends may send `"<instructions>\nUser question: <text>"`; without the
/// marker the whole prompt is the question.
pub fn extract_question(prompt: &str) -> String {
    let mut offset = 0;
    for line in prompt.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        // Marker is ASCII, so byte-wise lowercase comparison stays on char boundaries
        if trimmed.len() >= config::QUESTION_MARKER.len()
            && trimmed.is_char_boundary(config::QUESTION_MARKER.len())
            && trimmed[..config::QUESTION_MARKER.len()].eq_ignore_ascii_case(config::QUESTION_MARKER)
        {
            let start = offset + indent + config::QUESTION_MARKER.len();
            return prompt[start..].trim().to_string();
        }
        offset += line.len();
    }

    prompt.trim().to_string()
}

/// The prompt as it would be handed to a model, kept as structured parts.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedPrompt {
    pub question: String,
    pub screener_block: Option<String>,
}

impl AugmentedPrompt {
    pub fn new(question: String, screener_block: Option<String>) -> Self {
        // An empty block carries no signals
        let screener_block = screener_block.filter(|b| !b.is_empty());
        Self { question, screener_block }
    }

    pub fn render(&self) -> String {
        match &self.screener_block {
            Some(block) => format!("{}\n\n{}\n\n{}", self.question, block, SCREENER_INSTRUCTIONS),
            None => self.question.clone(),
        }
    }
}
