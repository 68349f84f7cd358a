use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::ScoringMode;

// -----------------------------------------------
// MASSIVE API ENDPOINTS
// -----------------------------------------------
pub const MASSIVE_SCREENER_URL: &str = "https://api.massive.com/v3/snapshot/options";

/// Snapshot URL for a single underlying: `{base}/{symbol}`
pub fn massive_snapshot_url(base_url: &str, symbol: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(symbol)
    )
}

// -----------------------------------------------
// SNAPSHOT QUERY PARAMETERS
// -----------------------------------------------
pub const SNAPSHOT_ORDER: &str = "asc";
pub const SNAPSHOT_SORT: &str = "ticker";
pub const DEFAULT_PAGE_LIMIT: u32 = 200;
pub const MAX_PAGE_LIMIT: u32 = 250;

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = concat!("massive-screener/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;
pub const MAX_TIMEOUT_SECS: u64 = 60;

// -----------------------------------------------
// REQUEST DEFAULTS
// -----------------------------------------------
pub const DEFAULT_SYMBOL: &str = "SPY";
pub const DEFAULT_MAX_SIGNALS: i64 = 5;
pub const CHAT_MAX_SIGNALS: i64 = 5;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Rough characters-per-token ratio used to cap templated answers
pub const CHARS_PER_TOKEN: usize = 4;

// -----------------------------------------------
// CHAT TRIGGERS
// -----------------------------------------------
pub const SCREENER_TRIGGER_KEYWORDS: &[&str] = &[
    "0dte",
    "0 dte",
    "screener",
    "covered call",
    "options screener",
];

pub const QUESTION_MARKER: &str = "user question:";

// -----------------------------------------------
// HTTP HEADERS
// -----------------------------------------------
pub const HEADER_API_KEY: &str = "x-api-key";

// -----------------------------------------------
// SERVER DEFAULTS
// -----------------------------------------------
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SYMBOLS_FILE: &str = "symbols.txt";

/// Process-wide configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub screener_url: Option<String>,
    pub timeout: Duration,
    pub page_limit: u32,
    pub backend_api_key: Option<String>,
    pub host: String,
    pub port: u16,
    pub chat_symbol: String,
    pub chat_scoring: ChatScoring,
    pub symbols: Vec<String>,
    pub log_dir: Option<String>,
}

/// Which scoring preset the chat path runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScoring {
    Profile,
    Legacy,
}

impl ChatScoring {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "legacy" => ChatScoring::Legacy,
            _ => ChatScoring::Profile,
        }
    }

    /// Scoring mode used for chat lookups: calls, balanced profile, or the legacy preset
    pub fn mode(self) -> ScoringMode {
        match self {
            ChatScoring::Profile => ScoringMode::default(),
            ChatScoring::Legacy => ScoringMode::Legacy,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            screener_url: Some(MASSIVE_SCREENER_URL.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_limit: DEFAULT_PAGE_LIMIT,
            backend_api_key: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chat_symbol: DEFAULT_SYMBOL.to_string(),
            chat_scoring: ChatScoring::Profile,
            symbols: Vec::new(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let symbols_file = lookup("SYMBOLS_FILE").unwrap_or_else(|| DEFAULT_SYMBOLS_FILE.to_string());

        Self {
            api_key: non_empty("MASSIVE_API_KEY"),
            screener_url: match lookup("MASSIVE_SCREENER_URL") {
                Some(url) if url.trim().is_empty() => None,
                Some(url) => Some(url.trim().to_string()),
                None => Some(MASSIVE_SCREENER_URL.to_string()),
            },
            timeout: Duration::from_secs(
                parse_or(lookup("MASSIVE_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS).clamp(1, MAX_TIMEOUT_SECS),
            ),
            page_limit: parse_or(lookup("MASSIVE_PAGE_LIMIT"), DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
            backend_api_key: non_empty("BACKEND_API_KEY"),
            host: lookup("SCREENER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(lookup("SCREENER_PORT"), DEFAULT_PORT),
            chat_symbol: non_empty("CHAT_DEFAULT_SYMBOL").unwrap_or_else(|| DEFAULT_SYMBOL.to_string()),
            chat_scoring: lookup("CHAT_SCORING_MODE")
                .map(|raw| ChatScoring::parse(&raw))
                .unwrap_or(ChatScoring::Profile),
            symbols: load_symbols(&symbols_file),
            log_dir: non_empty("LOG_DIR"),
        }
    }

    /// Log what is missing; the server still starts and fails per request.
    pub fn validate(&self) {
        if self.api_key.is_none() {
            warn!("MASSIVE_API_KEY is not set; screener requests will fail");
        }
        if self.screener_url.is_none() {
            warn!("MASSIVE_SCREENER_URL is empty; screener requests will fail");
        }
        if self.backend_api_key.is_none() {
            info!("BACKEND_API_KEY is not set; /api/chat is open");
        }
        info!(
            timeout_secs = self.timeout.as_secs_f64(),
            page_limit = self.page_limit,
            symbols = self.symbols.len(),
            "configuration loaded"
        );
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

/// Read one symbol per line; an unreadable file yields an empty list.
pub fn load_symbols(path: impl AsRef<Path>) -> Vec<String> {
    match std::fs::read_to_string(path.as_ref()) {
        Ok(text) => parse_symbols(&text),
        Err(e) => {
            info!("No symbols file at {}: {}", path.as_ref().display(), e);
            Vec::new()
        }
    }
}

fn parse_symbols(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
