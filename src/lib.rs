pub mod answer;
pub mod api_server_axum;
pub mod config;
pub mod error;
pub mod logging;
pub mod massive_client;
pub mod models;
pub mod processor;
pub mod prompt;
pub mod screener;

// Re-exports for convenience
pub use config::AppConfig;
pub use error::{ApiError, FetchError};
pub use massive_client::MassiveClient;
pub use models::{OptionRecord, OptionSide, OptionType, Payload, RequestParameters, RiskProfile, ScoredRecord, ScoringMode};
pub use processor::{normalize_rows, rank_signals, score_record, score_records, select_top};
pub use prompt::format_signals_for_prompt;
pub use screener::{ScreenerResult, ScreenerService};
