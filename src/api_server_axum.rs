use crate::config::{self, AppConfig};
use crate::error::ApiError;
use crate::models::{OptionSide, RequestParameters, RiskProfile};
use crate::prompt;
use crate::screener::{ScreenerResult, ScreenerService};
use anyhow::Result;
use axum::{
    Router,
    extract::{Query, Request, State},
    http::HeaderMap,
    middleware::{self, Next},
    response::{Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ScreenerQuery {
    pub symbol: Option<String>,
    pub option_side: Option<String>,
    pub risk_profile: Option<String>,
    pub max_signals: Option<i64>,
    pub top_n: Option<i64>,
}

impl ScreenerQuery {
    /// Apply defaults; `top_n` overrides `max_signals` when both are given.
    pub fn into_params(self) -> Result<RequestParameters, ApiError> {
        let option_side = match self.option_side.as_deref() {
            Some(raw) => raw.parse::<OptionSide>().map_err(ApiError::BadRequest)?,
            None => OptionSide::default(),
        };

        Ok(RequestParameters {
            symbol: self
                .symbol
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| config::DEFAULT_SYMBOL.to_string()),
            option_side,
            risk_profile: self
                .risk_profile
                .as_deref()
                .map(RiskProfile::parse)
                .unwrap_or_default(),
            max_signals: self
                .top_n
                .or(self.max_signals)
                .unwrap_or(config::DEFAULT_MAX_SIGNALS),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DebugScreenerResponse {
    #[serde(flatten)]
    pub result: ScreenerResult,
    pub formatted_for_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Accepted for compatibility; answers are templated
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> u32 {
    config::DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    config::DEFAULT_TEMPERATURE
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct SymbolsResponse {
    pub symbols: Vec<String>,
    pub count: usize,
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    screener: Arc<ScreenerService>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Result<Self> {
        Ok(Self {
            screener: Arc::new(ScreenerService::new(config)?),
        })
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET /health - Health check endpoint
async fn health() -> &'static str {
    "OK"
}

/// GET /symbols - Symbols loaded at startup
async fn get_symbols(State(app_state): State<AppState>) -> Json<SymbolsResponse> {
    let symbols = app_state.screener.config().symbols.clone();
    Json(SymbolsResponse {
        count: symbols.len(),
        symbols,
    })
}

/// GET /screener?symbol=SPY&option_side=call&risk_profile=balanced&max_signals=5
async fn get_screener(
    State(app_state): State<AppState>,
    Query(query): Query<ScreenerQuery>,
) -> Result<Json<ScreenerResult>, ApiError> {
    let params = query.into_params()?;
    let result = app_state.screener.run(&params).await?;
    Ok(Json(result))
}

/// GET /debug/screener - Same selection plus the prompt block; fetch errors come back as 200
async fn get_debug_screener(
    State(app_state): State<AppState>,
    Query(query): Query<ScreenerQuery>,
) -> Result<Json<Value>, ApiError> {
    let params = query.into_params()?;

    match app_state.screener.run(&params).await {
        Ok(result) => {
            let formatted_for_prompt = prompt::format_signals_for_prompt(&result.top_signals);
            let body = serde_json::to_value(DebugScreenerResponse {
                result,
                formatted_for_prompt,
            })
            .map_err(|e| ApiError::Internal(e.to_string()))?;
            Ok(Json(body))
        }
        Err(e) => {
            warn!("debug screener fetch failed: {}", e);
            Ok(Json(json!({ "error": e.to_string() })))
        }
    }
}

/// POST /chat - Templated answer, screener data injected on trigger keywords
async fn post_chat(
    State(app_state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    answer_chat(&app_state, request).await
}

/// Gate for POST /api/chat. Runs before the body is read, so a bad key is
/// always 401 whatever the payload looks like.
async fn require_api_key(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    check_api_key(app_state.screener.config(), request.headers())?;
    Ok(next.run(request).await)
}

// -----------------------------------------------
// HELPER FUNCTIONS
// -----------------------------------------------

async fn answer_chat(app_state: &AppState, request: ChatRequest) -> Result<Json<ChatResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let answer = app_state
        .screener
        .chat(&request.prompt, request.max_tokens)
        .await
        .map_err(|e| {
            error!("answer generation failed: {}", e);
            ApiError::Internal(format!("Answer generation failed: {}", e))
        })?;

    Ok(Json(ChatResponse { answer }))
}

/// Reject when a gate secret is configured and the header does not match it.
fn check_api_key(app_config: &AppConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = app_config.backend_api_key.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get(config::HEADER_API_KEY)
        .and_then(|v| v.to_str().ok());

    if provided == Some(expected) {
        Ok(())
    } else {
        warn!("rejected /api/chat request with bad or missing {}", config::HEADER_API_KEY);
        Err(ApiError::Unauthorized)
    }
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn build_router(app_state: AppState) -> Router {
    let gate = middleware::from_fn_with_state(app_state.clone(), require_api_key);

    Router::new()
        .route("/health", get(health))
        .route("/symbols", get(get_symbols))
        .route("/screener", get(get_screener))
        .route("/debug/screener", get(get_debug_screener))
        .route("/chat", post(post_chat))
        // Same handler as /chat behind the x-api-key gate
        .route("/api/chat", post(post_chat).route_layer(gate))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

pub async fn start_server(config: Arc<AppConfig>) -> Result<()> {
    let addr = config.bind_addr();
    let app = build_router(AppState::new(config)?);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Massive screener API running on http://{}", addr);
    info!("   GET  /health");
    info!("   GET  /symbols");
    info!("   GET  /screener?symbol=SPY&option_side=call&risk_profile=balanced&max_signals=5");
    info!("   GET  /debug/screener?symbol=SPY&top_n=5");
    info!("   POST /chat");
    info!("   POST /api/chat  (x-api-key)");

    axum::serve(listener, app).await?;
    Ok(())
}
