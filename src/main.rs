use anyhow::Result;
use colored::Colorize;
use massive_screener::{AppConfig, api_server_axum, logging};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real deployments set the environment directly
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::from_env());
    logging::init_logging(config.log_dir.as_deref())?;

    println!("{}", "=".repeat(60).blue());
    println!("{}", "Massive Options Screener".green().bold());
    println!("{}", "=".repeat(60).blue());
    println!("{} Listening on: {}", "→".cyan(), config.bind_addr().yellow());
    println!("{} Snapshot URL: {}", "→".cyan(), config.screener_url.as_deref().unwrap_or("(not set)").yellow());
    println!("{} Chat symbol: {}", "→".cyan(), config.chat_symbol.yellow());
    println!();

    config.validate();

    api_server_axum::start_server(config).await
}
