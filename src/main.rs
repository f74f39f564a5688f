mod config;
mod error;
mod utils;
mod modules;

use anyhow::Context;
use chrono::Local;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::BotSettings;
use crate::utils::http_client::{HttpClientFactory, Stage};
use crate::utils::notifier::TelegramNotifier;
use crate::modules::perception::FeedFetcher;
use crate::modules::brain::HuggingFaceSummarizer;
use crate::modules::action::{NewsSentinel, SentinelOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = BotSettings::load().context("Failed to load bot settings")?;

    info!("🐻 Crypto Bearish Alert Bot running...");
    info!(
        "Started {} | feed: {} | model: {} | mode: {:?} | every {}s",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        settings.rss_url,
        settings.hf_model_id,
        settings.alert_mode,
        settings.check_interval
    );

    let fetcher = FeedFetcher::new(HttpClientFactory::for_stage(Stage::Feed, &settings)?, &settings.rss_url);
    let summarizer = HuggingFaceSummarizer::new(HttpClientFactory::for_stage(Stage::Inference, &settings)?, &settings);
    let notifier = TelegramNotifier::new(HttpClientFactory::for_stage(Stage::Telegram, &settings)?, &settings);

    let sentinel = NewsSentinel::new(
        Box::new(fetcher),
        Box::new(summarizer),
        Box::new(notifier),
        SentinelOptions::from(&settings),
    );

    sentinel.run().await;
    Ok(())
}
