use std::env;
use std::process::ExitCode;

use feedwatch::models::config::{MonitorConfig, Transport};
use feedwatch::notify::command::DEFAULT_COMMAND;
use feedwatch::notify::{CommandNotifier, DiscordNotifier, Notifier};
use feedwatch::processing::embedding::FastEmbedder;
use feedwatch::processing::monitor::Monitor;
use feedwatch::processing::relevance::TopicEncoder;
use feedwatch::repository::JsonHistoryStore;
use feedwatch::sources::HttpSourceFetcher;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config_path =
        env::var("FEEDWATCH_CONFIG").unwrap_or_else(|_| "rss_monitor_settings.json".to_string());
    let history_path =
        env::var("FEEDWATCH_HISTORY").unwrap_or_else(|_| "processed_history.json".to_string());

    let config = match MonitorConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if config.positive_topics.is_empty() {
        log::info!("No topics configured. Exiting.");
        return ExitCode::SUCCESS;
    }

    let notifier: Box<dyn Notifier> = match config.output.transport {
        Transport::Command => Box::new(CommandNotifier::new(
            config.output.command.as_deref().unwrap_or(DEFAULT_COMMAND),
        )),
        Transport::Discord => {
            let token = env::var("DISCORD_BOT_TOKEN").unwrap_or_default();
            match DiscordNotifier::new(token) {
                Ok(notifier) => Box::new(notifier),
                Err(e) => {
                    log::error!("{e} (set DISCORD_BOT_TOKEN)");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    let fetcher = match HttpSourceFetcher::new() {
        Ok(fetcher) => fetcher,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let embedder = match FastEmbedder::try_new(&config.model_name) {
        Ok(embedder) => embedder,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let mut encoder = TopicEncoder::new(embedder);
    let history = JsonHistoryStore::new(history_path);

    let mut monitor = Monitor::new(&config, &mut encoder, &history, &fetcher, &*notifier);
    match monitor.run().await {
        Ok(_) => {
            log::info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Run failed: {e}");
            ExitCode::FAILURE
        }
    }
}
