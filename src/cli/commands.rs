//! CLI command definitions for apod-bot.

use clap::Parser;
use tracing::info;

use crate::caption::CaptionPreparer;
use crate::config::BotConfig;
use crate::fetch::ApodClient;
use crate::job::PhotoJob;
use crate::publish::TelegramPublisher;
use crate::scheduler;
use crate::translate::{AssistantsClient, Translator};

/// Daily NASA APOD publisher for a Telegram channel.
#[derive(Parser)]
#[command(name = "apod-bot")]
#[command(about = "Post the NASA Astronomy Picture of the Day to a Telegram channel")]
#[command(version)]
#[command(
    long_about = "apod-bot fetches the NASA Astronomy Picture of the Day, overlays a QR code linking to the channel, translates the caption, and publishes the result.\n\nConfiguration comes from environment variables (NASA_API_KEY, TELEGRAM_BOT_TOKEN, TELEGRAM_CHANNEL_ID, OPENAI_API_KEY, OPENAI_ASSISTANT_ID, ...).\n\nExample usage:\n  apod-bot run\n  apod-bot start"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Fetch, compose, and publish one post immediately.
    #[command(alias = "once")]
    Run,

    /// Run the daemon, posting daily at the configured UTC time.
    Start,
}

/// Parses CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses CLI arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config = BotConfig::from_env()?;
    let job = build_job(&config);

    match cli.command {
        Commands::Run => {
            info!("Running a single post");
            job.execute().await?;
        }
        Commands::Start => {
            let post_time = scheduler::parse_post_time(&config.post_time_utc)
                .ok_or_else(|| {
                    anyhow::anyhow!("invalid post_time_utc '{}'", config.post_time_utc)
                })?;
            info!(post_time = %config.post_time_utc, "Starting daily scheduler");
            scheduler::run_daily(job, post_time).await;
        }
    }

    Ok(())
}

/// Wires the photo job from configuration.
fn build_job(config: &BotConfig) -> PhotoJob {
    let source = ApodClient::new(config.nasa_api_url.clone(), config.nasa_api_key.clone());

    let backend = AssistantsClient::new(
        config.openai_api_url.clone(),
        config.openai_api_key.clone(),
        config.openai_assistant_id.clone(),
    );
    let translator = Translator::new(
        Box::new(backend),
        config.translation_poll_interval,
        config.translation_max_wait,
    );
    let caption_preparer = CaptionPreparer::new(translator, config.target_language.clone());

    let sink = TelegramPublisher::new(
        config.telegram_bot_token.clone(),
        config.telegram_channel_id.clone(),
    );

    PhotoJob::new(
        Box::new(source),
        Box::new(sink),
        caption_preparer,
        config.compose.clone(),
        config.channel_link(),
    )
}
