mod health;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use {
    anyhow::{Context, bail},
    clap::Parser,
    reelbot_fetch::{YtDlp, YtDlpConfig},
    reelbot_relay::{ArtifactStore, Relay},
    reelbot_telegram::{BotConfig, BotContext, TelegramTransport, bot},
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser, Debug)]
#[command(name = "reelbot", about = "Send a video link, get the video back")]
struct Cli {
    /// Telegram bot token from @BotFather.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Address the liveness endpoint binds to.
    #[arg(long, env = "REELBOT_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port for the liveness endpoint.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Scratch directory for in-flight downloads.
    #[arg(long, env = "REELBOT_SCRATCH_DIR", default_value = "/tmp/videos")]
    scratch_dir: PathBuf,

    /// Explicit path to the yt-dlp binary (defaults to PATH lookup).
    #[arg(long, env = "REELBOT_YTDLP")]
    ytdlp: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "reelbot starting");

    let cancel = CancellationToken::new();

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cli.bind, cli.port))?;
    let health_cancel = cancel.clone();
    let health = tokio::spawn(async move {
        if let Err(e) = health::serve(addr, health_cancel).await {
            error!(error = %e, "liveness endpoint failed");
        }
    });

    let bot_config = BotConfig::new(cli.bot_token.clone().unwrap_or_default());
    if !bot_config.has_token() {
        error!("BOT_TOKEN is not set, refusing to start the bot");
        cancel.cancel();
        let _ = health.await;
        bail!("BOT_TOKEN is required");
    }

    let ytdlp = YtDlp::new(
        YtDlpConfig::default().with_binary(YtDlpConfig::resolve_binary(cli.ytdlp.clone())),
    );
    match ytdlp.probe_version().await {
        Ok(version) => info!(%version, binary = %ytdlp.config().binary.display(), "yt-dlp available"),
        Err(e) => warn!(error = %e, "yt-dlp probe failed, downloads will fail until it is installed"),
    }

    let artifacts = ArtifactStore::new(&cli.scratch_dir);
    artifacts.prepare().await?;
    if let Err(e) = artifacts.sweep().await {
        warn!(error = %e, "failed to sweep scratch directory");
    }

    let bot = bot::build_bot(&bot_config)?;
    let relay = Relay::new(
        Arc::new(
            TelegramTransport::new(bot.clone())
                .with_upload_bot(bot::build_upload_bot(&bot_config)?)
                .with_max_retries(bot_config.retry_after_max_retries),
        ),
        Arc::new(ytdlp),
        artifacts,
    );
    let ctx = BotContext::new(bot, Arc::new(relay));

    let polling = bot::start_polling(ctx, &bot_config, cancel.clone()).await?;
    info!(scratch_dir = %cli.scratch_dir.display(), "bot running");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            cancel.cancel();
        },
        _ = cancel.cancelled() => {},
    }

    let _ = polling.await;
    let _ = health.await;
    info!("reelbot stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["reelbot", "--bot-token", "123:ABC"]).unwrap();
        assert_eq!(cli.bot_token.as_deref(), Some("123:ABC"));
        assert_eq!(cli.bind, "0.0.0.0");
        assert_eq!(cli.scratch_dir, PathBuf::from("/tmp/videos"));
        assert!(!cli.json_logs);
    }

    #[test]
    fn cli_overrides() {
        let cli = Cli::try_parse_from([
            "reelbot",
            "--port",
            "9000",
            "--scratch-dir",
            "/var/tmp/reel",
            "--ytdlp",
            "/opt/yt-dlp",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.scratch_dir, PathBuf::from("/var/tmp/reel"));
        assert_eq!(cli.ytdlp, Some(PathBuf::from("/opt/yt-dlp")));
        assert!(cli.json_logs);
    }
}
