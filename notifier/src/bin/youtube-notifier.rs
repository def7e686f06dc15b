use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_notifier::config::Config;
use youtube_notifier::setup_poller;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = Config::load(&config_path).context("load configuration")?;
    let poller = setup_poller(&config).await?;

    let Some(every) = config.poll_interval() else {
        let report = poller.run().await.context("poll subscriptions")?;
        if report.failed_channels > 0 || report.dispatch_failures > 0 {
            tracing::warn!(
                failed_channels = report.failed_channels,
                dispatch_failures = report.dispatch_failures,
                "run finished with errors"
            );
        }
        return Ok(());
    };

    tracing::info!(interval = ?every, "polling continuously");
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = poller.run().await {
                    tracing::error!(error = %format!("{e:#}"), "poll failed; retrying next interval");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, shutting down");
                return Ok(());
            }
        }
    }
}
