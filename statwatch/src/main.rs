use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use statwatch::Config;
use statwatch::poller::{Poller, StdoutSink, run_until};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "statwatch", version, about = "Server statistics threshold monitor")]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stats endpoint URL (overrides the config file)
    #[arg(long)]
    url: Option<String>,

    /// Seconds between polls (overrides the config file)
    #[arg(long)]
    interval_secs: Option<u64>,

    /// HTTP timeout in seconds (overrides the config file)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Poll once and exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn into_config(self) -> Result<(Config, bool)> {
        let mut cfg = match &self.config {
            Some(path) => {
                info!("[config] loading {}", path.display());
                Config::load(path)?
            }
            None => {
                info!("[config] no config file given, using defaults");
                Config::default()
            }
        };
        if let Some(url) = self.url {
            cfg.endpoint.url = url;
        }
        if let Some(secs) = self.interval_secs {
            cfg.polling.interval_secs = secs;
        }
        if let Some(secs) = self.timeout_secs {
            cfg.endpoint.timeout_secs = secs;
        }
        cfg.validate().context("invalid configuration")?;
        Ok((cfg, self.once))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (cfg, once) = Args::parse().into_config()?;
    let poller = Poller::from_config(&cfg)?;
    let mut sink = StdoutSink;

    if once {
        poller.poll_once(&mut sink).await?;
        return Ok(());
    }

    let t = poller.thresholds();
    info!(
        "[poller] watching {} every {}s (timeout {}s); thresholds load>{} mem>{}% disk>{}% net>{}%",
        cfg.endpoint.url,
        cfg.polling.interval_secs,
        cfg.endpoint.timeout_secs,
        t.load_average,
        t.memory_percent,
        t.disk_percent,
        t.network_percent
    );

    run_until(&poller, cfg.polling.interval(), &mut sink, shutdown_signal()).await;
    info!("[poller] stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
}
