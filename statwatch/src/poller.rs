use crate::config::{Config, ThresholdConfig};
use crate::error::CycleError;
use crate::snapshot::{MetricsSnapshot, parse_snapshot};
use crate::thresholds::{Alert, evaluate};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

/// A snapshot with more bad fields than this is discarded.
pub const MAX_UNPARSABLE_FIELDS: usize = 3;

/// Notice printed when a cycle fails for any reason.
pub const CYCLE_FAILED_NOTICE: &str = "Unable to fetch server statistic.";

/// Receives the outcome of each poll cycle.
pub trait AlertSink {
    fn emit(&mut self, alert: &Alert);

    fn cycle_failed(&mut self, _err: &CycleError) {}
}

/// Prints alerts and failure notices to stdout, one line each.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl AlertSink for StdoutSink {
    fn emit(&mut self, alert: &Alert) {
        println!("{alert}");
    }

    fn cycle_failed(&mut self, _err: &CycleError) {
        println!("{CYCLE_FAILED_NOTICE}");
    }
}

impl AlertSink for Vec<Alert> {
    fn emit(&mut self, alert: &Alert) {
        self.push(alert.clone());
    }
}

/// Fetches the raw stats line over HTTP.
#[derive(Clone)]
pub struct StatsClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl StatsClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).context("invalid stats endpoint URL")?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET the endpoint and return the trimmed body.
    pub async fn fetch(&self) -> Result<String, CycleError> {
        let resp = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|source| CycleError::Request {
                url: self.endpoint.to_string(),
                source,
            })?;
        if resp.status() != StatusCode::OK {
            return Err(CycleError::Status(resp.status()));
        }
        let body = resp.text().await.map_err(CycleError::Body)?;
        Ok(body.trim().to_string())
    }
}

/// Runs fetch-parse-evaluate cycles against one endpoint.
pub struct Poller {
    client: StatsClient,
    thresholds: ThresholdConfig,
}

impl Poller {
    pub fn new(client: StatsClient, thresholds: ThresholdConfig) -> Self {
        Self { client, thresholds }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client = StatsClient::new(&cfg.endpoint.url, cfg.endpoint.timeout())?;
        Ok(Self::new(client, cfg.thresholds))
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// One poll cycle. Alerts go to `sink` as they are found; the returned
    /// count is the number emitted. Nothing carries over between calls.
    pub async fn run_cycle(&self, sink: &mut dyn AlertSink) -> Result<usize, CycleError> {
        let body = self.client.fetch().await?;
        let snapshot = usable_snapshot(&body)?;
        debug!("[poller] {}", snapshot.summary());
        evaluate(&snapshot, &self.thresholds, |alert| {
            debug!("[poller] {:?} threshold breached", alert.resource());
            sink.emit(&alert);
        })
    }

    /// Run one cycle and report a failure to the sink instead of returning it.
    pub async fn poll_once(&self, sink: &mut dyn AlertSink) -> Result<usize, CycleError> {
        let result = self.run_cycle(sink).await;
        if let Err(err) = &result {
            if err.is_timeout() {
                warn!(
                    "[poller] no answer from {} within {:?}",
                    self.client.endpoint(),
                    self.client.timeout()
                );
            } else {
                warn!("[poller] cycle aborted ({:?}): {err}", err.kind());
            }
            sink.cycle_failed(err);
        }
        result
    }
}

/// Parse a stats line and apply the unparsable-field budget.
pub fn usable_snapshot(line: &str) -> Result<MetricsSnapshot, CycleError> {
    let snapshot = parse_snapshot(line)?;
    if snapshot.unparsable_fields > MAX_UNPARSABLE_FIELDS {
        return Err(CycleError::TooManyUnparsable {
            count: snapshot.unparsable_fields,
        });
    }
    if snapshot.unparsable_fields > 0 {
        warn!(
            "[poller] {} field(s) unparsable in {:?}, treated as 0",
            snapshot.unparsable_fields, line
        );
    }
    Ok(snapshot)
}

/// Poll every `interval` until `shutdown` resolves.
///
/// The first cycle runs one interval after start. Shutdown is only observed
/// between cycles; a cycle in flight is bounded by the client timeout.
pub async fn run_until<S, F>(poller: &Poller, interval: Duration, sink: &mut S, shutdown: F)
where
    S: AlertSink,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("[poller] shutdown requested, stopping");
                break;
            }
            _ = ticker.tick() => {
                // failures are already reported through the sink
                let _ = poller.poll_once(sink).await;
            }
        }
    }
}
