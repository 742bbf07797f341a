pub mod config;
pub mod error;
pub mod poller;
pub mod snapshot;
pub mod thresholds;

pub use config::{Config, EndpointConfig, PollingConfig, ThresholdConfig};
pub use error::{CycleError, ErrorKind};
pub use poller::{AlertSink, Poller, StatsClient, StdoutSink};
pub use snapshot::{MetricsSnapshot, ParseError, parse_snapshot};
pub use thresholds::{Alert, Resource, evaluate};
