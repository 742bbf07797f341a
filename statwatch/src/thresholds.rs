//! Threshold checks over a parsed snapshot.
//!
//! The four checks run in a fixed order (load, memory, disk, network) so the
//! output is deterministic. A zero total aborts evaluation with a guard error
//! instead of reading as 0% usage; alerts already emitted by earlier checks
//! stand.

use crate::config::ThresholdConfig;
use crate::error::CycleError;
use crate::snapshot::MetricsSnapshot;
use log::debug;
use std::fmt;

const BYTES_PER_MB: u64 = 1024 * 1024;
const BITS_PER_MBIT: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Load,
    Memory,
    Disk,
    Network,
}

/// A breached threshold.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    LoadAverage { load: u64 },
    MemoryUsage { percent: f64 },
    DiskSpace { free_mb: u64 },
    NetworkBandwidth { available_mbit: f64 },
}

impl Alert {
    pub fn resource(&self) -> Resource {
        match self {
            Self::LoadAverage { .. } => Resource::Load,
            Self::MemoryUsage { .. } => Resource::Memory,
            Self::DiskSpace { .. } => Resource::Disk,
            Self::NetworkBandwidth { .. } => Resource::Network,
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadAverage { load } => write!(f, "Load Average is too high: {load}"),
            Self::MemoryUsage { percent } => write!(f, "Memory usage too high: {percent:.6}%"),
            Self::DiskSpace { free_mb } => {
                write!(f, "Free disk space is too low: {free_mb} Mb left")
            }
            Self::NetworkBandwidth { available_mbit } => write!(
                f,
                "Network bandwidth usage high: {available_mbit:.6} Mbit/s available"
            ),
        }
    }
}

type CheckFn = fn(&MetricsSnapshot, &ThresholdConfig) -> Result<Option<Alert>, CycleError>;

/// One threshold check: the resource it covers and how to test it.
pub struct Check {
    pub resource: Resource,
    run: CheckFn,
}

impl Check {
    pub fn run(
        &self,
        snapshot: &MetricsSnapshot,
        thresholds: &ThresholdConfig,
    ) -> Result<Option<Alert>, CycleError> {
        (self.run)(snapshot, thresholds)
    }
}

pub const CHECKS: [Check; 4] = [
    Check {
        resource: Resource::Load,
        run: check_load,
    },
    Check {
        resource: Resource::Memory,
        run: check_memory,
    },
    Check {
        resource: Resource::Disk,
        run: check_disk,
    },
    Check {
        resource: Resource::Network,
        run: check_network,
    },
];

/// Run every check in order, handing each alert to `emit` as it is found.
///
/// Returns the number of alerts emitted, or the first guard error.
pub fn evaluate<F>(
    snapshot: &MetricsSnapshot,
    thresholds: &ThresholdConfig,
    mut emit: F,
) -> Result<usize, CycleError>
where
    F: FnMut(Alert),
{
    let mut emitted = 0;
    for check in &CHECKS {
        let outcome = check
            .run(snapshot, thresholds)
            .inspect_err(|err| debug!("[thresholds] {:?} check aborted: {err}", check.resource))?;
        if let Some(alert) = outcome {
            emit(alert);
            emitted += 1;
        }
    }
    Ok(emitted)
}

/// `used / total * 100`, refusing a zero total.
pub fn usage_percent(used: u64, total: u64, field: &'static str) -> Result<f64, CycleError> {
    if total == 0 {
        return Err(CycleError::ZeroDenominator { field });
    }
    Ok(used as f64 / total as f64 * 100.0)
}

fn check_load(
    snapshot: &MetricsSnapshot,
    thresholds: &ThresholdConfig,
) -> Result<Option<Alert>, CycleError> {
    let load = snapshot.load_average;
    Ok((load > thresholds.load_average).then_some(Alert::LoadAverage { load }))
}

fn check_memory(
    snapshot: &MetricsSnapshot,
    thresholds: &ThresholdConfig,
) -> Result<Option<Alert>, CycleError> {
    let percent = usage_percent(snapshot.memory_used, snapshot.memory_total, "memory_total")?;
    Ok((percent > thresholds.memory_percent).then_some(Alert::MemoryUsage { percent }))
}

fn check_disk(
    snapshot: &MetricsSnapshot,
    thresholds: &ThresholdConfig,
) -> Result<Option<Alert>, CycleError> {
    let percent = usage_percent(snapshot.disk_used, snapshot.disk_total, "disk_total")?;
    if percent <= thresholds.disk_percent {
        return Ok(None);
    }
    let free_bytes = snapshot.disk_total.saturating_sub(snapshot.disk_used);
    Ok(Some(Alert::DiskSpace {
        free_mb: free_bytes / BYTES_PER_MB,
    }))
}

fn check_network(
    snapshot: &MetricsSnapshot,
    thresholds: &ThresholdConfig,
) -> Result<Option<Alert>, CycleError> {
    let percent = usage_percent(
        snapshot.network_used,
        snapshot.network_capacity,
        "network_capacity",
    )?;
    if percent <= thresholds.network_percent {
        return Ok(None);
    }
    let free_bytes_per_sec = snapshot
        .network_capacity
        .saturating_sub(snapshot.network_used);
    Ok(Some(Alert::NetworkBandwidth {
        available_mbit: free_bytes_per_sec as f64 * 8.0 / BITS_PER_MBIT,
    }))
}
