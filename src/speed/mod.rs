//! Per-container network speed estimation.
//!
//! Two chained stages run as independent tasks for every monitored container:
//!
//! - [`Sampler`] — polls cumulative RX/TX byte counters from a
//!   [`CounterSource`] at a fixed cadence and forwards only changed snapshots.
//! - [`SpeedEstimator`] — folds the snapshot stream into a bounded ring of
//!   recent samples and emits a windowed average rate.
//!
//! Samples flow strictly one way, Sampler → estimator → consumer, over
//! capacity-1 channels; a slow consumer stalls the producer's next poll.
//! Pipelines never share state with each other.

use std::fmt;
use std::future::Future;

use crate::container::ContainerID;

mod estimator;
mod history;
mod sampler;

pub use estimator::SpeedEstimator;
pub use sampler::Sampler;

const MB: f64 = (1024 * 1024) as f64;

/// Cumulative network byte counters for one container, summed across all of
/// its interfaces.
///
/// Counters are monotonically non-decreasing for the lifetime of the
/// container; a decrease signals a counter reset (e.g., container restart).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkCounters {
    /// Bytes received since container start.
    pub rx_bytes: u64,
    /// Bytes transmitted since container start.
    pub tx_bytes: u64,
}

impl std::ops::AddAssign for NetworkCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.rx_bytes += rhs.rx_bytes;
        self.tx_bytes += rhs.tx_bytes;
    }
}

/// A smoothed throughput estimate, in bytes per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedEstimate {
    pub rx_per_sec: f64,
    pub tx_per_sec: f64,
}

impl fmt::Display for SpeedEstimate {
    /// Renders the estimate in megabytes per second with five decimal digits.
    ///
    /// The exact format is a presentation contract; downstream tooling may
    /// parse it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RX: {:.5}/MBs, TX: {:.5}/MBs",
            self.rx_per_sec / MB,
            self.tx_per_sec / MB
        )
    }
}

/// Point-in-time provider of cumulative network counters for a container.
///
/// Implementations must be safe for concurrent use: one shared source serves
/// every container pipeline. Fetches may fail transiently; the [`Sampler`]
/// retries with backoff.
pub trait CounterSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the container's cumulative RX/TX byte counters as of now.
    fn network_counters(
        &self,
        container_id: &ContainerID,
    ) -> impl Future<Output = std::result::Result<NetworkCounters, Self::Error>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_add_assign() {
        let mut total = NetworkCounters::default();
        total += NetworkCounters {
            rx_bytes: 100,
            tx_bytes: 10,
        };
        total += NetworkCounters {
            rx_bytes: 50,
            tx_bytes: 5,
        };
        assert_eq!(total.rx_bytes, 150);
        assert_eq!(total.tx_bytes, 15);
    }

    #[test]
    fn test_speed_estimate_display_contract() {
        let estimate = SpeedEstimate {
            rx_per_sec: MB,
            tx_per_sec: MB / 2.0,
        };
        assert_eq!(estimate.to_string(), "RX: 1.00000/MBs, TX: 0.50000/MBs");
    }

    #[test]
    fn test_speed_estimate_display_zero() {
        let estimate = SpeedEstimate {
            rx_per_sec: 0.0,
            tx_per_sec: 0.0,
        };
        assert_eq!(estimate.to_string(), "RX: 0.00000/MBs, TX: 0.00000/MBs");
    }
}
