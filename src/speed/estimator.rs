use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};

use super::history::{HistoryEntry, SampleHistory};
use super::{NetworkCounters, SpeedEstimate};
use crate::container::ContainerID;

/// Converts a stream of counter snapshots into a stream of smoothed
/// throughput estimates.
///
/// The estimator keeps a ring of the most recent samples and averages the
/// deltas of every consecutive pair in the window plus the newest sample, a
/// multi-step finite difference that smooths single noisy poll intervals
/// while staying O(window) per sample.
#[derive(Debug)]
pub struct SpeedEstimator {
    container_id: ContainerID,
    poll_interval: Duration,
    history: SampleHistory,
}

impl SpeedEstimator {
    pub fn new(container_id: ContainerID, poll_interval: Duration) -> Self {
        Self {
            container_id,
            poll_interval,
            history: SampleHistory::new(),
        }
    }

    /// Folds one counter snapshot into the window and returns the resulting
    /// estimate.
    ///
    /// Returns `None` for the very first sample (an empty window yields zero
    /// observations, so no rate is defined yet) and for a sample whose
    /// counters regressed below the newest buffered entry. A regression means
    /// the container restarted and its counters reset, which invalidates
    /// every buffered delta; the window is cleared and rebuilt from the new
    /// counter stream instead of emitting a negative rate.
    pub fn observe(
        &mut self,
        counters: NetworkCounters,
        observed_at: Instant,
    ) -> Option<SpeedEstimate> {
        if let Some(newest) = self.history.newest() {
            if counters.rx_bytes < newest.counters.rx_bytes
                || counters.tx_bytes < newest.counters.tx_bytes
            {
                log::warn!(
                    "container `{}`: counter regression ({:?} -> {:?}), resetting window",
                    self.container_id,
                    newest.counters,
                    counters
                );
                self.history.clear();
            }
        }

        let mut total_rx_delta = 0u64;
        let mut total_tx_delta = 0u64;
        let mut observations = 0u32;

        // Newest buffered entry vs. the incoming sample counts as one
        // observation. Entries are monotone within the window (regressions
        // cleared it above), so plain subtraction cannot underflow.
        if let Some(newest) = self.history.newest() {
            total_rx_delta += counters.rx_bytes - newest.counters.rx_bytes;
            total_tx_delta += counters.tx_bytes - newest.counters.tx_bytes;
            observations += 1;
        }

        // Each consecutive pair in the oldest-to-newest chain contributes one
        // more observation; for k buffered entries this totals exactly k.
        {
            let mut walk = self.history.iter_oldest_first();
            if let Some(first) = walk.next() {
                let mut prev = first;
                for entry in walk {
                    total_rx_delta += entry.counters.rx_bytes - prev.counters.rx_bytes;
                    total_tx_delta += entry.counters.tx_bytes - prev.counters.tx_bytes;
                    observations += 1;
                    prev = entry;
                }

                log::trace!(
                    "container `{}`: window of {} entries spanning {:?}",
                    self.container_id,
                    self.history.len(),
                    observed_at.duration_since(first.observed_at),
                );
            }
        }

        self.history.push(HistoryEntry {
            counters,
            observed_at,
        });

        if observations == 0 {
            return None;
        }

        let interval_secs = self.poll_interval.as_secs_f64();
        Some(SpeedEstimate {
            rx_per_sec: total_rx_delta as f64 / f64::from(observations) / interval_secs,
            tx_per_sec: total_tx_delta as f64 / f64::from(observations) / interval_secs,
        })
    }

    /// Consumes raw samples until the upstream channel closes or shutdown is
    /// signalled, forwarding each computed estimate downstream.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<NetworkCounters>,
        tx: mpsc::Sender<SpeedEstimate>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            let counters = tokio::select! {
                _ = shutdown.changed() => break,
                received = rx.recv() => match received {
                    Some(counters) => counters,
                    None => break,
                },
            };

            if let Some(estimate) = self.observe(counters, Instant::now()) {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    sent = tx.send(estimate) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        }
        log::debug!("container `{}`: speed estimator stopped", self.container_id);
    }
}
