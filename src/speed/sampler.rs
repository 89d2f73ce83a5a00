use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::{CounterSource, NetworkCounters};
use crate::container::ContainerID;

/// First retry delay after a failed fetch; doubled per subsequent attempt.
const FETCH_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Polls cumulative network counters for one container at a fixed cadence.
///
/// Snapshots that are bit-identical to the previously emitted one are
/// suppressed, so an idle container produces no zero-information samples
/// downstream. Transient fetch failures are retried with exponential backoff;
/// once the attempt budget is exhausted the sampler stops and closes its
/// output stream, leaving sibling pipelines untouched.
#[derive(Debug)]
pub struct Sampler<S> {
    container_id: ContainerID,
    source: Arc<S>,
    poll_interval: Duration,
    max_fetch_attempts: u32,
    tx: mpsc::Sender<NetworkCounters>,
    shutdown: watch::Receiver<bool>,
}

impl<S> Sampler<S>
where
    S: CounterSource,
{
    pub fn new(
        container_id: ContainerID,
        source: Arc<S>,
        poll_interval: Duration,
        max_fetch_attempts: u32,
        tx: mpsc::Sender<NetworkCounters>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            container_id,
            source,
            poll_interval,
            max_fetch_attempts,
            tx,
            shutdown,
        }
    }

    /// Runs the poll loop until shutdown, the estimator side hanging up, or
    /// the fetch attempt budget being exhausted.
    pub async fn run(mut self) {
        let mut previous: Option<NetworkCounters> = None;

        'poll: loop {
            let mut attempt = 1u32;
            let counters = loop {
                let fetched = tokio::select! {
                    _ = self.shutdown.changed() => break 'poll,
                    fetched = self.source.network_counters(&self.container_id) => fetched,
                };

                match fetched {
                    Ok(counters) => break counters,
                    Err(err) => {
                        if attempt >= self.max_fetch_attempts {
                            log::error!(
                                "container `{}`: giving up after {} failed fetch attempts: {}",
                                self.container_id,
                                attempt,
                                err
                            );
                            break 'poll;
                        }
                        let backoff = FETCH_BACKOFF_BASE * 2u32.pow(attempt - 1);
                        log::warn!(
                            "container `{}`: fetch attempt {}/{} failed: {}; retrying in {:?}",
                            self.container_id,
                            attempt,
                            self.max_fetch_attempts,
                            err,
                            backoff
                        );
                        attempt += 1;
                        tokio::select! {
                            _ = self.shutdown.changed() => break 'poll,
                            _ = tokio::time::sleep(backoff) => {}
                        }
                    }
                }
            };

            if previous == Some(counters) {
                log::trace!(
                    "container `{}`: counters unchanged, suppressing sample",
                    self.container_id
                );
            } else {
                log::trace!("container `{}`: sampled {:?}", self.container_id, counters);
                tokio::select! {
                    _ = self.shutdown.changed() => break,
                    sent = self.tx.send(counters) => {
                        if sent.is_err() {
                            break;
                        }
                    }
                }
                previous = Some(counters);
            }

            tokio::select! {
                _ = self.shutdown.changed() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        log::debug!("container `{}`: sampler stopped", self.container_id);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("scripted fetch failure")]
    struct ScriptedError;

    /// Counter source that replays a fixed script of responses.
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<NetworkCounters, ScriptedError>>>,
    }

    impl ScriptedSource {
        fn new(
            responses: impl IntoIterator<Item = Result<NetworkCounters, ScriptedError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().collect()),
            })
        }
    }

    impl CounterSource for ScriptedSource {
        type Error = ScriptedError;

        async fn network_counters(
            &self,
            _container_id: &ContainerID,
        ) -> Result<NetworkCounters, ScriptedError> {
            self.responses
                .lock()
                .expect("responses lock poisoned")
                .pop_front()
                .unwrap_or(Err(ScriptedError))
        }
    }

    fn counters(rx_bytes: u64, tx_bytes: u64) -> NetworkCounters {
        NetworkCounters { rx_bytes, tx_bytes }
    }

    fn spawn_sampler(
        source: Arc<ScriptedSource>,
        max_fetch_attempts: u32,
    ) -> (
        mpsc::Receiver<NetworkCounters>,
        watch::Sender<bool>,
        tokio::task::JoinHandle<()>,
    ) {
        let (tx, rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sampler = Sampler::new(
            ContainerID::new("test-container").unwrap(),
            source,
            Duration::from_millis(1),
            max_fetch_attempts,
            tx,
            shutdown_rx,
        );
        (rx, shutdown_tx, tokio::spawn(sampler.run()))
    }

    #[tokio::test]
    async fn test_emits_distinct_samples_in_order() {
        let source = ScriptedSource::new([Ok(counters(100, 10)), Ok(counters(200, 20))]);
        let (mut rx, _shutdown, handle) = spawn_sampler(source, 1);

        assert_eq!(rx.recv().await, Some(counters(100, 10)));
        assert_eq!(rx.recv().await, Some(counters(200, 20)));
        // Script exhausted: the sampler gives up and closes the stream.
        assert_eq!(rx.recv().await, None);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_snapshot_suppressed() {
        let source = ScriptedSource::new([
            Ok(counters(100, 10)),
            Ok(counters(100, 10)),
            Ok(counters(300, 30)),
        ]);
        let (mut rx, _shutdown, handle) = spawn_sampler(source, 1);

        assert_eq!(rx.recv().await, Some(counters(100, 10)));
        // The duplicate is swallowed; the next emission is the changed value.
        assert_eq!(rx.recv().await, Some(counters(300, 30)));
        assert_eq!(rx.recv().await, None);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_transient_failure_retried_within_budget() {
        let source = ScriptedSource::new([
            Ok(counters(100, 10)),
            Err(ScriptedError),
            Ok(counters(200, 20)),
        ]);
        let (mut rx, _shutdown, handle) = spawn_sampler(source, 3);

        assert_eq!(rx.recv().await, Some(counters(100, 10)));
        assert_eq!(rx.recv().await, Some(counters(200, 20)));
        handle.abort();
    }

    #[tokio::test]
    async fn test_stream_closes_after_attempt_budget() {
        let source = ScriptedSource::new([Err(ScriptedError), Err(ScriptedError)]);
        let (mut rx, _shutdown, handle) = spawn_sampler(source, 2);

        assert_eq!(rx.recv().await, None);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_stops_sampler() {
        let source = ScriptedSource::new([Ok(counters(100, 10)), Ok(counters(200, 20))]);
        let (mut rx, shutdown, handle) = spawn_sampler(source, 1);

        assert_eq!(rx.recv().await, Some(counters(100, 10)));
        shutdown.send(true).unwrap();
        handle.await.unwrap();
    }
}
