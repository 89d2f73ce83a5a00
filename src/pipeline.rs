use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::container::ContainerID;
use crate::speed::{CounterSource, Sampler, SpeedEstimate, SpeedEstimator};

/// Per-stage channel capacity. A single in-flight item gives near-rendezvous
/// semantics: a slow consumer stalls the producer's next poll, which bounds
/// memory growth without explicit buffering policy.
const STAGE_CHANNEL_CAPACITY: usize = 1;

#[derive(Debug)]
struct PipelineHandle {
    sampler: JoinHandle<()>,
    estimator: JoinHandle<()>,
}

/// Receiving end of one container's speed stream.
#[derive(Debug)]
pub struct SpeedStream {
    container_id: ContainerID,
    rx: mpsc::Receiver<SpeedEstimate>,
}

impl SpeedStream {
    pub fn container_id(&self) -> &ContainerID {
        &self.container_id
    }

    /// Waits for the next estimate; `None` once the pipeline has stopped.
    pub async fn recv(&mut self) -> Option<SpeedEstimate> {
        self.rx.recv().await
    }
}

/// Spawns and tracks the sampler/estimator task pair of every monitored
/// container.
///
/// Pipelines are fully independent of each other; the supervisor only holds
/// their join handles and the shared shutdown signal.
#[derive(Debug)]
pub struct Supervisor {
    pipelines: DashMap<ContainerID, PipelineHandle>,
    shutdown: watch::Sender<bool>,
}

impl Supervisor {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            pipelines: DashMap::default(),
            shutdown,
        }
    }

    /// Wires a sampler into an estimator for the given container, spawns both
    /// tasks, and returns the resulting speed stream.
    pub fn spawn_pipeline<S>(
        &self,
        container_id: ContainerID,
        source: Arc<S>,
        poll_interval: Duration,
        max_fetch_attempts: u32,
    ) -> SpeedStream
    where
        S: CounterSource + Send + Sync + 'static,
    {
        let (sample_tx, sample_rx) = mpsc::channel(STAGE_CHANNEL_CAPACITY);
        let (speed_tx, speed_rx) = mpsc::channel(STAGE_CHANNEL_CAPACITY);

        let sampler = Sampler::new(
            container_id.clone(),
            source,
            poll_interval,
            max_fetch_attempts,
            sample_tx,
            self.shutdown.subscribe(),
        );
        let estimator = SpeedEstimator::new(container_id.clone(), poll_interval);

        let handle = PipelineHandle {
            sampler: tokio::spawn(sampler.run()),
            estimator: tokio::spawn(estimator.run(
                sample_rx,
                speed_tx,
                self.shutdown.subscribe(),
            )),
        };
        self.pipelines.insert(container_id.clone(), handle);
        log::debug!("container `{container_id}`: pipeline started");

        SpeedStream {
            container_id,
            rx: speed_rx,
        }
    }

    /// Drops a pipeline, aborting its tasks if they are still running.
    pub fn remove_pipeline(&self, container_id: &ContainerID) {
        if let Some((_, handle)) = self.pipelines.remove(container_id) {
            handle.sampler.abort();
            handle.estimator.abort();
            log::debug!("container `{container_id}`: pipeline removed");
        }
    }

    /// Signals every pipeline to stop at its next suspension point.
    pub fn shutdown(&self) {
        // Err means no live receivers, i.e., nothing left to stop.
        let _ = self.shutdown.send(true);
    }

    pub fn size(&self) -> usize {
        self.pipelines.len()
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}
