//! flowmon: a container network-speed monitor.
//!
//! For every running container matching a configured label, flowmon polls the
//! Docker Engine API for cumulative network byte counters and converts them
//! into smoothed throughput estimates. Each container gets its own
//! sampler → estimator pipeline; the computed speeds are printed on stdout in
//! a stable, parseable format.
//!
//! The speed signal is a building block for bandwidth-aware routing; this
//! crate deliberately stops at producing the rate stream and makes no policy
//! decisions based on it.

use std::sync::Arc;

pub mod config;
pub mod container;
pub mod docker;
pub mod pipeline;
pub mod speed;

use pipeline::Supervisor;

/// Runs the monitor until every pipeline has stopped.
///
/// Discovers target containers, spawns one speed pipeline per container, and
/// drains the resulting speed streams round-robin, printing each estimate.
/// Ctrl-C triggers a cooperative shutdown of all pipelines.
///
/// # Errors
///
/// Fails fast at startup if the configuration is invalid, the Docker daemon
/// is unreachable, or no container matches the configured label. Per-sample
/// fetch errors after startup never abort the process; they are retried and,
/// if persistent, end only the affected container's stream.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::from_env()?;

    let client = Arc::new(docker::Client::new(config.socket_path.clone()));
    client.ping().await?;
    log::debug!(
        "docker daemon reachable via `{}`",
        config.socket_path.display()
    );

    let container_ids = client.list_containers(&config.label_filter).await?;
    if container_ids.is_empty() {
        return Err(format!(
            "no containers found for label `{}`",
            config.label_filter
        )
        .into());
    }
    log::info!(
        "monitoring {} container(s) with label `{}` every {:?}",
        container_ids.len(),
        config.label_filter,
        config.poll_interval
    );

    let supervisor = Arc::new(Supervisor::new());
    let mut streams = Vec::with_capacity(container_ids.len());
    for container_id in container_ids {
        streams.push(supervisor.spawn_pipeline(
            container_id,
            Arc::clone(&client),
            config.poll_interval,
            config.max_fetch_attempts,
        ));
    }

    {
        let supervisor = Arc::clone(&supervisor);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, stopping pipelines");
                supervisor.shutdown();
            }
        });
    }

    // Round-robin drain of the per-container speed streams. Arrival rates are
    // independent per container; a closed stream leaves the rotation.
    while !streams.is_empty() {
        let mut index = 0;
        while index < streams.len() {
            match streams[index].recv().await {
                Some(speed) => {
                    println!("{speed}");
                    index += 1;
                }
                None => {
                    let stream = streams.swap_remove(index);
                    log::info!("container `{}`: speed stream ended", stream.container_id());
                    supervisor.remove_pipeline(stream.container_id());
                }
            }
        }
    }

    Ok(())
}
