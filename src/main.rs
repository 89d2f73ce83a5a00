/// Entry point for the flowmon container network-speed monitor.
///
/// Initializes logging and runs the monitoring pipelines until they stop or
/// the process is interrupted.
///
/// # Errors
///
/// Returns an error if startup fails (e.g., missing configuration, Docker
/// daemon unreachable, or no containers matching the configured label).
///
/// # Examples
///
/// ```bash
/// FLOWMON_CONTAINER_LABEL=aa2.vpn cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    flowmon::run().await
}
