use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment variable `{0}` must be set")]
    MissingVar(&'static str),
    #[error("invalid value `{value}` for `{var}`: expected a positive integer")]
    InvalidPositiveInt { var: &'static str, value: String },
}
pub type Result<T> = std::result::Result<T, Error>;

const LABEL_VAR: &str = "FLOWMON_CONTAINER_LABEL";
const POLL_INTERVAL_VAR: &str = "FLOWMON_POLL_INTERVAL_SECS";
const DOCKER_SOCKET_VAR: &str = "FLOWMON_DOCKER_SOCKET";
const MAX_FETCH_ATTEMPTS_VAR: &str = "FLOWMON_MAX_FETCH_ATTEMPTS";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";
const DEFAULT_MAX_FETCH_ATTEMPTS: u32 = 3;

/// Runtime configuration, read from the environment at startup.
///
/// The poll interval is applied both to the sampler cadence and to the
/// estimator's per-second normalization; the two must never diverge, so it is
/// configured in exactly one place.
#[derive(Debug, Clone)]
pub struct Config {
    /// Label selecting the containers to monitor.
    pub label_filter: String,
    /// Cadence of counter snapshots per container.
    pub poll_interval: Duration,
    /// Path to the Docker Engine unix socket.
    pub socket_path: PathBuf,
    /// Fetch attempts per poll cycle before a container's pipeline gives up.
    pub max_fetch_attempts: u32,
}

impl Config {
    /// Loads the configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `FLOWMON_CONTAINER_LABEL` is unset or any numeric
    /// variable fails to parse as a positive integer.
    pub fn from_env() -> Result<Self> {
        let label_filter =
            std::env::var(LABEL_VAR).map_err(|_| Error::MissingVar(LABEL_VAR))?;

        let poll_interval_secs = match std::env::var(POLL_INTERVAL_VAR) {
            Ok(raw) => parse_positive(POLL_INTERVAL_VAR, &raw)?,
            Err(_) => DEFAULT_POLL_INTERVAL_SECS,
        };

        let socket_path = std::env::var_os(DOCKER_SOCKET_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCKER_SOCKET));

        let max_fetch_attempts = match std::env::var(MAX_FETCH_ATTEMPTS_VAR) {
            Ok(raw) => parse_positive::<u32>(MAX_FETCH_ATTEMPTS_VAR, &raw)?,
            Err(_) => DEFAULT_MAX_FETCH_ATTEMPTS,
        };

        Ok(Self {
            label_filter,
            poll_interval: Duration::from_secs(poll_interval_secs),
            socket_path,
            max_fetch_attempts,
        })
    }
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = raw.parse::<T>().map_err(|_| Error::InvalidPositiveInt {
        var,
        value: raw.to_owned(),
    })?;
    if value <= T::default() {
        return Err(Error::InvalidPositiveInt {
            var,
            value: raw.to_owned(),
        });
    }
    Ok(value)
}
