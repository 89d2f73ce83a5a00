use std::path::PathBuf;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Request;
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;

use super::models::{ContainerSummary, StatsResponse};
use super::{Error, Result};
use crate::container::ContainerID;
use crate::speed::{CounterSource, NetworkCounters};

/// Pinned Docker Engine API version.
const API_VERSION: &str = "v1.42";

/// Docker Engine API client over the daemon's unix socket.
///
/// Constructed once at startup and shared by reference into every sampler;
/// requests are independent one-shot connections, so concurrent use needs no
/// synchronization.
#[derive(Debug, Clone)]
pub struct Client {
    socket_path: PathBuf,
}

impl Client {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Checks that the daemon is reachable and answering.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be connected or the daemon does
    /// not answer the ping with a success status.
    pub async fn ping(&self) -> Result<()> {
        self.get(format!("/{API_VERSION}/_ping")).await.map(|_| ())
    }

    /// Lists running containers carrying the given label.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response contains an
    /// invalid container id.
    pub async fn list_containers(&self, label: &str) -> Result<Vec<ContainerID>> {
        let filters = serde_json::json!({ "label": [label] }).to_string();
        let path = format!(
            "/{API_VERSION}/containers/json?filters={}",
            percent_encode(&filters)
        );
        let summaries: Vec<ContainerSummary> = self.get_json(path).await?;

        summaries
            .into_iter()
            .map(|summary| ContainerID::new(summary.id).map_err(Error::from))
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(&self, path: String) -> Result<T> {
        let body = self.get(path.clone()).await?;
        serde_json::from_slice(&body).map_err(|source| Error::Decode { path, source })
    }

    async fn get(&self, path: String) -> Result<Bytes> {
        let stream = tokio::net::UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| Error::SocketConnect {
                path: self.socket_path.clone(),
                source,
            })?;
        let io = TokioIo::new(stream);
        let (mut sender, connection) = hyper::client::conn::http1::handshake::<_, Empty<Bytes>>(io)
            .await
            .map_err(Error::Handshake)?;
        // The connection must be driven while the request is in flight.
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                log::debug!("docker connection ended with error: {err}");
            }
        });

        let request = Request::builder()
            .uri(path.as_str())
            .header(hyper::header::HOST, "docker")
            .body(Empty::new())
            .map_err(|source| Error::Request {
                path: path.clone(),
                source,
            })?;
        let response = sender
            .send_request(request)
            .await
            .map_err(|source| Error::Transport {
                path: path.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|source| Error::Transport {
                path: path.clone(),
                source,
            })?
            .to_bytes();

        if !status.is_success() {
            return Err(Error::Status { path, status });
        }

        Ok(body)
    }
}

impl CounterSource for Client {
    type Error = Error;

    /// Fetches a one-shot stats snapshot and aggregates its interfaces.
    async fn network_counters(&self, container_id: &ContainerID) -> Result<NetworkCounters> {
        let path =
            format!("/{API_VERSION}/containers/{container_id}/stats?stream=false&one-shot=true");
        let stats: StatsResponse = self.get_json(path).await?;
        Ok(stats.total_counters())
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encodes everything outside the RFC 3986 unreserved set, as
/// required for the JSON `filters` query parameter.
fn percent_encode(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len() * 3);
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                encoded.push('%');
                encoded.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
                encoded.push(HEX_DIGITS[usize::from(byte & 0x0F)] as char);
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode_unreserved_passthrough() {
        assert_eq!(percent_encode("abc-XYZ_0.9~"), "abc-XYZ_0.9~");
    }

    #[test]
    fn test_percent_encode_filter_json() {
        assert_eq!(
            percent_encode(r#"{"label":["aa2.vpn"]}"#),
            "%7B%22label%22%3A%5B%22aa2.vpn%22%5D%7D"
        );
    }
}
