use std::path::PathBuf;

use hyper::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to connect to docker socket `{path}`: {source}")]
    SocketConnect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("http handshake with docker daemon failed: {0}")]
    Handshake(#[source] hyper::Error),
    #[error("failed to build request for `{path}`: {source}")]
    Request {
        path: String,
        #[source]
        source: hyper::http::Error,
    },
    #[error("request to `{path}` failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: hyper::Error,
    },
    #[error("unexpected status {status} for `{path}`")]
    Status { path: String, status: StatusCode },
    #[error("failed to decode response from `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    InvalidContainerID(#[from] crate::container::Error),
}
pub type Result<T> = std::result::Result<T, Error>;
