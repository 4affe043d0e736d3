//! Connection establishment
//!
//! The session only needs a byte stream it can read and write. [`Connector`]
//! is the seam between the session and the network: [`TcpConnector`] opens a
//! real TCP connection, tests substitute scripted in-memory streams.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{AmiError, Result};

/// Opens the stream a session runs over
#[async_trait]
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Connect to `host:port`, giving up after `timeout`
    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<Self::Stream>;
}

/// Plain TCP connector
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
        let addr = format!("{}:{}", host, port);
        debug!("Connecting to {} (timeout {:?})", addr, timeout);

        let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(AmiError::Connect { addr, source }),
            Err(_) => return Err(AmiError::timeout("connect", timeout)),
        };

        // Requests are small and strictly request/response.
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY on {}: {}", addr, e);
        }
        Ok(stream)
    }
}
