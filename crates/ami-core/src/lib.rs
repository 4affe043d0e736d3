//! # AMI-Core - PJSIP endpoint addresses over the Asterisk Manager Interface
//!
//! This crate logs into an Asterisk manager interface, enumerates the PJSIP
//! endpoints, looks up each registered endpoint's caller id, and returns a map
//! from the address each endpoint registered from to its details.
//!
//! ```no_run
//! # async fn example() -> ami_core::Result<()> {
//! let endpoints = ami_core::query_endpoints("10.0.0.1", 5038, "admin", "secret").await?;
//! for (address, endpoint) in &endpoints {
//!     println!("{} -> {} {}", address, endpoint.identifier, endpoint.display_name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`AmiClient`] takes an [`AmiConfig`] for control over timeouts, the
//! correlation identifier and the result keying; [`blocking`] offers the same
//! query for synchronous callers.

pub mod blocking;
pub mod config;
pub mod contact;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod types;

pub use config::{AmiConfig, ResultKey};
pub use error::{AmiError, Result};
pub use session::{AmiClient, AmiSession, SessionState};
pub use transport::{Connector, TcpConnector};
pub use types::{EndpointSummary, ResolvedEndpoint, ResultMap};

/// Query the endpoints registered on `host:port` with default settings
pub async fn query_endpoints(host: &str, port: u16, username: &str, secret: &str) -> Result<ResultMap> {
    AmiClient::new(AmiConfig::new(host, username, secret).with_port(port))
        .query_endpoints()
        .await
}
