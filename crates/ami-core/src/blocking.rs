//! Synchronous facade
//!
//! For callers without an async runtime. Each call builds a private
//! current-thread runtime, drives one session on it and tears it down again.
//! Called from inside a tokio runtime they fail with
//! [`AmiError::BlockingInAsync`]; use the async API there instead.

use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::AmiConfig;
use crate::error::{AmiError, Result};
use crate::session::AmiClient;
use crate::transport::Connector;
use crate::types::ResultMap;

/// Query the endpoints registered on `host:port`, blocking until done
///
/// ```no_run
/// let endpoints = ami_core::blocking::query_endpoints("10.0.0.1", 5038, "admin", "secret")?;
/// for (address, endpoint) in &endpoints {
///     println!("{} -> {} ({})", address, endpoint.identifier, endpoint.display_name);
/// }
/// # Ok::<(), ami_core::AmiError>(())
/// ```
pub fn query_endpoints(host: &str, port: u16, username: &str, secret: &str) -> Result<ResultMap> {
    query_with_config(AmiConfig::new(host, username, secret).with_port(port))
}

/// Query with a full configuration, blocking until done
pub fn query_with_config(config: AmiConfig) -> Result<ResultMap> {
    query_with_client(&AmiClient::new(config))
}

/// Run one query of an existing client, blocking until done
pub fn query_with_client<C: Connector>(client: &AmiClient<C>) -> Result<ResultMap> {
    runtime()?.block_on(client.query_endpoints())
}

fn runtime() -> Result<Runtime> {
    if Handle::try_current().is_ok() {
        return Err(AmiError::BlockingInAsync);
    }
    Ok(Builder::new_current_thread().enable_all().build()?)
}
