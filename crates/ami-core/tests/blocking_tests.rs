//! Synchronous facade

mod common;

use ami_core::blocking;
use ami_core::{AmiConfig, AmiError};
use common::{Endpoint, MockAmiServer, ServerBehavior};

fn start_server(runtime: &tokio::runtime::Runtime, behavior: ServerBehavior) -> MockAmiServer {
    runtime.block_on(MockAmiServer::start(behavior))
}

#[test]
fn test_blocking_query() {
    // The server needs its own runtime; the query builds a private one.
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = start_server(
        &runtime,
        ServerBehavior {
            endpoints: vec![Endpoint::new("100", "sip:100@10.0.0.5:5060", "Alice")],
            ..ServerBehavior::default()
        },
    );

    let result = blocking::query_endpoints("127.0.0.1", server.port(), "admin", "secret").unwrap();

    assert_eq!(result.len(), 1);
    let endpoint = &result["10.0.0.5"];
    assert_eq!(endpoint.identifier, "100");
    assert_eq!(endpoint.display_name, "Alice");
    assert_eq!(server.wait_closed_blocking(1), 1);
}

#[test]
fn test_blocking_connect_refused() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let err = blocking::query_with_config(AmiConfig::new("127.0.0.1", "admin", "secret").with_port(port))
        .unwrap_err();

    assert!(matches!(err, AmiError::Connect { .. }), "got {:?}", err);
    assert!(err.is_transport());
}

#[test]
fn test_blocking_rejects_invalid_config() {
    let err = blocking::query_endpoints("127.0.0.1", 0, "admin", "secret").unwrap_err();
    assert!(matches!(err, AmiError::Configuration { .. }));
}

#[tokio::test]
async fn test_blocking_inside_runtime_is_an_error() {
    let err = blocking::query_endpoints("127.0.0.1", 5038, "admin", "secret").unwrap_err();
    assert!(matches!(err, AmiError::BlockingInAsync), "got {:?}", err);
}
