//! A small manager interface server for integration tests
//!
//! Answers `login`, `PJSIPShowEndpoints`, `PJSIPShowEndpoint` and `logoff`
//! from an in-memory endpoint table the way Asterisk does, over a real
//! loopback TCP listener.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ami_core::protocol::{FieldMap, FrameReader};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::EnvFilter;

pub const BANNER: &str = "Asterisk Call Manager/5.0.1\r\n";

/// Route client logs through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub contacts: String,
    pub caller_id: String,
}

impl Endpoint {
    pub fn new(name: &str, contacts: &str, caller_id: &str) -> Self {
        Self {
            name: name.to_string(),
            contacts: contacts.to_string(),
            caller_id: caller_id.to_string(),
        }
    }
}

/// How the server behaves
#[derive(Debug, Clone)]
pub struct ServerBehavior {
    pub username: String,
    pub secret: String,
    pub endpoints: Vec<Endpoint>,
    /// Answer `PJSIPShowEndpoints` with `Response: Error` and this message
    pub list_error: Option<String>,
    /// Accept the connection and never write anything
    pub silent: bool,
}

impl Default for ServerBehavior {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            secret: "secret".to_string(),
            endpoints: Vec::new(),
            list_error: None,
            silent: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ServerStats {
    pub connections: AtomicUsize,
    /// Connections on which the client closed its side
    pub closed: AtomicUsize,
    pub actions: Mutex<Vec<String>>,
}

pub struct MockAmiServer {
    pub addr: SocketAddr,
    pub stats: Arc<ServerStats>,
}

impl MockAmiServer {
    pub async fn start(behavior: ServerBehavior) -> Self {
        init_tracing();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = Arc::new(ServerStats::default());
        let behavior = Arc::new(behavior);

        let server_stats = stats.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                server_stats.connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, behavior.clone(), server_stats.clone()));
            }
        });

        Self { addr, stats }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn actions(&self) -> Vec<String> {
        self.stats.actions.lock().clone()
    }

    /// Wait until `expected` connections have been closed by the client
    pub async fn wait_closed(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.stats.closed.load(Ordering::SeqCst) >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.stats.closed.load(Ordering::SeqCst)
    }

    /// Blocking variant of [`wait_closed`](Self::wait_closed)
    pub fn wait_closed_blocking(&self, expected: usize) -> usize {
        for _ in 0..100 {
            if self.stats.closed.load(Ordering::SeqCst) >= expected {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        self.stats.closed.load(Ordering::SeqCst)
    }
}

async fn serve(stream: TcpStream, behavior: Arc<ServerBehavior>, stats: Arc<ServerStats>) {
    let mut conn = FrameReader::new(stream);
    if behavior.silent {
        while let Ok(Some(_)) = conn.next_frame().await {}
        stats.closed.fetch_add(1, Ordering::SeqCst);
        return;
    }
    if conn.get_mut().write_all(BANNER.as_bytes()).await.is_err() {
        return;
    }

    let mut authenticated = false;
    loop {
        let frame = match conn.next_frame().await {
            Ok(Some(frame)) => frame,
            _ => break,
        };
        let fields = frame.fields();
        let action = fields.get_or_empty("Action").to_string();
        stats.actions.lock().push(action.clone());

        let reply = match action.to_ascii_lowercase().as_str() {
            "login" => {
                authenticated = fields.is("Username", &behavior.username)
                    && fields.is("Secret", &behavior.secret);
                login_reply(&fields, authenticated)
            }
            "pjsipshowendpoints" if authenticated => list_reply(&fields, &behavior),
            "pjsipshowendpoint" if authenticated => detail_reply(&fields, &behavior),
            "logoff" => {
                let _ = conn
                    .get_mut()
                    .write_all(b"Response: Goodbye\r\nMessage: Thanks for all the fish.\r\n\r\n")
                    .await;
                break;
            }
            _ => format!(
                "Response: Error\r\nActionID: {}\r\nMessage: Permission denied\r\n\r\n",
                fields.get_or_empty("ActionID")
            ),
        };
        if conn.get_mut().write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }

    // Drain until the client closes its side.
    while let Ok(Some(_)) = conn.next_frame().await {}
    stats.closed.fetch_add(1, Ordering::SeqCst);
}

fn login_reply(fields: &FieldMap, accepted: bool) -> String {
    let (response, message) = if accepted {
        ("Success", "Authentication accepted")
    } else {
        ("Error", "Authentication failed")
    };
    format!(
        "Response: {}\r\nActionID: {}\r\nMessage: {}\r\n\r\n",
        response,
        fields.get_or_empty("ActionID"),
        message
    )
}

fn list_reply(fields: &FieldMap, behavior: &ServerBehavior) -> String {
    let id = fields.get_or_empty("ActionID");
    if let Some(message) = &behavior.list_error {
        return format!("Response: Error\r\nActionID: {}\r\nMessage: {}\r\n\r\n", id, message);
    }

    let mut reply = format!(
        "Response: Success\r\nActionID: {}\r\nEventList: start\r\n\
         Message: A listing of Endpoints follows, presented as EndpointList events\r\n\r\n",
        id
    );
    for endpoint in &behavior.endpoints {
        let device_state = if endpoint.contacts.is_empty() { "Unavailable" } else { "Not in use" };
        reply.push_str(&format!(
            "Event: EndpointList\r\nActionID: {}\r\nObjectType: endpoint\r\nObjectName: {}\r\n\
             Transport: transport-udp\r\nAor: {}\r\nAuths: {}\r\nOutboundAuths: \r\n\
             Contacts: {}\r\nDeviceState: {}\r\nActiveChannels: \r\n\r\n",
            id, endpoint.name, endpoint.name, endpoint.name, endpoint.contacts, device_state
        ));
    }
    reply.push_str(&format!(
        "Event: EndpointListComplete\r\nActionID: {}\r\nEventList: Complete\r\nListItems: {}\r\n\r\n",
        id,
        behavior.endpoints.len()
    ));
    reply
}

fn detail_reply(fields: &FieldMap, behavior: &ServerBehavior) -> String {
    let id = fields.get_or_empty("ActionID");
    let name = fields.get_or_empty("Endpoint");
    let Some(endpoint) = behavior.endpoints.iter().find(|e| e.name == name) else {
        return format!(
            "Response: Error\r\nActionID: {}\r\nMessage: Unable to retrieve endpoint {}\r\n\r\n",
            id, name
        );
    };

    format!(
        "Response: Success\r\nActionID: {id}\r\nEventList: start\r\n\
         Message: Following are Events for each object associated with the Endpoint\r\n\r\n\
         Event: EndpointDetail\r\nActionID: {id}\r\nObjectType: endpoint\r\nObjectName: {name}\r\n\
         Context: from-internal\r\nCallerid: {caller_id}\r\nDeviceState: Not in use\r\n\r\n\
         Event: AorDetail\r\nActionID: {id}\r\nObjectType: aor\r\nObjectName: {name}\r\n\
         Contacts: {contacts}\r\n\r\n\
         Event: EndpointDetailComplete\r\nActionID: {id}\r\nEventList: Complete\r\nListItems: 2\r\n\r\n",
        id = id,
        name = endpoint.name,
        caller_id = endpoint.caller_id,
        contacts = endpoint.contacts,
    )
}
