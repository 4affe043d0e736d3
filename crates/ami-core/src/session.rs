//! Query session
//!
//! One query is one session over one connection:
//!
//! ```text
//! Connecting ─► Authenticating ─► Enumerating ─► DetailLookup* ─► LoggingOff ─► Done
//!      │              │                │               │               │
//!      └──────────────┴────────────────┴───────────────┴───────────────┴──► Failed
//! ```
//!
//! - **Authenticating** reads the greeting banner, sends `login` and reads one
//!   frame. A rejected login is not an error: the session skips straight to
//!   logoff and returns an empty map.
//! - **Enumerating** sends `PJSIPShowEndpoints` and collects endpoint list
//!   events until the completion marker.
//! - **DetailLookup** sends one `PJSIPShowEndpoint` per registered endpoint and
//!   takes the caller id from the last matching detail event.
//! - **LoggingOff** sends `logoff` and consumes at most one reply.
//!
//! The session deadline is fixed once the connection is up and bounds every
//! read and write after that. Running out of time while waiting for the logoff
//! reply is not an error: the result is already complete. Whatever the
//! outcome, the stream is shut down exactly once before
//! [`AmiClient::query_endpoints`] returns.

use std::fmt;
use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::AmiConfig;
use crate::error::{AmiError, Result};
use crate::protocol::{
    endpoint_detail, endpoint_list_entry, is_complete, Action, FieldMap, FrameReader, RawFrame,
    AUTH_ACCEPTED, FIELD_MESSAGE,
};
use crate::transport::{Connector, TcpConnector};
use crate::types::{build_result_map, EndpointSummary, ResultMap};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Enumerating,
    DetailLookup,
    LoggingOff,
    Done,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Enumerating => "enumerating",
            SessionState::DetailLookup => "detail-lookup",
            SessionState::LoggingOff => "logging-off",
            SessionState::Done => "done",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Endpoint query client
///
/// Holds configuration only; every call to
/// [`query_endpoints`](Self::query_endpoints) opens, drives and closes its own
/// session, so repeated calls share no state.
#[derive(Debug, Clone)]
pub struct AmiClient<C = TcpConnector> {
    config: AmiConfig,
    connector: C,
}

impl AmiClient<TcpConnector> {
    /// Client connecting over plain TCP
    pub fn new(config: AmiConfig) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> AmiClient<C> {
    /// Client using a custom connector
    pub fn with_connector(config: AmiConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &AmiConfig {
        &self.config
    }

    /// Run one query session and return the registered endpoints
    pub async fn query_endpoints(&self) -> Result<ResultMap> {
        self.config.validate()?;
        let config = &self.config;
        let addr = config.address();

        debug!("Session state: {}", SessionState::Connecting);
        let stream = self
            .connector
            .connect(&config.host, config.port, config.connect_timeout)
            .await
            .map_err(|e| {
                warn!("Connection to {} failed: {}", addr, e);
                e
            })?;
        info!("Connected to manager interface at {}", addr);

        let mut session = AmiSession::new(config, stream);
        let result = session.run().await;
        if let Err(e) = &result {
            warn!("Session with {} failed while {}: {}", addr, session.state(), e);
            session.transition(SessionState::Failed);
        }
        session.close().await;

        result
    }
}

/// One session over an established stream
pub struct AmiSession<'a, S> {
    config: &'a AmiConfig,
    reader: FrameReader<S>,
    state: SessionState,
    deadline: Instant,
}

impl<'a, S> AmiSession<'a, S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a freshly connected stream; the session deadline starts now
    pub fn new(config: &'a AmiConfig, stream: S) -> Self {
        Self {
            config,
            reader: FrameReader::new(stream),
            state: SessionState::Connecting,
            deadline: Instant::now() + config.session_deadline,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Drive the session from the greeting banner through logoff
    pub async fn run(&mut self) -> Result<ResultMap> {
        self.transition(SessionState::Authenticating);
        let deadline = self.deadline;
        let limit = self.config.session_deadline;
        let banner = before(deadline, limit, self.reader.read_line())
            .await?
            .ok_or(AmiError::UnexpectedEof {
                stage: "greeting banner",
            })?;
        debug!("Server banner: {}", banner);

        let mut endpoints = Vec::new();
        if self.login().await? {
            self.transition(SessionState::Enumerating);
            endpoints = self.enumerate().await?;
            info!("Enumerated {} endpoints", endpoints.len());

            self.transition(SessionState::DetailLookup);
            for endpoint in endpoints.iter_mut().filter(|e| e.is_registered()) {
                self.lookup_detail(endpoint).await?;
            }
        }

        let result = build_result_map(&endpoints, self.config.result_key);
        info!(
            "Resolved {} of {} endpoints (keyed by {})",
            result.len(),
            endpoints.len(),
            self.config.result_key
        );

        self.transition(SessionState::LoggingOff);
        self.logoff().await?;
        self.transition(SessionState::Done);
        Ok(result)
    }

    async fn login(&mut self) -> Result<bool> {
        let config = self.config;
        self.send(&Action::Login {
            username: &config.username,
            secret: &config.secret,
            action_id: &config.action_id,
        })
        .await?;

        let fields = self.next_fields().await?.unwrap_or_default();
        let accepted = fields.is(FIELD_MESSAGE, AUTH_ACCEPTED);
        if accepted {
            info!("Authenticated as {}", config.username);
        } else {
            warn!(
                "Login as {} not accepted: {}",
                config.username,
                fields.get(FIELD_MESSAGE).unwrap_or("<no message>")
            );
        }
        Ok(accepted)
    }

    async fn enumerate(&mut self) -> Result<Vec<EndpointSummary>> {
        let config = self.config;
        self.send(&Action::ShowEndpoints {
            action_id: &config.action_id,
        })
        .await?;

        let mut endpoints = Vec::new();
        while let Some(fields) = self.next_fields().await? {
            if is_complete(&fields) {
                break;
            }
            let entry = endpoint_list_entry(&fields, &config.action_id)?;
            if entry.identifier.contains(['\r', '\n']) {
                warn!("Skipping endpoint with line break in its name: {:?}", entry.identifier);
                continue;
            }
            if !entry.identifier.is_empty() {
                debug!("Endpoint {} contacts {:?}", entry.identifier, entry.contact_uri);
                endpoints.push(EndpointSummary::new(entry.identifier, entry.contact_uri));
            }
        }
        Ok(endpoints)
    }

    async fn lookup_detail(&mut self, endpoint: &mut EndpointSummary) -> Result<()> {
        let config = self.config;
        self.send(&Action::ShowEndpoint {
            endpoint: &endpoint.identifier,
            action_id: &config.action_id,
        })
        .await?;

        while let Some(fields) = self.next_fields().await? {
            if is_complete(&fields) {
                break;
            }
            let detail = endpoint_detail(&fields, &config.action_id)?;
            if !detail.caller_id.is_empty() && detail.identifier == endpoint.identifier {
                debug!("Endpoint {} caller id {:?}", endpoint.identifier, detail.caller_id);
                endpoint.display_name = detail.caller_id;
            }
        }
        Ok(())
    }

    async fn logoff(&mut self) -> Result<()> {
        self.send(&Action::Logoff).await?;
        match self.next_frame().await {
            Ok(Some(frame)) => debug!("Logoff reply: {:?}", frame),
            Ok(None) => debug!("Connection closed after logoff"),
            Err(e) => warn!("Ignoring failure reading logoff reply: {}", e),
        }
        Ok(())
    }

    async fn send(&mut self, action: &Action<'_>) -> Result<()> {
        debug!("Sending {:?}", action);
        let deadline = self.deadline;
        let limit = self.config.session_deadline;
        let stream = self.reader.get_mut();
        let bytes = action.to_bytes();
        before(deadline, limit, async {
            stream.write_all(&bytes).await?;
            stream.flush().await?;
            Ok::<_, AmiError>(())
        })
        .await
    }

    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let deadline = self.deadline;
        let limit = self.config.session_deadline;
        before(deadline, limit, self.reader.next_frame()).await
    }

    async fn next_fields(&mut self) -> Result<Option<FieldMap>> {
        let frame = self.next_frame().await?;
        Ok(frame.map(|frame| {
            let fields = frame.fields();
            debug!("Received {:?}", fields);
            fields
        }))
    }

    /// Shut the stream down; failures only get logged since the session is
    /// over either way
    pub async fn close(self) {
        let mut stream = self.reader.into_inner();
        if let Err(e) = stream.shutdown().await {
            debug!("Error shutting down connection: {}", e);
        }
    }
}

/// Run `operation` unless the session deadline passes first
async fn before<T, F>(deadline: Instant, limit: std::time::Duration, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout_at(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(AmiError::timeout("session", limit)),
    }
}
