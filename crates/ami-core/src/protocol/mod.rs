//! Manager interface wire protocol
//!
//! The manager interface speaks blocks of `Field: value` lines separated by
//! CRLF and terminated by an empty line, in both directions. This module holds
//! the field and action names the client relies on, the rendering of outbound
//! actions, and the inbound side split into three layers:
//!
//! - [`frame`] - cuts the byte stream into frames at the blank line
//! - [`fields`] - turns one frame into a [`FieldMap`]
//! - [`classify`] - recognizes completion markers, error responses and the
//!   endpoint events the session cares about

pub mod classify;
pub mod fields;
pub mod frame;

use std::fmt;

pub use classify::{endpoint_detail, endpoint_list_entry, is_complete, DetailEntry, ListEntry};
pub use fields::{parse_fields, FieldMap};
pub use frame::{FrameDecoder, FrameReader, RawFrame, MAX_FRAME_SIZE};

/// Line terminator
pub const CRLF: &str = "\r\n";

/// Frame delimiter: an empty line after the last field
pub const FRAME_DELIMITER: &str = "\r\n\r\n";

/// `Message` value the server sends for a successful login
pub const AUTH_ACCEPTED: &str = "Authentication accepted";

/// Action names
pub const ACTION_LOGIN: &str = "login";
pub const ACTION_LOGOFF: &str = "logoff";
pub const ACTION_SHOW_ENDPOINTS: &str = "PJSIPShowEndpoints";
pub const ACTION_SHOW_ENDPOINT: &str = "PJSIPShowEndpoint";

/// Field names
pub const FIELD_ACTION: &str = "Action";
pub const FIELD_ACTION_ID: &str = "ActionID";
pub const FIELD_RESPONSE: &str = "Response";
pub const FIELD_MESSAGE: &str = "Message";
pub const FIELD_EVENT: &str = "Event";
pub const FIELD_EVENT_LIST: &str = "EventList";
pub const FIELD_OBJECT_TYPE: &str = "ObjectType";
pub const FIELD_OBJECT_NAME: &str = "ObjectName";
pub const FIELD_CONTACTS: &str = "Contacts";
pub const FIELD_CALLER_ID: &str = "Callerid";

/// Field values
pub const RESPONSE_ERROR: &str = "Error";
pub const EVENT_LIST_COMPLETE: &str = "Complete";
pub const EVENT_ENDPOINT_LIST: &str = "EndpointList";
pub const EVENT_ENDPOINT_DETAIL: &str = "EndpointDetail";
pub const OBJECT_TYPE_ENDPOINT: &str = "endpoint";

/// An outbound manager action
///
/// `Display` renders the exact bytes written to the socket, including the
/// terminating empty line.
#[derive(Clone, PartialEq, Eq)]
pub enum Action<'a> {
    Login {
        username: &'a str,
        secret: &'a str,
        action_id: &'a str,
    },
    ShowEndpoints {
        action_id: &'a str,
    },
    ShowEndpoint {
        endpoint: &'a str,
        action_id: &'a str,
    },
    Logoff,
}

impl Action<'_> {
    /// Action name as sent in the `Action` field
    pub fn name(&self) -> &'static str {
        match self {
            Action::Login { .. } => ACTION_LOGIN,
            Action::ShowEndpoints { .. } => ACTION_SHOW_ENDPOINTS,
            Action::ShowEndpoint { .. } => ACTION_SHOW_ENDPOINT,
            Action::Logoff => ACTION_LOGOFF,
        }
    }

    /// Wire bytes for this action
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}{}", FIELD_ACTION, self.name(), CRLF)?;
        match self {
            Action::Login {
                username,
                secret,
                action_id,
            } => {
                write!(f, "Username: {}{}", username, CRLF)?;
                write!(f, "Secret: {}{}", secret, CRLF)?;
                write!(f, "Events: off{}", CRLF)?;
                write!(f, "{}: {}{}", FIELD_ACTION_ID, action_id, CRLF)?;
            }
            Action::ShowEndpoints { action_id } => {
                write!(f, "{}: {}{}", FIELD_ACTION_ID, action_id, CRLF)?;
            }
            Action::ShowEndpoint {
                endpoint,
                action_id,
            } => {
                write!(f, "Endpoint: {}{}", endpoint, CRLF)?;
                write!(f, "{}: {}{}", FIELD_ACTION_ID, action_id, CRLF)?;
            }
            Action::Logoff => {}
        }
        f.write_str(CRLF)
    }
}

// Login carries the secret, so it never goes to Debug output verbatim.
impl fmt::Debug for Action<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Login {
                username,
                action_id,
                ..
            } => f
                .debug_struct("Login")
                .field("username", username)
                .field("action_id", action_id)
                .finish_non_exhaustive(),
            Action::ShowEndpoints { action_id } => f
                .debug_struct("ShowEndpoints")
                .field("action_id", action_id)
                .finish(),
            Action::ShowEndpoint {
                endpoint,
                action_id,
            } => f
                .debug_struct("ShowEndpoint")
                .field("endpoint", endpoint)
                .field("action_id", action_id)
                .finish(),
            Action::Logoff => f.write_str("Logoff"),
        }
    }
}
