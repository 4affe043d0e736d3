//! Response classification
//!
//! Every frame the session reads goes through two checks: is it the marker
//! that ends the current multi-frame response, and if not, does it carry data
//! for the action we sent. Only frames echoing our `ActionID` are considered;
//! anything else (unsolicited events, replies to someone else) comes back
//! empty and is skipped by the caller.

use super::fields::FieldMap;
use super::{
    EVENT_ENDPOINT_DETAIL, EVENT_ENDPOINT_LIST, EVENT_LIST_COMPLETE, FIELD_ACTION_ID,
    FIELD_CALLER_ID, FIELD_CONTACTS, FIELD_EVENT, FIELD_EVENT_LIST, FIELD_MESSAGE,
    FIELD_OBJECT_NAME, FIELD_OBJECT_TYPE, FIELD_RESPONSE, OBJECT_TYPE_ENDPOINT, RESPONSE_ERROR,
};
use crate::error::{AmiError, Result};

/// Data carried by one `EndpointList` event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEntry {
    /// Endpoint name, empty when the frame is not an endpoint list entry
    pub identifier: String,
    /// Registered contacts, possibly empty
    pub contact_uri: String,
}

/// Data carried by one `EndpointDetail` event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailEntry {
    pub identifier: String,
    pub caller_id: String,
}

/// Whether this frame closes a multi-frame response
pub fn is_complete(fields: &FieldMap) -> bool {
    fields.is(FIELD_EVENT_LIST, EVENT_LIST_COMPLETE)
}

/// Extract an endpoint list entry from a frame answering our action
pub fn endpoint_list_entry(fields: &FieldMap, action_id: &str) -> Result<ListEntry> {
    let mut entry = ListEntry::default();
    if !correlated(fields, action_id)? {
        return Ok(entry);
    }
    if fields.is(FIELD_EVENT, EVENT_ENDPOINT_LIST) {
        if fields.is(FIELD_OBJECT_TYPE, OBJECT_TYPE_ENDPOINT) {
            entry.identifier = fields.get_or_empty(FIELD_OBJECT_NAME).to_string();
        }
        entry.contact_uri = fields.get_or_empty(FIELD_CONTACTS).to_string();
    }
    Ok(entry)
}

/// Extract endpoint detail from a frame answering our action
pub fn endpoint_detail(fields: &FieldMap, action_id: &str) -> Result<DetailEntry> {
    let mut entry = DetailEntry::default();
    if !correlated(fields, action_id)? {
        return Ok(entry);
    }
    if fields.is(FIELD_EVENT, EVENT_ENDPOINT_DETAIL) {
        if fields.is(FIELD_OBJECT_TYPE, OBJECT_TYPE_ENDPOINT) {
            entry.caller_id = fields.get_or_empty(FIELD_CALLER_ID).to_string();
        }
        entry.identifier = fields.get_or_empty(FIELD_OBJECT_NAME).to_string();
    }
    Ok(entry)
}

// False for frames that belong to someone else; an error for our own
// `Response: Error`.
fn correlated(fields: &FieldMap, action_id: &str) -> Result<bool> {
    if !fields.is(FIELD_ACTION_ID, action_id) {
        return Ok(false);
    }
    if fields.is(FIELD_RESPONSE, RESPONSE_ERROR) {
        return Err(AmiError::protocol(fields.get_or_empty(FIELD_MESSAGE)));
    }
    Ok(true)
}
