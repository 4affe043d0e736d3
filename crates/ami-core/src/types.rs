//! Endpoint types produced by a query

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::ResultKey;
use crate::contact::resolve_address;

/// Final result of a query, keyed according to [`ResultKey`]
pub type ResultMap = HashMap<String, ResolvedEndpoint>;

/// An endpoint as seen during enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointSummary {
    pub identifier: String,
    /// Registered contacts; empty when the endpoint is not registered
    pub contact_uri: String,
    /// Caller identity attached during detail lookup
    pub display_name: String,
}

impl EndpointSummary {
    pub fn new(identifier: impl Into<String>, contact_uri: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            contact_uri: contact_uri.into(),
            display_name: String::new(),
        }
    }

    /// Whether the endpoint has any registered contact
    pub fn is_registered(&self) -> bool {
        !self.contact_uri.is_empty()
    }

    /// Resolve the contact address; `None` for unregistered endpoints or
    /// contacts without a usable address
    pub fn resolve(&self) -> Option<ResolvedEndpoint> {
        if !self.is_registered() {
            return None;
        }
        let address = resolve_address(&self.contact_uri)?;
        Some(ResolvedEndpoint {
            identifier: self.identifier.clone(),
            contact_uri: self.contact_uri.clone(),
            address: address.to_string(),
            display_name: self.display_name.clone(),
        })
    }
}

/// A registered endpoint with the address it registered from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEndpoint {
    pub identifier: String,
    pub contact_uri: String,
    pub address: String,
    pub display_name: String,
}

impl ResolvedEndpoint {
    /// Map key under the given policy
    pub fn key(&self, policy: ResultKey) -> &str {
        match policy {
            ResultKey::Address => &self.address,
            ResultKey::Identifier => &self.identifier,
        }
    }
}

/// Resolve every endpoint and collect the ones with an address
///
/// Later endpoints replace earlier ones on key collisions.
pub fn build_result_map<'a, I>(endpoints: I, policy: ResultKey) -> ResultMap
where
    I: IntoIterator<Item = &'a EndpointSummary>,
{
    endpoints
        .into_iter()
        .filter_map(EndpointSummary::resolve)
        .map(|resolved| (resolved.key(policy).to_string(), resolved))
        .collect()
}
