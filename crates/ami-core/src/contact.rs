//! Contact URI address extraction

/// Extract the host address from a contact URI
///
/// Accepts `[scheme:]user@host[:port][;params]` and returns `host`. Anything
/// that doesn't have exactly one `@`, or leaves an empty host, yields `None`:
/// the endpoint is skipped, never failed. Several comma-separated contacts
/// therefore resolve to nothing.
///
/// ```rust
/// use ami_core::contact::resolve_address;
///
/// assert_eq!(resolve_address("sip:201@192.168.1.10:5060;transport=udp"), Some("192.168.1.10"));
/// assert_eq!(resolve_address("sip:192.168.1.10:5060"), None);
/// ```
pub fn resolve_address(contact_uri: &str) -> Option<&str> {
    let mut segments = contact_uri.split('@');
    let (_user, remainder) = (segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }
    let host_port = remainder.split(';').next()?;
    let address = host_port.split(':').next()?;
    if address.is_empty() {
        None
    } else {
        Some(address)
    }
}
