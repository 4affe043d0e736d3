//! Rendering of query results

use ami_core::{ResolvedEndpoint, ResultKey, ResultMap};
use anyhow::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct Row<'a> {
    #[tabled(rename = "Key")]
    key: &'a str,
    #[tabled(rename = "Endpoint")]
    identifier: &'a str,
    #[tabled(rename = "Address")]
    address: &'a str,
    #[tabled(rename = "Caller ID")]
    display_name: &'a str,
    #[tabled(rename = "Contact")]
    contact_uri: &'a str,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    key_by: ResultKey,
    endpoints: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    key: &'a str,
    #[serde(flatten)]
    endpoint: &'a ResolvedEndpoint,
}

// Maps have no order; sort by key so output is stable between runs.
fn sorted(result: &ResultMap) -> Vec<(&String, &ResolvedEndpoint)> {
    let mut entries: Vec<_> = result.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

pub fn render_table(result: &ResultMap) -> String {
    let rows = sorted(result).into_iter().map(|(key, endpoint)| Row {
        key,
        identifier: &endpoint.identifier,
        address: &endpoint.address,
        display_name: &endpoint.display_name,
        contact_uri: &endpoint.contact_uri,
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_json(result: &ResultMap, key_by: ResultKey) -> Result<String> {
    let output = JsonOutput {
        key_by,
        endpoints: sorted(result)
            .into_iter()
            .map(|(key, endpoint)| JsonEntry { key, endpoint })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
