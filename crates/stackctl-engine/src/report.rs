//! Console and JSON rendering of inspection and wait results.

use serde::Serialize;

use stackctl_utils::types::{GroupSummary, Resource, ResourceGroup};

use crate::wait::WaitOutcome;

/// `    <type:40> <logical:25> <physical>`; the physical id is empty when absent.
#[must_use]
pub fn format_resource_row(resource: &Resource) -> String {
    format!(
        "    {:<40} {:<25} {}",
        resource.resource_type,
        resource.logical_name,
        resource.physical_id.as_deref().unwrap_or("")
    )
}

#[must_use]
pub fn format_group_header(summary: &GroupSummary) -> String {
    format!("Group : {} [{}]", summary.name, summary.status)
}

#[must_use]
pub fn format_lookup_header(logical_name: &str, group: &str) -> String {
    format!("Looking up resource name {logical_name} from group {group}")
}

#[must_use]
pub fn format_completion(group: &str, outcome: &WaitOutcome) -> String {
    format!(
        "Group {group} completed with {} ({})",
        outcome.status, outcome.reason
    )
}

/// Every group header followed by its resource rows, newline-terminated.
#[must_use]
pub fn render_listing(groups: &[ResourceGroup]) -> String {
    let mut out = String::new();
    for group in groups {
        out.push_str(&format_group_header(&group.summary));
        out.push('\n');
        for resource in &group.resources {
            out.push_str(&format_resource_row(resource));
            out.push('\n');
        }
    }
    out
}

#[must_use]
pub fn render_resolution(logical_name: &str, group: &str, resources: &[Resource]) -> String {
    let mut out = format_lookup_header(logical_name, group);
    out.push('\n');
    for resource in resources {
        out.push_str(&format_resource_row(resource));
        out.push('\n');
    }
    out
}

/// JSON body for `resolve --json`.
#[derive(Debug, Serialize)]
pub struct Resolution<'a> {
    pub group: &'a str,
    pub logical_name: &'a str,
    pub resources: &'a [Resource],
}

/// JSON body for `wait --json`.
#[derive(Debug, Serialize)]
pub struct WaitReport<'a> {
    pub group: &'a str,
    #[serde(flatten)]
    pub outcome: &'a WaitOutcome,
}

/// Pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Propagates serializer failures.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}
