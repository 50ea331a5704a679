mod organization;
mod task;

pub use organization::{Member, Organization, Team};
pub use task::TaskDocument;

use serde_json::Value;

/// Discriminator stored on every document, used to scope visibility
/// filters.
pub const DOC_TYPE_TASK: &str = "task";
pub const DOC_TYPE_ORGANIZATION: &str = "organization";

/// Webhook payloads carry identifiers as strings or numbers.
pub(crate) fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
