use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DOC_TYPE_TASK;

/// Flat projection of a task change payload.
///
/// Tasks are replaced wholesale on every update event; there is no
/// partial-field merge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Numeric or named, depending on the source system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub invites: Vec<String>,
    pub doc_type: String,
}

impl TaskDocument {
    pub fn from_payload(id: impl Into<String>, payload: &Value) -> Self {
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_owned);

        Self {
            id: id.into(),
            title: text("title"),
            description: text("description"),
            category: text("category"),
            status: text("status"),
            priority: payload.get("priority").cloned().filter(|v| !v.is_null()),
            due_date: text("dueDate"),
            user_email: text("userEmail"),
            created_at: text("createdAt"),
            updated_at: text("updatedAt"),
            assignee: text("assignee"),
            invites: payload
                .get("invites")
                .and_then(Value::as_array)
                .map(|invites| {
                    invites
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
            doc_type: DOC_TYPE_TASK.to_string(),
        }
    }
}
