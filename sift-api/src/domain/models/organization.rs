use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{id_string, DOC_TYPE_ORGANIZATION};

/// The organization aggregate: the single persisted document for an
/// organization together with its embedded members and teams. Teams and
/// members have no record of their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub teams: Vec<Team>,
    pub doc_type: String,
}

impl Organization {
    /// Empty aggregate shell, created when a child event references an
    /// organization that has no stored document yet.
    pub fn shell(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            slug: String::new(),
            description: String::new(),
            created_at: None,
            members: Vec::new(),
            teams: Vec::new(),
            doc_type: DOC_TYPE_ORGANIZATION.to_string(),
        }
    }

    /// Lenient extraction from a webhook payload or a stored aggregate.
    /// Malformed entries are skipped rather than failing the whole
    /// document.
    pub fn from_payload(id: impl Into<String>, payload: &Value) -> Self {
        let text = |key: &str| {
            payload
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_default()
        };

        Self {
            id: id.into(),
            name: text("name"),
            slug: text("slug"),
            description: text("description"),
            created_at: payload
                .get("createdAt")
                .and_then(Value::as_str)
                .map(str::to_owned),
            members: payload
                .get("members")
                .and_then(Value::as_array)
                .map(|members| {
                    members
                        .iter()
                        .filter(|entry| entry.is_object())
                        .map(Member::from_payload)
                        .collect()
                })
                .unwrap_or_default(),
            teams: payload
                .get("teams")
                .and_then(Value::as_array)
                .map(|teams| {
                    teams
                        .iter()
                        .filter(|entry| entry.is_object())
                        .map(Team::from_payload)
                        .collect()
                })
                .unwrap_or_default(),
            doc_type: DOC_TYPE_ORGANIZATION.to_string(),
        }
    }

    /// Replace-in-place by identifier if present, append if not. Sibling
    /// entries and organization-level fields are left untouched.
    pub fn upsert_member(&mut self, incoming: Member) {
        match self.members.iter_mut().find(|m| m.id == incoming.id) {
            Some(existing) => existing.merge_from(incoming),
            None => self.members.push(incoming),
        }
    }

    pub fn upsert_team(&mut self, incoming: Team) {
        match self.teams.iter_mut().find(|t| t.id == incoming.id) {
            Some(existing) => existing.merge_from(incoming),
            None => self.teams.push(incoming),
        }
    }
}

/// A member embedded in its parent organization, identified by `id`
/// within the aggregate's member collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Member {
    pub fn from_payload(payload: &Value) -> Self {
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_owned);

        Self {
            id: id_string(payload.get("id"))
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: text("name"),
            email: text("email"),
            role: text("role"),
        }
    }

    /// Shallow merge: fields present on the incoming record replace the
    /// stored ones, absent fields keep their stored values.
    pub fn merge_from(&mut self, incoming: Member) {
        if incoming.name.is_some() {
            self.name = incoming.name;
        }
        if incoming.email.is_some() {
            self.email = incoming.email;
        }
        if incoming.role.is_some() {
            self.role = incoming.role;
        }
    }
}

/// A team embedded in its parent organization. Its member list keeps the
/// payload shape: plain identifier strings or embedded member references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<Value>,
}

impl Team {
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            id: id_string(payload.get("id"))
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: payload
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_owned),
            members: payload
                .get("members")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn merge_from(&mut self, incoming: Team) {
        if incoming.name.is_some() {
            self.name = incoming.name;
        }
        if !incoming.members.is_empty() {
            self.members = incoming.members;
        }
    }
}
