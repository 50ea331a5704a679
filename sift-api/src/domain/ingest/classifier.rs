//! Heuristic classification of inbound change payloads.

use serde_json::Value;
use strum::Display;

/// The closed set of document kinds an inbound payload can resolve to.
/// In the two-index deployment, `Team` and `OrgMember` live embedded in
/// their parent organization's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum DocKind {
    Task,
    Organization,
    Team,
    OrgMember,
}

type Rule = fn(&Value) -> Option<DocKind>;

/// Structural rules, first match wins. The order is load-bearing:
/// task-like fields (`status`) can co-occur with org-like shapes, so
/// member/organization/team shapes must be checked before the task shape.
const STRUCTURAL_RULES: &[Rule] = &[
    member_shape,
    organization_shape,
    team_shape,
    task_shape,
];

/// Resolve a payload to exactly one kind. An explicit hint (header or
/// body field) wins over the structural heuristics; with neither, the
/// payload is treated as a task.
pub fn classify(payload: &Value, hint: Option<&str>) -> DocKind {
    if let Some(kind) = hint.and_then(match_hint) {
        return kind;
    }

    for rule in STRUCTURAL_RULES {
        if let Some(kind) = rule(payload) {
            return kind;
        }
    }

    DocKind::Task
}

fn match_hint(hint: &str) -> Option<DocKind> {
    let hint = hint.to_ascii_lowercase();
    if hint.contains("task") {
        Some(DocKind::Task)
    } else if hint.contains("org") && hint.contains("member") {
        Some(DocKind::OrgMember)
    } else if hint.contains("org") {
        Some(DocKind::Organization)
    } else if hint.contains("team") {
        Some(DocKind::Team)
    } else {
        None
    }
}

fn has_field(payload: &Value, key: &str) -> bool {
    payload.get(key).is_some_and(|v| !v.is_null())
}

fn member_shape(payload: &Value) -> Option<DocKind> {
    (has_field(payload, "email") || has_field(payload, "role")).then_some(DocKind::OrgMember)
}

fn organization_shape(payload: &Value) -> Option<DocKind> {
    if has_field(payload, "slug") {
        return Some(DocKind::Organization);
    }
    if payload
        .get("teams")
        .and_then(Value::as_array)
        .is_some_and(|teams| !teams.is_empty())
    {
        return Some(DocKind::Organization);
    }
    if payload
        .get("members")
        .and_then(Value::as_array)
        .and_then(|members| members.first())
        .is_some_and(Value::is_object)
    {
        return Some(DocKind::Organization);
    }
    None
}

fn team_shape(payload: &Value) -> Option<DocKind> {
    let plain_ids = payload
        .get("members")
        .and_then(Value::as_array)
        .is_some_and(|members| members.iter().all(Value::is_string));

    (has_field(payload, "name") && plain_ids).then_some(DocKind::Team)
}

fn task_shape(payload: &Value) -> Option<DocKind> {
    ["title", "userEmail", "description", "status"]
        .iter()
        .any(|key| has_field(payload, key))
        .then_some(DocKind::Task)
}
