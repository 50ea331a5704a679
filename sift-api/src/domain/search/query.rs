//! Builds store query bodies adapted to the live mapping schema.

use serde_json::{json, Map, Value};

use super::mapping::MappingSummary;

/// Weighted field list for the text clause: title weighs highest,
/// description next, then the remaining task and organization fields.
const TEXT_FIELDS: &[&str] = &[
    "title^4",
    "description^2",
    "category",
    "assignee",
    "invites",
    "name^3",
    "slug",
    "members.name",
    "members.email",
    "teams.name",
];

pub struct QueryContext<'a> {
    pub tasks_index: &'a str,
    pub organizations_index: &'a str,
    pub summary: &'a MappingSummary,
}

/// The full scoped query: a hit must satisfy the text clause and at least
/// one visibility branch.
pub fn search_body(ctx: &QueryContext, text: &str, identity: &str, limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "bool": {
                "must": [text_clause(text)],
                "filter": [visibility_filter(ctx, identity)],
            }
        }
    })
}

/// Diagnostic variant without the visibility filter.
pub fn unscoped_body(text: &str, limit: usize) -> Value {
    json!({
        "size": limit,
        "query": {
            "bool": {
                "must": [text_clause(text)],
            }
        }
    })
}

/// Prefix-tolerant multi-field clause so partial last-token input still
/// matches.
fn text_clause(text: &str) -> Value {
    json!({
        "multi_match": {
            "query": text,
            "type": "bool_prefix",
            "fields": TEXT_FIELDS,
        }
    })
}

/// Disjunction across document kinds: tasks the caller owns, or
/// organizations the caller is a member of.
fn visibility_filter(ctx: &QueryContext, identity: &str) -> Value {
    json!({
        "bool": {
            "should": [
                kind_branch(
                    "task",
                    identity_clause(ctx.summary, ctx.tasks_index, "userEmail", identity),
                ),
                kind_branch(
                    "organization",
                    identity_clause(
                        ctx.summary,
                        ctx.organizations_index,
                        "members.email",
                        identity,
                    ),
                ),
            ],
            "minimum_should_match": 1,
        }
    })
}

fn kind_branch(doc_type: &str, scope: Value) -> Value {
    json!({
        "bool": {
            "must": [
                {"match": {"docType": doc_type}},
                scope,
            ]
        }
    })
}

/// Exact term against the keyword sub-field when the mapping has one,
/// fuzzy match otherwise. A term against a fuzzy-tokenized email silently
/// matches nothing, and so does a term against a missing sub-field, so
/// the sub-field is never assumed.
fn identity_clause(summary: &MappingSummary, index: &str, field: &str, identity: &str) -> Value {
    let mut clause = Map::new();
    if summary.has_exact(index, field) {
        clause.insert(format!("{field}.keyword"), Value::String(identity.into()));
        json!({"term": clause})
    } else {
        clause.insert(field.to_string(), Value::String(identity.into()));
        json!({"match": clause})
    }
}
