//! Mock document store for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::{DocumentStore, Result, StoreError, StoreHit};

/// In-memory document store with a naive interpretation of the query
/// bodies the search module generates: prefix text matching plus
/// evaluation of the visibility branches. Enough to exercise end-to-end
/// scenarios without a live store.
#[derive(Clone, Default)]
pub struct MockDocumentStore {
    documents: Arc<RwLock<HashMap<(String, String), Value>>>,
    mapping: Arc<RwLock<Value>>,
    search_bodies: Arc<RwLock<Vec<Value>>>,
    mapping_calls: Arc<RwLock<usize>>,
    refreshed: Arc<RwLock<Vec<String>>>,
    fail_deletes: bool,
    fail_refresh: bool,
    fail_mappings: bool,
}

#[allow(dead_code)]
impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document before the test runs.
    pub fn with_document(self, index: &str, id: &str, document: Value) -> Self {
        self.documents
            .write()
            .unwrap()
            .insert((index.to_string(), id.to_string()), document);
        self
    }

    /// Configure the raw mapping returned by `mappings()`.
    pub fn with_mapping(self, mapping: Value) -> Self {
        *self.mapping.write().unwrap() = mapping;
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn failing_mappings(mut self) -> Self {
        self.fail_mappings = true;
        self
    }

    /// Get a stored document (for test assertions).
    pub fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.documents
            .read()
            .unwrap()
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().unwrap().is_empty()
    }

    /// Query bodies received so far, in call order.
    pub fn search_bodies(&self) -> Vec<Value> {
        self.search_bodies.read().unwrap().clone()
    }

    pub fn search_count(&self) -> usize {
        self.search_bodies.read().unwrap().len()
    }

    pub fn mapping_call_count(&self) -> usize {
        *self.mapping_calls.read().unwrap()
    }

    /// Indices refreshed so far, in call order.
    pub fn refreshed(&self) -> Vec<String> {
        self.refreshed.read().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>> {
        Ok(self.document(index, id))
    }

    async fn put_document(&self, index: &str, id: &str, document: &Value) -> Result<()> {
        self.documents
            .write()
            .unwrap()
            .insert((index.to_string(), id.to_string()), document.clone());
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool> {
        if self.fail_deletes {
            return Err(StoreError::Unavailable("delete rejected".to_string()));
        }
        let removed = self
            .documents
            .write()
            .unwrap()
            .remove(&(index.to_string(), id.to_string()));
        Ok(removed.is_some())
    }

    async fn search(&self, indices: &[&str], body: &Value) -> Result<Vec<StoreHit>> {
        self.search_bodies.write().unwrap().push(body.clone());

        let text = body
            .pointer("/query/bool/must/0/multi_match/query")
            .and_then(Value::as_str)
            .unwrap_or("");
        let branches = body
            .pointer("/query/bool/filter/0/bool/should")
            .and_then(Value::as_array);
        let limit = body
            .get("size")
            .and_then(Value::as_u64)
            .unwrap_or(u64::MAX) as usize;

        let documents = self.documents.read().unwrap();
        let mut hits: Vec<StoreHit> = documents
            .iter()
            .filter(|((index, _), _)| indices.contains(&index.as_str()))
            .filter(|(_, source)| matches_text(source, text))
            .filter(|(_, source)| match branches {
                Some(branches) => branches.iter().any(|branch| branch_matches(source, branch)),
                None => true,
            })
            .map(|((index, id), source)| StoreHit {
                index: index.clone(),
                id: id.clone(),
                score: 1.0,
                source: source.clone(),
            })
            .collect();

        hits.sort_by(|a, b| a.id.cmp(&b.id));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn refresh(&self, index: &str) -> Result<()> {
        if self.fail_refresh {
            return Err(StoreError::Unavailable("refresh rejected".to_string()));
        }
        self.refreshed.write().unwrap().push(index.to_string());
        Ok(())
    }

    async fn mappings(&self, _indices: &[&str]) -> Result<Value> {
        *self.mapping_calls.write().unwrap() += 1;
        if self.fail_mappings {
            return Err(StoreError::Unavailable("mapping rejected".to_string()));
        }
        let mapping = self.mapping.read().unwrap().clone();
        if mapping.is_null() {
            return Ok(serde_json::json!({}));
        }
        Ok(mapping)
    }
}

/// Every query token must be a prefix of some document token.
fn matches_text(source: &Value, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let haystack = searchable_text(source).to_lowercase();
    let tokens: Vec<&str> = haystack.split_whitespace().collect();
    text.to_lowercase()
        .split_whitespace()
        .all(|query_token| tokens.iter().any(|token| token.starts_with(query_token)))
}

fn searchable_text(source: &Value) -> String {
    let mut parts: Vec<String> = Vec::new();

    for key in ["title", "description", "category", "assignee", "name", "slug"] {
        if let Some(value) = source.get(key).and_then(Value::as_str) {
            parts.push(value.to_string());
        }
    }
    if let Some(invites) = source.get("invites").and_then(Value::as_array) {
        parts.extend(invites.iter().filter_map(Value::as_str).map(str::to_string));
    }
    for (key, fields) in [("members", &["name", "email"][..]), ("teams", &["name"][..])] {
        if let Some(entries) = source.get(key).and_then(Value::as_array) {
            for entry in entries {
                for field in fields {
                    if let Some(value) = entry.get(field).and_then(Value::as_str) {
                        parts.push(value.to_string());
                    }
                }
            }
        }
    }

    parts.join(" ")
}

/// A branch matches when every clause under its `bool.must` matches.
fn branch_matches(source: &Value, branch: &Value) -> bool {
    match branch.pointer("/bool/must").and_then(Value::as_array) {
        Some(clauses) => clauses.iter().all(|clause| clause_matches(source, clause)),
        None => false,
    }
}

/// Interpret a `term`/`match` clause as field equality, descending into
/// arrays along the way.
fn clause_matches(source: &Value, clause: &Value) -> bool {
    let inner = clause
        .get("term")
        .or_else(|| clause.get("match"))
        .and_then(Value::as_object);
    let Some((field, expected)) = inner.and_then(|map| map.iter().next()) else {
        return false;
    };

    let path = field.trim_end_matches(".keyword");
    values_at_path(source, path).iter().any(|v| *v == expected)
}

fn values_at_path<'a>(node: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![node];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Array(items) => {
                    next.extend(items.iter().filter_map(|item| item.get(segment)))
                }
                _ => next.extend(value.get(segment)),
            }
        }
        current = next;
    }
    current
}
