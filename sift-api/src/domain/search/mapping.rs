//! Cached summary of the store's schema, per index and field.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::store::DocumentStore;

/// Fields the query builder may want to match exactly: owner-email and
/// name/title-like fields, including the nested member email path.
const CANDIDATE_FIELDS: &[&str] = &["userEmail", "title", "name", "slug", "members.email"];

/// Per (index, field): whether an exact keyword sub-field is available,
/// i.e. whether a `term` clause against `<field>.keyword` is valid.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MappingSummary {
    #[serde(flatten)]
    indices: HashMap<String, HashMap<String, bool>>,
}

impl MappingSummary {
    pub fn has_exact(&self, index: &str, field: &str) -> bool {
        self.indices
            .get(index)
            .and_then(|fields| fields.get(field))
            .copied()
            .unwrap_or(false)
    }

    fn insert(&mut self, index: &str, field: &str, exact: bool) {
        self.indices
            .entry(index.to_string())
            .or_default()
            .insert(field.to_string(), exact);
    }

    #[cfg(test)]
    pub fn with_exact(mut self, index: &str, field: &str) -> Self {
        self.insert(index, field, true);
        self
    }
}

/// Process-wide schema cache, lazily populated on first use and
/// refreshable on demand.
///
/// Staleness is tolerated: a stale `false` only downgrades a term clause
/// to a fuzzy match, it never affects the correctness of writes. The
/// lock is not held across store I/O, so two concurrent refreshes may
/// both run and the last writer wins.
pub struct MappingSummaryCache {
    indices: Vec<String>,
    snapshot: RwLock<Option<MappingSummary>>,
}

impl MappingSummaryCache {
    pub fn new(indices: Vec<String>) -> Self {
        Self {
            indices,
            snapshot: RwLock::new(None),
        }
    }

    /// The last successfully loaded summary, if any.
    pub async fn snapshot(&self) -> Option<MappingSummary> {
        self.snapshot.read().await.clone()
    }

    /// Lazy population: refresh only when no snapshot exists yet.
    pub async fn ensure_loaded<S: DocumentStore>(&self, store: &S) -> MappingSummary {
        if let Some(summary) = self.snapshot().await {
            return summary;
        }
        self.refresh(store).await
    }

    /// Re-read the schema. A failed schema query yields an empty summary,
    /// which downgrades every field to fuzzy matching rather than failing
    /// the search.
    pub async fn refresh<S: DocumentStore>(&self, store: &S) -> MappingSummary {
        let index_refs: Vec<&str> = self.indices.iter().map(String::as_str).collect();

        let summary = match store.mappings(&index_refs).await {
            Ok(raw) => self.summarize(&raw),
            Err(err) => {
                tracing::warn!("schema query failed, falling back to fuzzy matching: {err}");
                MappingSummary::default()
            }
        };

        *self.snapshot.write().await = Some(summary.clone());
        summary
    }

    fn summarize(&self, raw: &Value) -> MappingSummary {
        let mut summary = MappingSummary::default();
        for index in &self.indices {
            for field in CANDIDATE_FIELDS {
                summary.insert(index, field, field_has_keyword(raw.get(index.as_str()), field));
            }
        }
        summary
    }
}

/// Walk an index's mapping tree by dot-separated path segments, descending
/// into nested `properties`. A missing segment or field yields `false`,
/// never an error.
fn field_has_keyword(index_mapping: Option<&Value>, path: &str) -> bool {
    fn walk<'a>(mut node: &'a Value, path: &str) -> Option<&'a Value> {
        for segment in path.split('.') {
            node = node.get("properties")?.get(segment)?;
        }
        Some(node)
    }

    let Some(mapping) = index_mapping.and_then(|index| index.get("mappings")) else {
        return false;
    };
    let Some(leaf) = walk(mapping, path) else {
        return false;
    };

    leaf.pointer("/fields/keyword/type").and_then(Value::as_str) == Some("keyword")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::MockDocumentStore;
    use serde_json::json;

    fn sample_mapping() -> Value {
        json!({
            "tasks": {
                "mappings": {
                    "properties": {
                        "title": {
                            "type": "text",
                            "fields": {"keyword": {"type": "keyword", "ignore_above": 256}}
                        },
                        "userEmail": {"type": "text"},
                        "status": {"type": "text"}
                    }
                }
            },
            "organizations": {
                "mappings": {
                    "properties": {
                        "name": {
                            "type": "text",
                            "fields": {"keyword": {"type": "keyword"}}
                        },
                        "members": {
                            "properties": {
                                "email": {
                                    "type": "text",
                                    "fields": {"keyword": {"type": "keyword"}}
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    fn cache() -> MappingSummaryCache {
        MappingSummaryCache::new(vec!["tasks".to_string(), "organizations".to_string()])
    }

    #[tokio::test]
    async fn summarizes_keyword_subfields() {
        let store = MockDocumentStore::new().with_mapping(sample_mapping());
        let summary = cache().refresh(&store).await;

        assert!(summary.has_exact("tasks", "title"));
        assert!(!summary.has_exact("tasks", "userEmail"));
        assert!(summary.has_exact("organizations", "name"));
        assert!(summary.has_exact("organizations", "members.email"));
    }

    #[tokio::test]
    async fn missing_fields_and_indices_are_false() {
        let store = MockDocumentStore::new().with_mapping(sample_mapping());
        let summary = cache().refresh(&store).await;

        assert!(!summary.has_exact("tasks", "slug"));
        assert!(!summary.has_exact("ghost-index", "title"));
        assert!(!summary.has_exact("tasks", "members.email"));
    }

    #[tokio::test]
    async fn schema_failure_yields_empty_summary() {
        let store = MockDocumentStore::new().failing_mappings();
        let summary = cache().refresh(&store).await;

        assert!(!summary.has_exact("tasks", "userEmail"));
        assert!(!summary.has_exact("organizations", "members.email"));
    }

    #[tokio::test]
    async fn ensure_loaded_populates_lazily() {
        let store = MockDocumentStore::new().with_mapping(sample_mapping());
        let cache = cache();

        assert!(cache.snapshot().await.is_none());
        assert_eq!(store.mapping_call_count(), 0);

        cache.ensure_loaded(&store).await;
        assert_eq!(store.mapping_call_count(), 1);

        // Second call reuses the snapshot
        cache.ensure_loaded(&store).await;
        assert_eq!(store.mapping_call_count(), 1);
    }

    #[tokio::test]
    async fn refresh_replaces_the_snapshot() {
        let store = MockDocumentStore::new().with_mapping(sample_mapping());
        let cache = cache();

        cache.ensure_loaded(&store).await;
        cache.refresh(&store).await;
        assert_eq!(store.mapping_call_count(), 2);
        assert!(cache.snapshot().await.unwrap().has_exact("tasks", "title"));
    }
}
