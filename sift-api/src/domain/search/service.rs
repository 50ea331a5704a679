//! Search service combining schema-aware query building with visibility
//! scoping.

use std::sync::Arc;

use thiserror::Error;

use super::mapping::MappingSummaryCache;
use super::query::{self, QueryContext};
use super::types::{DebugOutcome, SearchItem, SearchOutcome};
use crate::domain::store::{DocumentStore, IndexNames, StoreError};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("userEmail is required")]
    MissingUserEmail,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration for the search service.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Default number of results to return
    pub default_limit: usize,
    /// Maximum number of results allowed
    pub max_limit: usize,
    /// Queries shorter than this return nothing without hitting the store
    pub min_query_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            min_query_length: 2,
        }
    }
}

/// Executes visibility-scoped searches across both indices.
///
/// # Type Parameters
///
/// * `S` - DocumentStore implementation for store operations
pub struct SearchService<S>
where
    S: DocumentStore,
{
    store: S,
    mapping_cache: Arc<MappingSummaryCache>,
    indices: IndexNames,
    config: SearchConfig,
}

impl<S> SearchService<S>
where
    S: DocumentStore,
{
    pub fn new(
        store: S,
        mapping_cache: Arc<MappingSummaryCache>,
        indices: IndexNames,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            mapping_cache,
            indices,
            config,
        }
    }

    /// Execute a search for the given caller identity.
    ///
    /// A missing identity is a validation error. A trimmed query shorter
    /// than the minimum is too sparse to match and returns an empty
    /// result set without querying the store. With `debug`, the query is
    /// re-run without the visibility filter and both result sets are
    /// returned.
    pub async fn search(
        &self,
        query_text: &str,
        user_email: Option<&str>,
        limit: Option<usize>,
        debug: bool,
    ) -> Result<SearchOutcome, SearchError> {
        let identity = user_email
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .ok_or(SearchError::MissingUserEmail)?;

        let text = query_text.trim();
        if text.chars().count() < self.config.min_query_length {
            return Ok(SearchOutcome::empty());
        }

        let limit = limit
            .unwrap_or(self.config.default_limit)
            .min(self.config.max_limit)
            .max(1);

        let summary = self.mapping_cache.ensure_loaded(&self.store).await;
        let ctx = QueryContext {
            tasks_index: &self.indices.tasks,
            organizations_index: &self.indices.organizations,
            summary: &summary,
        };

        let indices = [
            self.indices.tasks.as_str(),
            self.indices.organizations.as_str(),
        ];
        let body = query::search_body(&ctx, text, identity, limit);
        let results: Vec<SearchItem> = self
            .store
            .search(&indices, &body)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        if !debug {
            return Ok(SearchOutcome {
                results,
                debug: None,
            });
        }

        let unfiltered: Vec<SearchItem> = self
            .store
            .search(&indices, &query::unscoped_body(text, limit))
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(SearchOutcome {
            results: results.clone(),
            debug: Some(DebugOutcome {
                filtered: results,
                unfiltered,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::store::MockDocumentStore;
    use serde_json::json;

    fn service(store: MockDocumentStore) -> SearchService<MockDocumentStore> {
        let indices = IndexNames::default();
        let cache = Arc::new(MappingSummaryCache::new(indices.all()));
        SearchService::new(store, cache, indices, SearchConfig::default())
    }

    fn task(title: &str, owner: &str) -> serde_json::Value {
        json!({"docType": "task", "title": title, "userEmail": owner})
    }

    #[tokio::test]
    async fn missing_user_email_is_rejected() {
        let svc = service(MockDocumentStore::new());

        let err = svc.search("design", None, None, false).await.unwrap_err();
        assert!(matches!(err, SearchError::MissingUserEmail));

        let err = svc.search("design", Some("  "), None, false).await.unwrap_err();
        assert!(matches!(err, SearchError::MissingUserEmail));
    }

    #[tokio::test]
    async fn short_queries_short_circuit_without_store_calls() {
        let store = MockDocumentStore::new();
        let svc = service(store.clone());

        for query in ["", " ", "d", " d "] {
            let outcome = svc.search(query, Some("a@x.com"), None, false).await.unwrap();
            assert!(outcome.results.is_empty());
        }
        assert_eq!(store.search_count(), 0);
        assert_eq!(store.mapping_call_count(), 0);
    }

    #[tokio::test]
    async fn owner_sees_their_task_via_prefix_query() {
        let store = MockDocumentStore::new().with_document(
            "tasks",
            "t1",
            task("Design review", "a@x.com"),
        );
        let svc = service(store);

        let outcome = svc.search("desi", Some("a@x.com"), None, false).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].id, "t1");
        assert_eq!(outcome.results[0].fields["title"], "Design review");
    }

    #[tokio::test]
    async fn strangers_see_nothing_regardless_of_relevance() {
        let store = MockDocumentStore::new().with_document(
            "tasks",
            "t1",
            task("Design review", "a@x.com"),
        );
        let svc = service(store);

        let outcome = svc.search("desi", Some("b@x.com"), None, false).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn organization_membership_grants_visibility() {
        let store = MockDocumentStore::new().with_document(
            "organizations",
            "o1",
            json!({
                "docType": "organization",
                "name": "Design guild",
                "members": [{"id": "m1", "email": "a@x.com"}]
            }),
        );
        let svc = service(store);

        let outcome = svc.search("design", Some("a@x.com"), None, false).await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].index, "organizations");

        let outcome = svc.search("design", Some("b@x.com"), None, false).await.unwrap();
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn debug_mode_returns_both_result_sets() {
        let store = MockDocumentStore::new()
            .with_document("tasks", "t1", task("Design review", "a@x.com"))
            .with_document("tasks", "t2", task("Design system", "b@x.com"));
        let svc = service(store.clone());

        let outcome = svc.search("design", Some("a@x.com"), None, true).await.unwrap();
        let debug = outcome.debug.unwrap();
        assert_eq!(debug.filtered.len(), 1);
        assert_eq!(debug.unfiltered.len(), 2);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(store.search_count(), 2);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_the_maximum() {
        let store = MockDocumentStore::new();
        let svc = service(store.clone());

        svc.search("design", Some("a@x.com"), Some(10_000), false)
            .await
            .unwrap();

        let body = &store.search_bodies()[0];
        assert_eq!(body["size"], 100);
    }

    #[tokio::test]
    async fn generated_queries_adapt_to_the_mapping() {
        let mapping = json!({
            "tasks": {
                "mappings": {
                    "properties": {
                        "userEmail": {
                            "type": "text",
                            "fields": {"keyword": {"type": "keyword"}}
                        }
                    }
                }
            }
        });
        let store = MockDocumentStore::new().with_mapping(mapping);
        let svc = service(store.clone());

        svc.search("design", Some("a@x.com"), None, false).await.unwrap();

        let body = &store.search_bodies()[0];
        // Exact sub-field reported for tasks/userEmail: term clause
        assert_eq!(
            body.pointer("/query/bool/filter/0/bool/should/0/bool/must/1/term/userEmail.keyword")
                .unwrap(),
            "a@x.com"
        );
        // Nothing reported for organizations: fuzzy fallback
        assert_eq!(
            body.pointer("/query/bool/filter/0/bool/should/1/bool/must/1/match/members.email")
                .unwrap(),
            "a@x.com"
        );
    }

    #[tokio::test]
    async fn mapping_failure_still_searches_with_fuzzy_clauses() {
        let store = MockDocumentStore::new()
            .failing_mappings()
            .with_document("tasks", "t1", task("Design review", "a@x.com"));
        let svc = service(store.clone());

        let outcome = svc.search("design", Some("a@x.com"), None, false).await.unwrap();
        assert_eq!(outcome.results.len(), 1);

        let body = &store.search_bodies()[0];
        assert!(body
            .pointer("/query/bool/filter/0/bool/should/0/bool/must/1/match")
            .is_some());
    }
}
