//! Boundary to the backing document store.
//!
//! The store is an opaque collaborator with eventually-consistent
//! read-after-write; an explicit refresh makes writes visible to search.
//! The [`DocumentStore`] trait abstracts it for testing without a live
//! store.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod http;
mod mock;

pub use http::HttpDocumentStore;
pub use mock::MockDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Unexpected store response: {0}")]
    Response(String),
}

impl From<searchstore::StoreFetchError> for StoreError {
    fn from(err: searchstore::StoreFetchError) -> Self {
        match err {
            searchstore::StoreFetchError::Unauthorized => {
                StoreError::Unavailable("store rejected credentials".to_string())
            }
            searchstore::StoreFetchError::ResponseError(e) => StoreError::Unavailable(e),
            searchstore::StoreFetchError::ParsingError(e) => StoreError::Response(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Names of the two indices documents live in.
#[derive(Debug, Clone)]
pub struct IndexNames {
    pub tasks: String,
    pub organizations: String,
}

impl IndexNames {
    pub fn all(&self) -> Vec<String> {
        vec![self.tasks.clone(), self.organizations.clone()]
    }
}

impl Default for IndexNames {
    fn default() -> Self {
        Self {
            tasks: "tasks".to_string(),
            organizations: "organizations".to_string(),
        }
    }
}

/// A ranked hit returned from a search.
#[derive(Debug, Clone)]
pub struct StoreHit {
    pub index: String,
    pub id: String,
    pub score: f64,
    pub source: Value,
}

/// Document store operations used by the reconciler and the search service.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document's source. Absent documents are `None`, not an error.
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>>;

    /// Full replace of the document stored under `id`.
    async fn put_document(&self, index: &str, id: &str, document: &Value) -> Result<()>;

    /// Returns whether a document was actually removed.
    async fn delete_document(&self, index: &str, id: &str) -> Result<bool>;

    /// Execute an opaque query body against the given indices.
    async fn search(&self, indices: &[&str], body: &Value) -> Result<Vec<StoreHit>>;

    /// Make recent writes to `index` visible to search.
    async fn refresh(&self, index: &str) -> Result<()>;

    /// Raw schema description for the given indices.
    async fn mappings(&self, indices: &[&str]) -> Result<Value>;
}

#[async_trait]
impl<T> DocumentStore for Arc<T>
where
    T: DocumentStore + ?Sized,
{
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>> {
        (**self).get_document(index, id).await
    }

    async fn put_document(&self, index: &str, id: &str, document: &Value) -> Result<()> {
        (**self).put_document(index, id, document).await
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool> {
        (**self).delete_document(index, id).await
    }

    async fn search(&self, indices: &[&str], body: &Value) -> Result<Vec<StoreHit>> {
        (**self).search(indices, body).await
    }

    async fn refresh(&self, index: &str) -> Result<()> {
        (**self).refresh(index).await
    }

    async fn mappings(&self, indices: &[&str]) -> Result<Value> {
        (**self).mappings(indices).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify the trait stays object-safe (AppState holds Arc<dyn DocumentStore>)
    fn _assert_object_safe(_: &dyn DocumentStore) {}

    #[test]
    fn index_names_default() {
        let indices = IndexNames::default();
        assert_eq!(indices.all(), vec!["tasks", "organizations"]);
    }
}
