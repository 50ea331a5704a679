//! Store adapter backed by the `searchstore` HTTP client.

use async_trait::async_trait;
use searchstore::StoreClient;
use serde_json::Value;

use super::{DocumentStore, Result, StoreHit};

pub struct HttpDocumentStore {
    client: StoreClient,
}

impl HttpDocumentStore {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>> {
        Ok(self.client.get_document(index, id).await?)
    }

    async fn put_document(&self, index: &str, id: &str, document: &Value) -> Result<()> {
        Ok(self.client.put_document(index, id, document).await?)
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool> {
        Ok(self.client.delete_document(index, id).await?)
    }

    async fn search(&self, indices: &[&str], body: &Value) -> Result<Vec<StoreHit>> {
        let response = self.client.search(indices, body).await?;

        Ok(response
            .hits
            .hits
            .into_iter()
            .map(|hit| StoreHit {
                index: hit.index,
                id: hit.id,
                score: hit.score.unwrap_or(0.0),
                source: hit.source,
            })
            .collect())
    }

    async fn refresh(&self, index: &str) -> Result<()> {
        Ok(self.client.refresh(index).await?)
    }

    async fn mappings(&self, indices: &[&str]) -> Result<Value> {
        Ok(self.client.get_mapping(indices).await?)
    }
}
