use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::types::{GetDocumentResponse, SearchResponse};

/// Thin HTTP client for the document store's REST API.
///
/// The store is treated as an opaque collaborator: documents go in and out
/// as JSON, queries are opaque bodies built by the caller.
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

impl StoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            credentials: None,
        }
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.request(method, self.url(path));
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }
        request
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StoreFetchError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreFetchError::ResponseError(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreFetchError::Unauthorized),
            _ => Ok(response),
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreFetchError> {
        response.json::<T>().await.map_err(|e| {
            StoreFetchError::ParsingError(format!("Failed to parse response as JSON: {}", e))
        })
    }

    async fn error_body(response: reqwest::Response) -> StoreFetchError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StoreFetchError::ResponseError(format!("{}: {}", status, body))
    }

    /// Fetch a document's source by id. Absent documents are `None`, not an
    /// error.
    pub async fn get_document(
        &self,
        index: &str,
        id: &str,
    ) -> Result<Option<Value>, StoreFetchError> {
        let response = self
            .send(self.request(Method::GET, &format!("{}/_doc/{}", index, id)))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }

        let document: GetDocumentResponse = Self::parse(response).await?;
        Ok(document.found.then_some(document.source))
    }

    /// Full replace of the document stored under `id`.
    pub async fn put_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), StoreFetchError> {
        let response = self
            .send(
                self.request(Method::PUT, &format!("{}/_doc/{}", index, id))
                    .json(document),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }
        Ok(())
    }

    /// Returns whether a document was actually removed.
    pub async fn delete_document(&self, index: &str, id: &str) -> Result<bool, StoreFetchError> {
        let response = self
            .send(self.request(Method::DELETE, &format!("{}/_doc/{}", index, id)))
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }
        Ok(true)
    }

    /// Execute an opaque query body against one or more indices.
    pub async fn search(
        &self,
        indices: &[&str],
        body: &Value,
    ) -> Result<SearchResponse, StoreFetchError> {
        let response = self
            .send(
                self.request(Method::POST, &format!("{}/_search", indices.join(",")))
                    .json(body),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }
        Self::parse(response).await
    }

    /// Make recent writes visible to search without waiting for the store's
    /// own refresh interval.
    pub async fn refresh(&self, index: &str) -> Result<(), StoreFetchError> {
        let response = self
            .send(self.request(Method::POST, &format!("{}/_refresh", index)))
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }
        Ok(())
    }

    /// Fetch the raw schema description for the given indices.
    pub async fn get_mapping(&self, indices: &[&str]) -> Result<Value, StoreFetchError> {
        let response = self
            .send(self.request(Method::GET, &format!("{}/_mapping", indices.join(","))))
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_body(response).await);
        }
        Self::parse(response).await
    }
}

#[derive(Error, Debug)]
pub enum StoreFetchError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("ResponseError: {0}")]
    ResponseError(String),
    #[error("ParsingError: {0}")]
    ParsingError(String),
}
