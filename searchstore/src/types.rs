use serde::Deserialize;
use serde_json::Value;

/// Response envelope for `_search` requests.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// A single ranked hit as returned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    /// Absent when the store sorts without scoring.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    #[serde(rename = "_source", default)]
    pub source: Value,
}

/// Response envelope for single-document GET requests.
#[derive(Debug, Deserialize)]
pub struct GetDocumentResponse {
    pub found: bool,
    #[serde(rename = "_source", default)]
    pub source: Value,
}
