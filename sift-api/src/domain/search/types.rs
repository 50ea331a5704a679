use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::store::StoreHit;

/// One hit, flattened to its stored fields plus identifier, source index
/// and relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct SearchItem {
    pub id: String,
    pub index: String,
    pub score: f64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl From<StoreHit> for SearchItem {
    fn from(hit: StoreHit) -> Self {
        let fields = match hit.source {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            id: hit.id,
            index: hit.index,
            score: hit.score,
            fields,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugOutcome>,
}

impl SearchOutcome {
    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            debug: None,
        }
    }
}

/// Both result sets of a diagnostic run, letting operators tell "no
/// textual match" apart from "visibility filter excluded it".
#[derive(Debug, Clone, Serialize)]
pub struct DebugOutcome {
    pub filtered: Vec<SearchItem>,
    pub unfiltered: Vec<SearchItem>,
}
