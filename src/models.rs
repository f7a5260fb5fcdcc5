use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which derived text of a unit an index consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Semantic,
    Lexical,
    Code,
}

/// Derived text views, computed once at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Views {
    pub semantic: String,
    pub lexical: String,
    pub code: String,
}

impl Views {
    pub fn get(&self, kind: ViewKind) -> &str {
        match kind {
            ViewKind::Semantic => &self.semantic,
            ViewKind::Lexical => &self.lexical,
            ViewKind::Code => &self.code,
        }
    }
}

/// A single indexable piece of code. `id` is its position in every index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeUnit {
    pub id: usize,
    pub name: Option<String>,
    pub filename: String,
    pub language: String,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
    pub code: String,
    #[serde(skip_serializing)]
    pub views: Views,
}

/// A ranked search result
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    pub id: usize,
    pub name: Option<String>,
    pub filename: String,
    pub language: String,
    pub start_line: usize,
    pub end_line: usize,
    pub code: String,
    pub score: f32,
    pub source_model: String,
}

impl ScoredResult {
    pub fn from_unit(unit: &CodeUnit, score: f32, source_model: &str) -> Self {
        Self {
            id: unit.id,
            name: unit.name.clone(),
            filename: unit.filename.clone(),
            language: unit.language.clone(),
            start_line: unit.start_line,
            end_line: unit.end_line,
            code: unit.code.clone(),
            score,
            source_model: source_model.to_string(),
        }
    }
}

/// Search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// "bm25", "hybrid" or a configured vector modality name
    #[serde(default = "default_model")]
    pub model: String,
    pub k: Option<usize>,
}

fn default_model() -> String {
    "minilm".to_string()
}

/// Search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub model: String,
    pub results: Vec<ScoredResult>,
}

/// Ingest request
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
    pub repo_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Success,
    Cached,
}

/// Result of an ingest or reindex
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub status: IngestStatus,
    pub repository: String,
    pub count: usize,
    pub indexed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_status_serializes_to_snake_case() {
        let json = serde_json::to_value(IngestStatus::Cached).unwrap();
        assert_eq!(json, "cached");
    }

    #[test]
    fn test_search_request_defaults() {
        let req: SearchRequest = serde_json::from_str(r#"{"query":"parse json"}"#).unwrap();
        assert_eq!(req.model, "minilm");
        assert!(req.k.is_none());
    }

    #[test]
    fn test_unit_views_not_serialized() {
        let unit = CodeUnit {
            id: 0,
            name: Some("f".to_string()),
            filename: "a.py".to_string(),
            language: "python".to_string(),
            start_line: 1,
            end_line: 2,
            code: "def f():\n    pass".to_string(),
            views: Views {
                semantic: "function f.".to_string(),
                lexical: "f f f".to_string(),
                code: "File: a.py".to_string(),
            },
        };
        let json = serde_json::to_value(&unit).unwrap();
        assert!(json.get("views").is_none());
        assert_eq!(json["filename"], "a.py");
    }
}
