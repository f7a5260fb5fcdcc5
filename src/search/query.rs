use regex::Regex;
use std::sync::OnceLock;

use super::hybrid::{rrf_fuse, HYBRID_LABEL};
use super::index::{IndexSet, VectorModality, LEXICAL_LABEL};
use super::vector::NO_MATCH;
use crate::error::{EngineError, EngineResult};
use crate::models::{CodeUnit, ScoredResult};

/// Hybrid fetches this many candidates per list for every requested result.
const HYBRID_FETCH_FACTOR: usize = 3;

/// Which index answers a query, resolved once from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Lexical,
    /// Index into the configured vector modalities.
    Vector(usize),
    Hybrid,
}

impl Modality {
    /// Accepts "bm25"/"lexical", "hybrid" or a configured modality name.
    pub fn resolve(name: &str, modalities: &[VectorModality]) -> EngineResult<Self> {
        let wanted = name.trim().to_lowercase();
        match wanted.as_str() {
            "bm25" | "lexical" => Ok(Modality::Lexical),
            "hybrid" => Ok(Modality::Hybrid),
            _ => modalities
                .iter()
                .position(|m| m.name.to_lowercase() == wanted)
                .map(Modality::Vector)
                .ok_or_else(|| EngineError::InvalidQuery(format!("unknown model '{name}'"))),
        }
    }
}

fn filler_phrases() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(code snippet|how do i|how to)\b").expect("valid filler regex")
    })
}

/// Lowercase, drop filler phrases, collapse whitespace.
pub fn normalize_query(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = filler_phrases().replace_all(&lowered, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Same tokenization as the lexical index: whitespace split, lowercase.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(|t| t.to_lowercase()).collect()
}

/// Top `k` lexical matches, scores divided by the best score among them.
pub fn lexical_search(
    units: &[CodeUnit],
    index: &IndexSet,
    query: &str,
    k: usize,
) -> EngineResult<Vec<ScoredResult>> {
    let scores = index.lexical.scores(&tokenize(query))?;

    let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(k);

    let max = ranked
        .iter()
        .map(|(_, s)| *s)
        .fold(0.0f32, f32::max);
    let max = if max > 0.0 { max } else { 1.0 };

    Ok(ranked
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .filter_map(|(position, score)| {
            units
                .get(position)
                .map(|unit| ScoredResult::from_unit(unit, score / max, LEXICAL_LABEL))
        })
        .collect())
}

/// `k` nearest units in one vector modality, scored `1 / (1 + distance)`.
pub async fn vector_search(
    units: &[CodeUnit],
    index: &IndexSet,
    modalities: &[VectorModality],
    which: usize,
    query: &str,
    k: usize,
) -> EngineResult<Vec<ScoredResult>> {
    let (Some(modality), Some(vectors)) = (modalities.get(which), index.vectors.get(which)) else {
        return Err(EngineError::InvalidQuery(format!(
            "vector modality {which} is not built"
        )));
    };

    let embedding = modality
        .embedder
        .embed(query)
        .await
        .map_err(|e| EngineError::EmbeddingFailure(format!("{}: {e:#}", modality.name)))?;

    let hits = vectors
        .query(&embedding, k)
        .map_err(|e| EngineError::EmbeddingFailure(format!("{}: {e}", modality.name)))?;

    Ok(hits
        .into_iter()
        .filter(|(_, position)| *position != NO_MATCH)
        .filter_map(|(distance, position)| {
            let unit = usize::try_from(position).ok().and_then(|p| units.get(p))?;
            Some(ScoredResult::from_unit(
                unit,
                1.0 / (1.0 + distance),
                &modality.label,
            ))
        })
        .collect())
}

/// Lexical plus every vector modality, fused by reciprocal rank.
pub async fn hybrid_search(
    units: &[CodeUnit],
    index: &IndexSet,
    modalities: &[VectorModality],
    query: &str,
    k: usize,
) -> EngineResult<Vec<ScoredResult>> {
    let fetch = k.saturating_mul(HYBRID_FETCH_FACTOR);

    let mut lists = vec![lexical_search(units, index, query, fetch)?];
    for which in 0..modalities.len() {
        lists.push(vector_search(units, index, modalities, which, query, fetch).await?);
    }

    Ok(rrf_fuse(&lists, k))
}

/// Run an already-normalized query against one modality.
pub async fn run(
    units: &[CodeUnit],
    index: &IndexSet,
    modalities: &[VectorModality],
    modality: Modality,
    query: &str,
    k: usize,
) -> EngineResult<Vec<ScoredResult>> {
    match modality {
        Modality::Lexical => lexical_search(units, index, query, k),
        Modality::Vector(which) => vector_search(units, index, modalities, which, query, k).await,
        Modality::Hybrid => hybrid_search(units, index, modalities, query, k).await,
    }
}

/// Label a modality reports on its results.
pub fn label(modality: Modality, modalities: &[VectorModality]) -> &str {
    match modality {
        Modality::Lexical => LEXICAL_LABEL,
        Modality::Hybrid => HYBRID_LABEL,
        Modality::Vector(which) => modalities
            .get(which)
            .map(|m| m.label.as_str())
            .unwrap_or_default(),
    }
}
