use futures::future::try_join_all;
use std::sync::Arc;

use super::bm25::LexicalIndex;
use super::vector::FlatL2Index;
use crate::error::{EngineError, EngineResult};
use crate::llm::embeddings::Embedder;
use crate::models::{CodeUnit, ViewKind};

/// A configured vector space: which view it embeds and with what.
#[derive(Clone)]
pub struct VectorModality {
    pub name: String,
    pub label: String,
    pub view: ViewKind,
    pub embedder: Arc<dyn Embedder>,
}

/// Label reported for lexical results.
pub const LEXICAL_LABEL: &str = "BM25";

/// One lexical index plus one vector index per modality, all aligned with the
/// unit table: position `i` in every index is the unit with `id == i`.
pub struct IndexSet {
    pub lexical: LexicalIndex,
    /// Same order as the modalities the set was built with.
    pub vectors: Vec<FlatL2Index>,
}

impl IndexSet {
    pub fn len(&self) -> usize {
        self.lexical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexical.is_empty()
    }
}

/// Build every index over `units`. Modalities embed concurrently; any
/// embedding failure aborts the whole build.
pub async fn build_index_set(
    units: &[CodeUnit],
    modalities: &[VectorModality],
) -> EngineResult<IndexSet> {
    if units.is_empty() {
        return Err(EngineError::NoIndexableContent);
    }

    let vectors = try_join_all(modalities.iter().map(|m| build_vector_index(units, m))).await?;

    let lexical_texts: Vec<String> = units
        .iter()
        .map(|u| u.views.get(ViewKind::Lexical).to_string())
        .collect();
    let lexical = tokio::task::spawn_blocking(move || LexicalIndex::build(&lexical_texts))
        .await
        .map_err(|e| EngineError::Internal(anyhow::anyhow!("lexical build task failed: {e}")))??;

    tracing::info!(
        "Built indexes over {} units ({} vector modalities)",
        units.len(),
        vectors.len()
    );

    Ok(IndexSet { lexical, vectors })
}

async fn build_vector_index(
    units: &[CodeUnit],
    modality: &VectorModality,
) -> EngineResult<FlatL2Index> {
    let texts: Vec<String> = units
        .iter()
        .map(|u| u.views.get(modality.view).to_string())
        .collect();

    tracing::info!(
        "Embedding {} units for {} ({})",
        texts.len(),
        modality.name,
        modality.embedder.model_name()
    );

    let embeddings = modality
        .embedder
        .embed_batch(&texts)
        .await
        .map_err(|e| EngineError::EmbeddingFailure(format!("{}: {e:#}", modality.name)))?;

    if embeddings.len() != units.len() {
        return Err(EngineError::EmbeddingFailure(format!(
            "{}: expected {} vectors, got {}",
            modality.name,
            units.len(),
            embeddings.len()
        )));
    }

    let mut index = FlatL2Index::new(modality.embedder.dims());
    index
        .add(&embeddings)
        .map_err(|e| EngineError::EmbeddingFailure(format!("{}: {e}", modality.name)))?;
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::embeddings::HashingEmbedder;
    use crate::models::Views;
    use async_trait::async_trait;

    fn unit(id: usize, name: &str, lexical: &str) -> CodeUnit {
        CodeUnit {
            id,
            name: Some(name.to_string()),
            filename: "a.py".to_string(),
            language: "python".to_string(),
            start_line: 1,
            end_line: 2,
            code: lexical.to_string(),
            views: Views {
                semantic: format!("function {name}."),
                lexical: lexical.to_string(),
                code: format!("File: a.py\n{lexical}"),
            },
        }
    }

    fn hashing(dims: usize) -> VectorModality {
        VectorModality {
            name: "minilm".to_string(),
            label: "MiniLM".to_string(),
            view: ViewKind::Semantic,
            embedder: Arc::new(HashingEmbedder::new(dims)),
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(vec![vec![0.0; 4]])
        }
    }

    #[tokio::test]
    async fn test_all_indexes_match_unit_count() {
        let units = vec![
            unit(0, "fetch", "fetch items"),
            unit(1, "store", "store items"),
            unit(2, "drop", "drop items"),
        ];
        let set = build_index_set(&units, &[hashing(32), hashing(16)])
            .await
            .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.vectors.len(), 2);
        assert!(set.vectors.iter().all(|v| v.len() == 3));
    }

    #[tokio::test]
    async fn test_empty_units_rejected() {
        let err = build_index_set(&[], &[hashing(8)]).await.err().unwrap();
        assert!(matches!(err, EngineError::NoIndexableContent));
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_is_embedding_failure() {
        let units = vec![unit(0, "a", "alpha beta"), unit(1, "b", "gamma delta")];
        let modality = VectorModality {
            name: "short".to_string(),
            label: "Short".to_string(),
            view: ViewKind::Semantic,
            embedder: Arc::new(ShortEmbedder),
        };
        let err = build_index_set(&units, &[modality]).await.err().unwrap();
        assert!(matches!(err, EngineError::EmbeddingFailure(_)));
    }
}
