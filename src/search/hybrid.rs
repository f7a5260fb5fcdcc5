use std::collections::HashMap;

use crate::models::ScoredResult;

/// Reciprocal Rank Fusion constant.
const RRF_K: f32 = 60.0;
/// Added once per list in which a unit ranks first.
const TOP_RANK_BONUS: f32 = 0.05;

pub const HYBRID_LABEL: &str = "Hybrid";

/// Fuse ranked lists with Reciprocal Rank Fusion.
///
/// Scores are normalized by the fused maximum so the best result scores 1.0.
/// Ties order by lower unit id. Returns at most `k` results.
pub fn rrf_fuse(lists: &[Vec<ScoredResult>], k: usize) -> Vec<ScoredResult> {
    let mut fused: HashMap<usize, (f32, &ScoredResult)> = HashMap::new();

    for list in lists {
        for (rank, result) in list.iter().enumerate() {
            let mut contribution = 1.0 / (RRF_K + (rank + 1) as f32);
            if rank == 0 {
                contribution += TOP_RANK_BONUS;
            }
            fused
                .entry(result.id)
                .and_modify(|(score, _)| *score += contribution)
                .or_insert((contribution, result));
        }
    }

    let mut ranked: Vec<(f32, &ScoredResult)> = fused.into_values().collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
    ranked.truncate(k);

    let max = ranked.first().map(|(s, _)| *s).unwrap_or(1.0);
    ranked
        .into_iter()
        .map(|(score, result)| ScoredResult {
            score: score / max,
            source_model: HYBRID_LABEL.to_string(),
            ..result.clone()
        })
        .collect()
}
