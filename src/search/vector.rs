use anyhow::{bail, Result};

/// Position returned for padding when fewer than `k` vectors exist.
pub const NO_MATCH: i64 = -1;

/// Exact nearest-neighbour index over squared Euclidean distance.
///
/// Vectors are stored row-major; row `i` is unit position `i`.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dim: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append vectors at the next positions. All must have length `dim`.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some((i, v)) = vectors.iter().enumerate().find(|(_, v)| v.len() != self.dim) {
            bail!(
                "vector {i} has dimension {}, index expects {}",
                v.len(),
                self.dim
            );
        }
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// The `k` nearest rows as `(squared distance, position)`, nearest first.
    ///
    /// Equal distances order by lower position. When fewer than `k` rows exist
    /// the tail is padded with `(f32::MAX, NO_MATCH)`.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(f32, i64)>> {
        if vector.len() != self.dim {
            bail!(
                "query has dimension {}, index expects {}",
                vector.len(),
                self.dim
            );
        }

        let mut hits: Vec<(f32, i64)> = self
            .data
            .chunks_exact(self.dim.max(1))
            .enumerate()
            .map(|(i, row)| (squared_l2(vector, row), i as i64))
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.truncate(k);
        hits.resize(k, (f32::MAX, NO_MATCH));
        Ok(hits)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_first_with_padding() {
        let mut index = FlatL2Index::new(2);
        index
            .add(&[vec![0.0, 0.0], vec![3.0, 4.0], vec![1.0, 0.0]])
            .unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.query(&[0.0, 0.0], 5).unwrap();
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0], (0.0, 0));
        assert_eq!(hits[1], (1.0, 2));
        assert_eq!(hits[2], (25.0, 1));
        assert_eq!(hits[3], (f32::MAX, NO_MATCH));
        assert_eq!(hits[4].1, NO_MATCH);
    }

    #[test]
    fn test_ties_break_by_position() {
        let mut index = FlatL2Index::new(1);
        index.add(&[vec![1.0], vec![-1.0], vec![1.0]]).unwrap();
        let hits = index.query(&[0.0], 3).unwrap();
        let positions: Vec<i64> = hits.iter().map(|h| h.1).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        let mut index = FlatL2Index::new(3);
        assert!(index.add(&[vec![1.0, 2.0]]).is_err());
        assert!(index.is_empty());
        assert!(index.query(&[1.0], 1).is_err());
    }

    #[test]
    fn test_empty_index_is_all_padding() {
        let index = FlatL2Index::new(4);
        let hits = index.query(&[0.0; 4], 2).unwrap();
        assert!(hits.iter().all(|h| h.1 == NO_MATCH));
    }
}
