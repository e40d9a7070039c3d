use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::db::models::RecipeId;

/// Cosine similarity, or `None` when the vectors cannot be compared
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    similarity.is_finite().then_some(similarity)
}

/// Map cosine similarity from [-1, 1] onto a [0, 1] relevance score
pub fn similarity_score(cosine: f32) -> f32 {
    ((1.0 + cosine) / 2.0).clamp(0.0, 1.0)
}

#[derive(Debug)]
struct Scored {
    score: f32,
    id: RecipeId,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    // Reversed so the BinaryHeap pops the weakest candidate first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Keep the `pool_size` best candidates for `query`, best first.
/// Candidates whose dimensionality differs from the query are reported
/// through `on_mismatch` and skipped.
pub fn top_candidates<I, F>(
    query: &[f32],
    candidates: I,
    pool_size: usize,
    mut on_mismatch: F,
) -> Vec<(RecipeId, f32)>
where
    I: IntoIterator<Item = (RecipeId, Vec<f32>)>,
    F: FnMut(&RecipeId, usize),
{
    if pool_size == 0 {
        return Vec::new();
    }

    let mut heap = BinaryHeap::with_capacity(pool_size + 1);

    for (id, embedding) in candidates {
        if embedding.len() != query.len() {
            on_mismatch(&id, embedding.len());
            continue;
        }

        let Some(cosine) = cosine_similarity(query, &embedding) else {
            continue;
        };

        heap.push(Scored {
            score: similarity_score(cosine),
            id,
        });
        if heap.len() > pool_size {
            heap.pop();
        }
    }

    // Ascending in the reversed order == descending by score
    heap.into_sorted_vec()
        .into_iter()
        .map(|s| (s.id, s.score))
        .collect()
}
