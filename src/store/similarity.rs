//! Similarity functions over embedding vectors.

/// Cosine similarity between two vectors.
///
/// Returns a value between -1.0 and 1.0, or 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Select `k` candidates by maximal marginal relevance.
///
/// Starts with the candidate closest to the query, then repeatedly adds the
/// one maximising `lambda_mult * sim(query) - (1 - lambda_mult) * max sim(selected)`.
/// Returns indices into `candidates` in selection order.
pub fn maximal_marginal_relevance(
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
    lambda_mult: f32,
) -> Vec<usize> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }

    let to_query: Vec<f32> = candidates
        .iter()
        .map(|candidate| cosine_similarity(query, candidate))
        .collect();

    let mut selected = vec![argmax(&to_query)];
    // Highest similarity of each candidate to anything already selected
    let mut redundancy: Vec<f32> = candidates
        .iter()
        .map(|candidate| cosine_similarity(candidate, &candidates[selected[0]]))
        .collect();

    while selected.len() < k.min(candidates.len()) {
        let mut best: Option<(usize, f32)> = None;

        for (i, query_score) in to_query.iter().enumerate() {
            if selected.contains(&i) {
                continue;
            }
            let score = lambda_mult * query_score - (1.0 - lambda_mult) * redundancy[i];
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
        }

        let Some((next, _)) = best else { break };
        selected.push(next);

        for (i, candidate) in candidates.iter().enumerate() {
            redundancy[i] = redundancy[i].max(cosine_similarity(candidate, &candidates[next]));
        }
    }

    selected
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
            if v > best.1 { (i, v) } else { best }
        })
        .0
}
