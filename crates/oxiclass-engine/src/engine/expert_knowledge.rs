use rand::Rng;

/// Externally supplied per-attribute quality scores that bias covering and
/// mutation toward attributes believed to matter.
///
/// Scores are an opaque input: any attribute weighting source can produce
/// them. On construction they are shifted to be non-negative, converted to
/// selection probabilities, and ranked. Covering walks the rank from the
/// best attribute down; mutation samples attributes by roulette, directly
/// proportional to score when specifying and inversely when generalizing.
#[derive(Debug, Clone)]
pub struct ExpertKnowledge {
    scores: Vec<f64>,
    probabilities: Vec<f64>,
    rank: Vec<usize>,
}

impl ExpertKnowledge {
    /// Adjusts, normalizes, and ranks a raw score vector, one entry per
    /// dataset attribute.
    ///
    /// Negative scores are handled by shifting the whole vector up so the
    /// minimum lands at `init_fitness`, preserving relative order.
    #[must_use]
    pub fn new(mut scores: Vec<f64>, init_fitness: f64) -> Self {
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        if min < 0.0 {
            for score in &mut scores {
                *score = *score - min + init_fitness;
            }
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let probabilities = if max == 0.0 {
            vec![0.5; scores.len()]
        } else {
            scores.iter().map(|score| score / (max * 1.01)).collect()
        };

        let mut rank: Vec<usize> = (0..scores.len()).collect();
        // Stable sort keeps equal scores in attribute order.
        rank.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        Self {
            scores,
            probabilities,
            rank,
        }
    }

    #[must_use]
    pub fn num_attributes(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Per-attribute selection probabilities, normalized to the best score.
    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Attribute indices in descending score order.
    #[must_use]
    pub fn rank(&self) -> &[usize] {
        &self.rank
    }

    /// Picks `count` attributes to specify, weighted directly by score.
    pub fn select_specify<R: Rng + ?Sized>(
        &self,
        candidates: &[usize],
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        roulette_without_replacement(candidates, count, |a| self.scores[a], rng)
    }

    /// Picks `count` attributes to generalize, weighted inversely to score.
    pub fn select_generalize<R: Rng + ?Sized>(
        &self,
        candidates: &[usize],
        count: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        roulette_without_replacement(candidates, count, |a| 1.0 / (self.scores[a] + 1.0), rng)
    }
}

/// Roulette wheel over the candidate list, removing each winner before the
/// next spin. When every weight is zero the first remaining candidate wins.
pub(crate) fn roulette_without_replacement<R: Rng + ?Sized>(
    candidates: &[usize],
    count: usize,
    weight: impl Fn(usize) -> f64,
    rng: &mut R,
) -> Vec<usize> {
    let mut pool = candidates.to_vec();
    let mut total: f64 = pool.iter().map(|&a| weight(a)).sum();
    let mut selected = Vec::with_capacity(count);

    while selected.len() < count && !pool.is_empty() {
        let choice_point = rng.random::<f64>() * total;
        let mut index = 0;
        let mut acc = weight(pool[0]);
        while choice_point > acc && index + 1 < pool.len() {
            index += 1;
            acc += weight(pool[index]);
        }
        let picked = pool.remove(index);
        total -= weight(picked);
        selected.push(picked);
    }
    selected
}
