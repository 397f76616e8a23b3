use oxiclass_engine::Population;
use rand::Rng;

/// Per-instance record of which attributes contribute to correct
/// classification.
///
/// Every training instance keeps a running sum per attribute: whenever a
/// rule lands in the instance's correct set, its accuracy is added to the
/// sums of the attributes it specifies. The sums double as a feedback
/// signal for rule discovery, normalized into a probability vector drawn
/// from one random instance at a time so the bias reflects local rather
/// than global attribute usefulness.
#[derive(Debug, Clone)]
pub struct AttributeTracking {
    sums: Vec<Vec<f64>>,
    percent: f64,
}

impl AttributeTracking {
    #[must_use]
    pub fn new(num_instances: usize, num_attributes: usize) -> Self {
        Self {
            sums: vec![vec![0.0; num_attributes]; num_instances],
            percent: 0.0,
        }
    }

    /// Probability that discovery operators consult the feedback signal.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.percent
    }

    /// Scales the feedback weight with learning progress.
    pub fn update_percent(&mut self, iteration: usize, max_iterations: usize) {
        self.percent = iteration as f64 / max_iterations as f64;
    }

    /// Credits every correct-set rule's accuracy to the attributes it
    /// specifies, on the row of the current training instance.
    pub fn track(&mut self, instance_index: usize, population: &Population) {
        for &index in population.correct_set() {
            let rule = population.rule(index);
            for &attribute in rule.condition().specified_attributes() {
                self.sums[instance_index][attribute] += rule.accuracy();
            }
        }
    }

    /// Normalizes one uniformly random instance's sums into per-attribute
    /// specification probabilities.
    ///
    /// The row is shifted so its minimum sits at zero and divided by 1.01
    /// times its maximum, keeping every probability strictly below one. A
    /// flat row falls back to 0.5 everywhere.
    pub fn generate_probabilities<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        let row = &self.sums[rng.random_range(0..self.sums.len())];
        let low = row.iter().copied().fold(f64::INFINITY, f64::min);
        let shifted: Vec<f64> = row.iter().map(|sum| sum - low).collect();
        let high = shifted.iter().copied().fold(0.0, f64::max);
        if high == 0.0 {
            return vec![0.5; row.len()];
        }
        shifted.iter().map(|sum| sum / (high * 1.01)).collect()
    }

    #[must_use]
    pub fn instance_sums(&self, instance_index: usize) -> &[f64] {
        &self.sums[instance_index]
    }

    /// Per-attribute sums aggregated over every training instance.
    #[must_use]
    pub fn global_sums(&self) -> Vec<f64> {
        let num_attributes = self.sums.first().map_or(0, Vec::len);
        let mut totals = vec![0.0; num_attributes];
        for row in &self.sums {
            for (total, sum) in totals.iter_mut().zip(row) {
                *total += sum;
            }
        }
        totals
    }
}
