use serde::{Deserialize, Serialize};

/// Parent selection scheme used by rule discovery.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Fitness-proportionate roulette wheel over the correct set.
    Roulette,
    /// Tournament over a random `theta_sel` fraction of the correct set.
    #[default]
    Tournament,
}

/// Learning-run hyperparameters.
///
/// All fields have conventional defaults, so a configuration file only needs
/// to name the values it overrides. `checkpoints` doubles as the learning
/// schedule: evaluation snapshots are taken at each listed iteration and the
/// last entry is the total number of training iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LcsParameters {
    /// Maximum micro-classifier population size (sum of numerosities).
    pub population_size: usize,
    /// Fitness exponent applied to accuracy.
    pub nu: f64,
    /// Crossover probability.
    pub chi: f64,
    /// Per-attribute mutation probability, also the geometric step rate for
    /// the mutation pressure draw.
    pub upsilon: f64,
    /// GA activation threshold: mean correct-set age must exceed this.
    pub theta_ga: f64,
    /// Deletion experience threshold.
    pub theta_del: u32,
    /// Subsumption experience threshold.
    pub theta_sub: u32,
    /// Subsumption accuracy threshold.
    pub acc_sub: f64,
    /// Learning rate for running averages.
    pub beta: f64,
    /// Deletion vote fraction of mean fitness.
    pub delta: f64,
    /// Fitness assigned to newly covered rules.
    pub init_fitness: f64,
    /// Fitness discount applied to offspring.
    pub fitness_reduction: f64,
    /// Fraction of the correct set entering a tournament.
    pub theta_sel: f64,
    /// Parent selection scheme.
    pub selection: SelectionMethod,
    /// Whether offspring and correct-set subsumption run at all.
    pub do_subsumption: bool,
    /// Whether per-instance attribute tracking is maintained.
    pub do_attribute_tracking: bool,
    /// Whether tracking sums bias crossover and mutation.
    pub do_attribute_feedback: bool,
    /// Iterations at which full evaluations and snapshots are taken, in
    /// ascending order. The final entry is the training length.
    pub checkpoints: Vec<usize>,
    /// Learning-progress reporting period. Zero means once per epoch.
    pub tracking_frequency: usize,
    /// Attributes with at most this many distinct states are discrete.
    pub discrete_attribute_limit: usize,
    /// Textual form marking a missing value in data files.
    pub missing_label: String,
    /// Header label of the class column.
    pub phenotype_label: String,
    /// Header label of an optional instance identifier column.
    pub instance_id_label: String,
    /// Overrides the derived rule specificity limit when set.
    pub spec_limit_override: Option<usize>,
}

impl Default for LcsParameters {
    fn default() -> Self {
        Self {
            population_size: 1000,
            nu: 1.0,
            chi: 0.8,
            upsilon: 0.04,
            theta_ga: 25.0,
            theta_del: 20,
            theta_sub: 20,
            acc_sub: 0.99,
            beta: 0.2,
            delta: 0.1,
            init_fitness: 0.01,
            fitness_reduction: 0.1,
            theta_sel: 0.5,
            selection: SelectionMethod::Tournament,
            do_subsumption: true,
            do_attribute_tracking: true,
            do_attribute_feedback: true,
            checkpoints: vec![5000, 10000, 20000, 100_000],
            tracking_frequency: 0,
            discrete_attribute_limit: 10,
            missing_label: "NA".to_owned(),
            phenotype_label: "Class".to_owned(),
            instance_id_label: "InstanceID".to_owned(),
            spec_limit_override: None,
        }
    }
}

impl LcsParameters {
    /// Total number of training iterations (the last checkpoint).
    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.checkpoints.last().copied().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.population_size == 0 {
            return Err(ParameterError::ZeroPopulationSize);
        }
        if self.checkpoints.is_empty() {
            return Err(ParameterError::EmptyCheckpoints);
        }
        if !self.checkpoints.is_sorted() || self.checkpoints.contains(&0) {
            return Err(ParameterError::InvalidCheckpoints);
        }
        if !(0.0..1.0).contains(&self.upsilon) {
            return Err(ParameterError::UpsilonOutOfRange {
                value: self.upsilon,
            });
        }
        for (name, value) in [
            ("chi", self.chi),
            ("acc_sub", self.acc_sub),
            ("beta", self.beta),
            ("delta", self.delta),
            ("theta_sel", self.theta_sel),
            ("fitness_reduction", self.fitness_reduction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParameterError::ProbabilityOutOfRange {
                    name: name.to_owned(),
                    value,
                });
            }
        }
        if self.nu <= 0.0 {
            return Err(ParameterError::NonPositiveNu { value: self.nu });
        }
        Ok(())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParameterError {
    #[display("population size must be positive")]
    ZeroPopulationSize,
    #[display("at least one learning checkpoint is required")]
    EmptyCheckpoints,
    #[display("checkpoints must be positive and in ascending order")]
    InvalidCheckpoints,
    #[display("parameter '{name}' must lie in [0, 1], got {value}")]
    ProbabilityOutOfRange { name: String, value: f64 },
    #[display("mutation rate upsilon must lie in [0, 1), got {value}")]
    UpsilonOutOfRange { value: f64 },
    #[display("fitness exponent nu must be positive, got {value}")]
    NonPositiveNu { value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = LcsParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.max_iterations(), 100_000);
    }

    #[test]
    fn test_rejects_probability_out_of_range() {
        let params = LcsParameters {
            chi: 1.5,
            ..LcsParameters::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("chi"));
    }

    #[test]
    fn test_rejects_saturating_mutation_rate() {
        let params = LcsParameters {
            upsilon: 1.0,
            ..LcsParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_unsorted_checkpoints() {
        let params = LcsParameters {
            checkpoints: vec![10_000, 5000],
            ..LcsParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_config_overrides_merge_with_defaults() {
        let params: LcsParameters =
            serde_json::from_str(r#"{"population_size": 200, "selection": "roulette"}"#).unwrap();
        assert_eq!(params.population_size, 200);
        assert_eq!(params.selection, SelectionMethod::Roulette);
        assert_eq!(params.checkpoints, vec![5000, 10000, 20000, 100_000]);
    }
}
