use serde::{Deserialize, Serialize};

/// Confusion cells for a single phenotype class.
///
/// Every decided instance updates the cells of every class: from one class's
/// point of view an outcome is split by whether the instance belongs to that
/// class and whether the population's prediction was correct. Undecided and
/// tied instances never reach these cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAccuracy {
    true_my_class: u64,
    true_other_class: u64,
    false_my_class: u64,
    false_other_class: u64,
}

impl ClassAccuracy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the cell selected by instance membership and prediction
    /// correctness.
    pub fn record(&mut self, is_my_class: bool, prediction_correct: bool) {
        match (is_my_class, prediction_correct) {
            (true, true) => self.true_my_class += 1,
            (false, true) => self.true_other_class += 1,
            (true, false) => self.false_my_class += 1,
            (false, false) => self.false_other_class += 1,
        }
    }

    #[must_use]
    pub fn true_my_class(&self) -> u64 {
        self.true_my_class
    }

    #[must_use]
    pub fn true_other_class(&self) -> u64 {
        self.true_other_class
    }

    #[must_use]
    pub fn false_my_class(&self) -> u64 {
        self.false_my_class
    }

    #[must_use]
    pub fn false_other_class(&self) -> u64 {
        self.false_other_class
    }

    /// Fraction of decided instances the prediction got right.
    #[must_use]
    pub fn class_accuracy(&self) -> f64 {
        let correct = self.true_my_class + self.true_other_class;
        let total = correct + self.false_my_class + self.false_other_class;
        if total == 0 {
            return 0.0;
        }
        correct as f64 / total as f64
    }

    /// Correct-prediction rate over instances of this class.
    #[must_use]
    pub fn sensitivity(&self) -> f64 {
        let denominator = self.true_my_class + self.false_other_class;
        if denominator == 0 {
            return 0.0;
        }
        self.true_my_class as f64 / denominator as f64
    }

    /// Correct-prediction rate over instances of other classes.
    #[must_use]
    pub fn specificity(&self) -> f64 {
        let denominator = self.true_other_class + self.false_my_class;
        if denominator == 0 {
            return 0.0;
        }
        self.true_other_class as f64 / denominator as f64
    }

    /// Mean of sensitivity and specificity.
    #[must_use]
    pub fn balanced_accuracy(&self) -> f64 {
        (self.sensitivity() + self.specificity()) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_routes_to_the_right_cell() {
        let mut cells = ClassAccuracy::new();
        cells.record(true, true);
        cells.record(false, true);
        cells.record(true, false);
        cells.record(false, false);
        assert_eq!(cells.true_my_class(), 1);
        assert_eq!(cells.true_other_class(), 1);
        assert_eq!(cells.false_my_class(), 1);
        assert_eq!(cells.false_other_class(), 1);
    }

    #[test]
    fn test_empty_cells_report_zero_not_nan() {
        let cells = ClassAccuracy::new();
        assert_eq!(cells.class_accuracy(), 0.0);
        assert_eq!(cells.sensitivity(), 0.0);
        assert_eq!(cells.specificity(), 0.0);
        assert_eq!(cells.balanced_accuracy(), 0.0);
    }

    #[test]
    fn test_balanced_accuracy_averages_both_rates() {
        let mut cells = ClassAccuracy::new();
        // 3 of 4 of this class predicted right, 1 of 2 of the others.
        cells.record(true, true);
        cells.record(true, true);
        cells.record(true, true);
        cells.record(true, false);
        cells.record(false, true);
        cells.record(false, false);
        assert!((cells.sensitivity() - 0.75).abs() < 1e-12);
        assert!((cells.specificity() - 0.5).abs() < 1e-12);
        assert!((cells.balanced_accuracy() - 0.625).abs() < 1e-12);
    }
}
