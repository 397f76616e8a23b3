use oxiclass_engine::{Dataset, Instance, Population, Prediction, PredictionVote};
use serde::{Deserialize, Serialize};

use crate::class_accuracy::ClassAccuracy;

/// Accuracy figures for one evaluation pass over a fixed instance list.
///
/// Instances the population fails to match, or matches without reaching a
/// decision, are excluded from the raw accuracies and folded back in through
/// the adjusted figures: an undecided instance is treated as a chance guess,
/// so uncovered data pulls the adjusted accuracy toward `1 / num_classes`
/// rather than toward zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// Mean per-class accuracy over decided instances.
    pub standard_accuracy: f64,
    /// Mean per-class balanced accuracy over decided instances.
    pub balanced_accuracy: f64,
    /// Standard accuracy blended with chance for undecided instances.
    pub adjusted_standard_accuracy: f64,
    /// Balanced accuracy blended with chance for undecided instances.
    pub adjusted_balanced_accuracy: f64,
    /// Fraction of instances matched by at least one voting rule.
    pub coverage: f64,
    /// Fraction of instances whose vote ended in an unresolved tie.
    pub tie_fraction: f64,
    /// Confusion cells per phenotype, in dataset phenotype order.
    pub per_class: Vec<ClassAccuracy>,
}

/// Classifies every instance in `instances` with evaluation match sets and
/// tallies the outcome.
///
/// The population is only used through its transient match set, which is
/// cleared again before returning; rules are never modified.
pub fn evaluate_accuracy(
    population: &mut Population,
    instances: &[Instance],
    dataset: &Dataset,
) -> AccuracyReport {
    let classes = dataset.phenotype_list();
    let mut per_class = vec![ClassAccuracy::new(); classes.len()];
    let mut no_match = 0_usize;
    let mut ties = 0_usize;

    for instance in instances {
        population.make_eval_match_set(instance.state());
        let vote = PredictionVote::from_match_set(population, dataset);
        match vote.decision() {
            Prediction::Undecided => no_match += 1,
            Prediction::Tie => ties += 1,
            Prediction::Class(predicted) => {
                let prediction_correct = predicted == instance.phenotype();
                for (class, cells) in classes.iter().zip(&mut per_class) {
                    cells.record(class == instance.phenotype(), prediction_correct);
                }
            }
        }
        population.clear_sets();
    }

    let chance = dataset.chance_accuracy();
    if no_match == instances.len() {
        return AccuracyReport {
            standard_accuracy: chance,
            balanced_accuracy: chance,
            adjusted_standard_accuracy: chance,
            adjusted_balanced_accuracy: chance,
            coverage: 0.0,
            tie_fraction: 0.0,
            per_class,
        };
    }

    let num_classes = classes.len() as f64;
    let standard_accuracy = per_class
        .iter()
        .map(ClassAccuracy::class_accuracy)
        .sum::<f64>()
        / num_classes;
    let balanced_accuracy = per_class
        .iter()
        .map(ClassAccuracy::balanced_accuracy)
        .sum::<f64>()
        / num_classes;

    let total = instances.len() as f64;
    let prediction_fail = no_match as f64 / total;
    let tie_fraction = ties as f64 / total;
    let prediction_made = 1.0 - (prediction_fail + tie_fraction);

    AccuracyReport {
        standard_accuracy,
        balanced_accuracy,
        adjusted_standard_accuracy: standard_accuracy * prediction_made
            + (1.0 - prediction_made) * chance,
        adjusted_balanced_accuracy: balanced_accuracy * prediction_made
            + (1.0 - prediction_made) * chance,
        coverage: 1.0 - prediction_fail,
        tie_fraction,
        per_class,
    }
}

#[cfg(test)]
mod tests {
    use oxiclass_engine::{
        ClassifierSnapshot, ConditionElem, LcsParameters, RawData, RuleCondition,
    };

    use super::*;

    fn raw(header: &[&str], rows: &[&[&str]]) -> RawData {
        RawData {
            header: header.iter().map(ToString::to_string).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        }
    }

    fn dataset() -> Dataset {
        let train = raw(
            &["A0", "Class"],
            &[&["a", "0"], &["b", "1"], &["a", "0"], &["b", "1"]],
        );
        Dataset::from_raw(&train, None, &LcsParameters::default()).unwrap()
    }

    fn rule(value: &str, phenotype: &str, fitness: f64) -> ClassifierSnapshot {
        ClassifierSnapshot {
            condition: RuleCondition::from_parts(
                vec![0],
                vec![ConditionElem::Value(value.to_owned())],
            ),
            phenotype: phenotype.to_owned(),
            fitness,
            accuracy: fitness,
            numerosity: 1,
            ave_match_set_size: 1.0,
            time_stamp_ga: 0,
            init_time_stamp: 0,
            specificity: 1.0,
            deletion_vote: None,
            correct_count: 0,
            match_count: 0,
            correct_cover: 0,
            match_cover: 0,
            epoch_complete: false,
        }
    }

    #[test]
    fn test_perfect_rules_score_perfect_accuracy() {
        let dataset = dataset();
        let mut population =
            Population::from_snapshots(vec![rule("a", "0", 0.9), rule("b", "1", 0.9)]);
        let instances = dataset.train_instances().to_vec();
        let report = evaluate_accuracy(&mut population, &instances, &dataset);
        assert!((report.standard_accuracy - 1.0).abs() < 1e-12);
        assert!((report.balanced_accuracy - 1.0).abs() < 1e-12);
        assert!((report.adjusted_balanced_accuracy - 1.0).abs() < 1e-12);
        assert!((report.coverage - 1.0).abs() < 1e-12);
        assert_eq!(report.tie_fraction, 0.0);
    }

    #[test]
    fn test_unmatched_data_falls_back_to_chance() {
        let dataset = dataset();
        let mut population = Population::new();
        let instances = dataset.train_instances().to_vec();
        let report = evaluate_accuracy(&mut population, &instances, &dataset);
        assert!((report.adjusted_balanced_accuracy - 0.5).abs() < 1e-12);
        assert_eq!(report.coverage, 0.0);
    }

    #[test]
    fn test_ties_blend_toward_chance_but_count_as_covered() {
        let dataset = dataset();
        // Rules match everything and always cancel out, so every instance
        // is covered but no decision is ever made.
        let mut population =
            Population::from_snapshots(vec![rule("a", "0", 0.8), rule("a", "1", 0.8)]);
        let instances: Vec<Instance> = dataset
            .train_instances()
            .iter()
            .filter(|instance| instance.phenotype() == "0")
            .cloned()
            .collect();
        let report = evaluate_accuracy(&mut population, &instances, &dataset);
        assert!((report.tie_fraction - 1.0).abs() < 1e-12);
        assert!((report.coverage - 1.0).abs() < 1e-12);
        assert!((report.adjusted_balanced_accuracy - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_predictions_lower_the_balanced_accuracy() {
        let dataset = dataset();
        let mut population =
            Population::from_snapshots(vec![rule("a", "0", 0.9), rule("b", "0", 0.9)]);
        let instances = dataset.train_instances().to_vec();
        let report = evaluate_accuracy(&mut population, &instances, &dataset);
        // Class 0 instances are right, class 1 instances are wrong. Each
        // class sees one perfect rate and one zero rate, so the balanced
        // figure halves again.
        assert!((report.standard_accuracy - 0.5).abs() < 1e-12);
        assert!((report.balanced_accuracy - 0.25).abs() < 1e-12);
        assert!((report.coverage - 1.0).abs() < 1e-12);
    }
}
