use oxiclass_engine::{Dataset, Population};
use serde::{Deserialize, Serialize};

/// Composition summary of the rule population at one point in learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    /// Number of distinct rules.
    pub macro_size: usize,
    /// Sum of rule numerosities.
    pub micro_size: usize,
    /// Numerosity-weighted mean generality, `None` for an empty population.
    pub average_generality: Option<f64>,
    /// Fraction of rules old enough to have seen every training instance.
    pub experienced_rule_fraction: f64,
    /// Numerosity-weighted specification count per attribute.
    pub attribute_specification: Vec<usize>,
    /// Accuracy-and-numerosity-weighted specification sum per attribute.
    pub attribute_accuracy: Vec<f64>,
}

/// Summarizes `population` against the dataset it was trained on.
#[must_use]
pub fn summarize_population(
    population: &Population,
    dataset: &Dataset,
    iteration: usize,
) -> PopulationSummary {
    let mut attribute_specification = vec![0_usize; dataset.num_attributes()];
    let mut attribute_accuracy = vec![0.0_f64; dataset.num_attributes()];
    for rule in population.rules() {
        for &attribute in rule.condition().specified_attributes() {
            attribute_specification[attribute] += rule.numerosity();
            attribute_accuracy[attribute] += rule.numerosity() as f64 * rule.accuracy();
        }
    }

    PopulationSummary {
        macro_size: population.macro_size(),
        micro_size: population.micro_size(),
        average_generality: population.average_generality(dataset.num_attributes()),
        experienced_rule_fraction: population
            .experienced_rule_fraction(iteration, dataset.num_train_instances()),
        attribute_specification,
        attribute_accuracy,
    }
}

#[cfg(test)]
mod tests {
    use oxiclass_engine::{
        ClassifierSnapshot, ConditionElem, LcsParameters, RawData, RuleCondition,
    };

    use super::*;

    fn dataset() -> Dataset {
        let train = RawData {
            header: vec!["A0".to_owned(), "A1".to_owned(), "Class".to_owned()],
            rows: vec![
                vec!["a".to_owned(), "x".to_owned(), "0".to_owned()],
                vec!["b".to_owned(), "y".to_owned(), "1".to_owned()],
            ],
        };
        Dataset::from_raw(&train, None, &LcsParameters::default()).unwrap()
    }

    fn rule(attributes: Vec<usize>, accuracy: f64, numerosity: usize) -> ClassifierSnapshot {
        let elems = attributes
            .iter()
            .map(|_| ConditionElem::Value("a".to_owned()))
            .collect();
        ClassifierSnapshot {
            condition: RuleCondition::from_parts(attributes, elems),
            phenotype: "0".to_owned(),
            fitness: accuracy,
            accuracy,
            numerosity,
            ave_match_set_size: 1.0,
            time_stamp_ga: 0,
            init_time_stamp: 0,
            specificity: 0.5,
            deletion_vote: None,
            correct_count: 0,
            match_count: 0,
            correct_cover: 0,
            match_cover: 0,
            epoch_complete: false,
        }
    }

    #[test]
    fn test_empty_population_has_no_generality() {
        let dataset = dataset();
        let summary = summarize_population(&Population::new(), &dataset, 0);
        assert_eq!(summary.macro_size, 0);
        assert_eq!(summary.micro_size, 0);
        assert!(summary.average_generality.is_none());
        assert_eq!(summary.attribute_specification, vec![0, 0]);
    }

    #[test]
    fn test_attribute_sums_weight_by_numerosity_and_accuracy() {
        let dataset = dataset();
        let population = Population::from_snapshots(vec![
            rule(vec![0], 0.5, 3),
            rule(vec![0, 1], 1.0, 1),
        ]);
        let summary = summarize_population(&population, &dataset, 0);
        assert_eq!(summary.macro_size, 2);
        assert_eq!(summary.micro_size, 4);
        assert_eq!(summary.attribute_specification, vec![4, 1]);
        assert!((summary.attribute_accuracy[0] - 2.5).abs() < 1e-12);
        assert!((summary.attribute_accuracy[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_generality_weights_by_numerosity() {
        let dataset = dataset();
        let population = Population::from_snapshots(vec![
            rule(vec![0], 0.5, 3),
            rule(vec![0, 1], 1.0, 1),
        ]);
        let summary = summarize_population(&population, &dataset, 0);
        // Three copies at generality 1/2 and one at 0.
        let expected = (3.0 * 0.5) / 4.0;
        assert!((summary.average_generality.unwrap() - expected).abs() < 1e-12);
    }
}
