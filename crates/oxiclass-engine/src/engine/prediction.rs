use serde::{Deserialize, Serialize};

use crate::{Dataset, Population};

/// Outcome of a class vote over a match set.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::IsVariant, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    /// A single class won the vote.
    Class(String),
    /// The vote remained tied after every tiebreak.
    Tie,
    /// No matching rule cast a positive vote.
    Undecided,
}

/// Fitness-weighted class vote cast by the current match set.
///
/// Each rule contributes `fitness * numerosity * class_weight` to its
/// phenotype's tally. Ties on the vote are broken first by summed
/// numerosity, then by summed initial time stamp, favoring the class
/// backed by the younger rules.
#[derive(Debug, Clone)]
pub struct PredictionVote {
    votes: Vec<f64>,
    decision: Prediction,
}

impl PredictionVote {
    /// Tallies the votes of `population`'s current match set.
    #[must_use]
    pub fn from_match_set(population: &Population, dataset: &Dataset) -> Self {
        let classes = dataset.phenotype_list();
        let mut votes = vec![0.0; classes.len()];
        let mut tie_numerosity = vec![0_usize; classes.len()];
        let mut tie_time_stamp = vec![0_usize; classes.len()];

        for &index in population.match_set() {
            let rule = population.rule(index);
            let class_index = classes
                .iter()
                .position(|class| class == rule.phenotype())
                .expect("population rules predict known classes");
            votes[class_index] +=
                rule.fitness() * rule.numerosity() as f64 * dataset.class_weight(rule.phenotype());
            tie_numerosity[class_index] += rule.numerosity();
            tie_time_stamp[class_index] += rule.init_time_stamp();
        }

        let decision = decide(classes, &votes, &tie_numerosity, &tie_time_stamp);
        Self { votes, decision }
    }

    #[must_use]
    pub fn decision(&self) -> &Prediction {
        &self.decision
    }

    /// Per-class vote totals, indexed like the dataset's phenotype list.
    #[must_use]
    pub fn votes(&self) -> &[f64] {
        &self.votes
    }
}

fn decide(
    classes: &[String],
    votes: &[f64],
    tie_numerosity: &[usize],
    tie_time_stamp: &[usize],
) -> Prediction {
    let high = votes.iter().copied().fold(0.0, f64::max);
    if high == 0.0 {
        return Prediction::Undecided;
    }

    let mut best: Vec<usize> = (0..classes.len()).filter(|&i| votes[i] == high).collect();
    if let [winner] = best[..] {
        return Prediction::Class(classes[winner].clone());
    }

    let top_numerosity = best.iter().map(|&i| tie_numerosity[i]).max().unwrap_or(0);
    best.retain(|&i| tie_numerosity[i] == top_numerosity);
    if let [winner] = best[..] {
        return Prediction::Class(classes[winner].clone());
    }

    let top_stamp = best.iter().map(|&i| tie_time_stamp[i]).max().unwrap_or(0);
    best.retain(|&i| tie_time_stamp[i] == top_stamp);
    if let [winner] = best[..] {
        return Prediction::Class(classes[winner].clone());
    }
    Prediction::Tie
}

#[cfg(test)]
mod tests {
    use crate::{
        AttributeValue, ClassifierSnapshot, ConditionElem, LcsParameters, RawData, RuleCondition,
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

    fn balanced_dataset() -> Dataset {
        let train = raw(
            &["A0", "Class"],
            &[&["a", "0"], &["b", "1"], &["a", "0"], &["b", "1"]],
        );
        Dataset::from_raw(&train, None, &LcsParameters::default()).unwrap()
    }

    fn rule(value: &str, phenotype: &str, fitness: f64, numerosity: usize) -> ClassifierSnapshot {
        ClassifierSnapshot {
            condition: RuleCondition::from_parts(
                vec![0],
                vec![ConditionElem::Value(value.to_owned())],
            ),
            phenotype: phenotype.to_owned(),
            fitness,
            accuracy: fitness,
            numerosity,
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

    fn vote_on(dataset: &Dataset, rules: Vec<ClassifierSnapshot>) -> PredictionVote {
        let mut population = Population::from_snapshots(rules);
        population.make_eval_match_set(&[AttributeValue::Discrete("a".to_owned())]);
        PredictionVote::from_match_set(&population, dataset)
    }

    #[test]
    fn test_empty_match_set_is_undecided() {
        let dataset = balanced_dataset();
        let vote = vote_on(&dataset, vec![]);
        assert!(vote.decision().is_undecided());
        assert_eq!(vote.votes(), &[0.0, 0.0]);
    }

    #[test]
    fn test_highest_vote_wins() {
        let dataset = balanced_dataset();
        let vote = vote_on(
            &dataset,
            vec![rule("a", "0", 0.9, 1), rule("a", "1", 0.3, 1)],
        );
        assert_eq!(*vote.decision(), Prediction::Class("0".to_owned()));
        assert!(vote.votes()[0] > vote.votes()[1]);
    }

    #[test]
    fn test_votes_scale_with_numerosity_and_class_weight() {
        let dataset = balanced_dataset();
        let vote = vote_on(&dataset, vec![rule("a", "1", 0.5, 4)]);
        assert!((vote.votes()[1] - 0.5 * 4.0 * dataset.class_weight("1")).abs() < 1e-12);
    }

    #[test]
    fn test_vote_tie_breaks_on_numerosity() {
        let dataset = balanced_dataset();
        let vote = vote_on(
            &dataset,
            vec![rule("a", "0", 0.5, 2), rule("a", "1", 1.0, 1)],
        );
        assert!((vote.votes()[0] - vote.votes()[1]).abs() < 1e-12);
        assert_eq!(*vote.decision(), Prediction::Class("0".to_owned()));
    }

    #[test]
    fn test_numerosity_tie_breaks_on_time_stamp() {
        let dataset = balanced_dataset();
        let mut young = rule("a", "1", 1.0, 1);
        young.init_time_stamp = 40;
        let vote = vote_on(&dataset, vec![rule("a", "0", 1.0, 1), young]);
        assert_eq!(*vote.decision(), Prediction::Class("1".to_owned()));
    }

    #[test]
    fn test_exhausted_tiebreaks_report_a_tie() {
        let dataset = balanced_dataset();
        let vote = vote_on(
            &dataset,
            vec![rule("a", "0", 1.0, 1), rule("a", "1", 1.0, 1)],
        );
        assert_eq!(*vote.decision(), Prediction::Tie);
    }
}
