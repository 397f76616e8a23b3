use oxiclass_engine::{Classifier, Dataset, Instance, Population};
use oxiclass_evaluator::accuracy::evaluate_accuracy;
use serde::{Deserialize, Serialize};

/// Post-training population compaction strategy.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    derive_more::Display,
    derive_more::FromStr,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CompactionMethod {
    /// Three-stage accuracy-guarded sweep ending in match-count covering.
    #[display("fu1")]
    Fu1,
    /// Like [`Self::Fu1`] with a requeueing accuracy sweep as stage three.
    #[display("fu2")]
    Fu2,
    /// Keeps each instance's best correct rule by accuracy and generality.
    #[display("cra2")]
    Cra2,
    /// Greedy covering in descending accuracy order.
    #[display("qrc")]
    Qrc,
    /// Like [`Self::Cra2`] with numerosity folded into the score.
    #[display("pdrc")]
    Pdrc,
    /// One-pass filter of inaccurate and over-specific single-cover rules.
    #[default]
    #[display("qrf")]
    Qrf,
}

/// Macro-classifier count left after one named compaction stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactionStage {
    pub name: &'static str,
    pub macro_size: usize,
}

/// Compacts `population` in place and reports the per-stage shrinkage.
///
/// `original_training_accuracy` is the adjusted balanced training accuracy
/// of the population before compaction; the accuracy-guarded strategies
/// refuse removals that would fall below it.
pub fn compact(
    population: &mut Population,
    method: CompactionMethod,
    dataset: &Dataset,
    original_training_accuracy: f64,
) -> Vec<CompactionStage> {
    let rules = population.take_rules();
    let mut stages = Vec::new();
    let compacted = match method {
        CompactionMethod::Fu1 => fu1(rules, dataset, original_training_accuracy, &mut stages),
        CompactionMethod::Fu2 => fu2(rules, dataset, original_training_accuracy, &mut stages),
        CompactionMethod::Cra2 => {
            let kept = retain_best_correct(&rules, dataset, |rule| {
                rule.accuracy() * generality(rule, dataset)
            });
            stages.push(CompactionStage::new("best correct rule", kept.len()));
            kept
        }
        CompactionMethod::Qrc => {
            let kept = cover_by_accuracy(rules, dataset);
            stages.push(CompactionStage::new("greedy covering", kept.len()));
            kept
        }
        CompactionMethod::Pdrc => {
            let kept = retain_best_correct(&rules, dataset, |rule| {
                rule.accuracy() * generality(rule, dataset) * rule.numerosity() as f64
            });
            stages.push(CompactionStage::new("best correct rule", kept.len()));
            kept
        }
        CompactionMethod::Qrf => {
            let kept = quick_rule_filter(rules);
            stages.push(CompactionStage::new("quick filter", kept.len()));
            kept
        }
    };
    population.set_rules(compacted);
    stages
}

impl CompactionStage {
    fn new(name: &'static str, macro_size: usize) -> Self {
        Self { name, macro_size }
    }
}

/// Adjusted balanced training accuracy of a frozen rule list.
fn training_accuracy(rules: &[Classifier], dataset: &Dataset) -> f64 {
    let mut candidate = Population::from_rules(rules.to_vec());
    evaluate_accuracy(&mut candidate, dataset.train_instances(), dataset).adjusted_balanced_accuracy
}

fn generality(rule: &Classifier, dataset: &Dataset) -> f64 {
    (dataset.num_attributes() - rule.specificity()) as f64 / dataset.num_attributes() as f64
}

fn fu1(
    mut rules: Vec<Classifier>,
    dataset: &Dataset,
    original_accuracy: f64,
    stages: &mut Vec<CompactionStage>,
) -> Vec<Classifier> {
    rules.sort_by_key(Classifier::numerosity);
    let rules = prune_while_accuracy_holds(rules, dataset, original_accuracy);
    stages.push(CompactionStage::new("accuracy prune", rules.len()));
    let rules = retain_accuracy_critical(rules, dataset, original_accuracy);
    stages.push(CompactionStage::new("keep critical", rules.len()));
    let rules = cover_by_match_count(rules, dataset);
    stages.push(CompactionStage::new("match covering", rules.len()));
    rules
}

fn fu2(
    mut rules: Vec<Classifier>,
    dataset: &Dataset,
    original_accuracy: f64,
    stages: &mut Vec<CompactionStage>,
) -> Vec<Classifier> {
    rules.sort_by_key(Classifier::numerosity);
    let rules = prune_while_accuracy_holds(rules, dataset, original_accuracy);
    stages.push(CompactionStage::new("accuracy prune", rules.len()));
    let rules = retain_accuracy_critical(rules, dataset, original_accuracy);
    stages.push(CompactionStage::new("keep critical", rules.len()));
    let rules = requeue_by_accuracy_drop(rules, dataset);
    stages.push(CompactionStage::new("requeue sweep", rules.len()));
    rules
}

/// Removes rules from the front (lowest numerosity first) for as long as
/// training accuracy stays at or above the pre-compaction level.
fn prune_while_accuracy_holds(
    mut rules: Vec<Classifier>,
    dataset: &Dataset,
    original_accuracy: f64,
) -> Vec<Classifier> {
    let mut last_good = rules.clone();
    while !rules.is_empty() {
        rules.remove(0);
        if training_accuracy(&rules, dataset) < original_accuracy {
            return last_good;
        }
        last_good = rules.clone();
    }
    rules
}

/// Keeps only the rules whose individual removal drops training accuracy
/// below the running reference.
fn retain_accuracy_critical(
    mut rules: Vec<Classifier>,
    dataset: &Dataset,
    original_accuracy: f64,
) -> Vec<Classifier> {
    let mut retained = Vec::new();
    let mut reference_accuracy = original_accuracy;
    for _ in 0..rules.len() {
        let held = rules.remove(0);
        let accuracy = training_accuracy(&rules, dataset);
        if accuracy < reference_accuracy {
            retained.push(held);
            reference_accuracy = accuracy;
        }
    }
    retained
}

/// Repeatedly extracts the rule matching the most still-uncovered training
/// instances. Completely general rules are dropped up front, and rules that
/// no longer match anything are discarded.
fn cover_by_match_count(mut rules: Vec<Classifier>, dataset: &Dataset) -> Vec<Classifier> {
    let mut remaining: Vec<&Instance> = dataset.train_instances().iter().collect();
    let mut match_counts: Vec<usize> = rules
        .iter()
        .map(|rule| count_matches(rule, &remaining))
        .collect();
    if let Some(general) = rules.iter().rposition(|rule| rule.specificity() == 0) {
        rules.remove(general);
        match_counts.remove(general);
    }

    let mut kept = Vec::new();
    while !remaining.is_empty() && !rules.is_empty() {
        let mut best = 0;
        for (index, &count) in match_counts.iter().enumerate() {
            if count > match_counts[best] {
                best = index;
            }
        }
        if match_counts[best] == 0 {
            break;
        }

        let rule = rules.remove(best);
        match_counts.remove(best);
        let before = remaining.len();
        remaining.retain(|instance| !rule.matches(instance.state()));
        if remaining.len() < before {
            kept.push(rule);
        }
        for (count, rule) in match_counts.iter_mut().zip(&rules) {
            *count = count_matches(rule, &remaining);
        }
    }
    kept
}

/// One pass over the rules in descending numerosity order: a rule whose
/// removal drops accuracy is pushed to the back of the queue, everything
/// else is gone for good.
fn requeue_by_accuracy_drop(mut rules: Vec<Classifier>, dataset: &Dataset) -> Vec<Classifier> {
    rules.sort_by(|a, b| b.numerosity().cmp(&a.numerosity()));
    let mut reference_accuracy = training_accuracy(&rules, dataset);
    for _ in 0..rules.len() {
        let held = rules.remove(0);
        let accuracy = training_accuracy(&rules, dataset);
        if accuracy < reference_accuracy {
            rules.push(held);
        } else {
            reference_accuracy = accuracy;
        }
    }
    rules
}

/// For every training instance, keeps the highest-scoring rule in its
/// correct set. The first rule reaching the maximum score wins; a zero best
/// score keeps nothing for that instance.
fn retain_best_correct(
    rules: &[Classifier],
    dataset: &Dataset,
    score: impl Fn(&Classifier) -> f64,
) -> Vec<Classifier> {
    let mut retained: Vec<Classifier> = Vec::new();
    for instance in dataset.train_instances() {
        let mut best: Option<usize> = None;
        let mut best_value = 0.0;
        for (index, rule) in rules.iter().enumerate() {
            if rule.matches(instance.state()) && rule.phenotype() == instance.phenotype() {
                let value = score(rule);
                if value > best_value {
                    best_value = value;
                    best = Some(index);
                }
            }
        }
        if let Some(best) = best
            && !retained.iter().any(|kept| kept.same_rule(&rules[best]))
        {
            retained.push(rules[best].clone());
        }
    }
    retained
}

/// Greedy covering in descending accuracy order: a rule survives only if it
/// matches at least one training instance nothing before it covered.
fn cover_by_accuracy(mut rules: Vec<Classifier>, dataset: &Dataset) -> Vec<Classifier> {
    rules.sort_by(|a, b| b.accuracy().total_cmp(&a.accuracy()));
    let mut remaining: Vec<&Instance> = dataset.train_instances().iter().collect();
    let mut kept = Vec::new();
    while !remaining.is_empty() && !rules.is_empty() {
        let rule = rules.remove(0);
        let before = remaining.len();
        remaining.retain(|instance| !rule.matches(instance.state()));
        if remaining.len() < before {
            kept.push(rule);
        }
    }
    kept
}

/// Drops rules at or below coin-flip accuracy, plus rules that correctly
/// cover a single instance while specifying more than one attribute.
fn quick_rule_filter(rules: Vec<Classifier>) -> Vec<Classifier> {
    rules
        .into_iter()
        .filter(|rule| {
            !(rule.accuracy() <= 0.5 || (rule.correct_cover() == 1 && rule.specificity() > 1))
        })
        .collect()
}

fn count_matches(rule: &Classifier, instances: &[&Instance]) -> usize {
    instances
        .iter()
        .filter(|instance| rule.matches(instance.state()))
        .count()
}

#[cfg(test)]
mod tests {
    use oxiclass_engine::{ClassifierSnapshot, ConditionElem, LcsParameters, RawData, RuleCondition};

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
            &["A0", "A1", "Class"],
            &[
                &["a", "x", "0"],
                &["a", "y", "0"],
                &["b", "x", "1"],
                &["b", "y", "1"],
            ],
        );
        Dataset::from_raw(&train, None, &LcsParameters::default()).unwrap()
    }

    fn snapshot(
        elems: &[(usize, &str)],
        phenotype: &str,
        accuracy: f64,
        numerosity: usize,
    ) -> ClassifierSnapshot {
        let mut condition = RuleCondition::new();
        for (attribute, state) in elems {
            condition.push(*attribute, ConditionElem::Value((*state).to_owned()));
        }
        ClassifierSnapshot {
            condition,
            phenotype: phenotype.to_owned(),
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
            correct_cover: 2,
            match_cover: 2,
            epoch_complete: true,
        }
    }

    fn rule(
        elems: &[(usize, &str)],
        phenotype: &str,
        accuracy: f64,
        numerosity: usize,
    ) -> Classifier {
        Classifier::from_snapshot(snapshot(elems, phenotype, accuracy, numerosity))
    }

    fn population(rules: Vec<Classifier>) -> Population {
        Population::from_rules(rules)
    }

    #[test]
    fn test_method_parses_and_prints_its_lowercase_name() {
        assert_eq!("pdrc".parse::<CompactionMethod>().unwrap(), CompactionMethod::Pdrc);
        assert_eq!(CompactionMethod::Fu2.to_string(), "fu2");
        assert_eq!(CompactionMethod::default(), CompactionMethod::Qrf);
    }

    #[test]
    fn test_qrf_filters_weak_and_overly_specific_rules() {
        let dataset = dataset();
        let mut weak = snapshot(&[(0, "a")], "0", 0.5, 1);
        weak.correct_cover = 5;
        let mut narrow = snapshot(&[(0, "a"), (1, "x")], "0", 0.9, 1);
        narrow.correct_cover = 1;
        let mut lone = snapshot(&[(0, "b")], "1", 0.9, 1);
        lone.correct_cover = 1;
        let keeper = snapshot(&[(0, "a")], "0", 0.9, 1);

        let mut population = population(
            [weak, narrow, lone, keeper]
                .into_iter()
                .map(Classifier::from_snapshot)
                .collect(),
        );
        let stages = compact(&mut population, CompactionMethod::Qrf, &dataset, 1.0);
        // The single-attribute single-cover rule survives, the weak and the
        // over-specific single-cover rules do not.
        assert_eq!(population.macro_size(), 2);
        assert_eq!(population.micro_size(), 2);
        assert_eq!(stages, vec![CompactionStage::new("quick filter", 2)]);
    }

    #[test]
    fn test_qrc_keeps_only_rules_covering_new_instances() {
        let dataset = dataset();
        let mut population = population(vec![
            rule(&[(0, "a")], "0", 0.9, 1),
            rule(&[(0, "a"), (1, "x")], "0", 0.8, 1),
            rule(&[(0, "b")], "1", 0.7, 1),
        ]);
        compact(&mut population, CompactionMethod::Qrc, &dataset, 1.0);
        // The most accurate rule covers both "a" instances, starving the
        // more specific one; the "b" rule still covers fresh data.
        assert_eq!(population.macro_size(), 2);
        assert!(population.rules().iter().all(|kept| kept.specificity() == 1));
    }

    #[test]
    fn test_cra2_keeps_the_most_general_accurate_correct_rule() {
        let dataset = dataset();
        let mut population = population(vec![
            rule(&[(0, "a"), (1, "x")], "0", 1.0, 1),
            rule(&[(0, "a")], "0", 1.0, 1),
            rule(&[(0, "b")], "1", 1.0, 1),
        ]);
        compact(&mut population, CompactionMethod::Cra2, &dataset, 1.0);
        // Generality 1/2 beats 0 for the "a" instances, and duplicates
        // collapse across instances.
        assert_eq!(population.macro_size(), 2);
        assert!(population.rules().iter().all(|kept| kept.specificity() == 1));
    }

    #[test]
    fn test_pdrc_prefers_high_numerosity_on_equal_accuracy() {
        let dataset = dataset();
        let mut population = population(vec![
            rule(&[(0, "a")], "0", 1.0, 1),
            rule(&[(1, "x")], "0", 1.0, 5),
            rule(&[(0, "b")], "1", 1.0, 1),
        ]);
        compact(&mut population, CompactionMethod::Pdrc, &dataset, 1.0);
        let kept = population.rules();
        assert!(kept.iter().any(|rule| rule.numerosity() == 5));
        assert!(kept.iter().any(|rule| rule.phenotype() == "1"));
    }

    #[test]
    fn test_fu1_sweeps_stage_by_stage() {
        let dataset = dataset();
        let rules = vec![
            rule(&[(0, "a")], "0", 1.0, 3),
            rule(&[(0, "b")], "1", 1.0, 3),
            rule(&[(0, "a"), (1, "x")], "0", 1.0, 1),
        ];
        let original = training_accuracy(&rules, &dataset);
        let mut population = population(rules);
        let stages = compact(&mut population, CompactionMethod::Fu1, &dataset, original);
        // Stage one strips the redundant specific rule. Stage two retains
        // the first perfect rule, then judges the second against the
        // already lowered reference accuracy and lets it go. Stage three
        // keeps the lone survivor since it still matches training data.
        assert_eq!(
            stages,
            vec![
                CompactionStage::new("accuracy prune", 2),
                CompactionStage::new("keep critical", 1),
                CompactionStage::new("match covering", 1),
            ]
        );
        assert_eq!(population.macro_size(), 1);
        assert_eq!(population.rule(0).phenotype(), "0");
    }

    #[test]
    fn test_fu1_covering_drops_completely_general_rules() {
        let dataset = dataset();
        let kept = cover_by_match_count(
            vec![rule(&[], "0", 1.0, 1), rule(&[(0, "a")], "0", 1.0, 1)],
            &dataset,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].specificity(), 1);
    }

    #[test]
    fn test_fu2_requeue_keeps_accuracy_critical_rules() {
        let dataset = dataset();
        let rules = vec![
            rule(&[(0, "a")], "0", 1.0, 3),
            rule(&[(0, "b")], "1", 1.0, 2),
        ];
        let kept = requeue_by_accuracy_drop(rules, &dataset);
        // Removing either perfect rule halves the balanced accuracy, so
        // both come back around the queue.
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_prune_stops_before_accuracy_falls() {
        let dataset = dataset();
        let rules = vec![
            rule(&[(0, "a"), (1, "x")], "0", 1.0, 1),
            rule(&[(0, "a")], "0", 1.0, 2),
            rule(&[(0, "b")], "1", 1.0, 2),
        ];
        let original = training_accuracy(&rules, &dataset);
        let kept = prune_while_accuracy_holds(rules, &dataset, original);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|rule| rule.specificity() == 1));
    }
}
