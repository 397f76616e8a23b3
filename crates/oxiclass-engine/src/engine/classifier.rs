use rand::{Rng, seq::index};
use rand_distr::{Distribution as _, Geometric};
use serde::{Deserialize, Serialize};

use crate::{
    core::{AttributeValue, ConditionElem, Dataset, Instance, LcsParameters, RuleCondition},
    engine::ExpertKnowledge,
};

/// Chance that expert scores, when present, steer a mutation target pick.
const PRESSURE_PROB: f64 = 0.5;

/// Optional steering inputs for the rule discovery operators.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorBias<'a> {
    /// External attribute quality scores biasing target selection.
    pub expert: Option<&'a ExpertKnowledge>,
    /// Attribute tracking sums fed back into crossover and mutation.
    pub feedback: Option<FeedbackBias<'a>>,
}

/// Attribute tracking feedback: the chance an operator call engages it, plus
/// the per-attribute tracking probabilities it applies when engaged.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackBias<'a> {
    pub percent: f64,
    pub probabilities: &'a [f64],
}

impl<'a> OperatorBias<'a> {
    /// Rolls once per operator call whether tracking probabilities apply.
    fn engage_feedback<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'a [f64]> {
        match self.feedback {
            Some(feedback) if rng.random::<f64>() < feedback.percent => {
                Some(feedback.probabilities)
            }
            _ => None,
        }
    }

    /// Tracking probabilities regardless of the engagement roll. Specificity
    /// limit repair always uses them when available.
    fn feedback_probabilities(&self) -> Option<&'a [f64]> {
        self.feedback.map(|feedback| feedback.probabilities)
    }
}

/// A single rule in the evolving population.
///
/// A classifier pairs a condition over attribute states with the class it
/// predicts, plus the bookkeeping the learning loop maintains: fitness,
/// accuracy, numerosity, the running estimate of its niche size, and age
/// counters. Identical rules are merged by incrementing numerosity rather
/// than stored as duplicates.
#[derive(Debug, Clone)]
pub struct Classifier {
    condition: RuleCondition,
    phenotype: String,
    fitness: f64,
    accuracy: f64,
    numerosity: usize,
    ave_match_set_size: f64,
    time_stamp_ga: usize,
    init_time_stamp: usize,
    deletion_vote: Option<f64>,
    correct_count: u64,
    match_count: u64,
    correct_cover: u64,
    match_cover: u64,
    epoch_complete: bool,
}

impl Classifier {
    /// Creates a rule covering a training instance that nothing matched.
    ///
    /// Between one and `spec_limit` attributes are specified. With expert
    /// scores the best-ranked non-missing attributes are taken in order;
    /// otherwise a uniform sample of attributes is specified, skipping
    /// missing values.
    pub fn cover<R: Rng + ?Sized>(
        set_size: f64,
        iteration: usize,
        instance: &Instance,
        dataset: &Dataset,
        params: &LcsParameters,
        expert: Option<&ExpertKnowledge>,
        rng: &mut R,
    ) -> Self {
        let spec_limit = dataset.spec_limit().min(dataset.num_attributes());
        let to_specify = rng.random_range(1..=spec_limit);

        let mut condition = RuleCondition::new();
        if let Some(expert) = expert {
            for &attribute in expert.rank() {
                if condition.specificity() >= to_specify {
                    break;
                }
                let value = instance.attribute(attribute);
                if !value.is_missing() {
                    condition.push(attribute, build_match_elem(attribute, value, dataset, rng));
                }
            }
        } else {
            for attribute in index::sample(rng, dataset.num_attributes(), to_specify) {
                let value = instance.attribute(attribute);
                if !value.is_missing() {
                    condition.push(attribute, build_match_elem(attribute, value, dataset, rng));
                }
            }
        }

        Self {
            condition,
            phenotype: instance.phenotype().to_owned(),
            fitness: params.init_fitness,
            accuracy: 0.0,
            numerosity: 1,
            ave_match_set_size: set_size,
            time_stamp_ga: iteration,
            init_time_stamp: iteration,
            deletion_vote: None,
            correct_count: 0,
            match_count: 0,
            correct_cover: 0,
            match_cover: 0,
            epoch_complete: false,
        }
    }

    /// Clones a parent's rule for the discovery operators, resetting the
    /// counters a new rule starts from.
    #[must_use]
    pub fn copy_for_offspring(parent: &Self, iteration: usize) -> Self {
        Self {
            condition: parent.condition.clone(),
            phenotype: parent.phenotype.clone(),
            fitness: parent.fitness,
            accuracy: parent.accuracy,
            numerosity: 1,
            ave_match_set_size: parent.ave_match_set_size,
            time_stamp_ga: iteration,
            init_time_stamp: iteration,
            deletion_vote: None,
            correct_count: 0,
            match_count: 0,
            correct_cover: 0,
            match_cover: 0,
            epoch_complete: false,
        }
    }

    #[must_use]
    pub fn from_snapshot(snapshot: ClassifierSnapshot) -> Self {
        Self {
            condition: snapshot.condition,
            phenotype: snapshot.phenotype,
            fitness: snapshot.fitness,
            accuracy: snapshot.accuracy,
            numerosity: snapshot.numerosity,
            ave_match_set_size: snapshot.ave_match_set_size,
            time_stamp_ga: snapshot.time_stamp_ga,
            init_time_stamp: snapshot.init_time_stamp,
            deletion_vote: snapshot.deletion_vote,
            correct_count: snapshot.correct_count,
            match_count: snapshot.match_count,
            correct_cover: snapshot.correct_cover,
            match_cover: snapshot.match_cover,
            epoch_complete: snapshot.epoch_complete,
        }
    }

    #[must_use]
    pub fn to_snapshot(&self, num_attributes: usize) -> ClassifierSnapshot {
        ClassifierSnapshot {
            condition: self.condition.clone(),
            phenotype: self.phenotype.clone(),
            fitness: self.fitness,
            accuracy: self.accuracy,
            numerosity: self.numerosity,
            ave_match_set_size: self.ave_match_set_size,
            time_stamp_ga: self.time_stamp_ga,
            init_time_stamp: self.init_time_stamp,
            specificity: self.condition.specificity() as f64 / num_attributes as f64,
            deletion_vote: self.deletion_vote,
            correct_count: self.correct_count,
            match_count: self.match_count,
            correct_cover: self.correct_cover,
            match_cover: self.match_cover,
            epoch_complete: self.epoch_complete,
        }
    }

    #[must_use]
    pub fn condition(&self) -> &RuleCondition {
        &self.condition
    }

    #[must_use]
    pub fn phenotype(&self) -> &str {
        &self.phenotype
    }

    /// Number of specified attributes.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.condition.specificity()
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn numerosity(&self) -> usize {
        self.numerosity
    }

    #[must_use]
    pub fn ave_match_set_size(&self) -> f64 {
        self.ave_match_set_size
    }

    #[must_use]
    pub fn time_stamp_ga(&self) -> usize {
        self.time_stamp_ga
    }

    #[must_use]
    pub fn init_time_stamp(&self) -> usize {
        self.init_time_stamp
    }

    #[must_use]
    pub fn match_count(&self) -> u64 {
        self.match_count
    }

    #[must_use]
    pub fn correct_count(&self) -> u64 {
        self.correct_count
    }

    #[must_use]
    pub fn match_cover(&self) -> u64 {
        self.match_cover
    }

    #[must_use]
    pub fn correct_cover(&self) -> u64 {
        self.correct_cover
    }

    #[must_use]
    pub fn epoch_complete(&self) -> bool {
        self.epoch_complete
    }

    #[must_use]
    pub fn deletion_vote(&self) -> Option<f64> {
        self.deletion_vote
    }

    #[must_use]
    pub fn matches(&self, state: &[AttributeValue]) -> bool {
        self.condition.matches(state)
    }

    /// Uniform crossover over the union of both parents' specified
    /// attributes.
    ///
    /// Attributes specified by one parent may move to the other. An attribute
    /// specified by both is left alone when discrete; a shared continuous
    /// attribute either swaps one interval bound or is absorbed by one side
    /// while the other generalizes it. Returns whether the pair of specified
    /// sets actually changed, treating a complete swap as no change.
    pub fn uniform_crossover<R: Rng + ?Sized>(
        &mut self,
        other: &mut Self,
        dataset: &Dataset,
        bias: OperatorBias<'_>,
        rng: &mut R,
    ) -> bool {
        let before_self: Vec<usize> = self.condition.specified_attributes().to_vec();
        let before_other: Vec<usize> = other.condition.specified_attributes().to_vec();
        let feedback = bias.engage_feedback(rng);

        let mut combo: Vec<usize> = before_self.clone();
        for &attribute in &before_other {
            if !combo.contains(&attribute) {
                combo.push(attribute);
            } else if !dataset.attribute(attribute).is_continuous() {
                combo.retain(|&a| a != attribute);
            }
        }
        combo.sort_unstable();

        let mut changed = false;
        for attribute in combo {
            let probability = feedback.map_or(0.5, |probabilities| probabilities[attribute]);
            let in_self = before_self.contains(&attribute);
            let in_other = before_other.contains(&attribute);
            if in_self && !in_other {
                if rng.random::<f64>() > probability
                    && let Some(elem) = self.condition.remove(attribute)
                {
                    other.condition.push(attribute, elem);
                    changed = true;
                }
            } else if in_other && !in_self {
                if rng.random::<f64>() < probability
                    && let Some(elem) = other.condition.remove(attribute)
                {
                    self.condition.push(attribute, elem);
                    changed = true;
                }
            } else {
                self.cross_shared_interval(other, attribute, rng);
            }
        }

        self.spec_limit_fix(dataset.spec_limit(), bias.feedback_probabilities(), rng);
        other.spec_limit_fix(dataset.spec_limit(), bias.feedback_probabilities(), rng);

        let mut before = before_self;
        before.sort_unstable();
        let mut after: Vec<usize> = other.condition.specified_attributes().to_vec();
        after.sort_unstable();
        changed && before != after
    }

    fn cross_shared_interval<R: Rng + ?Sized>(
        &mut self,
        other: &mut Self,
        attribute: usize,
        rng: &mut R,
    ) {
        match rng.random_range(0..4_u32) {
            0 => {
                let (self_low, _) = interval_mut(&mut self.condition, attribute);
                let (other_low, _) = interval_mut(&mut other.condition, attribute);
                std::mem::swap(self_low, other_low);
            }
            1 => {
                let (_, self_high) = interval_mut(&mut self.condition, attribute);
                let (_, other_high) = interval_mut(&mut other.condition, attribute);
                std::mem::swap(self_high, other_high);
            }
            key => {
                let (self_low, self_high) = interval_of(&self.condition, attribute);
                let (other_low, other_high) = interval_of(&other.condition, attribute);
                let bounds = [self_low, self_high, other_low, other_high];
                let low = bounds.iter().copied().fold(f64::INFINITY, f64::min);
                let high = bounds.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let (absorber, dropped) = if key == 2 {
                    (&mut self.condition, &mut other.condition)
                } else {
                    (&mut other.condition, &mut self.condition)
                };
                let (absorber_low, absorber_high) = interval_mut(absorber, attribute);
                *absorber_low = low;
                *absorber_high = high;
                dropped.remove(attribute);
            }
        }
    }

    /// Generalizes attributes until the rule is back under the specificity
    /// limit, dropping the least-tracked attributes when feedback is on and
    /// a uniform sample otherwise.
    fn spec_limit_fix<R: Rng + ?Sized>(
        &mut self,
        spec_limit: usize,
        feedback: Option<&[f64]>,
        rng: &mut R,
    ) {
        if let Some(probabilities) = feedback {
            while self.condition.specificity() > spec_limit {
                let specified = self.condition.specified_attributes();
                let mut target = specified[0];
                for &attribute in specified {
                    if probabilities[attribute] < probabilities[target] {
                        target = attribute;
                    }
                }
                self.condition.remove(target);
            }
        } else if self.condition.specificity() > spec_limit {
            let excess = self.condition.specificity() - spec_limit;
            let specified = self.condition.specified_attributes();
            let targets: Vec<usize> = index::sample(rng, specified.len(), excess)
                .iter()
                .map(|i| specified[i])
                .collect();
            for attribute in targets {
                self.condition.remove(attribute);
            }
        }
    }

    /// Mutates the rule toward a specificity drawn around its current one.
    ///
    /// The step width follows a geometric draw at the mutation rate. Holding
    /// specificity swaps one attribute out and another in; otherwise the rule
    /// generalizes or specifies the difference. Continuous attributes picked
    /// for generalization may instead have an interval bound perturbed, which
    /// does not count as a change to the specified set.
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        instance: &Instance,
        dataset: &Dataset,
        params: &LcsParameters,
        bias: OperatorBias<'_>,
        rng: &mut R,
    ) -> bool {
        let feedback = bias.engage_feedback(rng);
        let steps = Geometric::new(1.0 - params.upsilon)
            .expect("upsilon is validated to lie below 1")
            .sample(rng) as usize;

        let len = self.condition.specificity();
        let spec_limit = dataset.spec_limit().min(dataset.num_attributes());
        let low_lim = len.saturating_sub(steps).max(1);
        let high_lim = if len == 0 {
            1
        } else {
            (len + steps).min(spec_limit)
        };
        let new_spec = rng.random_range(low_lim..=high_lim);

        let mut changed = false;
        if new_spec == len && rng.random::<f64>() < (1.0 - params.upsilon) {
            if let Some(&attribute) = self.pick_generalize_targets(1, bias, rng).first() {
                self.generalize_or_perturb(attribute, dataset, feedback, rng, &mut changed);
            }
            if self.condition.specificity() < dataset.num_attributes()
                && let Some(&attribute) = self.pick_specify_targets(1, dataset, bias, rng).first()
            {
                self.try_specify(attribute, instance, dataset, feedback, rng, &mut changed);
            }
            self.spec_limit_fix(spec_limit, bias.feedback_probabilities(), rng);
        } else if new_spec > len {
            for attribute in self.pick_specify_targets(new_spec - len, dataset, bias, rng) {
                self.try_specify(attribute, instance, dataset, feedback, rng, &mut changed);
            }
        } else if new_spec < len {
            for attribute in self.pick_generalize_targets(len - new_spec, bias, rng) {
                self.generalize_or_perturb(attribute, dataset, feedback, rng, &mut changed);
            }
        }
        changed
    }

    fn pick_generalize_targets<R: Rng + ?Sized>(
        &self,
        count: usize,
        bias: OperatorBias<'_>,
        rng: &mut R,
    ) -> Vec<usize> {
        let specified = self.condition.specified_attributes();
        match bias.expert {
            Some(expert) if rng.random::<f64>() <= PRESSURE_PROB => {
                expert.select_generalize(specified, count, rng)
            }
            _ => index::sample(rng, specified.len(), count)
                .iter()
                .map(|i| specified[i])
                .collect(),
        }
    }

    fn pick_specify_targets<R: Rng + ?Sized>(
        &self,
        count: usize,
        dataset: &Dataset,
        bias: OperatorBias<'_>,
        rng: &mut R,
    ) -> Vec<usize> {
        let unspecified: Vec<usize> = (0..dataset.num_attributes())
            .filter(|&attribute| !self.condition.contains(attribute))
            .collect();
        match bias.expert {
            Some(expert) if rng.random::<f64>() <= PRESSURE_PROB => {
                expert.select_specify(&unspecified, count, rng)
            }
            _ => index::sample(rng, unspecified.len(), count)
                .iter()
                .map(|i| unspecified[i])
                .collect(),
        }
    }

    fn generalize_or_perturb<R: Rng + ?Sized>(
        &mut self,
        attribute: usize,
        dataset: &Dataset,
        feedback: Option<&[f64]>,
        rng: &mut R,
        changed: &mut bool,
    ) {
        let continuous = dataset.attribute(attribute).is_continuous();
        if !continuous || rng.random::<f64>() > 0.5 {
            let generalize = match feedback {
                Some(probabilities) => rng.random::<f64>() > probabilities[attribute],
                None => true,
            };
            if generalize {
                self.condition.remove(attribute);
                *changed = true;
            }
        } else {
            self.perturb_interval(attribute, dataset, feedback, rng);
        }
    }

    fn perturb_interval<R: Rng + ?Sized>(
        &mut self,
        attribute: usize,
        dataset: &Dataset,
        feedback: Option<&[f64]>,
        rng: &mut R,
    ) {
        let perturb = match feedback {
            Some(probabilities) => rng.random::<f64>() < probabilities[attribute],
            None => rng.random::<f64>() > 0.5,
        };
        if !perturb {
            return;
        }
        let (att_low, att_high) = dataset
            .attribute(attribute)
            .range()
            .expect("perturbation only targets continuous attributes");
        let delta = rng.random::<f64>() * 0.5 * (att_high - att_low);
        let mutate_low = rng.random::<f64>() > 0.5;
        let add = rng.random::<f64>() > 0.5;
        let signed = if add { delta } else { -delta };
        let (low, high) = interval_mut(&mut self.condition, attribute);
        if mutate_low {
            *low += signed;
        } else {
            *high += signed;
        }
        if *low > *high {
            std::mem::swap(low, high);
        }
    }

    fn try_specify<R: Rng + ?Sized>(
        &mut self,
        attribute: usize,
        instance: &Instance,
        dataset: &Dataset,
        feedback: Option<&[f64]>,
        rng: &mut R,
        changed: &mut bool,
    ) {
        let value = instance.attribute(attribute);
        if value.is_missing() {
            return;
        }
        let specify = match feedback {
            Some(probabilities) => rng.random::<f64>() < probabilities[attribute],
            None => true,
        };
        if specify {
            self.condition
                .push(attribute, build_match_elem(attribute, value, dataset, rng));
            *changed = true;
        }
    }

    /// Pulls drifted interval bounds back toward the observed training range.
    ///
    /// An interval that swallows the whole observed range is generalized
    /// away. A bound straying more than 10% of the range past an edge is
    /// clamped to that buffer.
    pub fn range_check(&mut self, dataset: &Dataset) {
        let specified: Vec<usize> = self.condition.specified_attributes().to_vec();
        for attribute in specified {
            let Some((att_low, att_high)) = dataset.attribute(attribute).range() else {
                continue;
            };
            let buffer = (att_high - att_low) * 0.1;
            let (low, high) = interval_of(&self.condition, attribute);
            if low <= att_low && high >= att_high {
                self.condition.remove(attribute);
            } else if low + buffer < att_low {
                let (low, high) = interval_mut(&mut self.condition, attribute);
                *low = att_low - buffer;
                if *low > *high {
                    std::mem::swap(low, high);
                }
            } else if high - buffer > att_high {
                let (low, high) = interval_mut(&mut self.condition, attribute);
                *high = att_high + buffer;
                if *low > *high {
                    std::mem::swap(low, high);
                }
            }
        }
    }

    /// Whether this rule can absorb `other`: same class, experienced and
    /// accurate enough, and more general.
    #[must_use]
    pub fn subsumes(&self, other: &Self, params: &LcsParameters) -> bool {
        self.phenotype == other.phenotype && self.is_subsumer(params) && self.is_more_general(other)
    }

    #[must_use]
    pub fn is_subsumer(&self, params: &LcsParameters) -> bool {
        self.match_count > u64::from(params.theta_sub) && self.accuracy > params.acc_sub
    }

    /// Strictly fewer specified attributes, all of which `other` also
    /// specifies, with interval bounds lying inside `other`'s.
    #[must_use]
    pub fn is_more_general(&self, other: &Self) -> bool {
        if self.condition.specificity() >= other.condition.specificity() {
            return false;
        }
        for (attribute, elem) in self.condition.iter() {
            let Some(other_elem) = other.condition.element_for(attribute) else {
                return false;
            };
            if let (
                ConditionElem::Interval { low, high },
                ConditionElem::Interval {
                    low: other_low,
                    high: other_high,
                },
            ) = (elem, other_elem)
                && (low < other_low || high > other_high)
            {
                return false;
            }
        }
        true
    }

    /// Computes and caches this rule's deletion roulette vote.
    ///
    /// Rules at or above the delta fraction of the mean fitness, and rules
    /// too young to judge, stake only their niche footprint. Weak experienced
    /// rules are inflated in proportion to their fitness shortfall.
    pub fn compute_deletion_vote(&mut self, mean_fitness: f64, params: &LcsParameters) -> f64 {
        let numerosity = self.numerosity as f64;
        let footprint = self.ave_match_set_size * numerosity;
        let vote = if self.fitness / numerosity >= params.delta * mean_fitness
            || self.match_count < u64::from(params.theta_del)
        {
            footprint
        } else if self.fitness == 0.0 {
            footprint * mean_fitness / (params.init_fitness / numerosity)
        } else {
            footprint * mean_fitness / (self.fitness / numerosity)
        };
        self.deletion_vote = Some(vote);
        vote
    }

    /// Whether two rules express the same condition and class, regardless of
    /// the order attributes were specified in.
    #[must_use]
    pub fn same_rule(&self, other: &Self) -> bool {
        self.phenotype == other.phenotype && self.condition == other.condition
    }

    /// Marks the rule epoch-complete once it has existed for a full pass
    /// over the training data.
    pub fn update_epoch_status(&mut self, iteration: usize, num_train_instances: usize) {
        if !self.epoch_complete
            && iteration.saturating_sub(self.init_time_stamp + 1) >= num_train_instances
        {
            self.epoch_complete = true;
        }
    }

    pub fn update_experience(&mut self) {
        self.match_count += 1;
        if !self.epoch_complete {
            self.match_cover += 1;
        }
    }

    pub fn update_correct(&mut self) {
        self.correct_count += 1;
        if !self.epoch_complete {
            self.correct_cover += 1;
        }
    }

    /// Running average of the match set sizes this rule has appeared in,
    /// exact while young and exponentially smoothed after `1 / beta`
    /// matches.
    pub fn update_match_set_size(&mut self, match_set_size: f64, beta: f64) {
        let match_count = self.match_count as f64;
        if match_count < 1.0 / beta {
            self.ave_match_set_size =
                (self.ave_match_set_size * (match_count - 1.0) + match_set_size) / match_count;
        } else {
            self.ave_match_set_size += beta * (match_set_size - self.ave_match_set_size);
        }
    }

    pub fn update_accuracy(&mut self) {
        self.accuracy = self.correct_count as f64 / self.match_count as f64;
    }

    pub fn update_fitness(&mut self, nu: f64) {
        self.fitness = self.accuracy.powf(nu);
    }

    pub fn update_time_stamp(&mut self, iteration: usize) {
        self.time_stamp_ga = iteration;
    }

    pub fn increase_numerosity(&mut self, amount: usize) {
        self.numerosity += amount;
    }

    pub fn decrement_numerosity(&mut self) {
        self.numerosity -= 1;
    }

    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    pub fn set_accuracy(&mut self, accuracy: f64) {
        self.accuracy = accuracy;
    }
}

/// Serializable form of a classifier, used for rule population export and
/// for rebooting a run from a saved population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSnapshot {
    pub condition: RuleCondition,
    pub phenotype: String,
    pub fitness: f64,
    pub accuracy: f64,
    pub numerosity: usize,
    pub ave_match_set_size: f64,
    pub time_stamp_ga: usize,
    pub init_time_stamp: usize,
    /// Fraction of attributes specified, recorded for population reports.
    pub specificity: f64,
    pub deletion_vote: Option<f64>,
    pub correct_count: u64,
    pub match_count: u64,
    pub correct_cover: u64,
    pub match_cover: u64,
    pub epoch_complete: bool,
}

fn build_match_elem<R: Rng + ?Sized>(
    attribute: usize,
    value: &AttributeValue,
    dataset: &Dataset,
    rng: &mut R,
) -> ConditionElem {
    match dataset.attribute(attribute).range() {
        Some((att_low, att_high)) => {
            let value = value
                .as_continuous()
                .expect("typed instances carry numeric states for continuous attributes");
            let radius =
                f64::from(rng.random_range(25..=75_u32)) * 0.01 * (att_high - att_low) / 2.0;
            ConditionElem::Interval {
                low: value - radius,
                high: value + radius,
            }
        }
        None => {
            let state = value
                .as_discrete()
                .expect("typed instances carry labels for discrete attributes");
            ConditionElem::Value(state.to_owned())
        }
    }
}

fn interval_of(condition: &RuleCondition, attribute: usize) -> (f64, f64) {
    match condition.element_for(attribute) {
        Some(&ConditionElem::Interval { low, high }) => (low, high),
        _ => unreachable!("continuous attributes are specified by intervals"),
    }
}

fn interval_mut(condition: &mut RuleCondition, attribute: usize) -> (&mut f64, &mut f64) {
    match condition.element_for_mut(attribute) {
        Some(ConditionElem::Interval { low, high }) => (low, high),
        _ => unreachable!("continuous attributes are specified by intervals"),
    }
}
