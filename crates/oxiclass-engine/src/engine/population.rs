use rand::{Rng, seq::index};

use crate::{
    core::{AttributeValue, Dataset, Instance, LcsParameters, SelectionMethod},
    engine::{Classifier, ClassifierSnapshot, ExpertKnowledge, OperatorBias},
};

/// The rule population plus the per-iteration match and correct sets.
///
/// Rules are macro classifiers: identical rules are merged and counted
/// through numerosity, and `micro_size` tracks the numerosity total the
/// population size limit applies to. The match and correct sets hold indices
/// into the rule vector and are rebuilt every iteration.
#[derive(Debug, Clone, Default)]
pub struct Population {
    rules: Vec<Classifier>,
    match_set: Vec<usize>,
    correct_set: Vec<usize>,
    micro_size: usize,
}

impl Population {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a population from saved rule snapshots.
    #[must_use]
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = ClassifierSnapshot>) -> Self {
        let rules: Vec<Classifier> = snapshots
            .into_iter()
            .map(Classifier::from_snapshot)
            .collect();
        let micro_size = rules.iter().map(Classifier::numerosity).sum();
        Self {
            rules,
            match_set: Vec::new(),
            correct_set: Vec::new(),
            micro_size,
        }
    }

    #[must_use]
    pub fn snapshots(&self, num_attributes: usize) -> Vec<ClassifierSnapshot> {
        self.rules
            .iter()
            .map(|rule| rule.to_snapshot(num_attributes))
            .collect()
    }

    /// Builds a population around an existing rule list.
    #[must_use]
    pub fn from_rules(rules: Vec<Classifier>) -> Self {
        let micro_size = rules.iter().map(Classifier::numerosity).sum();
        Self {
            rules,
            match_set: Vec::new(),
            correct_set: Vec::new(),
            micro_size,
        }
    }

    /// Moves the rule list out, leaving the population empty.
    pub fn take_rules(&mut self) -> Vec<Classifier> {
        self.clear_sets();
        self.micro_size = 0;
        std::mem::take(&mut self.rules)
    }

    /// Replaces the rule list, clearing the working sets and recomputing the
    /// micro population size.
    pub fn set_rules(&mut self, rules: Vec<Classifier>) {
        self.rules = rules;
        self.clear_sets();
        self.recalculate_micro_size();
    }

    #[must_use]
    pub fn rules(&self) -> &[Classifier] {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut [Classifier] {
        &mut self.rules
    }

    #[must_use]
    pub fn rule(&self, index: usize) -> &Classifier {
        &self.rules[index]
    }

    /// Number of macro classifiers.
    #[must_use]
    pub fn macro_size(&self) -> usize {
        self.rules.len()
    }

    /// Numerosity sum over all macro classifiers.
    #[must_use]
    pub fn micro_size(&self) -> usize {
        self.micro_size
    }

    #[must_use]
    pub fn match_set(&self) -> &[usize] {
        &self.match_set
    }

    #[must_use]
    pub fn correct_set(&self) -> &[usize] {
        &self.correct_set
    }

    /// Builds the match set for a training instance, covering a new rule
    /// when no matching rule predicts the instance's class.
    pub fn make_match_set<R: Rng + ?Sized>(
        &mut self,
        instance: &Instance,
        iteration: usize,
        dataset: &Dataset,
        params: &LcsParameters,
        expert: Option<&ExpertKnowledge>,
        rng: &mut R,
    ) {
        let mut covering = true;
        let mut set_numerosity = 0;
        for index in 0..self.rules.len() {
            let rule = &mut self.rules[index];
            rule.update_epoch_status(iteration, dataset.num_train_instances());
            if rule.matches(instance.state()) {
                self.match_set.push(index);
                set_numerosity += rule.numerosity();
                if rule.phenotype() == instance.phenotype() {
                    covering = false;
                }
            }
        }
        if covering {
            let covered = Classifier::cover(
                (set_numerosity + 1) as f64,
                iteration,
                instance,
                dataset,
                params,
                expert,
                rng,
            );
            self.insert_rule(covered, false);
            self.match_set.push(self.rules.len() - 1);
        }
    }

    /// Builds the match set for an evaluation instance. No covering and no
    /// epoch bookkeeping.
    pub fn make_eval_match_set(&mut self, state: &[AttributeValue]) {
        for index in 0..self.rules.len() {
            if self.rules[index].matches(state) {
                self.match_set.push(index);
            }
        }
    }

    /// Narrows the match set to the rules predicting the given class.
    pub fn make_correct_set(&mut self, phenotype: &str) {
        let matching: Vec<usize> = self
            .match_set
            .iter()
            .copied()
            .filter(|&index| self.rules[index].phenotype() == phenotype)
            .collect();
        self.correct_set.extend(matching);
    }

    /// Updates experience, niche size, accuracy, and fitness for every rule
    /// in the match set.
    pub fn update_sets(&mut self, params: &LcsParameters) {
        let match_numerosity: usize = self
            .match_set
            .iter()
            .map(|&index| self.rules[index].numerosity())
            .sum();
        for i in 0..self.match_set.len() {
            let index = self.match_set[i];
            let in_correct = self.correct_set.contains(&index);
            let rule = &mut self.rules[index];
            rule.update_experience();
            rule.update_match_set_size(match_numerosity as f64, params.beta);
            if in_correct {
                rule.update_correct();
            }
            rule.update_accuracy();
            rule.update_fitness(params.nu);
        }
    }

    pub fn clear_sets(&mut self) {
        self.match_set.clear();
        self.correct_set.clear();
    }

    /// Runs rule discovery on the correct set once its numerosity-weighted
    /// mean GA stamp is old enough.
    ///
    /// Two parents breed two offspring through crossover and mutation.
    /// Offspring that changed are inserted, first attempting subsumption by
    /// a parent and then by the correct set.
    pub fn run_ga<R: Rng + ?Sized>(
        &mut self,
        iteration: usize,
        instance: &Instance,
        dataset: &Dataset,
        params: &LcsParameters,
        bias: OperatorBias<'_>,
        rng: &mut R,
    ) {
        if (iteration as f64 - self.iter_stamp_average()) < params.theta_ga {
            return;
        }
        self.set_iter_stamps(iteration);

        let (parent1, parent2) = match params.selection {
            SelectionMethod::Roulette => self.select_roulette(rng),
            SelectionMethod::Tournament => self.select_tournament(params.theta_sel, rng),
        };

        let mut child1 = Classifier::copy_for_offspring(&self.rules[parent1], iteration);
        let mut child2 = Classifier::copy_for_offspring(&self.rules[parent2], iteration);

        let mut changed = false;
        if !child1.same_rule(&child2) && rng.random::<f64>() < params.chi {
            changed = child1.uniform_crossover(&mut child2, dataset, bias, rng);
        }

        if changed {
            child1.set_accuracy((child1.accuracy() + child2.accuracy()) / 2.0);
            child1.set_fitness(params.fitness_reduction * (child1.fitness() + child2.fitness()) / 2.0);
            child2.set_accuracy(child1.accuracy());
            child2.set_fitness(child1.fitness());
        } else {
            child1.set_fitness(params.fitness_reduction * child1.fitness());
            child2.set_fitness(params.fitness_reduction * child2.fitness());
        }

        let mutated1 = child1.mutate(instance, dataset, params, bias, rng);
        let mutated2 = child2.mutate(instance, dataset, params, bias, rng);
        if dataset.has_continuous_attributes() {
            child1.range_check(dataset);
            child2.range_check(dataset);
        }
        if changed || mutated1 || mutated2 {
            self.insert_discovered(child1, child2, parent1, parent2, params, rng);
        }
    }

    /// Deletes micro classifiers by deletion-vote roulette until the
    /// population is back under its size limit.
    pub fn enforce_population_limit<R: Rng + ?Sized>(
        &mut self,
        params: &LcsParameters,
        rng: &mut R,
    ) {
        while self.micro_size > params.population_size {
            self.delete_one(params, rng);
        }
    }

    /// Finds the most general qualified subsumer in the correct set and
    /// folds every more specific correct-set rule into it.
    pub fn correct_set_subsumption(&mut self, params: &LcsParameters) {
        let mut subsumer: Option<usize> = None;
        for &index in &self.correct_set {
            if self.rules[index].is_subsumer(params) {
                let better = match subsumer {
                    Some(current) => self.rules[index].is_more_general(&self.rules[current]),
                    None => true,
                };
                if better {
                    subsumer = Some(index);
                }
            }
        }
        let Some(mut subsumer) = subsumer else {
            return;
        };

        let mut i = 0;
        while i < self.correct_set.len() {
            let index = self.correct_set[i];
            if self.rules[subsumer].is_more_general(&self.rules[index]) {
                let absorbed = self.rules[index].numerosity();
                self.rules[subsumer].increase_numerosity(absorbed);
                self.remove_macro(index);
                if index < subsumer {
                    subsumer -= 1;
                }
            } else {
                i += 1;
            }
        }
    }

    /// Removes every rule failing the predicate, clears the working sets,
    /// and recomputes the micro population size.
    pub fn retain_rules(&mut self, keep: impl FnMut(&Classifier) -> bool) {
        self.rules.retain(keep);
        self.clear_sets();
        self.recalculate_micro_size();
    }

    pub fn recalculate_micro_size(&mut self) {
        self.micro_size = self.rules.iter().map(Classifier::numerosity).sum();
    }

    /// Numerosity-weighted mean fraction of wildcarded attributes, `None`
    /// for an empty population.
    #[must_use]
    pub fn average_generality(&self, num_attributes: usize) -> Option<f64> {
        if self.micro_size == 0 {
            return None;
        }
        let generality_sum: f64 = self
            .rules
            .iter()
            .map(|rule| {
                (num_attributes - rule.specificity()) as f64 / num_attributes as f64
                    * rule.numerosity() as f64
            })
            .sum();
        Some(generality_sum / self.micro_size as f64)
    }

    /// Fraction of macro rules old enough to have seen every training
    /// instance.
    #[must_use]
    pub fn experienced_rule_fraction(&self, iteration: usize, num_train_instances: usize) -> f64 {
        if self.rules.is_empty() {
            return 0.0;
        }
        let aged = self
            .rules
            .iter()
            .filter(|rule| iteration.saturating_sub(rule.init_time_stamp()) > num_train_instances)
            .count();
        aged as f64 / self.rules.len() as f64
    }

    fn iter_stamp_average(&self) -> f64 {
        let mut stamp_sum = 0.0;
        let mut numerosity_sum = 0.0;
        for &index in &self.correct_set {
            let rule = &self.rules[index];
            stamp_sum += rule.time_stamp_ga() as f64 * rule.numerosity() as f64;
            numerosity_sum += rule.numerosity() as f64;
        }
        stamp_sum / numerosity_sum
    }

    fn set_iter_stamps(&mut self, iteration: usize) {
        for i in 0..self.correct_set.len() {
            let index = self.correct_set[i];
            self.rules[index].update_time_stamp(iteration);
        }
    }

    /// Fitness-proportionate selection over the correct set, without
    /// replacement once it holds more than two rules.
    fn select_roulette<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        let mut set_list = self.correct_set.clone();
        match set_list.len() {
            1 => (set_list[0], set_list[0]),
            2 => (set_list[0], set_list[1]),
            _ => {
                let mut selected = [0_usize; 2];
                for slot in &mut selected {
                    let fitness_sum: f64 = set_list
                        .iter()
                        .map(|&index| self.rules[index].fitness())
                        .sum();
                    let choice_point = rng.random::<f64>() * fitness_sum;
                    let mut i = 0;
                    let mut acc = self.rules[set_list[0]].fitness();
                    while choice_point > acc && i + 1 < set_list.len() {
                        i += 1;
                        acc += self.rules[set_list[i]].fitness();
                    }
                    *slot = set_list.remove(i);
                }
                (selected[0], selected[1])
            }
        }
    }

    /// Tournament selection over a `theta_sel` fraction of the correct set,
    /// removing each winner before the second round.
    fn select_tournament<R: Rng + ?Sized>(&self, theta_sel: f64, rng: &mut R) -> (usize, usize) {
        let mut set_list = self.correct_set.clone();
        match set_list.len() {
            1 => (set_list[0], set_list[0]),
            2 => (set_list[0], set_list[1]),
            _ => {
                let mut selected = [0_usize; 2];
                for slot in &mut selected {
                    let tournament_size = (set_list.len() as f64 * theta_sel) as usize;
                    let mut best_fitness = 0.0;
                    let mut best = set_list[0];
                    for i in index::sample(rng, set_list.len(), tournament_size) {
                        let candidate = set_list[i];
                        if self.rules[candidate].fitness() > best_fitness {
                            best_fitness = self.rules[candidate].fitness();
                            best = candidate;
                        }
                    }
                    set_list.retain(|&index| index != best);
                    *slot = best;
                }
                (selected[0], selected[1])
            }
        }
    }

    fn insert_discovered<R: Rng + ?Sized>(
        &mut self,
        child1: Classifier,
        child2: Classifier,
        parent1: usize,
        parent2: usize,
        params: &LcsParameters,
        rng: &mut R,
    ) {
        if params.do_subsumption {
            if child1.specificity() > 0 {
                self.subsume_or_insert(child1, parent1, parent2, params, rng);
            }
            if child2.specificity() > 0 {
                self.subsume_or_insert(child2, parent1, parent2, params, rng);
            }
        } else {
            if child1.specificity() > 0 {
                self.insert_rule(child1, true);
            }
            if child2.specificity() > 0 {
                self.insert_rule(child2, true);
            }
        }
    }

    /// Tries to fold an offspring into a parent, then into any correct-set
    /// subsumer, before inserting it as its own rule.
    fn subsume_or_insert<R: Rng + ?Sized>(
        &mut self,
        child: Classifier,
        parent1: usize,
        parent2: usize,
        params: &LcsParameters,
        rng: &mut R,
    ) {
        for parent in [parent1, parent2] {
            if self.rules[parent].subsumes(&child, params) {
                self.rules[parent].increase_numerosity(1);
                self.micro_size += 1;
                return;
            }
        }

        let choices: Vec<usize> = self
            .correct_set
            .iter()
            .copied()
            .filter(|&index| self.rules[index].subsumes(&child, params))
            .collect();
        if choices.is_empty() {
            self.insert_rule(child, true);
        } else {
            let choice = choices[(rng.random::<f64>() * choices.len() as f64) as usize];
            self.rules[choice].increase_numerosity(1);
            self.micro_size += 1;
        }
    }

    fn insert_rule(&mut self, rule: Classifier, check_identical: bool) {
        if check_identical
            && let Some(existing) = self.rules.iter_mut().find(|existing| existing.same_rule(&rule))
        {
            existing.increase_numerosity(1);
            self.micro_size += 1;
            return;
        }
        self.micro_size += rule.numerosity();
        self.rules.push(rule);
    }

    fn delete_one<R: Rng + ?Sized>(&mut self, params: &LcsParameters, rng: &mut R) {
        let mean_fitness = self.fitness_sum() / self.micro_size as f64;
        let mut vote_sum = 0.0;
        let mut votes = Vec::with_capacity(self.rules.len());
        for rule in &mut self.rules {
            let vote = rule.compute_deletion_vote(mean_fitness, params);
            vote_sum += vote;
            votes.push(vote);
        }

        let choice_point = vote_sum * rng.random::<f64>();
        let mut acc = 0.0;
        for (index, vote) in votes.into_iter().enumerate() {
            acc += vote;
            if acc > choice_point {
                self.rules[index].decrement_numerosity();
                self.micro_size -= 1;
                if self.rules[index].numerosity() < 1 {
                    self.remove_macro(index);
                }
                return;
            }
        }
    }

    fn fitness_sum(&self) -> f64 {
        self.rules
            .iter()
            .map(|rule| rule.fitness() * rule.numerosity() as f64)
            .sum()
    }

    /// Drops a macro classifier and re-indexes the working sets.
    fn remove_macro(&mut self, index: usize) {
        self.rules.remove(index);
        remove_ref(&mut self.match_set, index);
        remove_ref(&mut self.correct_set, index);
    }
}

fn remove_ref(set: &mut Vec<usize>, removed: usize) {
    set.retain(|&reference| reference != removed);
    for reference in set {
        if *reference > removed {
            *reference -= 1;
        }
    }
}
