use oxiclass_engine::{
    Classifier, Dataset, Environment, ExpertKnowledge, FeedbackBias, LcsParameters, OperatorBias,
    ParameterError, Population, Prediction, PredictionVote, RunSeed,
};
use oxiclass_evaluator::{
    accuracy::{AccuracyReport, evaluate_accuracy},
    summary::{PopulationSummary, summarize_population},
};
use oxiclass_stats::descriptive::DescriptiveStats;
use rand::seq::IndexedRandom as _;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{
    attribute_tracking::AttributeTracking,
    compaction::{self, CompactionMethod, CompactionStage},
    timer::{RunTimer, TimedPhase},
};

/// A run could not be constructed from its inputs.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum RunError {
    #[display("invalid learning parameters: {source}")]
    InvalidParameters { source: ParameterError },
    #[display("expert knowledge covers {found} attributes, dataset has {expected}")]
    ExpertKnowledgeMismatch { expected: usize, found: usize },
}

/// Windowed progress sample emitted once per tracking interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackingRecord {
    /// Iterations completed when the record was taken.
    pub iteration: usize,
    pub macro_size: usize,
    pub micro_size: usize,
    /// Fraction of the last window's instances the vote classified
    /// correctly.
    pub accuracy_estimate: f64,
    pub average_generality: Option<f64>,
    pub experienced_rule_fraction: f64,
    pub elapsed_seconds: f64,
}

/// Full evaluation taken when a checkpoint iteration completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointReport {
    pub iteration: usize,
    pub summary: PopulationSummary,
    pub train: AccuracyReport,
    pub test: Option<AccuracyReport>,
}

/// Outcome of the post-training compaction pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactionReport {
    pub method: CompactionMethod,
    pub stages: Vec<CompactionStage>,
    pub summary: PopulationSummary,
    pub train: AccuracyReport,
    pub test: Option<AccuracyReport>,
}

/// Distributions of per-rule figures across the current population.
///
/// `None` when the population is empty.
#[derive(Debug, Clone)]
pub struct PopulationStatistics {
    pub fitness: Option<DescriptiveStats>,
    pub accuracy: Option<DescriptiveStats>,
    pub generality: Option<DescriptiveStats>,
}

/// Summarizes rule fitness, accuracy, and generality distributions.
#[must_use]
pub fn population_statistics(
    population: &Population,
    num_attributes: usize,
) -> PopulationStatistics {
    let rules = population.rules();
    PopulationStatistics {
        fitness: DescriptiveStats::new(rules.iter().map(Classifier::fitness)),
        accuracy: DescriptiveStats::new(rules.iter().map(Classifier::accuracy)),
        generality: DescriptiveStats::new(rules.iter().map(|rule| {
            (num_attributes - rule.specificity()) as f64 / num_attributes as f64
        })),
    }
}

/// Callbacks fired as a run produces records and reports.
///
/// All methods default to no-ops, so implementors override only what they
/// consume.
pub trait RunObserver {
    fn on_tracking(&mut self, _record: &TrackingRecord) {}
    fn on_checkpoint(&mut self, _report: &CheckpointReport) {}
    fn on_compaction(&mut self, _report: &CompactionReport) {}
}

/// Observer that ignores every event.
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

/// A complete training run over one dataset.
///
/// Owns the population, the environment cursor, and the run RNG. Each call
/// to [`Self::step`] processes the current training instance through one
/// match / predict / reinforce / discover / delete cycle and advances the
/// cursor. Every stochastic decision draws from the single run RNG, so a
/// given seed and dataset reproduce the run exactly.
#[derive(Debug)]
pub struct LearningRun {
    params: LcsParameters,
    seed: RunSeed,
    environment: Environment,
    population: Population,
    rng: Pcg32,
    expert: Option<ExpertKnowledge>,
    tracking: Option<AttributeTracking>,
    feedback_probabilities: Vec<f64>,
    compaction: Option<CompactionMethod>,
    timer: RunTimer,
    correct_window: Vec<bool>,
    tracking_frequency: usize,
    iteration: usize,
    stop_requested: bool,
    tracking_records: Vec<TrackingRecord>,
    checkpoint_reports: Vec<CheckpointReport>,
    compaction_report: Option<CompactionReport>,
}

impl LearningRun {
    /// Prepares a fresh run starting from an empty population.
    ///
    /// Validates the parameters, checks expert knowledge against the
    /// dataset's attribute count, and shuffles the training data with the
    /// run RNG so identical seeds see identical instance orders.
    pub fn new(
        dataset: Dataset,
        params: LcsParameters,
        seed: RunSeed,
        expert: Option<ExpertKnowledge>,
        compaction: Option<CompactionMethod>,
    ) -> Result<Self, RunError> {
        Self::build(dataset, params, seed, expert, compaction, Population::new(), 0)
    }

    /// Prepares a run that continues from a previously saved population.
    ///
    /// `start_iteration` restores the iteration counter, so checkpoints
    /// before it are considered already passed.
    pub fn resume(
        dataset: Dataset,
        params: LcsParameters,
        seed: RunSeed,
        expert: Option<ExpertKnowledge>,
        compaction: Option<CompactionMethod>,
        population: Population,
        start_iteration: usize,
    ) -> Result<Self, RunError> {
        Self::build(
            dataset,
            params,
            seed,
            expert,
            compaction,
            population,
            start_iteration,
        )
    }

    fn build(
        mut dataset: Dataset,
        params: LcsParameters,
        seed: RunSeed,
        expert: Option<ExpertKnowledge>,
        compaction: Option<CompactionMethod>,
        population: Population,
        start_iteration: usize,
    ) -> Result<Self, RunError> {
        params
            .validate()
            .map_err(|source| RunError::InvalidParameters { source })?;
        if let Some(expert) = &expert {
            if expert.num_attributes() != dataset.num_attributes() {
                return Err(RunError::ExpertKnowledgeMismatch {
                    expected: dataset.num_attributes(),
                    found: expert.num_attributes(),
                });
            }
        }

        let mut rng = seed.rng();
        dataset.shuffle_training(&mut rng);

        let tracking_frequency = if params.tracking_frequency == 0 {
            dataset.num_train_instances()
        } else {
            params.tracking_frequency
        };
        let tracking = params
            .do_attribute_tracking
            .then(|| AttributeTracking::new(dataset.num_train_instances(), dataset.num_attributes()));

        Ok(Self {
            params,
            seed,
            environment: Environment::new(dataset),
            population,
            rng,
            expert,
            tracking,
            feedback_probabilities: Vec::new(),
            compaction,
            timer: RunTimer::new(),
            correct_window: vec![false; tracking_frequency],
            tracking_frequency,
            iteration: start_iteration,
            stop_requested: false,
            tracking_records: Vec::new(),
            checkpoint_reports: Vec::new(),
            compaction_report: None,
        })
    }

    #[must_use]
    pub fn params(&self) -> &LcsParameters {
        &self.params
    }

    #[must_use]
    pub fn seed(&self) -> RunSeed {
        self.seed
    }

    /// Iterations completed so far.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        self.environment.dataset()
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn timer(&self) -> &RunTimer {
        &self.timer
    }

    #[must_use]
    pub fn attribute_tracking(&self) -> Option<&AttributeTracking> {
        self.tracking.as_ref()
    }

    #[must_use]
    pub fn tracking_records(&self) -> &[TrackingRecord] {
        &self.tracking_records
    }

    #[must_use]
    pub fn checkpoint_reports(&self) -> &[CheckpointReport] {
        &self.checkpoint_reports
    }

    #[must_use]
    pub fn compaction_report(&self) -> Option<&CompactionReport> {
        self.compaction_report.as_ref()
    }

    /// Makes [`Self::finished`] report true before the final checkpoint.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    #[must_use]
    pub fn finished(&self) -> bool {
        self.stop_requested || self.iteration >= self.params.max_iterations()
    }

    /// Runs every remaining iteration.
    pub fn run<O: RunObserver>(&mut self, observer: &mut O) {
        while !self.finished() {
            self.step(observer);
        }
    }

    /// Processes the current training instance and advances the cursor.
    pub fn step<O: RunObserver>(&mut self, observer: &mut O) {
        self.run_iteration();
        self.write_tracking(observer);
        self.run_checkpoint(observer);
        self.iteration += 1;
        self.environment.advance();
    }

    fn run_iteration(&mut self) {
        let Self {
            params,
            environment,
            population,
            rng,
            expert,
            tracking,
            feedback_probabilities,
            timer,
            correct_window,
            tracking_frequency,
            iteration,
            ..
        } = self;
        let iteration = *iteration;
        let dataset = environment.dataset();
        let instance = environment.current_instance();

        timer.start(TimedPhase::Matching);
        population.make_match_set(instance, iteration, dataset, params, expert.as_ref(), rng);
        timer.stop();

        // The windowed estimate scores the vote the way evaluation would,
        // with undecided outcomes falling back to a random class guess.
        timer.start(TimedPhase::Evaluation);
        let vote = PredictionVote::from_match_set(population, dataset);
        let hit = match vote.decision() {
            Prediction::Class(class) => class == instance.phenotype(),
            Prediction::Tie | Prediction::Undecided => dataset
                .phenotype_list()
                .choose(rng)
                .is_some_and(|class| class == instance.phenotype()),
        };
        correct_window[iteration % *tracking_frequency] = hit;
        timer.stop();

        population.make_correct_set(instance.phenotype());
        population.update_sets(params);

        if params.do_subsumption {
            timer.start(TimedPhase::Subsumption);
            population.correct_set_subsumption(params);
            timer.stop();
        }

        if let Some(tracking) = tracking {
            timer.start(TimedPhase::AttributeTracking);
            tracking.track(environment.current_index(), population);
            if params.do_attribute_feedback {
                tracking.update_percent(iteration, params.max_iterations());
                *feedback_probabilities = tracking.generate_probabilities(rng);
            }
            timer.stop();
        }

        timer.start(TimedPhase::GeneticAlgorithm);
        let feedback = if params.do_attribute_feedback {
            tracking.as_ref().map(|tracking| FeedbackBias {
                percent: tracking.percent(),
                probabilities: feedback_probabilities.as_slice(),
            })
        } else {
            None
        };
        let bias = OperatorBias {
            expert: expert.as_ref(),
            feedback,
        };
        population.run_ga(iteration, instance, dataset, params, bias, rng);
        timer.stop();

        timer.start(TimedPhase::Deletion);
        population.enforce_population_limit(params, rng);
        timer.stop();

        population.clear_sets();
    }

    fn write_tracking<O: RunObserver>(&mut self, observer: &mut O) {
        let frequency = self.tracking_frequency;
        if self.iteration == 0 || self.iteration % frequency != frequency - 1 {
            return;
        }
        let hits = self.correct_window.iter().filter(|&&hit| hit).count();
        let num_attributes = self.environment.dataset().num_attributes();
        let num_train = self.environment.dataset().num_train_instances();
        let record = TrackingRecord {
            iteration: self.iteration + 1,
            macro_size: self.population.macro_size(),
            micro_size: self.population.micro_size(),
            accuracy_estimate: hits as f64 / frequency as f64,
            average_generality: self.population.average_generality(num_attributes),
            experienced_rule_fraction: self
                .population
                .experienced_rule_fraction(self.iteration, num_train),
            elapsed_seconds: self.timer.elapsed().as_secs_f64(),
        };
        observer.on_tracking(&record);
        self.tracking_records.push(record);
    }

    fn run_checkpoint<O: RunObserver>(&mut self, observer: &mut O) {
        let completed = self.iteration + 1;
        if !self.params.checkpoints.contains(&completed) {
            return;
        }
        let report = self.evaluate_checkpoint(completed);
        observer.on_checkpoint(&report);
        self.checkpoint_reports.push(report);

        if completed == self.params.max_iterations() {
            if let Some(method) = self.compaction {
                let report = self.run_compaction(method);
                observer.on_compaction(&report);
                self.compaction_report = Some(report);
            }
        }
    }

    fn evaluate_checkpoint(&mut self, completed: usize) -> CheckpointReport {
        let Self {
            environment,
            population,
            timer,
            ..
        } = self;
        timer.start(TimedPhase::Evaluation);
        environment.begin_evaluation();
        let dataset = environment.dataset();
        let summary = summarize_population(population, dataset, completed);
        let train = evaluate_accuracy(population, dataset.train_instances(), dataset);
        let test = (dataset.num_test_instances() > 0)
            .then(|| evaluate_accuracy(population, dataset.test_instances(), dataset));
        environment.end_evaluation();
        timer.stop();
        CheckpointReport {
            iteration: completed,
            summary,
            train,
            test,
        }
    }

    /// Compacts the trained population and re-evaluates the survivor set.
    ///
    /// The pre-compaction training accuracy is the bar the first compaction
    /// stages must hold.
    fn run_compaction(&mut self, method: CompactionMethod) -> CompactionReport {
        let Self {
            environment,
            population,
            timer,
            iteration,
            ..
        } = self;
        timer.start(TimedPhase::Evaluation);
        environment.begin_evaluation();
        let dataset = environment.dataset();
        let original = evaluate_accuracy(population, dataset.train_instances(), dataset)
            .adjusted_balanced_accuracy;
        let stages = compaction::compact(population, method, dataset, original);
        let summary = summarize_population(population, dataset, *iteration + 1);
        let train = evaluate_accuracy(population, dataset.train_instances(), dataset);
        let test = (dataset.num_test_instances() > 0)
            .then(|| evaluate_accuracy(population, dataset.test_instances(), dataset));
        environment.end_evaluation();
        timer.stop();
        CompactionReport {
            method,
            stages,
            summary,
            train,
            test,
        }
    }
}

#[cfg(test)]
mod tests {
    use oxiclass_engine::RawData;

    use super::*;

    fn dataset() -> Dataset {
        let train = RawData {
            header: vec!["A0".to_owned(), "A1".to_owned(), "Class".to_owned()],
            rows: vec![
                vec!["a".to_owned(), "x".to_owned(), "0".to_owned()],
                vec!["a".to_owned(), "y".to_owned(), "0".to_owned()],
                vec!["b".to_owned(), "x".to_owned(), "1".to_owned()],
                vec!["b".to_owned(), "y".to_owned(), "1".to_owned()],
            ],
        };
        Dataset::from_raw(&train, None, &LcsParameters::default()).unwrap()
    }

    fn params(checkpoints: Vec<usize>) -> LcsParameters {
        LcsParameters {
            population_size: 60,
            checkpoints,
            ..LcsParameters::default()
        }
    }

    fn seed() -> RunSeed {
        RunSeed::from_bytes([7; 16])
    }

    #[derive(Default)]
    struct CountingObserver {
        tracking: usize,
        checkpoints: usize,
        compactions: usize,
    }

    impl RunObserver for CountingObserver {
        fn on_tracking(&mut self, _record: &TrackingRecord) {
            self.tracking += 1;
        }

        fn on_checkpoint(&mut self, _report: &CheckpointReport) {
            self.checkpoints += 1;
        }

        fn on_compaction(&mut self, _report: &CompactionReport) {
            self.compactions += 1;
        }
    }

    #[test]
    fn test_identical_seeds_reproduce_identical_runs() {
        let completed_run = || {
            let mut run =
                LearningRun::new(dataset(), params(vec![40]), seed(), None, None).unwrap();
            run.run(&mut SilentObserver);
            run
        };
        let first = completed_run();
        let second = completed_run();
        assert_eq!(
            first.population().snapshots(2),
            second.population().snapshots(2)
        );
        let estimates = |run: &LearningRun| {
            run.tracking_records()
                .iter()
                .map(|record| record.accuracy_estimate)
                .collect::<Vec<_>>()
        };
        assert_eq!(estimates(&first), estimates(&second));
        assert_eq!(
            first.checkpoint_reports()[0].train,
            second.checkpoint_reports()[0].train
        );
    }

    #[test]
    fn test_tracking_records_follow_the_window_cadence() {
        let mut run = LearningRun::new(dataset(), params(vec![40]), seed(), None, None).unwrap();
        let mut observer = CountingObserver::default();
        run.run(&mut observer);

        // Frequency 0 resolves to the four training instances.
        let records = run.tracking_records();
        assert_eq!(records.len(), 10);
        assert_eq!(records[0].iteration, 4);
        assert_eq!(records[9].iteration, 40);
        assert_eq!(observer.tracking, 10);
        assert!(records
            .iter()
            .all(|record| (0.0..=1.0).contains(&record.accuracy_estimate)));
    }

    #[test]
    fn test_checkpoints_emit_full_evaluations() {
        let mut run =
            LearningRun::new(dataset(), params(vec![10, 20]), seed(), None, None).unwrap();
        let mut observer = CountingObserver::default();
        run.run(&mut observer);

        assert!(run.finished());
        assert_eq!(run.iteration(), 20);
        assert_eq!(observer.checkpoints, 2);
        let reports = run.checkpoint_reports();
        assert_eq!(reports[0].iteration, 10);
        assert_eq!(reports[1].iteration, 20);
        assert!(reports[1].train.standard_accuracy >= 0.0);
        assert!(reports[1].test.is_none());
        assert_eq!(observer.compactions, 0);
    }

    #[test]
    fn test_final_checkpoint_triggers_compaction() {
        let mut run = LearningRun::new(
            dataset(),
            params(vec![20]),
            seed(),
            None,
            Some(CompactionMethod::Qrf),
        )
        .unwrap();
        let mut observer = CountingObserver::default();
        run.run(&mut observer);

        assert_eq!(observer.compactions, 1);
        let report = run.compaction_report().unwrap();
        assert_eq!(report.method, CompactionMethod::Qrf);
        assert_eq!(report.summary.macro_size, run.population().macro_size());
    }

    #[test]
    fn test_request_stop_ends_the_run_early() {
        let mut run = LearningRun::new(dataset(), params(vec![40]), seed(), None, None).unwrap();
        let mut observer = SilentObserver;
        run.step(&mut observer);
        run.request_stop();
        run.run(&mut observer);
        assert_eq!(run.iteration(), 1);
    }

    #[test]
    fn test_mismatched_expert_knowledge_is_rejected() {
        let expert = ExpertKnowledge::new(vec![1.0, 2.0, 3.0], 0.01);
        let err = LearningRun::new(dataset(), params(vec![10]), seed(), Some(expert), None)
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::ExpertKnowledgeMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let err = LearningRun::new(dataset(), params(Vec::new()), seed(), None, None).unwrap_err();
        assert!(matches!(err, RunError::InvalidParameters { .. }));
    }

    #[test]
    fn test_population_statistics_summarize_rule_distributions() {
        let mut run = LearningRun::new(dataset(), params(vec![20]), seed(), None, None).unwrap();
        run.run(&mut SilentObserver);
        let stats = population_statistics(run.population(), 2);
        let generality = stats.generality.unwrap();
        assert!(generality.min >= 0.0);
        assert!(generality.max <= 1.0);
        assert!(stats.fitness.unwrap().max <= 1.0 + f64::EPSILON);
    }
}
