use chrono::{DateTime, Utc};
use oxiclass_engine::{LcsParameters, RunSeed};
use oxiclass_evaluator::{accuracy::AccuracyReport, summary::PopulationSummary};
use oxiclass_stats::descriptive::DescriptiveStats;
use oxiclass_training::{
    controller::{CompactionReport, PopulationStatistics},
    timer::TimerReport,
};
use serde::Serialize;

/// Everything a finished training run reports, exported as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub finished_at: DateTime<Utc>,
    pub seed: RunSeed,
    pub parameters: LcsParameters,
    pub iterations: usize,
    pub population: PopulationSummary,
    pub statistics: StatisticsSummary,
    pub train: AccuracyReport,
    pub test: Option<AccuracyReport>,
    pub attribute_tracking: Option<Vec<f64>>,
    pub timing: TimerReport,
    pub compaction: Option<CompactionReport>,
}

/// Standalone evaluation of a saved population.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub finished_at: DateTime<Utc>,
    pub population: PopulationSummary,
    pub statistics: StatisticsSummary,
    pub train: AccuracyReport,
    pub test: Option<AccuracyReport>,
}

/// Rule-level distributions of the final population.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSummary {
    pub fitness: Option<DescriptiveStatsSchema>,
    pub accuracy: Option<DescriptiveStatsSchema>,
    pub generality: Option<DescriptiveStatsSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStatsSchema {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl From<DescriptiveStats> for DescriptiveStatsSchema {
    fn from(stats: DescriptiveStats) -> Self {
        Self {
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            median: stats.median,
            variance: stats.variance,
            std_dev: stats.std_dev,
        }
    }
}

impl From<PopulationStatistics> for StatisticsSummary {
    fn from(statistics: PopulationStatistics) -> Self {
        Self {
            fitness: statistics.fitness.map(Into::into),
            accuracy: statistics.accuracy.map(Into::into),
            generality: statistics.generality.map(Into::into),
        }
    }
}
