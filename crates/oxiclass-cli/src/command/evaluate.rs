use std::path::PathBuf;

use chrono::Utc;
use oxiclass_engine::Population;
use oxiclass_evaluator::{accuracy::evaluate_accuracy, summary::summarize_population};
use oxiclass_training::controller::population_statistics;

use crate::{
    data,
    schema::{run_config::RunConfig, run_summary::EvaluationSummary, snapshot},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Training dataset the snapshot was learned from
    #[arg(long)]
    data: PathBuf,
    /// Held-out dataset to evaluate as well
    #[arg(long)]
    test_data: Option<PathBuf>,
    /// JSON run configuration file (dataset characterization knobs)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Population snapshot to evaluate
    #[arg(long)]
    snapshot: PathBuf,
    /// Evaluation summary JSON path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let config = RunConfig::load(arg.config.as_deref())?;
    let dataset = data::load_dataset(&arg.data, arg.test_data.as_deref(), &config.params)?;
    let snapshots = snapshot::read_snapshot_file(&arg.snapshot)?;
    let mut population = Population::from_snapshots(snapshots);
    eprintln!(
        "Evaluating {} macro / {} micro rules on {} instances",
        population.macro_size(),
        population.micro_size(),
        dataset.num_train_instances(),
    );

    let summary = summarize_population(&population, &dataset, 0);
    let statistics = population_statistics(&population, dataset.num_attributes());
    let train = evaluate_accuracy(&mut population, dataset.train_instances(), &dataset);
    let test = (dataset.num_test_instances() > 0)
        .then(|| evaluate_accuracy(&mut population, dataset.test_instances(), &dataset));

    eprintln!(
        "Train accuracy {:.3} (coverage {:.3})",
        train.adjusted_balanced_accuracy, train.coverage,
    );
    if let Some(test) = &test {
        eprintln!(
            "Test accuracy {:.3} (coverage {:.3})",
            test.adjusted_balanced_accuracy, test.coverage,
        );
    }

    let report = EvaluationSummary {
        finished_at: Utc::now(),
        population: summary,
        statistics: statistics.into(),
        train,
        test,
    };
    Output::save_json(&report, arg.output.clone())
}
