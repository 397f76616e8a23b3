use std::path::PathBuf;

use anyhow::Context as _;
use oxiclass_engine::Population;
use oxiclass_evaluator::accuracy::evaluate_accuracy;
use oxiclass_training::compaction::{self, CompactionMethod};

use crate::{
    data,
    schema::{run_config::RunConfig, snapshot},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CompactArg {
    /// Training dataset the snapshot was learned from
    #[arg(long)]
    data: PathBuf,
    /// JSON run configuration file (dataset characterization knobs)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Compaction method to apply
    #[arg(long, default_value = "qrf")]
    method: CompactionMethod,
    /// Population snapshot to compact
    #[arg(long)]
    snapshot: PathBuf,
    /// Compacted snapshot path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &CompactArg) -> anyhow::Result<()> {
    let config = RunConfig::load(arg.config.as_deref())?;
    let dataset = data::load_dataset(&arg.data, None, &config.params)?;
    let snapshots = snapshot::read_snapshot_file(&arg.snapshot)?;
    let mut population = Population::from_snapshots(snapshots);

    let original = evaluate_accuracy(&mut population, dataset.train_instances(), &dataset)
        .adjusted_balanced_accuracy;
    eprintln!(
        "Pre-compaction: {} macro / {} micro rules, train accuracy {:.3}",
        population.macro_size(),
        population.micro_size(),
        original,
    );

    let stages = compaction::compact(&mut population, arg.method, &dataset, original);
    for stage in &stages {
        eprintln!("Compaction stage {}: {} rules kept", stage.name, stage.macro_size);
    }
    let after = evaluate_accuracy(&mut population, dataset.train_instances(), &dataset);
    eprintln!(
        "Post-compaction ({}): {} macro / {} micro rules, train accuracy {:.3}",
        arg.method,
        population.macro_size(),
        population.micro_size(),
        after.adjusted_balanced_accuracy,
    );

    let mut output = Output::from_output_path(arg.output.clone())?;
    let display_path = output.display_path();
    snapshot::write_snapshot(&mut output, &population.snapshots(dataset.num_attributes()))
        .with_context(|| format!("Failed to write compacted snapshot to {display_path}"))?;
    output.finish()
}
