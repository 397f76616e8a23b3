use std::{
    fs::File,
    io::{self, BufWriter},
    path::PathBuf,
};

use anyhow::Context as _;
use chrono::Utc;
use oxiclass_engine::{ExpertKnowledge, Population, RunSeed};
use oxiclass_training::{
    attribute_tracking::AttributeTracking,
    compaction::CompactionMethod,
    controller::{
        CheckpointReport, CompactionReport, LearningRun, RunObserver, TrackingRecord,
        population_statistics,
    },
};
use rand::Rng as _;

use crate::{
    data,
    schema::{run_config::RunConfig, run_summary::RunSummary, snapshot, tracker::TrackerWriter},
    util::Output,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training dataset (tab-separated with a header row)
    #[arg(long)]
    data: PathBuf,
    /// Held-out dataset evaluated at checkpoints
    #[arg(long)]
    test_data: Option<PathBuf>,
    /// JSON run configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// 32-digit hex run seed; drawn randomly when omitted
    #[arg(long)]
    seed: Option<RunSeed>,
    /// Override the final checkpoint (total iteration count)
    #[arg(long)]
    iterations: Option<usize>,
    /// Override the micro population cap
    #[arg(long)]
    population_size: Option<usize>,
    /// Compaction method applied after the final checkpoint
    #[arg(long)]
    compaction: Option<CompactionMethod>,
    /// Expert knowledge scores (JSON array, one score per attribute)
    #[arg(long)]
    expert_knowledge: Option<PathBuf>,
    /// Continue training from a population snapshot
    #[arg(long)]
    reboot: Option<PathBuf>,
    /// Iterations the reboot snapshot has already completed
    #[arg(long, default_value_t = 0)]
    reboot_iteration: usize,
    /// Learning tracker output path (tab-separated)
    #[arg(long)]
    tracker: Option<PathBuf>,
    /// Population snapshot output path (tab-separated)
    #[arg(long)]
    snapshot: Option<PathBuf>,
    /// Run summary JSON path; stdout when omitted
    #[arg(long)]
    output: Option<PathBuf>,
}

struct TrainObserver {
    tracker: Option<TrackerWriter<BufWriter<File>>>,
    tracker_failure: Option<io::Error>,
}

impl TrainObserver {
    fn new(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        let tracker = match path {
            Some(path) => {
                let file = File::create(path).with_context(|| {
                    format!("Failed to create tracker file: {}", path.display())
                })?;
                Some(
                    TrackerWriter::new(BufWriter::new(file)).with_context(|| {
                        format!("Failed to write tracker header: {}", path.display())
                    })?,
                )
            }
            None => None,
        };
        Ok(Self {
            tracker,
            tracker_failure: None,
        })
    }

    fn finish(mut self) -> Result<(), io::Error> {
        if let Some(failure) = self.tracker_failure.take() {
            return Err(failure);
        }
        match self.tracker.as_mut() {
            Some(tracker) => tracker.flush(),
            None => Ok(()),
        }
    }
}

impl RunObserver for TrainObserver {
    fn on_tracking(&mut self, record: &TrackingRecord) {
        eprintln!(
            "Iteration #{}: estimate {:.3}, {} macro / {} micro rules",
            record.iteration, record.accuracy_estimate, record.macro_size, record.micro_size,
        );
        if self.tracker_failure.is_some() {
            return;
        }
        if let Some(tracker) = self.tracker.as_mut() {
            if let Err(failure) = tracker.write_record(record) {
                self.tracker_failure = Some(failure);
            }
        }
    }

    fn on_checkpoint(&mut self, report: &CheckpointReport) {
        eprintln!(
            "Checkpoint #{}: train accuracy {:.3} (coverage {:.3}), {} macro / {} micro rules",
            report.iteration,
            report.train.adjusted_balanced_accuracy,
            report.train.coverage,
            report.summary.macro_size,
            report.summary.micro_size,
        );
        if let Some(test) = &report.test {
            eprintln!(
                "  Test accuracy {:.3} (coverage {:.3})",
                test.adjusted_balanced_accuracy, test.coverage,
            );
        }
    }

    fn on_compaction(&mut self, report: &CompactionReport) {
        for stage in &report.stages {
            eprintln!("Compaction stage {}: {} rules kept", stage.name, stage.macro_size);
        }
        eprintln!(
            "Compaction ({}): train accuracy {:.3}, {} macro / {} micro rules",
            report.method,
            report.train.adjusted_balanced_accuracy,
            report.summary.macro_size,
            report.summary.micro_size,
        );
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = RunConfig::load(arg.config.as_deref())?;
    let mut params = config.params;
    if let Some(iterations) = arg.iterations {
        params.checkpoints.retain(|&checkpoint| checkpoint < iterations);
        params.checkpoints.push(iterations);
    }
    if let Some(population_size) = arg.population_size {
        params.population_size = population_size;
    }
    let compaction = arg.compaction.or(config.compaction);
    let seed = arg
        .seed
        .or(config.seed)
        .unwrap_or_else(|| rand::rng().random());

    let dataset = data::load_dataset(&arg.data, arg.test_data.as_deref(), &params)?;
    eprintln!(
        "Training on {} instances ({} test), {} attributes, {} classes",
        dataset.num_train_instances(),
        dataset.num_test_instances(),
        dataset.num_attributes(),
        dataset.phenotype_list().len(),
    );
    eprintln!("Seed: {seed}");

    let expert = match &arg.expert_knowledge {
        Some(path) => {
            let scores = data::read_expert_scores(path)?;
            Some(ExpertKnowledge::new(scores, params.init_fitness))
        }
        None => None,
    };

    let num_attributes = dataset.num_attributes();
    let mut run = match &arg.reboot {
        Some(path) => {
            let snapshots = snapshot::read_snapshot_file(path)?;
            eprintln!(
                "Rebooting from {} rules at iteration {}",
                snapshots.len(),
                arg.reboot_iteration,
            );
            LearningRun::resume(
                dataset,
                params,
                seed,
                expert,
                compaction,
                Population::from_snapshots(snapshots),
                arg.reboot_iteration,
            )
        }
        None => LearningRun::new(dataset, params, seed, expert, compaction),
    }
    .context("Failed to prepare the learning run")?;
    eprintln!(
        "Running {} iterations (checkpoints {:?})",
        run.params().max_iterations(),
        run.params().checkpoints,
    );

    let mut observer = TrainObserver::new(arg.tracker.as_ref())?;
    run.run(&mut observer);
    observer.finish().context("Failed to write tracker file")?;

    if let Some(path) = &arg.snapshot {
        snapshot::write_snapshot_file(path, &run.population().snapshots(num_attributes))?;
        eprintln!("Population snapshot written to {}", path.display());
    }

    let final_checkpoint = run
        .checkpoint_reports()
        .last()
        .context("Training produced no checkpoint evaluation")?;
    let summary = RunSummary {
        finished_at: Utc::now(),
        seed: run.seed(),
        parameters: run.params().clone(),
        iterations: run.iteration(),
        population: final_checkpoint.summary.clone(),
        statistics: population_statistics(run.population(), num_attributes).into(),
        train: final_checkpoint.train.clone(),
        test: final_checkpoint.test.clone(),
        attribute_tracking: run.attribute_tracking().map(AttributeTracking::global_sums),
        timing: run.timer().report(),
        compaction: run.compaction_report().cloned(),
    };
    Output::save_json(&summary, arg.output.clone())
}
