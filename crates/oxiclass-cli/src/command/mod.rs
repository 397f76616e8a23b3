use clap::{Parser, Subcommand};

use self::{compact::CompactArg, evaluate::EvaluateArg, train::TrainArg};

mod compact;
mod evaluate;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a rule population on a dataset
    Train(#[clap(flatten)] TrainArg),
    /// Evaluate a saved population snapshot against a dataset
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Compact a saved population snapshot without further learning
    Compact(#[clap(flatten)] CompactArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Compact(arg) => compact::run(&arg)?,
    }
    Ok(())
}
