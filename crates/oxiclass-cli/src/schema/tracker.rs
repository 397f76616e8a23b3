//! Tab-separated learning tracker files, one row per tracking window.

use std::io::{self, Write as _};

use oxiclass_training::controller::TrackingRecord;

pub const COLUMNS: [&str; 7] = [
    "iteration",
    "macro_size",
    "micro_size",
    "accuracy_estimate",
    "average_generality",
    "experienced_rule_fraction",
    "elapsed_seconds",
];

/// Streams tracking records to a writer, header first.
#[derive(Debug)]
pub struct TrackerWriter<W: io::Write> {
    writer: W,
}

impl<W: io::Write> TrackerWriter<W> {
    pub fn new(mut writer: W) -> io::Result<Self> {
        writeln!(writer, "{}", COLUMNS.join("\t"))?;
        Ok(Self { writer })
    }

    pub fn write_record(&mut self, record: &TrackingRecord) -> io::Result<()> {
        let generality = record
            .average_generality
            .map_or_else(|| "NA".to_owned(), |generality| generality.to_string());
        writeln!(
            self.writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.iteration,
            record.macro_size,
            record.micro_size,
            record.accuracy_estimate,
            generality,
            record.experienced_rule_fraction,
            record.elapsed_seconds,
        )
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
