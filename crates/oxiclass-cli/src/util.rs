use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;

/// Report sink: the process stdout or a freshly created file.
///
/// Every subcommand funnels its primary artifact (run summary, evaluation
/// summary, compacted snapshot) through this type so `--output` behaves the
/// same way everywhere.
#[derive(Debug)]
pub enum Output {
    Stdout(StdoutLock<'static>),
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Serializes `value` as pretty JSON to `output_path`, falling back to
    /// stdout when no path is given.
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)?;
        output.finish()
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                Ok(Output::File {
                    writer: BufWriter::new(file),
                    path,
                })
            }
            None => Ok(Output::Stdout(io::stdout().lock())),
        }
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout(_) => "stdout".to_owned(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: &T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(self)
            .with_context(|| format!("Failed to finish JSON report to {}", self.display_path()))
    }

    /// Flushes buffered output, naming the sink on failure.
    pub fn finish(&mut self) -> anyhow::Result<()> {
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(writer) => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(writer) => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Reads and parses a small JSON input file, labeling errors with what the
/// file was supposed to contain.
pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;
    serde_json::from_str(&text).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_written_to_file_reads_back() {
        let dir = std::env::temp_dir().join("oxiclass-util-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("report.json");

        Output::save_json(&vec![1, 2, 3], Some(path.clone())).unwrap();
        let values: Vec<i32> = read_json_file("report", &path).unwrap();
        assert_eq!(values, [1, 2, 3]);
    }

    #[test]
    fn test_missing_json_file_names_its_kind_and_path() {
        let error =
            read_json_file::<Vec<i32>, _>("run configuration", "no-such-file.json").unwrap_err();
        assert!(error.to_string().contains("run configuration"));
        assert!(error.to_string().contains("no-such-file.json"));
    }
}
