use std::{fs, path::Path};

use anyhow::Context;
use oxiclass_engine::{Dataset, LcsParameters, RawData};

use crate::util;

/// Reads a tab-separated file with a header row into untyped rows.
///
/// Blank lines are skipped so trailing newlines do not produce phantom
/// instances.
pub fn read_raw_data(path: &Path) -> anyhow::Result<RawData> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header = lines
        .next()
        .with_context(|| format!("Dataset file has no header row: {}", path.display()))?
        .split('\t')
        .map(str::to_owned)
        .collect();
    let rows = lines
        .map(|line| line.split('\t').map(str::to_owned).collect())
        .collect();
    Ok(RawData { header, rows })
}

/// Loads and characterizes a training file, with an optional held-out test
/// file sharing its header.
pub fn load_dataset(
    train_path: &Path,
    test_path: Option<&Path>,
    params: &LcsParameters,
) -> anyhow::Result<Dataset> {
    let train = read_raw_data(train_path)?;
    let test = test_path.map(read_raw_data).transpose()?;
    Dataset::from_raw(&train, test.as_ref(), params)
        .with_context(|| format!("Failed to characterize dataset: {}", train_path.display()))
}

/// Reads per-attribute expert knowledge scores from a JSON array file.
pub fn read_expert_scores(path: &Path) -> anyhow::Result<Vec<f64>> {
    util::read_json_file("expert knowledge", path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_raw_data_splits_header_and_rows() {
        let dir = std::env::temp_dir().join("oxiclass-data-test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("train.txt");
        fs::write(&path, "A0\tA1\tClass\na\tx\t0\nb\ty\t1\n\n").unwrap();

        let raw = read_raw_data(&path).unwrap();
        assert_eq!(raw.header, vec!["A0", "A1", "Class"]);
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.rows[1], vec!["b", "y", "1"]);
    }

    #[test]
    fn test_missing_dataset_file_carries_its_path() {
        let err = read_raw_data(Path::new("does-not-exist.txt")).unwrap_err();
        assert!(err.to_string().contains("does-not-exist.txt"));
    }
}
