//! Tab-separated population snapshot files.
//!
//! One macro classifier per row, 16 columns in fixed order, preceded by a
//! header line naming them. List-valued cells are bracketed and
//! space-separated; interval elements nest as `[low high]`. A written
//! snapshot parses back into an equivalent population, which is what the
//! `--reboot`, `evaluate`, and `compact` flows rely on.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write as _},
    path::Path,
    str::FromStr,
};

use anyhow::Context as _;
use oxiclass_engine::{ClassifierSnapshot, ConditionElem, RuleCondition};

pub const COLUMNS: [&str; 16] = [
    "specified",
    "condition",
    "phenotype",
    "fitness",
    "accuracy",
    "numerosity",
    "ave_match_set_size",
    "time_stamp_ga",
    "init_time_stamp",
    "specificity",
    "deletion_vote",
    "correct_count",
    "match_count",
    "correct_cover",
    "match_cover",
    "epoch_complete",
];

/// A snapshot file could not be interpreted.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SnapshotError {
    #[display("snapshot has no header line")]
    MissingHeader,
    #[display("snapshot header names unexpected columns")]
    HeaderMismatch,
    #[display("line {line}: expected {expected} columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[display("line {line}, column {column}: invalid value {value:?}")]
    InvalidValue {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[display("line {line}: {specified} specified attributes but {elements} condition elements")]
    ConditionMismatch {
        line: usize,
        specified: usize,
        elements: usize,
    },
}

pub fn write_snapshot<W: io::Write>(
    writer: &mut W,
    snapshots: &[ClassifierSnapshot],
) -> io::Result<()> {
    writeln!(writer, "{}", COLUMNS.join("\t"))?;
    for snapshot in snapshots {
        writeln!(writer, "{}", render_row(snapshot))?;
    }
    Ok(())
}

pub fn write_snapshot_file(path: &Path, snapshots: &[ClassifierSnapshot]) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create snapshot file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_snapshot(&mut writer, snapshots)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write population snapshot: {}", path.display()))
}

pub fn read_snapshot_file(path: &Path) -> anyhow::Result<Vec<ClassifierSnapshot>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read population snapshot: {}", path.display()))?;
    let snapshots = parse_snapshot(&text)
        .with_context(|| format!("Failed to parse population snapshot: {}", path.display()))?;
    Ok(snapshots)
}

pub fn parse_snapshot(text: &str) -> Result<Vec<ClassifierSnapshot>, SnapshotError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let (_, header) = lines.next().ok_or(SnapshotError::MissingHeader)?;
    if header.split('\t').ne(COLUMNS) {
        return Err(SnapshotError::HeaderMismatch);
    }
    lines
        .map(|(index, line)| parse_row(index + 1, line))
        .collect()
}

fn render_row(snapshot: &ClassifierSnapshot) -> String {
    let specified = render_list(
        snapshot
            .condition
            .specified_attributes()
            .iter()
            .map(ToString::to_string),
    );
    let condition = render_list(snapshot.condition.elements().iter().map(render_elem));
    let deletion_vote = snapshot
        .deletion_vote
        .map_or_else(|| "None".to_owned(), |vote| vote.to_string());
    [
        specified,
        condition,
        snapshot.phenotype.clone(),
        snapshot.fitness.to_string(),
        snapshot.accuracy.to_string(),
        snapshot.numerosity.to_string(),
        snapshot.ave_match_set_size.to_string(),
        snapshot.time_stamp_ga.to_string(),
        snapshot.init_time_stamp.to_string(),
        snapshot.specificity.to_string(),
        deletion_vote,
        snapshot.correct_count.to_string(),
        snapshot.match_count.to_string(),
        snapshot.correct_cover.to_string(),
        snapshot.match_cover.to_string(),
        u8::from(snapshot.epoch_complete).to_string(),
    ]
    .join("\t")
}

fn render_list(items: impl Iterator<Item = String>) -> String {
    format!("[{}]", items.collect::<Vec<_>>().join(" "))
}

fn render_elem(elem: &ConditionElem) -> String {
    match elem {
        ConditionElem::Value(state) => state.clone(),
        ConditionElem::Interval { low, high } => format!("[{low} {high}]"),
    }
}

fn parse_row(line: usize, text: &str) -> Result<ClassifierSnapshot, SnapshotError> {
    let cells: Vec<&str> = text.split('\t').collect();
    if cells.len() != COLUMNS.len() {
        return Err(SnapshotError::ColumnCount {
            line,
            expected: COLUMNS.len(),
            found: cells.len(),
        });
    }

    let specified = parse_specified(line, cells[0])?;
    let elements = parse_elements(line, cells[1])?;
    if specified.len() != elements.len() {
        return Err(SnapshotError::ConditionMismatch {
            line,
            specified: specified.len(),
            elements: elements.len(),
        });
    }

    Ok(ClassifierSnapshot {
        condition: RuleCondition::from_parts(specified, elements),
        phenotype: cells[2].to_owned(),
        fitness: parse_cell(line, "fitness", cells[3])?,
        accuracy: parse_cell(line, "accuracy", cells[4])?,
        numerosity: parse_cell(line, "numerosity", cells[5])?,
        ave_match_set_size: parse_cell(line, "ave_match_set_size", cells[6])?,
        time_stamp_ga: parse_cell(line, "time_stamp_ga", cells[7])?,
        init_time_stamp: parse_cell(line, "init_time_stamp", cells[8])?,
        specificity: parse_cell(line, "specificity", cells[9])?,
        deletion_vote: parse_deletion_vote(line, cells[10])?,
        correct_count: parse_cell(line, "correct_count", cells[11])?,
        match_count: parse_cell(line, "match_count", cells[12])?,
        correct_cover: parse_cell(line, "correct_cover", cells[13])?,
        match_cover: parse_cell(line, "match_cover", cells[14])?,
        epoch_complete: parse_flag(line, cells[15])?,
    })
}

fn parse_cell<T: FromStr>(
    line: usize,
    column: &'static str,
    value: &str,
) -> Result<T, SnapshotError> {
    value
        .parse()
        .map_err(|_| invalid(line, column, value))
}

fn invalid(line: usize, column: &'static str, value: &str) -> SnapshotError {
    SnapshotError::InvalidValue {
        line,
        column,
        value: value.to_owned(),
    }
}

fn strip_brackets<'a>(
    line: usize,
    column: &'static str,
    value: &'a str,
) -> Result<&'a str, SnapshotError> {
    value
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .ok_or_else(|| invalid(line, column, value))
}

fn parse_specified(line: usize, value: &str) -> Result<Vec<usize>, SnapshotError> {
    strip_brackets(line, "specified", value)?
        .split_whitespace()
        .map(|token| parse_cell(line, "specified", token))
        .collect()
}

fn parse_elements(line: usize, value: &str) -> Result<Vec<ConditionElem>, SnapshotError> {
    let inner = strip_brackets(line, "condition", value)?;
    let mut tokens = inner.split_whitespace();
    let mut elems = Vec::new();
    while let Some(token) = tokens.next() {
        if let Some(low) = token.strip_prefix('[') {
            let high = tokens
                .next()
                .and_then(|token| token.strip_suffix(']'))
                .ok_or_else(|| invalid(line, "condition", value))?;
            elems.push(ConditionElem::Interval {
                low: parse_cell(line, "condition", low)?,
                high: parse_cell(line, "condition", high)?,
            });
        } else {
            elems.push(ConditionElem::Value(token.to_owned()));
        }
    }
    Ok(elems)
}

fn parse_deletion_vote(line: usize, value: &str) -> Result<Option<f64>, SnapshotError> {
    if value == "None" {
        return Ok(None);
    }
    parse_cell(line, "deletion_vote", value).map(Some)
}

fn parse_flag(line: usize, value: &str) -> Result<bool, SnapshotError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(invalid(line, "epoch_complete", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discrete_rule() -> ClassifierSnapshot {
        let mut condition = RuleCondition::new();
        condition.push(0, ConditionElem::Value("a".to_owned()));
        condition.push(2, ConditionElem::Value("x".to_owned()));
        ClassifierSnapshot {
            condition,
            phenotype: "0".to_owned(),
            fitness: 0.81,
            accuracy: 0.9,
            numerosity: 3,
            ave_match_set_size: 4.5,
            time_stamp_ga: 120,
            init_time_stamp: 40,
            specificity: 0.5,
            deletion_vote: None,
            correct_count: 18,
            match_count: 20,
            correct_cover: 9,
            match_cover: 10,
            epoch_complete: false,
        }
    }

    fn interval_rule() -> ClassifierSnapshot {
        let mut condition = RuleCondition::new();
        condition.push(1, ConditionElem::Interval { low: 0.25, high: 0.75 });
        ClassifierSnapshot {
            condition,
            phenotype: "1".to_owned(),
            fitness: 0.5,
            accuracy: 0.7,
            numerosity: 1,
            ave_match_set_size: 2.0,
            time_stamp_ga: 10,
            init_time_stamp: 0,
            specificity: 0.25,
            deletion_vote: Some(0.125),
            correct_count: 7,
            match_count: 10,
            correct_cover: 7,
            match_cover: 10,
            epoch_complete: true,
        }
    }

    #[test]
    fn test_snapshot_round_trip_reproduces_every_column() {
        let rules = vec![discrete_rule(), interval_rule()];
        let mut buffer = Vec::new();
        write_snapshot(&mut buffer, &rules).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("specified\tcondition"));
        assert_eq!(parse_snapshot(&text).unwrap(), rules);
    }

    #[test]
    fn test_list_cells_use_bracketed_rendering() {
        let mut buffer = Vec::new();
        write_snapshot(&mut buffer, &[discrete_rule(), interval_rule()]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert!(rows[0].starts_with("[0 2]\t[a x]\t0\t"));
        assert!(rows[1].starts_with("[1]\t[[0.25 0.75]]\t1\t"));
    }

    #[test]
    fn test_wrong_column_count_is_rejected_with_line_number() {
        let text = format!("{}\n[0]\ta\t0\n", COLUMNS.join("\t"));
        let err = parse_snapshot(&text).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::ColumnCount {
                line: 2,
                expected: 16,
                found: 3
            }
        ));
    }

    #[test]
    fn test_unexpected_header_is_rejected() {
        let err = parse_snapshot("not\ta\tsnapshot\n").unwrap_err();
        assert!(matches!(err, SnapshotError::HeaderMismatch));
    }

    #[test]
    fn test_condition_and_specified_lengths_must_agree() {
        let mut buffer = Vec::new();
        write_snapshot(&mut buffer, &[discrete_rule()]).unwrap();
        let text = String::from_utf8(buffer).unwrap().replace("[a x]", "[a]");
        let err = parse_snapshot(&text).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::ConditionMismatch {
                line: 2,
                specified: 2,
                elements: 1
            }
        ));
    }

    #[test]
    fn test_epoch_flag_must_be_binary() {
        let mut buffer = Vec::new();
        write_snapshot(&mut buffer, &[discrete_rule()]).unwrap();
        let mut text = String::from_utf8(buffer).unwrap();
        text = text.trim_end().trim_end_matches('0').to_owned() + "yes\n";
        let err = parse_snapshot(&text).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::InvalidValue {
                column: "epoch_complete",
                ..
            }
        ));
    }
}
