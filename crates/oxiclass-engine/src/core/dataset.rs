use std::collections::BTreeSet;

use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use super::{AttributeValue, Instance, LcsParameters};

/// Characterized form of a single dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeInfo {
    /// A categorical column and its distinct observed states.
    Discrete { states: Vec<String> },
    /// A numeric column and its observed training range.
    Continuous { low: f64, high: f64 },
}

impl AttributeInfo {
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        matches!(self, Self::Continuous { .. })
    }

    /// Observed training range of a continuous column.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Continuous { low, high } => Some((*low, *high)),
            Self::Discrete { .. } => None,
        }
    }
}

/// Untyped tabular data as read from a file: one header row plus cell rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawData {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A characterized dataset: typed train/test instances plus the metadata the
/// learning loop needs (attribute types and ranges, class list and weights,
/// and the derived rule specificity limit).
#[derive(Debug, Clone)]
pub struct Dataset {
    attribute_names: Vec<String>,
    attributes: Vec<AttributeInfo>,
    train: Vec<Instance>,
    train_ids: Vec<String>,
    test: Vec<Instance>,
    phenotype_list: Vec<String>,
    class_weights: Vec<f64>,
    average_state_count: f64,
    spec_limit: usize,
}

impl Dataset {
    /// Characterizes raw tabular data into a typed dataset.
    ///
    /// Column types, continuous ranges, the class list, and the specificity
    /// limit are all derived from the training rows; testing rows are typed
    /// against that characterization. Rows whose class cell is missing are
    /// dropped from both partitions.
    pub fn from_raw(
        train: &RawData,
        test: Option<&RawData>,
        params: &LcsParameters,
    ) -> Result<Self, DatasetError> {
        let layout = ColumnLayout::discover(&train.header, params)?;
        if let Some(test) = test {
            if test.header != train.header {
                return Err(DatasetError::HeaderMismatch);
            }
        }

        let attribute_names = layout.attribute_names(&train.header);
        let attributes = characterize_attributes(&layout, train, params)?;

        let (train_instances, train_ids) =
            type_rows(&layout, &attributes, train, params, &attribute_names)?;
        if train_instances.is_empty() {
            return Err(DatasetError::EmptyTrainingSet);
        }
        let test_instances = match test {
            Some(test) => type_rows(&layout, &attributes, test, params, &attribute_names)?.0,
            None => Vec::new(),
        };

        let phenotype_list = discover_classes(&layout, train, params)?;
        let class_weights = class_weights(&phenotype_list, &train_instances);

        let average_state_count = average_state_count(&attributes);
        let spec_limit = derive_spec_limit(
            average_state_count,
            train_instances.len(),
            attributes.len(),
            params.spec_limit_override,
        );

        Ok(Self {
            attribute_names,
            attributes,
            train: train_instances,
            train_ids,
            test: test_instances,
            phenotype_list,
            class_weights,
            average_state_count,
            spec_limit,
        })
    }

    #[must_use]
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn num_train_instances(&self) -> usize {
        self.train.len()
    }

    #[must_use]
    pub fn num_test_instances(&self) -> usize {
        self.test.len()
    }

    #[must_use]
    pub fn attribute(&self, index: usize) -> &AttributeInfo {
        &self.attributes[index]
    }

    #[must_use]
    pub fn attribute_name(&self, index: usize) -> &str {
        &self.attribute_names[index]
    }

    #[must_use]
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    #[must_use]
    pub fn train_instances(&self) -> &[Instance] {
        &self.train
    }

    #[must_use]
    pub fn train_instance(&self, index: usize) -> &Instance {
        &self.train[index]
    }

    #[must_use]
    pub fn train_id(&self, index: usize) -> &str {
        &self.train_ids[index]
    }

    #[must_use]
    pub fn test_instances(&self) -> &[Instance] {
        &self.test
    }

    /// Distinct class labels in sorted order.
    #[must_use]
    pub fn phenotype_list(&self) -> &[String] {
        &self.phenotype_list
    }

    /// Inverse-frequency weight of a class, `1 - count / total`.
    #[must_use]
    pub fn class_weight(&self, phenotype: &str) -> f64 {
        self.phenotype_list
            .iter()
            .position(|p| p == phenotype)
            .map_or(0.0, |i| self.class_weights[i])
    }

    /// Expected accuracy of uniform random guessing.
    #[must_use]
    pub fn chance_accuracy(&self) -> f64 {
        1.0 / self.phenotype_list.len() as f64
    }

    /// Maximum number of attributes a single rule may specify.
    #[must_use]
    pub fn spec_limit(&self) -> usize {
        self.spec_limit
    }

    #[must_use]
    pub fn average_state_count(&self) -> f64 {
        self.average_state_count
    }

    #[must_use]
    pub fn has_continuous_attributes(&self) -> bool {
        self.attributes.iter().any(AttributeInfo::is_continuous)
    }

    /// Shuffles the training partition, keeping instance ids in step.
    pub fn shuffle_training<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.train.len()).collect();
        order.shuffle(rng);
        self.train = order.iter().map(|&i| self.train[i].clone()).collect();
        self.train_ids = order.iter().map(|&i| self.train_ids[i].clone()).collect();
    }
}

/// Positions of the class and optional id columns within the raw header.
struct ColumnLayout {
    phenotype_column: usize,
    id_column: Option<usize>,
}

impl ColumnLayout {
    fn discover(header: &[String], params: &LcsParameters) -> Result<Self, DatasetError> {
        let phenotype_column = header
            .iter()
            .position(|h| *h == params.phenotype_label)
            .ok_or_else(|| DatasetError::PhenotypeColumnNotFound {
                label: params.phenotype_label.clone(),
            })?;
        let id_column = header.iter().position(|h| *h == params.instance_id_label);
        Ok(Self {
            phenotype_column,
            id_column,
        })
    }

    fn is_attribute(&self, column: usize) -> bool {
        column != self.phenotype_column && Some(column) != self.id_column
    }

    fn attribute_names(&self, header: &[String]) -> Vec<String> {
        header
            .iter()
            .enumerate()
            .filter(|&(i, _)| self.is_attribute(i))
            .map(|(_, name)| name.clone())
            .collect()
    }

    fn attribute_columns<'a>(
        &'a self,
        row: &'a [String],
    ) -> impl Iterator<Item = &'a String> + 'a {
        row.iter()
            .enumerate()
            .filter(|&(i, _)| self.is_attribute(i))
            .map(|(_, cell)| cell)
    }
}

fn check_row_widths(data: &RawData) -> Result<(), DatasetError> {
    for (row_index, row) in data.rows.iter().enumerate() {
        if row.len() != data.header.len() {
            return Err(DatasetError::RaggedRow {
                row: row_index,
                expected: data.header.len(),
                found: row.len(),
            });
        }
    }
    Ok(())
}

fn characterize_attributes(
    layout: &ColumnLayout,
    train: &RawData,
    params: &LcsParameters,
) -> Result<Vec<AttributeInfo>, DatasetError> {
    check_row_widths(train)?;

    let usable: Vec<&Vec<String>> = train
        .rows
        .iter()
        .filter(|row| row[layout.phenotype_column] != params.missing_label)
        .collect();

    let mut infos = Vec::new();
    for (column, name) in train
        .header
        .iter()
        .enumerate()
        .filter(|&(i, _)| layout.is_attribute(i))
    {
        let distinct: BTreeSet<&String> = usable
            .iter()
            .map(|row| &row[column])
            .filter(|cell| **cell != params.missing_label)
            .collect();

        if distinct.len() <= params.discrete_attribute_limit {
            infos.push(AttributeInfo::Discrete {
                states: distinct.into_iter().cloned().collect(),
            });
        } else {
            let mut low = f64::INFINITY;
            let mut high = f64::NEG_INFINITY;
            for cell in distinct {
                let value = cell
                    .parse::<f64>()
                    .map_err(|_| DatasetError::InvalidNumber {
                        column: name.clone(),
                        value: cell.clone(),
                    })?;
                low = low.min(value);
                high = high.max(value);
            }
            infos.push(AttributeInfo::Continuous { low, high });
        }
    }
    Ok(infos)
}

fn type_rows(
    layout: &ColumnLayout,
    attributes: &[AttributeInfo],
    data: &RawData,
    params: &LcsParameters,
    attribute_names: &[String],
) -> Result<(Vec<Instance>, Vec<String>), DatasetError> {
    check_row_widths(data)?;

    let mut instances = Vec::new();
    let mut ids = Vec::new();
    for (row_index, row) in data.rows.iter().enumerate() {
        let phenotype = &row[layout.phenotype_column];
        if *phenotype == params.missing_label {
            continue;
        }

        let mut state = Vec::with_capacity(attributes.len());
        for (attribute, cell) in layout.attribute_columns(row).enumerate() {
            if *cell == params.missing_label {
                state.push(AttributeValue::Missing);
            } else {
                match &attributes[attribute] {
                    AttributeInfo::Discrete { .. } => {
                        state.push(AttributeValue::Discrete(cell.clone()));
                    }
                    AttributeInfo::Continuous { .. } => {
                        let value =
                            cell.parse::<f64>()
                                .map_err(|_| DatasetError::InvalidNumber {
                                    column: attribute_names[attribute].clone(),
                                    value: cell.clone(),
                                })?;
                        state.push(AttributeValue::Continuous(value));
                    }
                }
            }
        }
        instances.push(Instance::new(state, phenotype.clone()));
        ids.push(match layout.id_column {
            Some(column) => row[column].clone(),
            None => row_index.to_string(),
        });
    }
    Ok((instances, ids))
}

fn discover_classes(
    layout: &ColumnLayout,
    train: &RawData,
    params: &LcsParameters,
) -> Result<Vec<String>, DatasetError> {
    let distinct: BTreeSet<&String> = train
        .rows
        .iter()
        .map(|row| &row[layout.phenotype_column])
        .filter(|cell| **cell != params.missing_label)
        .collect();

    // A class column with more distinct labels than the discrete limit is
    // treated as a continuous endpoint, which this system does not learn.
    if distinct.len() > params.discrete_attribute_limit {
        return Err(DatasetError::ContinuousPhenotype);
    }
    Ok(distinct.into_iter().cloned().collect())
}

fn class_weights(phenotype_list: &[String], train: &[Instance]) -> Vec<f64> {
    let total = train.len() as f64;
    phenotype_list
        .iter()
        .map(|phenotype| {
            let count = train.iter().filter(|i| i.phenotype() == phenotype).count();
            1.0 - count as f64 / total
        })
        .collect()
}

fn average_state_count(attributes: &[AttributeInfo]) -> f64 {
    let sum: f64 = attributes
        .iter()
        .map(|info| match info {
            AttributeInfo::Discrete { states } => states.len() as f64,
            AttributeInfo::Continuous { .. } => 2.0,
        })
        .sum();
    sum / attributes.len() as f64
}

/// Smallest power of the average state count that covers the training set,
/// capped at the attribute count. An explicit override wins outright.
fn derive_spec_limit(
    average_state_count: f64,
    num_train: usize,
    num_attributes: usize,
    spec_limit_override: Option<usize>,
) -> usize {
    if let Some(limit) = spec_limit_override {
        return limit;
    }
    let mut exponent = 1;
    while average_state_count.powi(exponent) < num_train as f64
        && (exponent as usize) < num_attributes
    {
        exponent += 1;
    }
    (exponent as usize).min(num_attributes)
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("class column '{label}' not found in header")]
    PhenotypeColumnNotFound { label: String },
    #[display("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[display("column '{column}' looks continuous but value '{value}' is not a number")]
    InvalidNumber { column: String, value: String },
    #[display("class column appears continuous; only discrete classes are supported")]
    ContinuousPhenotype,
    #[display("training and testing headers differ")]
    HeaderMismatch,
    #[display("no usable training rows after dropping missing-class rows")]
    EmptyTrainingSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(header: &[&str], rows: &[&[&str]]) -> RawData {
        RawData {
            header: header.iter().map(|s| (*s).to_owned()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|s| (*s).to_owned()).collect())
                .collect(),
        }
    }

    fn small_params() -> LcsParameters {
        LcsParameters {
            discrete_attribute_limit: 3,
            ..LcsParameters::default()
        }
    }

    #[test]
    fn test_discrete_and_continuous_columns() {
        let train = raw(
            &["A0", "A1", "Class"],
            &[
                &["x", "0.1", "0"],
                &["y", "0.9", "1"],
                &["x", "0.4", "0"],
                &["z", "2.5", "1"],
                &["y", "1.5", "0"],
            ],
        );
        let dataset = Dataset::from_raw(&train, None, &small_params()).unwrap();

        assert_eq!(dataset.num_attributes(), 2);
        assert_eq!(
            dataset.attribute(0),
            &AttributeInfo::Discrete {
                states: vec!["x".to_owned(), "y".to_owned(), "z".to_owned()],
            }
        );
        assert_eq!(dataset.attribute(1).range(), Some((0.1, 2.5)));
        assert_eq!(dataset.phenotype_list(), &["0", "1"]);
        assert!((dataset.chance_accuracy() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_class_weights_are_inverse_frequency() {
        let train = raw(
            &["A0", "Class"],
            &[&["a", "0"], &["b", "0"], &["c", "0"], &["a", "1"]],
        );
        let dataset = Dataset::from_raw(&train, None, &small_params()).unwrap();
        assert!((dataset.class_weight("0") - 0.25).abs() < 1e-12);
        assert!((dataset.class_weight("1") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_missing_class_rows_are_dropped() {
        let train = raw(
            &["A0", "Class"],
            &[&["a", "0"], &["b", "NA"], &["c", "1"]],
        );
        let dataset = Dataset::from_raw(&train, None, &small_params()).unwrap();
        assert_eq!(dataset.num_train_instances(), 2);
    }

    #[test]
    fn test_instance_id_column_is_not_an_attribute() {
        let train = raw(
            &["InstanceID", "A0", "Class"],
            &[&["i1", "a", "0"], &["i2", "b", "1"]],
        );
        let dataset = Dataset::from_raw(&train, None, &small_params()).unwrap();
        assert_eq!(dataset.num_attributes(), 1);
        assert_eq!(dataset.train_id(0), "i1");
        assert_eq!(dataset.train_id(1), "i2");
    }

    #[test]
    fn test_spec_limit_from_average_state_count() {
        // 3 states on average, 5 instances: 3^1 < 5 <= 3^2.
        assert_eq!(derive_spec_limit(3.0, 5, 10, None), 2);
        // Capped at the attribute count.
        assert_eq!(derive_spec_limit(2.0, 1000, 4, None), 4);
        // Override wins.
        assert_eq!(derive_spec_limit(3.0, 5, 10, Some(7)), 7);
    }

    #[test]
    fn test_rejects_missing_class_column() {
        let train = raw(&["A0", "Label"], &[&["a", "0"]]);
        assert!(matches!(
            Dataset::from_raw(&train, None, &small_params()),
            Err(DatasetError::PhenotypeColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_continuous_class_column() {
        let rows: Vec<Vec<String>> = (0..20)
            .map(|i| vec!["a".to_owned(), format!("{}.5", i)])
            .collect();
        let train = RawData {
            header: vec!["A0".to_owned(), "Class".to_owned()],
            rows,
        };
        assert!(matches!(
            Dataset::from_raw(&train, None, &small_params()),
            Err(DatasetError::ContinuousPhenotype)
        ));
    }

    #[test]
    fn test_rejects_header_mismatch_and_ragged_rows() {
        let train = raw(&["A0", "Class"], &[&["a", "0"]]);
        let test = raw(&["A1", "Class"], &[&["a", "0"]]);
        assert!(matches!(
            Dataset::from_raw(&train, Some(&test), &small_params()),
            Err(DatasetError::HeaderMismatch)
        ));

        let ragged = raw(&["A0", "Class"], &[&["a"]]);
        assert!(matches!(
            Dataset::from_raw(&ragged, None, &small_params()),
            Err(DatasetError::RaggedRow { .. })
        ));
    }
}
