use serde::{Deserialize, Serialize};

/// A single attribute state observed in a data row.
///
/// Discrete states keep their raw textual form; continuous states are parsed
/// to `f64` during dataset characterization. Missing values match every rule
/// condition and are never specified by covering or mutation.
#[derive(Debug, Clone, PartialEq, derive_more::IsVariant, Serialize, Deserialize)]
pub enum AttributeValue {
    /// The value was absent in the source data.
    Missing,
    /// A categorical state, kept as its raw textual form.
    Discrete(String),
    /// A numeric state of a continuous-valued attribute.
    Continuous(f64),
}

impl AttributeValue {
    #[must_use]
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Self::Continuous(value) => Some(*value),
            Self::Missing | Self::Discrete(_) => None,
        }
    }

    #[must_use]
    pub fn as_discrete(&self) -> Option<&str> {
        match self {
            Self::Discrete(value) => Some(value),
            Self::Missing | Self::Continuous(_) => None,
        }
    }
}

/// One labeled data row: an attribute state per dataset column plus the class
/// label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    state: Vec<AttributeValue>,
    phenotype: String,
}

impl Instance {
    #[must_use]
    pub fn new(state: Vec<AttributeValue>, phenotype: impl Into<String>) -> Self {
        Self {
            state,
            phenotype: phenotype.into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &[AttributeValue] {
        &self.state
    }

    #[must_use]
    pub fn attribute(&self, index: usize) -> &AttributeValue {
        &self.state[index]
    }

    #[must_use]
    pub fn phenotype(&self) -> &str {
        &self.phenotype
    }
}
