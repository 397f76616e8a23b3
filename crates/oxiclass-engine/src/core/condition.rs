use serde::{Deserialize, Serialize};

use super::AttributeValue;

/// The specified form of a single attribute within a rule condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionElem {
    /// A discrete attribute must equal this state.
    Value(String),
    /// A continuous attribute must fall strictly inside this interval.
    Interval { low: f64, high: f64 },
}

impl ConditionElem {
    /// Whether a single attribute state satisfies this element.
    ///
    /// Missing values satisfy every element, so a rule never fails to match
    /// because of absent data.
    #[must_use]
    pub fn matches(&self, value: &AttributeValue) -> bool {
        match (self, value) {
            (_, AttributeValue::Missing) => true,
            (Self::Value(want), AttributeValue::Discrete(got)) => want == got,
            (Self::Interval { low, high }, AttributeValue::Continuous(got)) => {
                *low < *got && *got < *high
            }
            (Self::Value(_), AttributeValue::Continuous(_))
            | (Self::Interval { .. }, AttributeValue::Discrete(_)) => false,
        }
    }
}

/// A rule condition: the set of specified attributes and, in parallel, the
/// element each one must satisfy.
///
/// Attributes absent from the condition are wildcards. The two vectors always
/// have the same length and the pairing by position is the load-bearing
/// invariant of every operator that edits a condition.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RuleCondition {
    specified: Vec<usize>,
    elems: Vec<ConditionElem>,
}

impl RuleCondition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_parts(specified: Vec<usize>, elems: Vec<ConditionElem>) -> Self {
        assert_eq!(specified.len(), elems.len());
        Self { specified, elems }
    }

    /// Number of specified attributes.
    #[must_use]
    pub fn specificity(&self) -> usize {
        self.specified.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specified.is_empty()
    }

    #[must_use]
    pub fn specified_attributes(&self) -> &[usize] {
        &self.specified
    }

    #[must_use]
    pub fn elements(&self) -> &[ConditionElem] {
        &self.elems
    }

    /// Position of an attribute within the parallel vectors.
    #[must_use]
    pub fn position(&self, attribute: usize) -> Option<usize> {
        self.specified.iter().position(|&a| a == attribute)
    }

    #[must_use]
    pub fn contains(&self, attribute: usize) -> bool {
        self.position(attribute).is_some()
    }

    #[must_use]
    pub fn element_for(&self, attribute: usize) -> Option<&ConditionElem> {
        self.position(attribute).map(|i| &self.elems[i])
    }

    pub fn element_for_mut(&mut self, attribute: usize) -> Option<&mut ConditionElem> {
        self.position(attribute).map(|i| &mut self.elems[i])
    }

    pub fn push(&mut self, attribute: usize, elem: ConditionElem) {
        debug_assert!(!self.contains(attribute));
        self.specified.push(attribute);
        self.elems.push(elem);
    }

    /// Generalizes an attribute back to a wildcard, returning its element.
    pub fn remove(&mut self, attribute: usize) -> Option<ConditionElem> {
        let index = self.position(attribute)?;
        self.specified.remove(index);
        Some(self.elems.remove(index))
    }

    /// Whether every specified element is satisfied by the given state.
    #[must_use]
    pub fn matches(&self, state: &[AttributeValue]) -> bool {
        self.specified
            .iter()
            .zip(&self.elems)
            .all(|(&attribute, elem)| elem.matches(&state[attribute]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ConditionElem)> + '_ {
        self.specified.iter().copied().zip(&self.elems)
    }
}

/// Conditions are sets: two conditions are equal when they specify the same
/// attributes with the same elements, regardless of insertion order.
impl PartialEq for RuleCondition {
    fn eq(&self, other: &Self) -> bool {
        self.specified.len() == other.specified.len()
            && self
                .iter()
                .all(|(attribute, elem)| other.element_for(attribute) == Some(elem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(low: f64, high: f64) -> ConditionElem {
        ConditionElem::Interval { low, high }
    }

    fn value(s: &str) -> ConditionElem {
        ConditionElem::Value(s.to_owned())
    }

    #[test]
    fn test_interval_match_is_strict() {
        let elem = interval(0.2, 0.8);
        assert!(elem.matches(&AttributeValue::Continuous(0.5)));
        assert!(!elem.matches(&AttributeValue::Continuous(0.2)));
        assert!(!elem.matches(&AttributeValue::Continuous(0.8)));
    }

    #[test]
    fn test_missing_matches_everything() {
        assert!(interval(0.0, 1.0).matches(&AttributeValue::Missing));
        assert!(value("x").matches(&AttributeValue::Missing));
    }

    #[test]
    fn test_condition_matches_over_wildcards() {
        let mut condition = RuleCondition::new();
        condition.push(1, value("a"));
        condition.push(3, interval(-1.0, 1.0));

        let state = vec![
            AttributeValue::Discrete("ignored".to_owned()),
            AttributeValue::Discrete("a".to_owned()),
            AttributeValue::Missing,
            AttributeValue::Continuous(0.0),
        ];
        assert!(condition.matches(&state));

        let mismatched = vec![
            AttributeValue::Discrete("ignored".to_owned()),
            AttributeValue::Discrete("b".to_owned()),
            AttributeValue::Missing,
            AttributeValue::Continuous(0.0),
        ];
        assert!(!condition.matches(&mismatched));
    }

    #[test]
    fn test_equality_ignores_order() {
        let mut a = RuleCondition::new();
        a.push(0, value("x"));
        a.push(2, interval(0.0, 1.0));

        let mut b = RuleCondition::new();
        b.push(2, interval(0.0, 1.0));
        b.push(0, value("x"));

        assert_eq!(a, b);

        let mut c = RuleCondition::new();
        c.push(0, value("x"));
        c.push(2, interval(0.0, 2.0));
        assert_ne!(a, c);
    }

    #[test]
    fn test_remove_keeps_vectors_in_step() {
        let mut condition = RuleCondition::new();
        condition.push(0, value("x"));
        condition.push(1, value("y"));
        condition.push(2, value("z"));

        assert_eq!(condition.remove(1), Some(value("y")));
        assert_eq!(condition.specified_attributes(), &[0, 2]);
        assert_eq!(condition.element_for(2), Some(&value("z")));
        assert_eq!(condition.remove(1), None);
    }
}
