//! Subject identity and binary test results.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Caller-owned subject identifier used to key results.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        SubjectId(id.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        SubjectId(id)
    }
}

/// One subject's test results keyed by indicator name.
///
/// A key mapped to `None` records a test whose value is genuinely missing;
/// an absent key means the test is not part of the record at all. The
/// record may cover any subset of a model's indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SubjectRecord {
    pub id: SubjectId,
    pub results: BTreeMap<String, Option<u8>>,
}

impl SubjectRecord {
    pub fn new(id: impl Into<SubjectId>) -> Self {
        Self {
            id: id.into(),
            results: BTreeMap::new(),
        }
    }

    /// Build from indicator names and 0/1 values given in the same order.
    pub fn from_pattern<I, S>(id: impl Into<SubjectId>, names: I, values: &[u8]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let results = names
            .into_iter()
            .zip(values.iter())
            .map(|(name, value)| (name.into(), Some(*value)))
            .collect();
        Self {
            id: id.into(),
            results,
        }
    }

    /// Record an observed value.
    pub fn with_result(mut self, indicator: impl Into<String>, value: u8) -> Self {
        self.results.insert(indicator.into(), Some(value));
        self
    }

    /// Record a test that was requested but has no usable value.
    pub fn with_missing(mut self, indicator: impl Into<String>) -> Self {
        self.results.insert(indicator.into(), None);
        self
    }

    /// Lookup: `None` if the key is absent, `Some(None)` if the value is missing.
    pub fn get(&self, indicator: &str) -> Option<Option<u8>> {
        self.results.get(indicator).copied()
    }
}
