//! Canonical class and indicator names.
//!
//! A fitted model may arrive without metadata, or with only some names
//! filled in. The fallback sequence is total: every index has a name
//! (`Class_1..Class_K`, `Test1..TestM`), independent of how a container
//! represents a missing entry.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One of the two named axes of the outcome-probability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Rows: latent classes.
    Class,
    /// Columns: binary indicators (tests).
    Indicator,
}

impl Axis {
    /// Fallback name for position `index` on this axis.
    pub fn fallback_name(self, index: usize) -> String {
        match self {
            Axis::Class => class_name(index),
            Axis::Indicator => indicator_name(index),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Class => write!(f, "class"),
            Axis::Indicator => write!(f, "indicator"),
        }
    }
}

/// Default class name for a zero-based index: `Class_1`, `Class_2`, ...
pub fn class_name(index: usize) -> String {
    format!("Class_{}", index + 1)
}

/// Default indicator name for a zero-based index: `Test1`, `Test2`, ...
pub fn indicator_name(index: usize) -> String {
    format!("Test{}", index + 1)
}

/// Bijective name <-> position mapping for one matrix axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIndex {
    axis: Axis,
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl NameIndex {
    /// Build from explicit names, rejecting empty and duplicate entries.
    pub fn from_names<I, S>(axis: Axis, names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut positions = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ValidationError::EmptyName { axis, index });
            }
            if positions.insert(name.clone(), index).is_some() {
                return Err(ValidationError::DuplicateName {
                    axis,
                    name: name.clone(),
                });
            }
        }
        Ok(Self {
            axis,
            names,
            positions,
        })
    }

    /// The full fallback sequence of length `len`.
    pub fn fallback(axis: Axis, len: usize) -> Self {
        let names: Vec<String> = (0..len).map(|i| axis.fallback_name(i)).collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            axis,
            names,
            positions,
        }
    }

    /// Resolve metadata of length `len` into a complete index.
    ///
    /// A missing list yields the fallback sequence; a `None` entry inside a
    /// supplied list takes the fallback name for its position. A supplied
    /// list of the wrong length is a `ShapeMismatch`.
    pub fn resolve(
        axis: Axis,
        len: usize,
        supplied: Option<&[Option<String>]>,
    ) -> Result<Self, ValidationError> {
        let Some(supplied) = supplied else {
            return Ok(Self::fallback(axis, len));
        };
        if supplied.len() != len {
            return Err(ValidationError::ShapeMismatch {
                axis,
                expected: len,
                actual: supplied.len(),
            });
        }
        let names = supplied
            .iter()
            .enumerate()
            .map(|(i, name)| name.clone().unwrap_or_else(|| axis.fallback_name(i)));
        Self::from_names(axis, names)
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of `name`, if known.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Name at `index`, if in range.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}
