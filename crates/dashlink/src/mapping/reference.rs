//! Column references of the form `role`, `role2` or `role[2]`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DashlinkError;

static COLUMN_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<role>[^\[\]]*?)(?:\[(?P<bracket>\d+)\]|(?P<index>\d+))?$")
        .expect("column reference regex is valid")
});

/// Address of one column in a column map.
///
/// Trailing digits are read as the index into a multi-valued role, so
/// `measure2` and `measure[2]` both address the third measure. Role names
/// therefore cannot end in a digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColumnRef {
    role: String,
    index: Option<usize>,
}

impl ColumnRef {
    /// Reference to a single-valued role.
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            index: None,
        }
    }

    /// Reference to one column of a multi-valued role.
    pub fn indexed(role: impl Into<String>, index: usize) -> Self {
        Self {
            role: role.into(),
            index: Some(index),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl FromStr for ColumnRef {
    type Err = DashlinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = COLUMN_REF
            .captures(s.trim())
            .ok_or_else(|| DashlinkError::InvalidColumnRef(s.to_string()))?;

        let role = caps.name("role").map(|m| m.as_str()).unwrap_or_default();
        if role.is_empty() {
            return Err(DashlinkError::InvalidColumnRef(s.to_string()));
        }

        let index = caps
            .name("bracket")
            .or_else(|| caps.name("index"))
            .map(|m| {
                m.as_str()
                    .parse::<usize>()
                    .map_err(|_| DashlinkError::InvalidColumnRef(s.to_string()))
            })
            .transpose()?;

        Ok(Self {
            role: role.to_string(),
            index,
        })
    }
}

impl TryFrom<String> for ColumnRef {
    type Error = DashlinkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColumnRef> for String {
    fn from(value: ColumnRef) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(idx) => write!(f, "{}{}", self.role, idx),
            None => f.write_str(&self.role),
        }
    }
}
