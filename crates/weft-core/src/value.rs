//! Typed metadata values.
//!
//! Frontmatter and static extraction both produce maps of [`MetaValue`].
//! The variants cover everything the source dialect can express: quoted
//! strings, bare numbers, ISO dates, and bracketed string lists.

use chrono::NaiveDate;
use serde::Serialize;

/// A single metadata value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    /// Free text.
    Text(String),
    /// Numeric scalar.
    Number(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// List of strings (e.g. tags).
    List(Vec<String>),
}

impl MetaValue {
    /// Returns the text content, if this is a [`MetaValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value, if this is a [`MetaValue::Number`].
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the date, if this is a [`MetaValue::Date`].
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the list items, if this is a [`MetaValue::List`].
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for MetaValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}
