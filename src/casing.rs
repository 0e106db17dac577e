//! Column name casing.
//!
//! Rewrites driver column names into the header entries and map keys
//! produced by the projection functions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// How column names are rewritten before they become headers or map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CasingMode {
    /// Lowercase every character.
    #[default]
    Lower,
    /// Uppercase every character.
    Upper,
    /// `USER_ID` becomes `userId`.
    Camel,
    /// Any other mode name. Every column maps to the empty string.
    ///
    /// Kept for compatibility with callers that pass free-form mode strings;
    /// map results collapse to a single `""` key in this mode.
    Unrecognized(String),
}

impl CasingMode {
    /// Returns the mode name as written in configuration.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Camel => "camel",
            Self::Unrecognized(name) => name,
        }
    }

    /// Parses a mode name. Never fails; unknown names become `Unrecognized`.
    pub fn parse(s: &str) -> Self {
        match s {
            "lower" => Self::Lower,
            "upper" => Self::Upper,
            "camel" => Self::Camel,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// Returns true for `lower`, `upper` and `camel`.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Applies this mode to a single column name.
    pub fn apply(&self, name: &str) -> String {
        match self {
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase(),
            Self::Camel => to_camel(name),
            Self::Unrecognized(_) => String::new(),
        }
    }

    /// Applies this mode to every column, preserving order.
    pub fn apply_all<S: AsRef<str>>(&self, columns: &[S]) -> Vec<String> {
        columns.iter().map(|c| self.apply(c.as_ref())).collect()
    }
}

impl fmt::Display for CasingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CasingMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for CasingMode {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for CasingMode {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl Serialize for CasingMode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CasingMode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// Converts a snake_case (or SHOUTY_SNAKE) name to lowerCamelCase.
///
/// The whole name is lowercased, split on `_`, and every segment after the
/// first has its first character uppercased. Empty segments contribute
/// nothing, so `a__b` becomes `aB`.
pub fn to_camel(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut out = String::with_capacity(lowered.len());

    for (i, segment) in lowered.split('_').enumerate() {
        if i == 0 {
            out.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }

    out
}
