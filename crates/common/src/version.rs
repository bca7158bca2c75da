//! Platform versions with wildcard components.
//!
//! Availability attributes and target settings are `Major.Minor.SubMinor`
//! triples where any component may be unknown. An unknown component compares
//! equal to everything, so `11` matches `11.0.1` and `10.x` matches `10.15`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// A `(major, minor, subminor)` version; `None` components are wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: Option<u32>,
    pub minor: Option<u32>,
    pub subminor: Option<u32>,
}

impl Version {
    /// Fully specified version.
    pub const fn new(major: u32, minor: u32, subminor: u32) -> Self {
        Self {
            major: Some(major),
            minor: Some(minor),
            subminor: Some(subminor),
        }
    }

    /// Version with every component unknown.
    pub const fn unknown() -> Self {
        Self {
            major: None,
            minor: None,
            subminor: None,
        }
    }

    /// True when no component is known.
    pub fn is_unknown(&self) -> bool {
        self.major.is_none() && self.minor.is_none() && self.subminor.is_none()
    }

    /// Wildcard-aware comparison.
    ///
    /// Components are compared left to right. The first pair where either
    /// side is unknown ends the comparison as `Equal`.
    pub fn compare(&self, other: &Self) -> Ordering {
        let pairs = [
            (self.major, other.major),
            (self.minor, other.minor),
            (self.subminor, other.subminor),
        ];
        for (a, b) in pairs {
            match (a, b) {
                (Some(a), Some(b)) => match a.cmp(&b) {
                    Ordering::Equal => {}
                    unequal => return unequal,
                },
                _ => return Ordering::Equal,
            }
        }
        Ordering::Equal
    }

    /// `self > other` under wildcard comparison.
    pub fn is_after(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Greater
    }

    /// `self >= other` under wildcard comparison.
    pub fn is_at_or_after(&self, other: &Self) -> bool {
        self.compare(other) != Ordering::Less
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let component = |c: Option<u32>| c.map_or_else(|| "x".to_string(), |c| c.to_string());
        match (self.major, self.minor, self.subminor) {
            (None, None, None) => write!(f, "unknown"),
            (major, None, None) => write!(f, "{}", component(major)),
            (major, minor, None) => write!(f, "{}.{}", component(major), component(minor)),
            (major, minor, subminor) => write!(
                f,
                "{}.{}.{}",
                component(major),
                component(minor),
                component(subminor)
            ),
        }
    }
}

impl FromStr for Version {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidVersion(s.to_string()));
        }
        if trimmed == "unknown" {
            return Ok(Self::unknown());
        }

        let mut components = [None; 3];
        for (i, part) in trimmed.split('.').enumerate() {
            if i >= components.len() {
                return Err(ConfigError::InvalidVersion(s.to_string()));
            }
            components[i] = match part {
                "x" | "X" | "*" => None,
                digits => Some(
                    digits
                        .parse::<u32>()
                        .map_err(|_| ConfigError::InvalidVersion(s.to_string()))?,
                ),
            };
        }

        Ok(Self {
            major: components[0],
            minor: components[1],
            subminor: components[2],
        })
    }
}

impl TryFrom<String> for Version {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}
