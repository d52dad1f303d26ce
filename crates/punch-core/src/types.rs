//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Device identifiers are limited to the two physical turnstiles.
    #[error("device must be 1 or 2, got {value}")]
    InvalidDevice { value: i64 },

    /// Invalid direction value.
    #[error("invalid direction: {value}")]
    InvalidDirection { value: String },

    /// Invalid meal period value.
    #[error("invalid period: {value}")]
    InvalidPeriod { value: String },
}

/// Which stream a punch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Swipe on the way in.
    #[serde(rename = "entrada", alias = "entry")]
    Entry,
    /// Swipe on the way out.
    #[serde(rename = "saida", alias = "exit")]
    Exit,
}

impl Direction {
    /// Sheet name used by the turnstile exports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entrada",
            Self::Exit => "saida",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entrada" | "entry" => Ok(Self::Entry),
            "saida" | "saída" | "exit" => Ok(Self::Exit),
            _ => Err(ValidationError::InvalidDirection {
                value: s.to_string(),
            }),
        }
    }
}

/// A validated turnstile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct DeviceId(u8);

impl DeviceId {
    /// Creates a device ID, accepting only 1 and 2.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        match value {
            1 => Ok(Self(1)),
            2 => Ok(Self(2)),
            _ => Err(ValidationError::InvalidDevice { value }),
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for DeviceId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for i64 {
    fn from(id: DeviceId) -> Self {
        Self::from(id.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates a validated, trimmed string newtype with common trait implementations.
macro_rules! define_text {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after trimming and validation.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_text!(
    /// A person's display name as printed on the turnstile export.
    ///
    /// Names are trimmed but otherwise kept verbatim, including case. Two punches
    /// belong to the same person only if their names match exactly.
    PersonName, "person name"
);

define_text!(
    /// Identifies the file or batch a punch was read from, kept for audit.
    SourceLabel, "source label"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_name_is_trimmed_and_case_preserved() {
        let name = PersonName::new("  Ana Souza ").unwrap();
        assert_eq!(name.as_str(), "Ana Souza");
        assert_ne!(name, PersonName::new("ana souza").unwrap());
    }

    #[test]
    fn person_name_rejects_blank() {
        assert_eq!(
            PersonName::new("   ").unwrap_err(),
            ValidationError::Empty {
                field: "person name"
            }
        );
    }

    #[test]
    fn person_name_serde_rejects_empty() {
        let result: Result<PersonName, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn device_id_accepts_only_known_turnstiles() {
        assert_eq!(DeviceId::new(1).unwrap().get(), 1);
        assert_eq!(DeviceId::new(2).unwrap().get(), 2);
        assert!(DeviceId::new(0).is_err());
        assert!(DeviceId::new(3).is_err());
    }

    #[test]
    fn device_id_serde_roundtrip() {
        let id = DeviceId::new(2).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "2");
        let parsed: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<DeviceId>("7").is_err());
    }

    #[test]
    fn direction_from_str_accepts_sheet_names() {
        assert_eq!("entrada".parse::<Direction>().unwrap(), Direction::Entry);
        assert_eq!("Saída".parse::<Direction>().unwrap(), Direction::Exit);
        assert_eq!("SAIDA".parse::<Direction>().unwrap(), Direction::Exit);
        assert_eq!("exit".parse::<Direction>().unwrap(), Direction::Exit);
        assert!("lunch".parse::<Direction>().is_err());
    }

    #[test]
    fn direction_as_str() {
        assert_eq!(Direction::Entry.as_str(), "entrada");
        assert_eq!(Direction::Exit.as_str(), "saida");
    }
}
