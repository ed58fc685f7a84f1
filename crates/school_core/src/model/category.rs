//! Closed categorical values with free-text normalization.
//!
//! # Responsibility
//! - Map user input to one canonical value per category kind.
//! - Provide the stable labels persisted in the store.
//!
//! # Invariants
//! - Blank or unrecognized input normalizes to `Unknown`.
//! - `normalize(label())` is the identity for every variant.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Shared behavior of the categorical enums.
pub trait Category: Copy + Eq + Sized + 'static {
    /// Every variant, `Unknown` last.
    const ALL: &'static [Self];
    /// Sentinel used for blank or unrecognized input.
    const UNKNOWN: Self;

    /// Canonical label, as persisted.
    fn label(self) -> &'static str;

    /// Alias table lookup on a trimmed, lowercased key.
    fn from_alias(key: &str) -> Option<Self>;

    /// Maps free text to a canonical value.
    fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::UNKNOWN;
        }
        let key = trimmed.to_lowercase();
        if let Some(value) = Self::from_alias(&key) {
            return value;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.label().to_lowercase() == key)
            .unwrap_or(Self::UNKNOWN)
    }

    /// Selectable values for input forms (without `Unknown`).
    fn choices() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|value| **value != Self::UNKNOWN)
            .map(|value| value.label())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Department {
    #[serde(rename = "Human Resources")]
    HumanResources,
    Finance,
    Engineering,
    Marketing,
    Unknown,
}

impl Category for Department {
    const ALL: &'static [Self] = &[
        Self::HumanResources,
        Self::Finance,
        Self::Engineering,
        Self::Marketing,
        Self::Unknown,
    ];
    const UNKNOWN: Self = Self::Unknown;

    fn label(self) -> &'static str {
        match self {
            Self::HumanResources => "Human Resources",
            Self::Finance => "Finance",
            Self::Engineering => "Engineering",
            Self::Marketing => "Marketing",
            Self::Unknown => "Unknown",
        }
    }

    fn from_alias(key: &str) -> Option<Self> {
        match key {
            "hr" | "human resources" => Some(Self::HumanResources),
            "fin" | "finance" => Some(Self::Finance),
            "eng" | "engineering" | "it" => Some(Self::Engineering),
            "mkt" | "marketing" => Some(Self::Marketing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Subject {
    Mathematics,
    Physics,
    Chemistry,
    Biology,
    Unknown,
}

impl Category for Subject {
    const ALL: &'static [Self] = &[
        Self::Mathematics,
        Self::Physics,
        Self::Chemistry,
        Self::Biology,
        Self::Unknown,
    ];
    const UNKNOWN: Self = Self::Unknown;

    fn label(self) -> &'static str {
        match self {
            Self::Mathematics => "Mathematics",
            Self::Physics => "Physics",
            Self::Chemistry => "Chemistry",
            Self::Biology => "Biology",
            Self::Unknown => "Unknown",
        }
    }

    fn from_alias(key: &str) -> Option<Self> {
        match key {
            "math" | "mathematics" => Some(Self::Mathematics),
            "phys" | "physics" => Some(Self::Physics),
            "chem" | "chemistry" => Some(Self::Chemistry),
            "bio" | "biology" => Some(Self::Biology),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Speciality {
    #[serde(rename = "Computer Science")]
    ComputerScience,
    Mathematics,
    Physics,
    Engineering,
    Unknown,
}

impl Category for Speciality {
    const ALL: &'static [Self] = &[
        Self::ComputerScience,
        Self::Mathematics,
        Self::Physics,
        Self::Engineering,
        Self::Unknown,
    ];
    const UNKNOWN: Self = Self::Unknown;

    fn label(self) -> &'static str {
        match self {
            Self::ComputerScience => "Computer Science",
            Self::Mathematics => "Mathematics",
            Self::Physics => "Physics",
            Self::Engineering => "Engineering",
            Self::Unknown => "Unknown",
        }
    }

    fn from_alias(key: &str) -> Option<Self> {
        match key {
            "cs" | "computer science" => Some(Self::ComputerScience),
            "math" | "mathematics" => Some(Self::Mathematics),
            "phys" | "physics" => Some(Self::Physics),
            "eng" | "engineering" | "it" => Some(Self::Engineering),
            _ => None,
        }
    }
}

macro_rules! category_conversions {
    ($($ty:ty),+) => {$(
        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                <$ty>::normalize(&value)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                <$ty>::normalize(value)
            }
        }
    )+};
}

category_conversions!(Department, Subject, Speciality);
