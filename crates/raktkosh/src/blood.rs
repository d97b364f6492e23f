//! Blood groups, urgency levels and the stock overview.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An ABO/Rh blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodGroup {
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// O negative.
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    /// All groups, in the order forms list them.
    pub const ALL: [BloodGroup; 8] = [
        Self::APositive,
        Self::ANegative,
        Self::BPositive,
        Self::BNegative,
        Self::AbPositive,
        Self::AbNegative,
        Self::OPositive,
        Self::ONegative,
    ];

    /// The conventional text form, e.g. `"AB-"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::parse("blood group", s))
    }
}

/// How urgently a searcher needs blood.
///
/// Anything above `Normal` restricts search results to available donors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Routine need.
    #[default]
    Normal,
    /// Needed soon.
    Urgent,
    /// Needed immediately.
    Critical,
}

impl Urgency {
    /// Whether unavailable donors must be hidden at this urgency.
    #[must_use]
    pub fn requires_available(self) -> bool {
        matches!(self, Self::Urgent | Self::Critical)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Urgent => write!(f, "urgent"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Urgency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "urgent" => Ok(Self::Urgent),
            "critical" => Ok(Self::Critical),
            _ => Err(Error::parse("urgency", s)),
        }
    }
}

/// Urgency of a hospital emergency request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    /// Within hours.
    Critical,
    /// Within a day.
    #[default]
    High,
    /// Within a few days.
    Moderate,
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::High => write!(f, "high"),
            Self::Moderate => write!(f, "moderate"),
        }
    }
}

impl FromStr for UrgencyLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "moderate" => Ok(Self::Moderate),
            _ => Err(Error::parse("urgency level", s)),
        }
    }
}

/// Units on hand for one blood group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// The group.
    pub group: BloodGroup,
    /// Units available.
    pub units_available: u32,
    /// Whether the bank has flagged this group as urgently needed.
    pub urgent: bool,
}

impl StockLevel {
    /// Whether the units on hand fall below `threshold`.
    #[must_use]
    pub fn is_low(&self, threshold: u32) -> bool {
        self.units_available < threshold
    }
}

/// The stock overview shown on the landing screen.
#[must_use]
pub fn blood_stock() -> Vec<StockLevel> {
    [
        (BloodGroup::APositive, 45, false),
        (BloodGroup::BPositive, 38, false),
        (BloodGroup::OPositive, 52, false),
        (BloodGroup::AbPositive, 15, true),
        (BloodGroup::ANegative, 8, true),
        (BloodGroup::BNegative, 12, false),
        (BloodGroup::ONegative, 6, true),
        (BloodGroup::AbNegative, 3, true),
    ]
    .into_iter()
    .map(|(group, units_available, urgent)| StockLevel {
        group,
        units_available,
        urgent,
    })
    .collect()
}
