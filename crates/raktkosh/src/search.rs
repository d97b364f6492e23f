//! Donor search.
//!
//! [`filter`] is pure: it never reorders, and applying it twice with the
//! same criteria gives the same result as applying it once.

use serde::{Deserialize, Serialize};

use crate::blood::{BloodGroup, Urgency};
use crate::directory::Donor;

/// What the searcher is looking for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    /// Exact blood group, or any.
    pub blood_group: Option<BloodGroup>,
    /// Case-insensitive substring of the donor location, or any.
    pub location: Option<String>,
    /// How urgent the need is.
    pub urgency: Urgency,
}

impl SearchCriteria {
    /// Criteria with only an urgency set.
    #[must_use]
    pub fn with_urgency(urgency: Urgency) -> Self {
        Self {
            urgency,
            ..Self::default()
        }
    }

    /// Whether `donor` passes every filter.
    #[must_use]
    pub fn matches(&self, donor: &Donor) -> bool {
        if self.urgency.requires_available() && !donor.available {
            return false;
        }
        if let Some(group) = self.blood_group {
            if donor.blood_group != group {
                return false;
            }
        }
        match self.location_needle() {
            Some(needle) => donor.location.to_lowercase().contains(&needle),
            None => true,
        }
    }

    fn location_needle(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}

/// Donors matching `criteria`, in the order given.
pub fn filter<'a>(
    donors: impl IntoIterator<Item = &'a Donor>,
    criteria: &SearchCriteria,
) -> Vec<Donor> {
    donors
        .into_iter()
        .filter(|donor| criteria.matches(donor))
        .cloned()
        .collect()
}
