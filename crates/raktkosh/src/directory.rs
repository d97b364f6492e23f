//! The donor directory.
//!
//! A fixed list of demo donors, optionally followed by one entry synthesized
//! from the signed-in profile. The directory is rebuilt on every load and is
//! never persisted.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::blood::BloodGroup;
use crate::error::{Error, Result};
use crate::profile::DonorProfile;
use crate::search::{self, SearchCriteria};

/// One directory entry as shown in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    /// Directory id. The signed-in user's entry uses their email.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Blood group.
    pub blood_group: BloodGroup,
    /// Area and city.
    pub location: String,
    /// Distance text, e.g. `"2.5 km"`. Static; never computed.
    pub distance: String,
    /// Whole months since the last donation, if the donor has donated.
    pub months_since_donation: Option<u32>,
    /// Whether the donor is currently accepting requests.
    pub available: bool,
    /// Whether the donor's identity has been verified.
    pub verified: bool,
}

impl Donor {
    /// Human-readable time since the last donation.
    #[must_use]
    pub fn last_donation_label(&self) -> String {
        match self.months_since_donation {
            None => "Never".to_string(),
            Some(0) => "This month".to_string(),
            Some(1) => "1 month ago".to_string(),
            Some(n) => format!("{n} months ago"),
        }
    }

    /// Whether enough months have passed since the last donation.
    #[must_use]
    pub fn can_donate_now(&self, cooldown_months: u32) -> bool {
        self.months_since_donation
            .map_or(true, |months| months >= cooldown_months)
    }
}

/// The extended donor card behind "view profile".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorDetail {
    /// The directory entry.
    #[serde(flatten)]
    pub donor: Donor,
    /// Contact number.
    pub phone: String,
    /// Lifetime donations.
    pub total_donations: u32,
    /// Age in years.
    pub age: u32,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Month and year the donor joined.
    pub registered_since: String,
}

/// The list of candidate donors.
#[derive(Debug, Clone, Default)]
pub struct DonorDirectory {
    entries: Vec<DonorDetail>,
}

struct DemoDonor {
    id: &'static str,
    name: &'static str,
    group: BloodGroup,
    location: &'static str,
    distance: &'static str,
    months: u32,
    available: bool,
    verified: bool,
    donations: u32,
    age: u32,
}

const DEMO_DONORS: [DemoDonor; 4] = [
    DemoDonor {
        id: "1",
        name: "Rahul S.",
        group: BloodGroup::OPositive,
        location: "Connaught Place, Delhi",
        distance: "2.5 km",
        months: 3,
        available: true,
        verified: true,
        donations: 10,
        age: 29,
    },
    DemoDonor {
        id: "2",
        name: "Priya M.",
        group: BloodGroup::APositive,
        location: "Saket, Delhi",
        distance: "5 km",
        months: 6,
        available: true,
        verified: true,
        donations: 8,
        age: 28,
    },
    DemoDonor {
        id: "3",
        name: "Amit K.",
        group: BloodGroup::BPositive,
        location: "Dwarka, Delhi",
        distance: "8 km",
        months: 4,
        available: false,
        verified: true,
        donations: 12,
        age: 35,
    },
    DemoDonor {
        id: "4",
        name: "Sneha R.",
        group: BloodGroup::AbPositive,
        location: "Rohini, Delhi",
        distance: "12 km",
        months: 2,
        available: true,
        verified: false,
        donations: 3,
        age: 24,
    },
];

const DEMO_PHONE: &str = "+91 98765 43210";
const DEMO_REGISTERED_SINCE: &str = "January 2023";

/// Whole calendar months from `from` to `to`, never negative.
#[must_use]
pub fn months_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let month_index = |d: NaiveDate| d.year() * 12 + i32::try_from(d.month0()).unwrap_or(0);
    let mut months = month_index(to) - month_index(from);
    if to.day() < from.day() {
        months -= 1;
    }
    u32::try_from(months).unwrap_or(0)
}

impl DonorDirectory {
    /// The built-in demo donors.
    #[must_use]
    pub fn demo() -> Self {
        let entries = DEMO_DONORS
            .iter()
            .map(|demo| DonorDetail {
                donor: Donor {
                    id: demo.id.to_string(),
                    name: demo.name.to_string(),
                    blood_group: demo.group,
                    location: demo.location.to_string(),
                    distance: demo.distance.to_string(),
                    months_since_donation: Some(demo.months),
                    available: demo.available,
                    verified: demo.verified,
                },
                phone: DEMO_PHONE.to_string(),
                total_donations: demo.donations,
                age: demo.age,
                city: "Delhi".to_string(),
                state: "Delhi".to_string(),
                registered_since: DEMO_REGISTERED_SINCE.to_string(),
            })
            .collect();
        Self { entries }
    }

    /// Build a directory from explicit entries, in order.
    #[must_use]
    pub fn from_entries(entries: Vec<DonorDetail>) -> Self {
        Self { entries }
    }

    /// Append an entry for the signed-in user.
    ///
    /// The entry's id is the profile email and it is available exactly when
    /// the user is eligible to donate on `today`.
    #[must_use]
    pub fn with_current_user(
        mut self,
        profile: &DonorProfile,
        today: NaiveDate,
        donation_interval: Duration,
    ) -> Self {
        let donor = Donor {
            id: profile.email.clone(),
            name: profile.name.clone(),
            blood_group: profile.blood_group,
            location: profile.location(),
            distance: "0 km".to_string(),
            months_since_donation: profile.last_donation.map(|last| months_between(last, today)),
            available: profile.eligibility_on(today, donation_interval).is_eligible(),
            verified: false,
        };
        self.entries.push(DonorDetail {
            donor,
            phone: profile.phone.clone(),
            total_donations: u32::from(profile.last_donation.is_some()),
            age: u32::try_from(profile.age_on(today)).unwrap_or(0),
            city: profile.address.city.clone().unwrap_or_default(),
            state: profile.address.state.clone().unwrap_or_default(),
            registered_since: profile.registered_at.format("%B %Y").to_string(),
        });
        self
    }

    /// Directory entries in insertion order.
    pub fn donors(&self) -> impl Iterator<Item = &Donor> {
        self.entries.iter().map(|entry| &entry.donor)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up one donor by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DonorNotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<&Donor> {
        self.detail(id).map(|entry| &entry.donor)
    }

    /// Look up the extended card for one donor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DonorNotFound`] for an unknown id.
    pub fn detail(&self, id: &str) -> Result<&DonorDetail> {
        self.entries
            .iter()
            .find(|entry| entry.donor.id == id)
            .ok_or_else(|| Error::DonorNotFound(id.to_string()))
    }

    /// Donors matching `criteria`, in directory order.
    #[must_use]
    pub fn search(&self, criteria: &SearchCriteria) -> Vec<Donor> {
        search::filter(self.donors(), criteria)
    }
}
