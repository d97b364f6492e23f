//! The emergency board.
//!
//! Hospital emergency requests live in their own slot, independent of the
//! donor request ledger. New requests go to the front; existing ones are
//! never edited or removed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::blood::{BloodGroup, UrgencyLevel};
use crate::config::EmergencyConfig;
use crate::error::{Error, Result};
use crate::storage::{Slot, Storage};

/// Where the board is persisted.
pub const EMERGENCY_SLOT: Slot<Vec<EmergencyRequest>> = Slot::new("emergency_requests");

/// Hospitals offered as suggestions. Any name is accepted.
pub const HOSPITALS: [&str; 6] = [
    "AIIMS, New Delhi",
    "Apollo Hospital",
    "Fortis Hospital",
    "Max Hospital",
    "Medanta Hospital",
    "Other",
];

const MAX_PATIENT_AGE: u32 = 150;

/// One posted emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyRequest {
    /// Board-unique id.
    pub id: u64,
    /// Patient name.
    pub patient_name: String,
    /// Patient age in years.
    pub patient_age: u32,
    /// Blood group needed.
    pub blood_group: BloodGroup,
    /// Units needed.
    pub units_required: u32,
    /// Hospital name.
    pub hospital: String,
    /// Hospital area or city.
    pub location: String,
    /// Who to call.
    pub contact_person: String,
    /// Primary contact number.
    pub contact_number: String,
    /// Secondary contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_contact: Option<String>,
    /// How soon the blood is needed.
    #[serde(default)]
    pub urgency_level: UrgencyLevel,
    /// Why the blood is needed.
    #[serde(default)]
    pub reason: String,
    /// Treating doctor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    /// Treating doctor's number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_contact: Option<String>,
    /// When the request was posted.
    pub created_at: DateTime<Utc>,
}

/// Raw form input for a new emergency.
#[derive(Debug, Clone, Default)]
pub struct EmergencyForm {
    /// Patient name.
    pub patient_name: String,
    /// Patient age.
    pub patient_age: String,
    /// Blood group.
    pub blood_group: String,
    /// Units required.
    pub units_required: String,
    /// Hospital.
    pub hospital: String,
    /// Location.
    pub location: String,
    /// Contact person.
    pub contact_person: String,
    /// Contact number.
    pub contact_number: String,
    /// Alternate contact.
    pub alternate_contact: String,
    /// Urgency level; blank means high.
    pub urgency_level: String,
    /// Reason.
    pub reason: String,
    /// Doctor name.
    pub doctor_name: String,
    /// Doctor contact.
    pub doctor_contact: String,
}

/// A validated form, waiting for an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CheckedEmergency {
    patient_name: String,
    patient_age: u32,
    blood_group: BloodGroup,
    units_required: u32,
    hospital: String,
    location: String,
    contact_person: String,
    contact_number: String,
    alternate_contact: Option<String>,
    urgency_level: UrgencyLevel,
    reason: String,
    doctor_name: Option<String>,
    doctor_contact: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|v| !v.is_empty())
}

impl EmergencyForm {
    fn check(&self) -> Result<CheckedEmergency> {
        let missing: Vec<&'static str> = [
            ("patient name", &self.patient_name),
            ("patient age", &self.patient_age),
            ("blood group", &self.blood_group),
            ("units required", &self.units_required),
            ("hospital", &self.hospital),
            ("location", &self.location),
            ("contact person", &self.contact_person),
            ("contact number", &self.contact_number),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(Error::MissingFields { fields: missing });
        }

        let patient_age: u32 = self
            .patient_age
            .trim()
            .parse()
            .ok()
            .filter(|age| *age <= MAX_PATIENT_AGE)
            .ok_or_else(|| Error::invalid_field("patient age", "expected a whole number of years"))?;
        let units_required: u32 = self
            .units_required
            .trim()
            .parse()
            .ok()
            .filter(|units| *units > 0)
            .ok_or_else(|| Error::invalid_field("units required", "expected at least one unit"))?;
        let urgency_level = match optional(&self.urgency_level) {
            Some(level) => level.parse()?,
            None => UrgencyLevel::default(),
        };

        Ok(CheckedEmergency {
            patient_name: self.patient_name.trim().to_string(),
            patient_age,
            blood_group: self.blood_group.parse()?,
            units_required,
            hospital: self.hospital.trim().to_string(),
            location: self.location.trim().to_string(),
            contact_person: self.contact_person.trim().to_string(),
            contact_number: self.contact_number.trim().to_string(),
            alternate_contact: optional(&self.alternate_contact),
            urgency_level,
            reason: self.reason.trim().to_string(),
            doctor_name: optional(&self.doctor_name),
            doctor_contact: optional(&self.doctor_contact),
        })
    }
}

impl CheckedEmergency {
    fn into_request(self, id: u64, created_at: DateTime<Utc>) -> EmergencyRequest {
        EmergencyRequest {
            id,
            patient_name: self.patient_name,
            patient_age: self.patient_age,
            blood_group: self.blood_group,
            units_required: self.units_required,
            hospital: self.hospital,
            location: self.location,
            contact_person: self.contact_person,
            contact_number: self.contact_number,
            alternate_contact: self.alternate_contact,
            urgency_level: self.urgency_level,
            reason: self.reason,
            doctor_name: self.doctor_name,
            doctor_contact: self.doctor_contact,
            created_at,
        }
    }
}

/// The four requests a fresh board starts with, newest first.
#[must_use]
pub fn sample_requests(now: DateTime<Utc>) -> Vec<EmergencyRequest> {
    let sample = |id: u64,
                  patient: &str,
                  age: u32,
                  group: BloodGroup,
                  units: u32,
                  hospital: &str,
                  location: &str,
                  contact: (&str, &str),
                  urgency_level: UrgencyLevel,
                  reason: &str,
                  hours_ago: i64| EmergencyRequest {
        id,
        patient_name: patient.to_string(),
        patient_age: age,
        blood_group: group,
        units_required: units,
        hospital: hospital.to_string(),
        location: location.to_string(),
        contact_person: contact.0.to_string(),
        contact_number: contact.1.to_string(),
        alternate_contact: None,
        urgency_level,
        reason: reason.to_string(),
        doctor_name: None,
        doctor_contact: None,
        created_at: now - Duration::hours(hours_ago),
    };

    vec![
        sample(
            4,
            "Ravi Kumar",
            45,
            BloodGroup::ONegative,
            3,
            "AIIMS, New Delhi",
            "Ansari Nagar, Delhi",
            ("Sunita Kumar", "+91 98110 22334"),
            UrgencyLevel::Critical,
            "Road accident, emergency surgery",
            1,
        ),
        sample(
            3,
            "Anjali Sharma",
            32,
            BloodGroup::BPositive,
            2,
            "Fortis Hospital",
            "Vasant Kunj, Delhi",
            ("Vikram Sharma", "+91 98990 45671"),
            UrgencyLevel::High,
            "Complications during delivery",
            4,
        ),
        sample(
            2,
            "Mohammed Irfan",
            58,
            BloodGroup::AbNegative,
            4,
            "Medanta Hospital",
            "Sector 38, Gurugram",
            ("Ayesha Irfan", "+91 99580 11245"),
            UrgencyLevel::High,
            "Scheduled cardiac bypass surgery",
            9,
        ),
        sample(
            1,
            "Kavya Nair",
            11,
            BloodGroup::APositive,
            1,
            "Apollo Hospital",
            "Sarita Vihar, Delhi",
            ("Deepa Nair", "+91 98730 66120"),
            UrgencyLevel::Moderate,
            "Thalassemia transfusion",
            26,
        ),
    ]
}

/// The emergency board bound to a store.
#[derive(Debug, Clone, Copy)]
pub struct EmergencyBoard<'a> {
    storage: &'a Storage,
    seed_samples: bool,
}

impl<'a> EmergencyBoard<'a> {
    /// Create a board over `storage`.
    #[must_use]
    pub fn new(storage: &'a Storage, config: &EmergencyConfig) -> Self {
        Self {
            storage,
            seed_samples: config.seed_samples,
        }
    }

    /// All requests, newest first.
    ///
    /// A board that has never been written is seeded with the sample
    /// requests, which are persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be read or seeded.
    pub fn load(&self, now: DateTime<Utc>) -> Result<Vec<EmergencyRequest>> {
        if let Some(requests) = self.storage.load(EMERGENCY_SLOT)? {
            return Ok(requests);
        }
        if !self.seed_samples {
            return Ok(Vec::new());
        }

        let samples = sample_requests(now);
        self.storage.save(EMERGENCY_SLOT, &samples)?;
        info!(count = samples.len(), "Seeded emergency board");
        Ok(samples)
    }

    /// Validate `form` and post it at the top of the board.
    ///
    /// # Errors
    ///
    /// Returns a validation error, in which case nothing is written, or a
    /// storage error.
    pub fn submit(&self, form: &EmergencyForm, now: DateTime<Utc>) -> Result<EmergencyRequest> {
        let checked = form.check()?;
        self.load(now)?;

        let request = self
            .storage
            .update(EMERGENCY_SLOT, |requests: &mut Vec<EmergencyRequest>| {
                let id = requests.iter().map(|r| r.id).max().unwrap_or(0) + 1;
                let request = checked.into_request(id, now);
                requests.insert(0, request.clone());
                Ok(request)
            })?;

        info!(
            id = request.id,
            blood_group = %request.blood_group,
            urgency = %request.urgency_level,
            "Posted emergency request"
        );
        debug!(hospital = %request.hospital, units = request.units_required, "Emergency details");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap()
    }

    fn config(seed_samples: bool) -> EmergencyConfig {
        EmergencyConfig { seed_samples }
    }

    fn form() -> EmergencyForm {
        EmergencyForm {
            patient_name: "Arjun Mehta".to_string(),
            patient_age: "40".to_string(),
            blood_group: "o-".to_string(),
            units_required: "2".to_string(),
            hospital: "Max Hospital".to_string(),
            location: "Saket, Delhi".to_string(),
            contact_person: "Neha Mehta".to_string(),
            contact_number: "+91 98100 00000".to_string(),
            ..EmergencyForm::default()
        }
    }

    #[test]
    fn test_first_load_seeds_samples() {
        let storage = Storage::open_in_memory().unwrap();
        let board = EmergencyBoard::new(&storage, &config(true));

        let requests = board.load(now()).unwrap();
        assert_eq!(requests.len(), 4);
        assert!(storage.contains(EMERGENCY_SLOT).unwrap());

        let ids: Vec<u64> = requests.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_seeding_happens_once() {
        let storage = Storage::open_in_memory().unwrap();
        let board = EmergencyBoard::new(&storage, &config(true));

        let first = board.load(now()).unwrap();
        let later = board.load(now() + Duration::days(3)).unwrap();
        assert_eq!(first, later);
    }

    #[test]
    fn test_empty_board_is_not_reseeded() {
        let storage = Storage::open_in_memory().unwrap();
        storage.save(EMERGENCY_SLOT, &Vec::new()).unwrap();

        let board = EmergencyBoard::new(&storage, &config(true));
        assert!(board.load(now()).unwrap().is_empty());
    }

    #[test]
    fn test_seeding_disabled() {
        let storage = Storage::open_in_memory().unwrap();
        let board = EmergencyBoard::new(&storage, &config(false));

        assert!(board.load(now()).unwrap().is_empty());
        assert!(!storage.contains(EMERGENCY_SLOT).unwrap());
    }

    #[test]
    fn test_submit_prepends_with_next_id() {
        let storage = Storage::open_in_memory().unwrap();
        let board = EmergencyBoard::new(&storage, &config(true));

        let posted = board.submit(&form(), now()).unwrap();
        assert_eq!(posted.id, 5);
        assert_eq!(posted.blood_group, BloodGroup::ONegative);
        assert_eq!(posted.urgency_level, UrgencyLevel::High);
        assert_eq!(posted.created_at, now());

        let requests = board.load(now()).unwrap();
        assert_eq!(requests.len(), 5);
        assert_eq!(requests[0], posted);
    }

    #[test]
    fn test_submit_keeps_existing_records() {
        let storage = Storage::open_in_memory().unwrap();
        let board = EmergencyBoard::new(&storage, &config(true));
        let before = board.load(now()).unwrap();

        board.submit(&form(), now()).unwrap();
        let after = board.load(now()).unwrap();
        assert_eq!(&after[1..], before.as_slice());
    }

    #[test]
    fn test_submit_without_seeding_starts_at_one() {
        let storage = Storage::open_in_memory().unwrap();
        let board = EmergencyBoard::new(&storage, &config(false));

        assert_eq!(board.submit(&form(), now()).unwrap().id, 1);
        assert_eq!(board.submit(&form(), now()).unwrap().id, 2);
        let ids: Vec<u64> = board.load(now()).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_missing_fields_rejected_without_write() {
        let storage = Storage::open_in_memory().unwrap();
        let board = EmergencyBoard::new(&storage, &config(true));

        let incomplete = EmergencyForm {
            hospital: String::new(),
            contact_number: "  ".to_string(),
            ..form()
        };
        let err = board.submit(&incomplete, now()).unwrap_err();
        assert!(matches!(
            &err,
            Error::MissingFields { fields } if fields == &vec!["hospital", "contact number"]
        ));
        assert!(!storage.contains(EMERGENCY_SLOT).unwrap());
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        let zero_units = EmergencyForm {
            units_required: "0".to_string(),
            ..form()
        };
        assert!(matches!(
            zero_units.check(),
            Err(Error::InvalidField { field: "units required", .. })
        ));

        let bad_age = EmergencyForm {
            patient_age: "forty".to_string(),
            ..form()
        };
        assert!(matches!(
            bad_age.check(),
            Err(Error::InvalidField { field: "patient age", .. })
        ));
    }

    #[test]
    fn test_optional_fields() {
        let full = EmergencyForm {
            alternate_contact: "+91 90000 11111".to_string(),
            doctor_name: " Dr. Rao ".to_string(),
            doctor_contact: String::new(),
            urgency_level: "Critical".to_string(),
            ..form()
        };
        let checked = full.check().unwrap();
        assert_eq!(checked.alternate_contact.as_deref(), Some("+91 90000 11111"));
        assert_eq!(checked.doctor_name.as_deref(), Some("Dr. Rao"));
        assert_eq!(checked.doctor_contact, None);
        assert_eq!(checked.urgency_level, UrgencyLevel::Critical);
    }

    #[test]
    fn test_unknown_hospital_accepted() {
        let custom = EmergencyForm {
            hospital: "Civil Hospital, Panipat".to_string(),
            ..form()
        };
        assert!(!HOSPITALS.contains(&custom.hospital.as_str()));
        assert!(custom.check().is_ok());
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_string(&sample_requests(now())[0]).unwrap();
        assert!(json.contains("\"patientName\":\"Ravi Kumar\""));
        assert!(json.contains("\"urgencyLevel\":\"critical\""));
        assert!(!json.contains("doctorName"));
    }
}
