//! Donor profiles and the registration wizard.
//!
//! A [`DonorProfile`] is the single record describing the signed-in user.
//! It is produced either by the three-step [`RegistrationWizard`] or by the
//! demo sign-in ([`DonorProfile::demo`]).

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::blood::BloodGroup;
use crate::error::{Error, Result};
use crate::storage::Slot;

/// Where the signed-in profile is persisted.
pub const PROFILE_SLOT: Slot<DonorProfile> = Slot::new("user_profile");

/// The signed-in user's donor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorProfile {
    /// Full name.
    pub name: String,
    /// Email address; also the donor identity requests are addressed to.
    pub email: String,
    /// Mobile number.
    pub phone: String,
    /// Blood group.
    pub blood_group: BloodGroup,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Postal address.
    #[serde(default)]
    pub address: Address,
    /// Date of the most recent donation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_donation: Option<NaiveDate>,
    /// Free-text medical conditions, medications or allergies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<String>,
    /// Emergency contact number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    /// When the profile was created.
    pub registered_at: DateTime<Utc>,
}

/// A postal address. Every part is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    /// Street address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    /// City.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Six-digit postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
}

impl Address {
    /// "City, State" with whichever parts are present.
    #[must_use]
    pub fn locality(&self) -> Option<String> {
        let parts: Vec<&str> = [self.city.as_deref(), self.state.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Whether a donor may give blood today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Can donate now.
    Eligible,
    /// Must wait this many more days.
    EligibleIn(i64),
}

impl Eligibility {
    /// `true` for [`Eligibility::Eligible`].
    #[must_use]
    pub fn is_eligible(self) -> bool {
        matches!(self, Self::Eligible)
    }
}

impl std::fmt::Display for Eligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Eligible => write!(f, "Eligible to Donate"),
            Self::EligibleIn(days) => write!(f, "Eligible in {days} days"),
        }
    }
}

impl DonorProfile {
    /// The fixed profile written by demo sign-in, carrying only `email`.
    #[must_use]
    pub fn demo(email: &str, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            name: "John Doe".to_string(),
            email: email.trim().to_string(),
            phone: "+91 9876543210".to_string(),
            blood_group: BloodGroup::APositive,
            date_of_birth: NaiveDate::from_ymd_opt(1995, 3, 15).unwrap_or(today),
            address: Address {
                street: Some("123, Green Park".to_string()),
                city: Some("Connaught Place".to_string()),
                state: Some("Delhi".to_string()),
                pincode: Some("110016".to_string()),
            },
            last_donation: Some(today - Duration::days(60)),
            medical_conditions: Some("No major health issues".to_string()),
            emergency_contact: Some("+91 9876543211".to_string()),
            registered_at: now,
        }
    }

    /// Age in whole years on `today`.
    #[must_use]
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        age_on(self.date_of_birth, today)
    }

    /// Donation eligibility on `today` given the required `interval`.
    #[must_use]
    pub fn eligibility_on(&self, today: NaiveDate, interval: Duration) -> Eligibility {
        donation_eligibility(self.last_donation, today, interval)
    }

    /// Display location, falling back to the street address.
    #[must_use]
    pub fn location(&self) -> String {
        self.address
            .locality()
            .or_else(|| self.address.street.clone())
            .unwrap_or_default()
    }
}

/// Whole years between `birth` and `today`, counting a birthday only once it
/// has been reached.
#[must_use]
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Eligible when there is no recorded donation or `interval` has elapsed.
#[must_use]
pub fn donation_eligibility(
    last_donation: Option<NaiveDate>,
    today: NaiveDate,
    interval: Duration,
) -> Eligibility {
    let Some(last) = last_donation else {
        return Eligibility::Eligible;
    };
    let waited = (today - last).num_days();
    let required = interval.num_days();
    if waited >= required {
        Eligibility::Eligible
    } else {
        Eligibility::EligibleIn(required - waited)
    }
}

/// Raw registration input, as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    /// Full name (required).
    pub full_name: String,
    /// Email (required).
    pub email: String,
    /// Phone (required).
    pub phone: String,
    /// Date of birth, `YYYY-MM-DD` (required).
    pub date_of_birth: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Postal code.
    pub pincode: String,
    /// Blood group (required).
    pub blood_group: String,
    /// Last donation date, `YYYY-MM-DD`.
    pub last_donation: String,
    /// Medical conditions.
    pub medical_conditions: String,
    /// Emergency contact number.
    pub emergency_contact: String,
    /// Agreement to the terms (required).
    pub agree_terms: bool,
}

/// Registration wizard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum WizardStep {
    /// Name, contact details, date of birth and address.
    #[default]
    Personal,
    /// Blood group and medical history.
    Medical,
    /// Terms agreement.
    Confirmation,
}

impl WizardStep {
    /// 1-based page number.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Personal => 1,
            Self::Medical => 2,
            Self::Confirmation => 3,
        }
    }
}

/// Three-step registration flow.
///
/// Each forward step validates the fields of the page being left; going
/// back never validates.
#[derive(Debug, Clone, Default)]
pub struct RegistrationWizard {
    step: WizardStep,
    form: RegistrationForm,
}

impl RegistrationWizard {
    /// Start a wizard on the first page with `form` pre-filled.
    #[must_use]
    pub fn new(form: RegistrationForm) -> Self {
        Self {
            step: WizardStep::Personal,
            form,
        }
    }

    /// The current page.
    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// The form being filled.
    #[must_use]
    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    /// Mutable access to the form.
    pub fn form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.form
    }

    /// Validate the current page and move to the next one.
    ///
    /// On the last page this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a validation error and stays on the page if its required
    /// fields are missing or malformed.
    pub fn next(&mut self) -> Result<WizardStep> {
        self.step = match self.step {
            WizardStep::Personal => {
                self.form.check_personal()?;
                WizardStep::Medical
            }
            WizardStep::Medical => {
                self.form.check_medical()?;
                WizardStep::Confirmation
            }
            WizardStep::Confirmation => WizardStep::Confirmation,
        };
        Ok(self.step)
    }

    /// Move to the previous page.
    pub fn back(&mut self) -> WizardStep {
        self.step = match self.step {
            WizardStep::Personal | WizardStep::Medical => WizardStep::Personal,
            WizardStep::Confirmation => WizardStep::Medical,
        };
        self.step
    }

    /// Complete registration.
    ///
    /// # Errors
    ///
    /// Returns an error if not on the confirmation page, if the terms were
    /// not accepted, or if any page fails validation.
    pub fn submit(&self, now: DateTime<Utc>) -> Result<DonorProfile> {
        if self.step != WizardStep::Confirmation {
            return Err(Error::internal(format!(
                "registration submitted from step {}",
                self.step.number()
            )));
        }
        self.form.into_profile(now)
    }
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,17}$").expect("valid phone regex"))
}

fn pincode_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{6}$").expect("valid pincode regex"))
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| Error::invalid_field(field, format!("expected YYYY-MM-DD, got '{value}'")))
}

impl RegistrationForm {
    fn check_personal(&self) -> Result<()> {
        let missing: Vec<&'static str> = [
            ("full name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("date of birth", &self.date_of_birth),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(Error::MissingFields { fields: missing });
        }

        if !email_pattern().is_match(self.email.trim()) {
            return Err(Error::invalid_field("email", "not an email address"));
        }
        if !phone_pattern().is_match(self.phone.trim()) {
            return Err(Error::invalid_field("phone", "not a phone number"));
        }
        parse_date("date of birth", &self.date_of_birth)?;
        if let Some(pincode) = optional(&self.pincode) {
            if !pincode_pattern().is_match(&pincode) {
                return Err(Error::invalid_field("pincode", "expected six digits"));
            }
        }
        Ok(())
    }

    fn check_medical(&self) -> Result<()> {
        if self.blood_group.trim().is_empty() {
            return Err(Error::MissingFields {
                fields: vec!["blood group"],
            });
        }
        self.blood_group.parse::<BloodGroup>()?;
        if let Some(last) = optional(&self.last_donation) {
            parse_date("last donation", &last)?;
        }
        Ok(())
    }

    /// Validate every page and build the profile, stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn into_profile(&self, now: DateTime<Utc>) -> Result<DonorProfile> {
        self.check_personal()?;
        self.check_medical()?;
        if !self.agree_terms {
            return Err(Error::TermsNotAccepted);
        }

        Ok(DonorProfile {
            name: self.full_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            blood_group: self.blood_group.parse()?,
            date_of_birth: parse_date("date of birth", &self.date_of_birth)?,
            address: Address {
                street: optional(&self.address),
                city: optional(&self.city),
                state: optional(&self.state),
                pincode: optional(&self.pincode),
            },
            last_donation: optional(&self.last_donation)
                .map(|d| parse_date("last donation", &d))
                .transpose()?,
            medical_conditions: optional(&self.medical_conditions),
            emergency_contact: optional(&self.emergency_contact),
            registered_at: now,
        })
    }
}
