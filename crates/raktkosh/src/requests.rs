//! The blood request ledger.
//!
//! Requests are appended, never deleted. A request's status moves once,
//! from pending to accepted or rejected; any later accept or decline is a
//! no-op.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::blood::{BloodGroup, Urgency};
use crate::directory::Donor;
use crate::error::{Error, Result};
use crate::profile::DonorProfile;
use crate::storage::{Slot, Storage};

/// Where the ledger is persisted.
pub const REQUESTS_SLOT: Slot<Vec<BloodRequest>> = Slot::new("blood_requests");

/// Lifecycle of a blood request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting the donor's answer.
    #[default]
    Pending,
    /// The donor agreed.
    Accepted,
    /// The donor declined.
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A request sent to one donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodRequest {
    /// Ledger sequence number, starting at 1.
    pub id: u64,
    /// Directory id of the donor asked.
    pub donor_id: String,
    /// Donor display name.
    pub donor_name: String,
    /// Donor blood group.
    pub blood_group: BloodGroup,
    /// Donor location.
    pub location: String,
    /// Name of whoever asked.
    pub requested_by: String,
    /// Blood group of whoever asked.
    pub requester_blood_group: BloodGroup,
    /// When the request was made.
    pub request_date: DateTime<Utc>,
    /// Urgency the requester searched with.
    pub urgency: Urgency,
    /// Current status.
    pub status: RequestStatus,
    /// BLAKE3 of the donor/requester pair, used to refuse duplicates.
    pub fingerprint: String,
}

impl BloodRequest {
    /// Whether the donor holding `profile` is the one being asked.
    ///
    /// True when the donor id is the profile email or the donor name is the
    /// profile name.
    #[must_use]
    pub fn is_addressed_to(&self, profile: &DonorProfile) -> bool {
        self.donor_id == profile.email || self.donor_name == profile.name
    }
}

/// Who is asking for blood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requester {
    /// The signed-in user.
    SignedIn {
        /// Profile name.
        name: String,
        /// Profile email.
        email: String,
        /// Profile blood group.
        blood_group: BloodGroup,
    },
    /// Someone without a profile who gave a name and blood group.
    Guest {
        /// Name as entered.
        name: String,
        /// Blood group as entered.
        blood_group: BloodGroup,
    },
}

impl Requester {
    /// Requester for the signed-in `profile`.
    #[must_use]
    pub fn signed_in(profile: &DonorProfile) -> Self {
        Self::SignedIn {
            name: profile.name.clone(),
            email: profile.email.clone(),
            blood_group: profile.blood_group,
        }
    }

    /// Requester for a guest.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFields`] if `name` is blank.
    pub fn guest(name: &str, blood_group: BloodGroup) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::MissingFields {
                fields: vec!["your name"],
            });
        }
        Ok(Self::Guest {
            name: name.to_string(),
            blood_group,
        })
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SignedIn { name, .. } | Self::Guest { name, .. } => name,
        }
    }

    /// Blood group.
    #[must_use]
    pub fn blood_group(&self) -> BloodGroup {
        match self {
            Self::SignedIn { blood_group, .. } | Self::Guest { blood_group, .. } => *blood_group,
        }
    }

    /// Stable identity: email when signed in, lower-cased name for guests.
    #[must_use]
    pub fn identity(&self) -> String {
        match self {
            Self::SignedIn { email, .. } => email.to_lowercase(),
            Self::Guest { name, .. } => format!("guest:{}", name.to_lowercase()),
        }
    }
}

/// Fingerprint of a donor/requester pair.
#[must_use]
pub fn fingerprint(donor_id: &str, requester: &Requester) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(donor_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(requester.identity().as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Result of submitting a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new pending request was appended.
    Submitted(BloodRequest),
    /// This requester had already asked this donor; nothing was appended.
    AlreadyRequested(BloodRequest),
}

impl SubmitOutcome {
    /// The new or pre-existing request.
    #[must_use]
    pub fn request(&self) -> &BloodRequest {
        match self {
            Self::Submitted(request) | Self::AlreadyRequested(request) => request,
        }
    }

    /// Whether a new request was appended.
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Submitted(_))
    }
}

/// Result of an accept or decline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The request moved out of pending.
    Changed {
        /// Always [`RequestStatus::Pending`].
        from: RequestStatus,
        /// The new status.
        to: RequestStatus,
    },
    /// The request was not pending; its status is unchanged.
    Unchanged(RequestStatus),
}

/// Requests addressed to one donor, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedRequests {
    /// The requests.
    pub requests: Vec<BloodRequest>,
    /// How many are still pending.
    pub pending: usize,
    /// How many were accepted.
    pub accepted: usize,
}

/// Read/write access to the persisted ledger.
#[derive(Debug, Clone, Copy)]
pub struct RequestLedger<'a> {
    storage: &'a Storage,
}

impl<'a> RequestLedger<'a> {
    /// Ledger backed by `storage`.
    #[must_use]
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Every request in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn all(&self) -> Result<Vec<BloodRequest>> {
        Ok(self.storage.load(REQUESTS_SLOT)?.unwrap_or_default())
    }

    /// Ask `donor` for blood on behalf of `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DonorUnavailable`] if the donor is not accepting
    /// requests, [`Error::SelfRequest`] if the requester is the donor, or a
    /// storage error.
    pub fn submit(
        &self,
        donor: &Donor,
        requester: &Requester,
        urgency: Urgency,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        if !donor.available {
            return Err(Error::DonorUnavailable(donor.id.clone()));
        }
        if requester.identity() == donor.id.to_lowercase() {
            return Err(Error::SelfRequest);
        }

        let print = fingerprint(&donor.id, requester);
        let outcome = self.storage.update(REQUESTS_SLOT, |requests: &mut Vec<BloodRequest>| {
            if let Some(existing) = requests.iter().find(|r| r.fingerprint == print) {
                return Ok(SubmitOutcome::AlreadyRequested(existing.clone()));
            }

            let id = requests.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            let request = BloodRequest {
                id,
                donor_id: donor.id.clone(),
                donor_name: donor.name.clone(),
                blood_group: donor.blood_group,
                location: donor.location.clone(),
                requested_by: requester.name().to_string(),
                requester_blood_group: requester.blood_group(),
                request_date: now,
                urgency,
                status: RequestStatus::Pending,
                fingerprint: print.clone(),
            };
            requests.push(request.clone());
            Ok(SubmitOutcome::Submitted(request))
        })?;

        match &outcome {
            SubmitOutcome::Submitted(request) => info!(
                "Request {} sent to donor {} by {}",
                request.id, request.donor_id, request.requested_by
            ),
            SubmitOutcome::AlreadyRequested(request) => debug!(
                "Donor {} already requested by {}",
                request.donor_id, request.requested_by
            ),
        }
        Ok(outcome)
    }

    /// Accept request `id` on behalf of the donor holding `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestNotFound`] for an unknown id or a request
    /// addressed to someone else.
    pub fn accept(&self, profile: &DonorProfile, id: u64) -> Result<StatusChange> {
        self.transition(profile, id, RequestStatus::Accepted)
    }

    /// Decline request `id` on behalf of the donor holding `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestNotFound`] for an unknown id or a request
    /// addressed to someone else.
    pub fn decline(&self, profile: &DonorProfile, id: u64) -> Result<StatusChange> {
        self.transition(profile, id, RequestStatus::Rejected)
    }

    fn transition(&self, profile: &DonorProfile, id: u64, to: RequestStatus) -> Result<StatusChange> {
        let change = self.storage.update(REQUESTS_SLOT, |requests: &mut Vec<BloodRequest>| {
            let request = requests
                .iter_mut()
                .find(|r| r.id == id && r.is_addressed_to(profile))
                .ok_or(Error::RequestNotFound(id))?;
            if request.status != RequestStatus::Pending {
                return Ok(StatusChange::Unchanged(request.status));
            }
            request.status = to;
            Ok(StatusChange::Changed {
                from: RequestStatus::Pending,
                to,
            })
        })?;

        match change {
            StatusChange::Changed { to, .. } => info!("Request {} is now {}", id, to),
            StatusChange::Unchanged(status) => {
                debug!("Request {} already {}; left unchanged", id, status);
            }
        }
        Ok(change)
    }

    /// Requests addressed to the holder of `profile`, newest first.
    ///
    /// A request is addressed to the profile when its donor id is the
    /// profile email or its donor name is the profile name.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn received_by(&self, profile: &DonorProfile) -> Result<ReceivedRequests> {
        let mut requests: Vec<BloodRequest> = self
            .all()?
            .into_iter()
            .filter(|r| r.is_addressed_to(profile))
            .collect();
        requests.sort_by(|a, b| b.request_date.cmp(&a.request_date));

        let count = |status: RequestStatus| requests.iter().filter(|r| r.status == status).count();
        Ok(ReceivedRequests {
            pending: count(RequestStatus::Pending),
            accepted: count(RequestStatus::Accepted),
            requests,
        })
    }

    /// Donor ids `requester` has already asked, in request order.
    ///
    /// # Errors
    ///
    /// Returns an error if the ledger cannot be read.
    pub fn requested_donor_ids(&self, requester: &Requester) -> Result<Vec<String>> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|r| r.fingerprint == fingerprint(&r.donor_id, requester))
            .map(|r| r.donor_id)
            .collect())
    }
}

/// Short relative rendering of `then` as seen at `now`.
///
/// "Just now" under an hour, "N hours ago" under a day, "Yesterday" under
/// two days, otherwise the calendar date.
#[must_use]
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - then).num_hours();
    match hours {
        h if h < 1 => "Just now".to_string(),
        1 => "1 hour ago".to_string(),
        h if h < 24 => format!("{h} hours ago"),
        h if h < 48 => "Yesterday".to_string(),
        _ => then.format("%-d %b %Y").to_string(),
    }
}
