//! The signed-in session.
//!
//! The stored profile is the session: present means signed in, absent means
//! guest. Every change is published on a [`tokio::sync::watch`] channel so
//! observers always see the latest state without polling the store.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::profile::{DonorProfile, Eligibility, PROFILE_SLOT};
use crate::storage::Storage;

/// Who is using the app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    Guest,
    /// A profile is stored.
    SignedIn {
        /// Profile email.
        email: String,
        /// Profile name.
        name: String,
    },
}

impl SessionState {
    fn from_profile(profile: Option<&DonorProfile>) -> Self {
        profile.map_or(Self::Guest, |p| Self::SignedIn {
            email: p.email.clone(),
            name: p.name.clone(),
        })
    }

    /// Whether a profile is stored.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }
}

/// What the profile screen should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileView {
    /// The stored profile with derived facts.
    Show {
        /// The profile.
        profile: Box<DonorProfile>,
        /// Age in whole years.
        age: i32,
        /// Whether the donor may give blood today.
        eligibility: Eligibility,
    },
    /// No profile is stored; send the user to registration.
    RedirectToRegistration,
}

/// Session over a store.
#[derive(Debug)]
pub struct Session<'a> {
    storage: &'a Storage,
    state: watch::Sender<SessionState>,
}

impl<'a> Session<'a> {
    /// Open a session, reading the initial state from `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored profile cannot be read.
    pub fn new(storage: &'a Storage) -> Result<Self> {
        let profile = storage.load(PROFILE_SLOT)?;
        let (state, _) = watch::channel(SessionState::from_profile(profile.as_ref()));
        Ok(Self { storage, state })
    }

    /// Observe session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The stored profile, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    pub fn current_profile(&self) -> Result<Option<DonorProfile>> {
        self.storage.load(PROFILE_SLOT)
    }

    /// The stored profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotRegistered`] when no profile is stored.
    pub fn require_profile(&self) -> Result<DonorProfile> {
        self.current_profile()?.ok_or(Error::NotRegistered)
    }

    /// Demo sign-in.
    ///
    /// Credentials are not checked beyond being present. The stored profile is
    /// replaced with the demo profile carrying `email`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingFields`] for a blank email or password, or a
    /// storage error.
    pub fn sign_in(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<DonorProfile> {
        let missing: Vec<&'static str> = [("email", email), ("password", password)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingFields { fields: missing });
        }

        let profile = DonorProfile::demo(email, now);
        self.store(&profile)?;
        info!(email = %profile.email, "Signed in");
        Ok(profile)
    }

    /// Store a freshly registered profile and sign it in.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be written.
    pub fn register(&self, profile: &DonorProfile) -> Result<()> {
        self.store(profile)?;
        info!(email = %profile.email, blood_group = %profile.blood_group, "Registered donor");
        Ok(())
    }

    /// Remove the stored profile. Returns whether one was present.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn logout(&self) -> Result<bool> {
        let removed = self.storage.remove(PROFILE_SLOT)?;
        self.state.send_replace(SessionState::Guest);
        if removed {
            info!("Signed out");
        } else {
            debug!("Logout with no stored profile");
        }
        Ok(removed)
    }

    /// Resolve the profile screen for `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be read.
    pub fn profile_view(&self, today: NaiveDate, donation_interval: Duration) -> Result<ProfileView> {
        Ok(match self.current_profile()? {
            Some(profile) => ProfileView::Show {
                age: profile.age_on(today),
                eligibility: profile.eligibility_on(today, donation_interval),
                profile: Box::new(profile),
            },
            None => ProfileView::RedirectToRegistration,
        })
    }

    fn store(&self, profile: &DonorProfile) -> Result<()> {
        self.storage.save(PROFILE_SLOT, profile)?;
        self.state
            .send_replace(SessionState::from_profile(Some(profile)));
        Ok(())
    }
}
