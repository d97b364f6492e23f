//! `raktkosh` - Blood donor coordination
//!
//! This library provides the donor directory and search, the blood request
//! ledger, the hospital emergency board and the signed-in session, all backed
//! by a small typed SQLite store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod blood;
pub mod cli;
pub mod config;
pub mod directory;
pub mod emergency;
pub mod error;
pub mod logging;
pub mod profile;
pub mod requests;
pub mod search;
pub mod session;
pub mod storage;

pub use blood::{BloodGroup, Urgency, UrgencyLevel};
pub use config::Config;
pub use directory::{Donor, DonorDetail, DonorDirectory};
pub use emergency::{EmergencyBoard, EmergencyForm, EmergencyRequest};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use profile::{DonorProfile, RegistrationForm, RegistrationWizard};
pub use requests::{BloodRequest, RequestLedger, RequestStatus, Requester};
pub use search::SearchCriteria;
pub use session::{ProfileView, Session, SessionState};
pub use storage::{Storage, StorageStats};
