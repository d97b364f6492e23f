//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::blood::{BloodGroup, Urgency, UrgencyLevel};

fn parse_blood_group(value: &str) -> Result<BloodGroup, String> {
    value.parse().map_err(|e: crate::Error| e.to_string())
}

/// Demo sign-in arguments.
#[derive(Debug, Args)]
pub struct SignInCommand {
    /// Email address
    #[arg(short, long)]
    pub email: String,

    /// Password (not verified)
    #[arg(short, long)]
    pub password: String,
}

/// Registration arguments, one flag per form field.
#[derive(Debug, Args)]
pub struct RegisterCommand {
    /// Full name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Email address
    #[arg(long, default_value = "")]
    pub email: String,

    /// Mobile number
    #[arg(long, default_value = "")]
    pub phone: String,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    pub dob: String,

    /// Street address
    #[arg(long, default_value = "")]
    pub address: String,

    /// City
    #[arg(long, default_value = "")]
    pub city: String,

    /// State
    #[arg(long, default_value = "")]
    pub state: String,

    /// Six-digit pincode
    #[arg(long, default_value = "")]
    pub pincode: String,

    /// Blood group (e.g. "O+", "ab-")
    #[arg(short, long, default_value = "")]
    pub blood_group: String,

    /// Last donation date (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    pub last_donation: String,

    /// Medical conditions, medications or allergies
    #[arg(long, default_value = "")]
    pub medical_conditions: String,

    /// Emergency contact number
    #[arg(long, default_value = "")]
    pub emergency_contact: String,

    /// Agree to the terms and conditions
    #[arg(long)]
    pub agree_terms: bool,
}

/// Profile command arguments.
#[derive(Debug, Args)]
pub struct ProfileCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Donor directory commands.
#[derive(Debug, Subcommand)]
pub enum DonorsCommand {
    /// Search the directory
    Search {
        /// Exact blood group
        #[arg(short, long, value_parser = parse_blood_group)]
        blood_group: Option<BloodGroup>,

        /// Case-insensitive part of the donor location
        #[arg(short, long)]
        location: Option<String>,

        /// How urgent the need is
        #[arg(short, long, value_enum)]
        urgency: Option<UrgencyArg>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one donor's card
    Show {
        /// Donor id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Blood request commands.
#[derive(Debug, Subcommand)]
pub enum RequestCommand {
    /// Ask a donor for blood
    Send {
        /// Donor id
        donor_id: String,

        /// Your name, when not signed in
        #[arg(long)]
        guest_name: Option<String>,

        /// Your blood group, when not signed in
        #[arg(long, value_parser = parse_blood_group)]
        guest_blood_group: Option<BloodGroup>,

        /// How urgent the need is
        #[arg(short, long, value_enum)]
        urgency: Option<UrgencyArg>,
    },

    /// List requests addressed to you
    List {
        /// List every request in the ledger
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Accept a pending request addressed to you
    Accept {
        /// Request id
        id: u64,
    },

    /// Decline a pending request addressed to you
    Decline {
        /// Request id
        id: u64,
    },
}

/// Emergency board commands.
#[derive(Debug, Subcommand)]
pub enum EmergencyCommand {
    /// Show the board
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Post an emergency request
    Submit(Box<EmergencySubmitArgs>),

    /// List suggested hospitals
    Hospitals,
}

/// Emergency form fields.
#[derive(Debug, Args)]
pub struct EmergencySubmitArgs {
    /// Patient name
    #[arg(long, default_value = "")]
    pub patient_name: String,

    /// Patient age
    #[arg(long, default_value = "")]
    pub patient_age: String,

    /// Blood group needed
    #[arg(short, long, default_value = "")]
    pub blood_group: String,

    /// Units required
    #[arg(long, default_value = "")]
    pub units: String,

    /// Hospital name
    #[arg(long, default_value = "")]
    pub hospital: String,

    /// Hospital location
    #[arg(long, default_value = "")]
    pub location: String,

    /// Contact person
    #[arg(long, default_value = "")]
    pub contact_person: String,

    /// Primary contact number
    #[arg(long, default_value = "")]
    pub contact_number: String,

    /// Alternate contact number
    #[arg(long, default_value = "")]
    pub alternate_contact: String,

    /// Urgency level
    #[arg(long, value_enum, default_value = "high")]
    pub urgency_level: UrgencyLevelArg,

    /// Reason for the request
    #[arg(long, default_value = "")]
    pub reason: String,

    /// Treating doctor
    #[arg(long, default_value = "")]
    pub doctor_name: String,

    /// Treating doctor's number
    #[arg(long, default_value = "")]
    pub doctor_contact: String,
}

/// Stock command arguments.
#[derive(Debug, Args)]
pub struct StockCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Search urgency argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UrgencyArg {
    /// Any donor
    Normal,
    /// Available donors only
    Urgent,
    /// Available donors only
    Critical,
}

impl From<UrgencyArg> for Urgency {
    fn from(arg: UrgencyArg) -> Self {
        match arg {
            UrgencyArg::Normal => Self::Normal,
            UrgencyArg::Urgent => Self::Urgent,
            UrgencyArg::Critical => Self::Critical,
        }
    }
}

/// Emergency urgency argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UrgencyLevelArg {
    /// Within hours
    Critical,
    /// Within a day
    High,
    /// Within a few days
    Moderate,
}

impl From<UrgencyLevelArg> for UrgencyLevel {
    fn from(arg: UrgencyLevelArg) -> Self {
        match arg {
            UrgencyLevelArg::Critical => Self::Critical,
            UrgencyLevelArg::High => Self::High,
            UrgencyLevelArg::Moderate => Self::Moderate,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_arg_conversion() {
        assert_eq!(Urgency::from(UrgencyArg::Normal), Urgency::Normal);
        assert_eq!(Urgency::from(UrgencyArg::Urgent), Urgency::Urgent);
        assert_eq!(Urgency::from(UrgencyArg::Critical), Urgency::Critical);
    }

    #[test]
    fn test_urgency_level_arg_conversion() {
        assert_eq!(
            UrgencyLevel::from(UrgencyLevelArg::Critical),
            UrgencyLevel::Critical
        );
        assert_eq!(UrgencyLevel::from(UrgencyLevelArg::High), UrgencyLevel::High);
        assert_eq!(
            UrgencyLevel::from(UrgencyLevelArg::Moderate),
            UrgencyLevel::Moderate
        );
    }

    #[test]
    fn test_parse_blood_group_arg() {
        assert_eq!(parse_blood_group("ab-"), Ok(BloodGroup::AbNegative));
        let err = parse_blood_group("C+").unwrap_err();
        assert!(err.contains("C+"));
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
