//! Command-line interface for raktkosh.
//!
//! This module provides the CLI structure for the `raktkosh` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DonorsCommand, EmergencyCommand, EmergencySubmitArgs, OutputFormat,
    ProfileCommand, RegisterCommand, RequestCommand, SignInCommand, StatusCommand, StockCommand,
    UrgencyArg, UrgencyLevelArg,
};

use crate::logging::Verbosity;

/// raktkosh - Find blood donors and coordinate requests
///
/// Search nearby donors, send and answer blood requests, and post hospital
/// emergencies from the terminal.
#[derive(Debug, Parser)]
#[command(name = "raktkosh")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the database, overriding configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with the demo account
    Signin(SignInCommand),

    /// Register as a donor
    Register(Box<RegisterCommand>),

    /// Sign out and forget the stored profile
    Logout,

    /// Show your donor profile
    Profile(ProfileCommand),

    /// Browse the donor directory
    #[command(subcommand)]
    Donors(DonorsCommand),

    /// Send and answer blood requests
    #[command(subcommand)]
    Request(RequestCommand),

    /// Hospital emergency board
    #[command(subcommand)]
    Emergency(EmergencyCommand),

    /// Show blood bank stock
    Stock(StockCommand),

    /// Show session and storage status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blood::BloodGroup;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "raktkosh");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        assert_eq!(parse(&["raktkosh", "-q", "status"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["raktkosh", "status"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["raktkosh", "-v", "status"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["raktkosh", "-vv", "status"]).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_global_paths() {
        let cli = parse(&[
            "raktkosh",
            "stock",
            "--config",
            "/custom/config.toml",
            "--database",
            "/tmp/r.db",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/r.db")));
    }

    #[test]
    fn test_parse_signin() {
        let cli = parse(&["raktkosh", "signin", "-e", "a@b.com", "-p", "pw"]);
        let Command::Signin(cmd) = cli.command else {
            panic!("expected signin");
        };
        assert_eq!(cmd.email, "a@b.com");
        assert_eq!(cmd.password, "pw");
    }

    #[test]
    fn test_parse_donor_search() {
        let cli = parse(&[
            "raktkosh", "donors", "search", "-b", "o+", "-l", "saket", "-u", "critical", "-f",
            "json",
        ]);
        let Command::Donors(DonorsCommand::Search {
            blood_group,
            location,
            urgency,
            format,
        }) = cli.command
        else {
            panic!("expected donors search");
        };
        assert_eq!(blood_group, Some(BloodGroup::OPositive));
        assert_eq!(location.as_deref(), Some("saket"));
        assert_eq!(urgency, Some(UrgencyArg::Critical));
        assert_eq!(format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_rejects_unknown_blood_group() {
        let result = Cli::try_parse_from(["raktkosh", "donors", "search", "-b", "Z+"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_guest_request() {
        let cli = parse(&[
            "raktkosh",
            "request",
            "send",
            "2",
            "--guest-name",
            "Asha",
            "--guest-blood-group",
            "B-",
        ]);
        let Command::Request(RequestCommand::Send {
            donor_id,
            guest_name,
            guest_blood_group,
            urgency,
        }) = cli.command
        else {
            panic!("expected request send");
        };
        assert_eq!(donor_id, "2");
        assert_eq!(guest_name.as_deref(), Some("Asha"));
        assert_eq!(guest_blood_group, Some(BloodGroup::BNegative));
        assert_eq!(urgency, None);
    }

    #[test]
    fn test_parse_request_accept() {
        let cli = parse(&["raktkosh", "request", "accept", "7"]);
        assert!(matches!(
            cli.command,
            Command::Request(RequestCommand::Accept { id: 7 })
        ));
    }

    #[test]
    fn test_parse_emergency_submit_defaults() {
        let cli = parse(&[
            "raktkosh",
            "emergency",
            "submit",
            "--patient-name",
            "Ravi",
            "--units",
            "2",
        ]);
        let Command::Emergency(EmergencyCommand::Submit(args)) = cli.command else {
            panic!("expected emergency submit");
        };
        assert_eq!(args.patient_name, "Ravi");
        assert_eq!(args.units, "2");
        assert_eq!(args.urgency_level, UrgencyLevelArg::High);
        assert!(args.hospital.is_empty());
    }

    #[test]
    fn test_parse_register_terms_flag() {
        let cli = parse(&["raktkosh", "register", "--name", "Meera", "--agree-terms"]);
        let Command::Register(cmd) = cli.command else {
            panic!("expected register");
        };
        assert_eq!(cmd.name, "Meera");
        assert!(cmd.agree_terms);
    }
}
