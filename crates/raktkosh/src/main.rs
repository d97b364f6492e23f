//! `raktkosh` - CLI for blood donor coordination
//!
//! This binary provides the command-line interface for searching donors,
//! sending and answering blood requests, and posting hospital emergencies.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use chrono::Utc;
use clap::Parser;

use raktkosh::blood::blood_stock;
use raktkosh::cli::{
    Cli, Command, ConfigCommand, DonorsCommand, EmergencyCommand, EmergencySubmitArgs,
    OutputFormat, RegisterCommand, RequestCommand,
};
use raktkosh::emergency::HOSPITALS;
use raktkosh::profile::WizardStep;
use raktkosh::requests::{relative_time, StatusChange};
use raktkosh::{
    init_logging, Config, DonorDirectory, EmergencyBoard, EmergencyForm, Error, ProfileView,
    RegistrationForm, RegistrationWizard, RequestLedger, Requester, SearchCriteria, Session,
    Storage,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;
    if let Some(path) = cli.database.clone() {
        config.storage.database_path = Some(path);
    }

    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(&config, config_cmd),
        command => command,
    };

    let storage = Storage::open(config.database_path())?;
    let session = Session::new(&storage)?;

    match command {
        Command::Signin(cmd) => handle_signin(&session, &cmd.email, &cmd.password),
        Command::Register(cmd) => handle_register(&session, *cmd),
        Command::Logout => handle_logout(&session),
        Command::Profile(cmd) => handle_profile(&config, &session, cmd.json),
        Command::Donors(cmd) => handle_donors(&config, &storage, &session, cmd),
        Command::Request(cmd) => handle_request(&config, &storage, &session, cmd),
        Command::Emergency(cmd) => handle_emergency(&config, &storage, cmd),
        Command::Stock(cmd) => handle_stock(&config, cmd.format),
        Command::Status(cmd) => handle_status(&config, &storage, &session, cmd.json),
        // Handled before the store is opened.
        Command::Config(_) => Ok(()),
    }
}

fn handle_signin(
    session: &Session<'_>,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let profile = session.sign_in(email, password, Utc::now())?;
    println!("Signed in as {} ({}).", profile.name, profile.email);
    Ok(())
}

fn handle_register(
    session: &Session<'_>,
    cmd: RegisterCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wizard = RegistrationWizard::new(RegistrationForm {
        full_name: cmd.name,
        email: cmd.email,
        phone: cmd.phone,
        date_of_birth: cmd.dob,
        address: cmd.address,
        city: cmd.city,
        state: cmd.state,
        pincode: cmd.pincode,
        blood_group: cmd.blood_group,
        last_donation: cmd.last_donation,
        medical_conditions: cmd.medical_conditions,
        emergency_contact: cmd.emergency_contact,
        agree_terms: cmd.agree_terms,
    });

    while wizard.step() != WizardStep::Confirmation {
        let step = wizard.step().number();
        wizard
            .next()
            .map_err(|e| format!("step {step} of 3: {e}"))?;
    }
    let profile = wizard
        .submit(Utc::now())
        .map_err(|e| format!("step 3 of 3: {e}"))?;
    session.register(&profile)?;

    println!(
        "Registered {} ({}) as a {} donor.",
        profile.name, profile.email, profile.blood_group
    );
    Ok(())
}

fn handle_logout(session: &Session<'_>) -> Result<(), Box<dyn std::error::Error>> {
    if session.logout()? {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

fn handle_profile(
    config: &Config,
    session: &Session<'_>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = Utc::now().date_naive();
    match session.profile_view(today, config.donation_interval())? {
        ProfileView::RedirectToRegistration => {
            println!("No donor profile found.");
            println!("Register with `raktkosh register` or sign in with `raktkosh signin`.");
        }
        ProfileView::Show {
            profile,
            age,
            eligibility,
        } => {
            if json {
                let view = serde_json::json!({
                    "profile": profile,
                    "age": age,
                    "eligible": eligibility.is_eligible(),
                    "eligibility": eligibility.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            println!("{}", profile.name);
            println!("{}", "=".repeat(profile.name.len()));
            println!("Blood group:        {}", profile.blood_group);
            println!("Age:                {age}");
            println!("Status:             {eligibility}");
            println!("Email:              {}", profile.email);
            println!("Phone:              {}", profile.phone);
            println!("Location:           {}", profile.location());
            if let Some(pincode) = &profile.address.pincode {
                println!("Pincode:            {pincode}");
            }
            match profile.last_donation {
                Some(date) => println!("Last donation:      {}", date.format("%-d %b %Y")),
                None => println!("Last donation:      Never"),
            }
            if let Some(conditions) = &profile.medical_conditions {
                println!("Medical conditions: {conditions}");
            }
            if let Some(contact) = &profile.emergency_contact {
                println!("Emergency contact:  {contact}");
            }
            println!(
                "Member since:       {}",
                profile.registered_at.format("%B %Y")
            );
        }
    }
    Ok(())
}

fn load_directory(config: &Config, session: &Session<'_>) -> raktkosh::Result<DonorDirectory> {
    let directory = DonorDirectory::demo();
    Ok(match session.current_profile()? {
        Some(profile) => directory.with_current_user(
            &profile,
            Utc::now().date_naive(),
            config.donation_interval(),
        ),
        None => directory,
    })
}

fn handle_donors(
    config: &Config,
    storage: &Storage,
    session: &Session<'_>,
    cmd: DonorsCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let directory = load_directory(config, session)?;

    match cmd {
        DonorsCommand::Search {
            blood_group,
            location,
            urgency,
            format,
        } => {
            let criteria = SearchCriteria {
                blood_group,
                location,
                urgency: urgency.map_or(config.search.default_urgency, Into::into),
            };
            let donors = directory.search(&criteria);

            let requested = match session.current_profile()? {
                Some(profile) => {
                    RequestLedger::new(storage).requested_donor_ids(&Requester::signed_in(&profile))?
                }
                None => Vec::new(),
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&donors)?),
                OutputFormat::Plain => {
                    for donor in &donors {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            donor.id,
                            donor.name,
                            donor.blood_group,
                            donor.location,
                            if donor.available { "available" } else { "unavailable" }
                        );
                    }
                }
                OutputFormat::Table => {
                    println!("Found {} donor(s)", donors.len());
                    println!();
                    println!(
                        "{:<18} {:<12} {:<5} {:<24} {:<8} {:<14} {:<11} STATUS",
                        "ID", "NAME", "GROUP", "LOCATION", "DIST", "LAST DONATION", "AVAILABLE"
                    );
                    for donor in &donors {
                        let mut status = Vec::new();
                        if donor.verified {
                            status.push("verified");
                        }
                        if donor.can_donate_now(config.eligibility.donor_cooldown_months) {
                            status.push("can donate");
                        }
                        if requested.contains(&donor.id) {
                            status.push("requested");
                        }
                        println!(
                            "{:<18} {:<12} {:<5} {:<24} {:<8} {:<14} {:<11} {}",
                            donor.id,
                            donor.name,
                            donor.blood_group.as_str(),
                            donor.location,
                            donor.distance,
                            donor.last_donation_label(),
                            if donor.available { "yes" } else { "no" },
                            status.join(", ")
                        );
                    }
                }
            }
        }
        DonorsCommand::Show { id, json } => {
            let detail = directory.detail(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(detail)?);
                return Ok(());
            }

            let donor = &detail.donor;
            println!("{} ({})", donor.name, donor.blood_group);
            println!("Location:        {} ({})", donor.location, donor.distance);
            println!("City/State:      {}, {}", detail.city, detail.state);
            println!("Age:             {}", detail.age);
            println!("Phone:           {}", detail.phone);
            println!("Total donations: {}", detail.total_donations);
            println!("Last donation:   {}", donor.last_donation_label());
            println!(
                "Available:       {}",
                if donor.available { "yes" } else { "no" }
            );
            println!(
                "Verified:        {}",
                if donor.verified { "yes" } else { "no" }
            );
            println!("Member since:    {}", detail.registered_since);
        }
    }
    Ok(())
}

fn handle_request(
    config: &Config,
    storage: &Storage,
    session: &Session<'_>,
    cmd: RequestCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = RequestLedger::new(storage);

    match cmd {
        RequestCommand::Send {
            donor_id,
            guest_name,
            guest_blood_group,
            urgency,
        } => {
            let directory = load_directory(config, session)?;
            let donor = directory.get(&donor_id)?;

            let requester = match session.current_profile()? {
                Some(profile) => Requester::signed_in(&profile),
                None => {
                    let blood_group = guest_blood_group.ok_or_else(|| Error::MissingFields {
                        fields: vec!["your blood group"],
                    })?;
                    Requester::guest(guest_name.as_deref().unwrap_or_default(), blood_group)?
                }
            };
            let urgency = urgency.map_or(config.search.default_urgency, Into::into);

            let outcome = ledger.submit(donor, &requester, urgency, Utc::now())?;
            if outcome.is_new() {
                println!(
                    "Request #{} sent to {}. They will be notified.",
                    outcome.request().id,
                    donor.name
                );
            } else {
                println!(
                    "You have already requested {} (request #{}, {}).",
                    donor.name,
                    outcome.request().id,
                    outcome.request().status
                );
            }
        }
        RequestCommand::List { all, format } => {
            let now = Utc::now();
            let (requests, summary) = if all {
                let requests = ledger.all()?;
                let summary = format!("{} request(s) in the ledger", requests.len());
                (requests, summary)
            } else {
                let profile = session.require_profile()?;
                let received = ledger.received_by(&profile)?;
                let summary = format!(
                    "{} pending, {} accepted, {} total",
                    received.pending,
                    received.accepted,
                    received.requests.len()
                );
                (received.requests, summary)
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&requests)?),
                OutputFormat::Plain => {
                    for r in &requests {
                        println!(
                            "{}\t{}\t{}\t{}\t{}",
                            r.id, r.requested_by, r.requester_blood_group, r.urgency, r.status
                        );
                    }
                }
                OutputFormat::Table => {
                    println!("{summary}");
                    println!();
                    println!(
                        "{:<5} {:<16} {:<16} {:<5} {:<9} {:<9} WHEN",
                        "ID", "FROM", "TO", "GROUP", "URGENCY", "STATUS"
                    );
                    for r in &requests {
                        println!(
                            "{:<5} {:<16} {:<16} {:<5} {:<9} {:<9} {}",
                            r.id,
                            r.requested_by,
                            r.donor_name,
                            r.requester_blood_group.as_str(),
                            r.urgency.to_string(),
                            r.status.to_string(),
                            relative_time(r.request_date, now)
                        );
                    }
                }
            }
        }
        RequestCommand::Accept { id } => {
            let profile = session.require_profile()?;
            report_status_change(id, &ledger.accept(&profile, id)?);
        }
        RequestCommand::Decline { id } => {
            let profile = session.require_profile()?;
            report_status_change(id, &ledger.decline(&profile, id)?);
        }
    }
    Ok(())
}

fn report_status_change(id: u64, change: &StatusChange) {
    match change {
        StatusChange::Changed { to, .. } => println!("Request #{id} {to}."),
        StatusChange::Unchanged(status) => {
            println!("Request #{id} is already {status}; nothing changed.");
        }
    }
}

fn handle_emergency(
    config: &Config,
    storage: &Storage,
    cmd: EmergencyCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let board = EmergencyBoard::new(storage, &config.emergency);
    let now = Utc::now();

    match cmd {
        EmergencyCommand::List { format } => {
            let requests = board.load(now)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&requests)?),
                OutputFormat::Plain => {
                    for r in &requests {
                        println!(
                            "{}\t{}\t{}\t{}\t{}\t{}",
                            r.id, r.patient_name, r.blood_group, r.units_required, r.hospital,
                            r.urgency_level
                        );
                    }
                }
                OutputFormat::Table => {
                    println!("{} emergency request(s)", requests.len());
                    println!();
                    println!(
                        "{:<4} {:<16} {:<5} {:<5} {:<20} {:<9} {:<16} POSTED",
                        "ID", "PATIENT", "GROUP", "UNITS", "HOSPITAL", "URGENCY", "CONTACT"
                    );
                    for r in &requests {
                        println!(
                            "{:<4} {:<16} {:<5} {:<5} {:<20} {:<9} {:<16} {}",
                            r.id,
                            r.patient_name,
                            r.blood_group.as_str(),
                            r.units_required,
                            r.hospital,
                            r.urgency_level.to_string(),
                            r.contact_number,
                            relative_time(r.created_at, now)
                        );
                    }
                }
            }
        }
        EmergencyCommand::Submit(args) => {
            let posted = board.submit(&emergency_form(*args), now)?;
            println!(
                "Emergency request #{} posted: {} unit(s) of {} at {}.",
                posted.id, posted.units_required, posted.blood_group, posted.hospital
            );
            println!("Compatible donors in {} will be notified.", posted.location);
        }
        EmergencyCommand::Hospitals => {
            for hospital in HOSPITALS {
                println!("{hospital}");
            }
        }
    }
    Ok(())
}

fn emergency_form(args: EmergencySubmitArgs) -> EmergencyForm {
    EmergencyForm {
        patient_name: args.patient_name,
        patient_age: args.patient_age,
        blood_group: args.blood_group,
        units_required: args.units,
        hospital: args.hospital,
        location: args.location,
        contact_person: args.contact_person,
        contact_number: args.contact_number,
        alternate_contact: args.alternate_contact,
        urgency_level: raktkosh::UrgencyLevel::from(args.urgency_level).to_string(),
        reason: args.reason,
        doctor_name: args.doctor_name,
        doctor_contact: args.doctor_contact,
    }
}

fn handle_stock(config: &Config, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let stock = blood_stock();
    let threshold = config.stock.low_stock_threshold;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stock)?),
        OutputFormat::Plain => {
            for level in &stock {
                println!("{}\t{}", level.group, level.units_available);
            }
        }
        OutputFormat::Table => {
            println!("{:<5} {:>5}  STATUS", "GROUP", "UNITS");
            for level in &stock {
                let mut status = Vec::new();
                if level.is_low(threshold) {
                    status.push("low");
                }
                if level.urgent {
                    status.push("urgently needed");
                }
                println!(
                    "{:<5} {:>5}  {}",
                    level.group.as_str(),
                    level.units_available,
                    status.join(", ")
                );
            }
        }
    }
    Ok(())
}

fn handle_status(
    config: &Config,
    storage: &Storage,
    session: &Session<'_>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = storage.stats()?;
    let profile = session.current_profile()?;
    let requests = RequestLedger::new(storage).all()?.len();

    if json {
        let status = serde_json::json!({
            "signed_in": profile.is_some(),
            "email": profile.as_ref().map(|p| p.email.clone()),
            "database_path": storage.path(),
            "database_size_bytes": stats.db_size_bytes,
            "blood_requests": requests,
            "slots": stats.slots,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("raktkosh status");
        println!("---------------");
        match &profile {
            Some(p) => println!("Session:       signed in as {} ({})", p.name, p.email),
            None => println!("Session:       guest"),
        }
        println!("Database:      {}", storage.path().display());
        println!("Size:          {} bytes", stats.db_size_bytes);
        println!("Requests:      {requests}");
        println!("Config:        {}", Config::default_config_path().display());
        println!(
            "Interval:      {} days between donations",
            config.eligibility.donation_interval_days
        );
        if !stats.slots.is_empty() {
            println!();
            for slot in &stats.slots {
                let updated = slot
                    .updated_at
                    .map_or_else(|| "unknown".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
                println!("  {:<20} {:>8} bytes  {updated}", slot.key, slot.size_bytes);
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Search]");
                println!("  Default urgency:    {}", config.search.default_urgency);
                println!();
                println!("[Eligibility]");
                println!(
                    "  Donation interval:  {} days",
                    config.eligibility.donation_interval_days
                );
                println!(
                    "  Donor cooldown:     {} months",
                    config.eligibility.donor_cooldown_months
                );
                println!();
                println!("[Emergency]");
                println!("  Seed samples:       {}", config.emergency.seed_samples);
                println!();
                println!("[Stock]");
                println!(
                    "  Low stock below:    {} units",
                    config.stock.low_stock_threshold
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
