//! Command-line interface.
//!
//! Each subcommand is a thin layer over the library: it gathers input,
//! calls into `setup`, `config` or `tracking`, and prints the result.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use crossterm::style::Stylize;
use tracing::{info, warn};

use crate::api::{SecretToken, YouTrackClient, YouTrackProbe};
use crate::config::Settings;
use crate::error::Result;
use crate::setup::address::segments;
use crate::setup::credentials::store_for;
use crate::setup::{
    CommitPlan, ConnectionAttempt, ConnectionRequest, ConnectionValidator, CredentialStore,
    KeyringStore, NotifierState, PatternTokenClassifier,
};
use crate::tracking::{
    choose_work_item_type, InactivityPeriod, ScheduledTime, TrackingMode, TrackingUpdate,
    WorkItemChoice,
};

#[derive(Debug, Parser)]
#[command(name = "ytsetup", version, about = "Set up and test a YouTrack connection")]
pub struct Cli {
    /// Settings file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Test a server address and token without saving anything.
    Test(ConnectionArgs),
    /// Test a connection and save it.
    Save(SaveArgs),
    /// Change time tracking settings.
    Tracking(TrackingArgs),
    /// Print the current settings.
    Show,
}

#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// YouTrack server URL; `http://` is assumed without a scheme.
    #[arg(long, default_value = "")]
    pub url: String,

    /// Permanent token or application password.
    #[arg(long, env = "YOUTRACK_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,

    /// Connect through the configured proxy.
    #[arg(long)]
    pub use_proxy: bool,
}

#[derive(Debug, Args)]
pub struct SaveArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Share the server URL with other users of the project.
    #[arg(long)]
    pub share: bool,

    /// Keep the token for this session only instead of the OS keyring.
    #[arg(long)]
    pub no_remember_token: bool,
}

#[derive(Debug, Args)]
pub struct TrackingArgs {
    #[arg(long, value_enum)]
    pub mode: Option<TrackingMode>,

    /// Post tracked time daily at HH:MM.
    #[arg(long, value_name = "HH:MM", conflicts_with = "no_schedule")]
    pub scheduled_at: Option<String>,

    /// Stop posting on a schedule.
    #[arg(long)]
    pub no_schedule: bool,

    #[arg(long, requires = "inactivity_minutes")]
    pub inactivity_hours: Option<u64>,

    /// Idle minutes before automatic tracking pauses.
    #[arg(long)]
    pub inactivity_minutes: Option<u64>,

    /// Post tracked time on commit.
    #[arg(long)]
    pub post_on_commit: Option<bool>,

    /// Post tracked time when the project is closed.
    #[arg(long)]
    pub post_on_close: Option<bool>,

    /// Default work item comment.
    #[arg(long)]
    pub comment: Option<String>,

    /// Work item type, e.g. "Development".
    #[arg(long = "type", value_name = "TYPE")]
    pub work_item_type: Option<String>,
}

impl TrackingArgs {
    fn into_update(self) -> Result<TrackingUpdate> {
        let scheduled_time = self
            .scheduled_at
            .as_deref()
            .map(str::parse::<ScheduledTime>)
            .transpose()?;
        let scheduled = if self.no_schedule {
            Some(false)
        } else if scheduled_time.is_some() {
            Some(true)
        } else {
            None
        };
        let inactivity = self
            .inactivity_minutes
            .map(|minutes| InactivityPeriod::new(self.inactivity_hours.unwrap_or(0), minutes));

        Ok(TrackingUpdate {
            mode: self.mode,
            scheduled,
            scheduled_time,
            inactivity,
            post_on_commit: self.post_on_commit,
            post_on_close: self.post_on_close,
            comment: self.comment,
            work_item_type: self.work_item_type,
        })
    }
}

type Validator = ConnectionValidator<
    YouTrackProbe,
    PatternTokenClassifier,
    Box<dyn CredentialStore + Send + Sync>,
>;

impl Cli {
    /// The settings file this invocation reads and writes.
    pub fn settings_path(&self) -> Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => Ok(Settings::default_path()?),
        }
    }

    /// Whether the command talks to a server or changes settings, and so is
    /// worth a log file.
    pub fn writes_log(&self) -> bool {
        !matches!(self.command, Command::Show)
    }
}

/// Run a parsed command line.
///
/// Returns `false` when the command finished but the user still has
/// something to fix (a failed or incomplete connection test).
pub async fn run(cli: Cli) -> Result<bool> {
    let path = cli.settings_path()?;
    info!(path = %path.display(), "Using settings file");

    match cli.command {
        Command::Test(args) => {
            let settings = Settings::load_from(&path)?;
            let validator = connection_validator(&settings, settings.repository.remember_token);
            let attempt = validator
                .validate(&connection_request(&settings, &args))
                .await;
            print_attempt(&attempt);
            Ok(attempt.outcome.is_success() || attempt.outcome.is_advisory())
        }
        Command::Save(args) => save(&path, args).await,
        Command::Tracking(args) => {
            let mut settings = Settings::load_from(&path)?;
            let connected = settings.repository.verified;
            settings.tracking.apply(args.into_update()?, connected)?;
            settings.save_to(&path)?;
            println!("Time tracking: {:?}", settings.tracking.effective_mode(connected));
            Ok(true)
        }
        Command::Show => {
            let settings = Settings::load_from(&path)?;
            show(&settings);
            Ok(true)
        }
    }
}

fn connection_validator(settings: &Settings, remember_token: bool) -> Validator {
    ConnectionValidator::new(
        YouTrackProbe::new(settings.proxy.proxy_url()),
        PatternTokenClassifier::new(),
        store_for(remember_token),
    )
}

fn connection_request(settings: &Settings, args: &ConnectionArgs) -> ConnectionRequest {
    ConnectionRequest::new(args.url.as_str(), SecretToken::new(args.token.as_str()))
        .with_proxy(args.use_proxy, settings.proxy.is_host_configured())
}

async fn save(path: &Path, args: SaveArgs) -> Result<bool> {
    let mut settings = Settings::load_from(path)?;
    let validator = connection_validator(&settings, !args.no_remember_token);

    let attempt = validator
        .validate(&connection_request(&settings, &args.connection))
        .await;
    print_attempt(&attempt);
    let plan = CommitPlan::for_attempt(&attempt);

    let report = plan.apply(&attempt, &mut settings, validator.store(), args.share, path)?;
    if let Some(url) = &report.saved_url {
        println!("Saved {}", url);
        if !report.token_remembered {
            println!(
                "{}",
                "The token is not kept after ytsetup exits; pass --token again next time."
                    .yellow()
            );
        }
    }
    if let Some(reason) = &report.rejected {
        println!("{}", format!("Not saved: {}", reason).red());
    }

    if plan.refresh_issues {
        let choice = work_item_types(&settings, &attempt.token).await;
        print_work_item_types(&choice);
    }

    if !plan.close {
        println!("{}", "Settings need attention before they are complete.".yellow());
    }
    Ok(plan.close
        && attempt.outcome != NotifierState::ConnectionFailed
        && report.rejected.is_none())
}

async fn work_item_types(settings: &Settings, token: &SecretToken) -> WorkItemChoice {
    let proxy = if settings.repository.use_proxy {
        settings.proxy.proxy_url()
    } else {
        None
    };
    let client =
        YouTrackClient::with_credentials(&settings.repository.url, token, proxy.as_deref());
    let fetched = match client {
        Ok(client) => match client.get_work_item_types().await {
            Ok(types) => Some(types.into_iter().map(|t| t.name).collect()),
            Err(e) => {
                warn!("Work item types cannot be loaded: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Work item types cannot be loaded: {}", e);
            None
        }
    };

    choose_work_item_type(fetched, settings.tracking.work_item_type.as_deref())
}

fn print_attempt(attempt: &ConnectionAttempt) {
    let message = attempt.outcome.message();
    if attempt.outcome.is_success() {
        println!("{}", message.green());
    } else if attempt.outcome.is_advisory() {
        println!("{}", message.yellow());
    } else {
        println!("{}", message.red());
    }

    if let Some(failure) = &attempt.failure {
        println!("  {}", failure.as_str().dark_grey());
    }
    if attempt.outcome.is_user_input_error() {
        println!("  Check the --url and --token values.");
    }

    if let Some(canonical) = &attempt.normalized_address {
        let diff = attempt.correction.unwrap_or_default();
        let rendered: String = segments(canonical, &diff)
            .into_iter()
            .map(|segment| {
                if segment.changed {
                    segment.text.green().to_string()
                } else {
                    segment.text
                }
            })
            .collect();
        if diff.has_changes() {
            println!("  Server URL: {} (corrected by the server)", rendered);
        } else {
            println!("  Server URL: {}", rendered);
        }
    }
}

fn print_work_item_types(choice: &WorkItemChoice) {
    if choice.types.is_empty() {
        return;
    }
    println!("Work item types:");
    for (idx, name) in choice.types.iter().enumerate() {
        let marker = if choice.selected == Some(idx) { "*" } else { " " };
        println!("  {} {}", marker, name);
    }
}

fn show(settings: &Settings) {
    let repo = &settings.repository;
    if repo.is_configured() {
        println!("Server URL:     {}", repo.url);
        println!("Verified:       {}", repo.verified);
        println!("Shared:         {}", repo.shared);
        println!("Use proxy:      {}", repo.use_proxy);
        if repo.remember_token {
            let has_token = KeyringStore::new().has_token(repo.credential_account());
            println!("Token stored:   {}", has_token);
        } else {
            println!("Token stored:   no (session only, pass --token each run)");
        }
    } else {
        println!("No YouTrack server configured. Run 'ytsetup save --url <URL>'.");
    }

    match settings.proxy.proxy_url() {
        Some(url) => println!("Proxy:          {}", url),
        None => println!("Proxy:          not configured"),
    }

    let tracking = &settings.tracking;
    println!("Time tracking:  {:?}", tracking.effective_mode(repo.verified));
    if tracking.scheduled {
        println!("  Scheduled at: {}", tracking.scheduled_time);
    }
    println!("  Inactivity:   {}", tracking.inactivity);
    let editable = tracking.availability(repo.verified).editable_fields();
    if editable.is_empty() {
        println!("  Editable:     none");
    } else {
        println!("  Editable:     {}", editable.join(", "));
    }
    if let Some(kind) = &tracking.work_item_type {
        println!("  Type:         {}", kind);
    }
    if !tracking.comment.is_empty() {
        println!("  Comment:      {}", tracking.comment);
    }

    if let Some(dir) = crate::logging::log_directory() {
        println!("Logs:           {}", dir.display());
    }
}
