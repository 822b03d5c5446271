//! ytsetup - set up and test a YouTrack connection from the terminal.

use std::process::ExitCode;

use clap::Parser;
use crossterm::style::Stylize;

use ytsetup::cli::{self, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.writes_log() {
        let settings_path = cli.settings_path().ok();
        if let Err(e) = ytsetup::logging::init(settings_path.as_deref()) {
            eprintln!("Logging disabled: {}", e);
        }
    }

    match cli::run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            if e.is_critical() {
                tracing::error!("{}", e);
            } else {
                tracing::warn!("{}", e);
            }
            eprintln!("{}", e.user_message().red());
            if let Some(action) = e.suggested_action() {
                eprintln!("{}", action);
            }
            if e.is_recoverable() {
                eprintln!("This may be temporary; running the command again can help.");
            }
            ExitCode::FAILURE
        }
    }
}
