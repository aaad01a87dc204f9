pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "huddle",
    about = "Huddle operator CLI",
    long_about = "Apply database migrations, inspect effective configuration, and run readiness checks for huddle-server.",
    after_help = "Examples:\n  huddle doctor --json\n  huddle config\n  huddle migrate --status\n  huddle connect-slack --team-id team-1 --access-token xoxp-..."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate {
        #[arg(long, help = "List pending migrations without applying them")]
        status: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, webhook signing, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Store or replace a team's Slack access token")]
    ConnectSlack {
        #[arg(long, help = "Team that owns the Slack workspace")]
        team_id: String,
        #[arg(long, help = "Slack OAuth access token (xoxp-/xoxb-)")]
        access_token: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate { status } => commands::migrate::run(status),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::ConnectSlack { team_id, access_token } => {
            commands::connect_slack::run(&team_id, &access_token)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
