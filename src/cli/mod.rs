pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

#[derive(Parser)]
#[command(name = "approvex")]
#[command(about = "ApproveX CLI - bonafide requests and approvals from the terminal")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Login, signup and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Student bonafide requests")]
    Request {
        #[command(subcommand)]
        cmd: commands::request::RequestCommands,
    },

    #[command(about = "Staff review queue and decisions")]
    Review {
        #[command(subcommand)]
        cmd: commands::review::ReviewCommands,
    },

    #[command(about = "Notifications")]
    Notify {
        #[command(subcommand)]
        cmd: commands::notify::NotifyCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &output_format).await,
        Commands::Request { cmd } => commands::request::handle(cmd, &output_format).await,
        Commands::Review { cmd } => commands::review::handle(cmd, &output_format).await,
        Commands::Notify { cmd } => commands::notify::handle(cmd, &output_format).await,
    };

    // Client errors get their own formatting; print once and exit
    if let Err(e) = result {
        if let Some(client_error) = e.downcast_ref::<ClientError>() {
            utils::output_client_error(&output_format, client_error)?;
            std::process::exit(1);
        }
        return Err(e);
    }

    Ok(())
}
