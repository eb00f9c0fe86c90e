use clap::Subcommand;
use serde_json::json;

use crate::api::types::Notification;
use crate::api::NotificationFeed;
use crate::cli::config::client;
use crate::cli::utils::{output_empty_collection, output_json, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::poller::Poller;

#[derive(Subcommand)]
pub enum NotifyCommands {
    #[command(about = "List notifications")]
    List {
        #[arg(long, help = "Only unread notifications")]
        unread: bool,
    },

    #[command(about = "Mark a notification as read")]
    Read { id: i64 },

    #[command(about = "Poll for notifications until interrupted")]
    Watch {
        #[arg(long, help = "Seconds between polls (defaults to APPROVEX_POLL_SECS)")]
        interval: Option<u64>,
    },
}

pub async fn handle(cmd: NotifyCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    match cmd {
        NotifyCommands::List { unread } => {
            let mut items = client()?.notifications().await?;
            if unread {
                items.retain(|n| n.unread);
            }
            if items.is_empty() {
                return output_empty_collection(output_format, "notifications", "No notifications");
            }
            match output_format {
                OutputFormat::Json => output_json(&json!({ "notifications": items })),
                OutputFormat::Text => {
                    items.iter().for_each(print_notification);
                    Ok(())
                }
            }
        }
        NotifyCommands::Read { id } => {
            client()?.mark_read(id).await?;
            output_success(output_format, &format!("Notification {} marked read", id), None)
        }
        NotifyCommands::Watch { interval } => {
            let period = interval
                .map(|secs| std::time::Duration::from_secs(secs.max(1)))
                .unwrap_or_else(|| config().poll_interval());
            let (feed, mut rx) = NotificationFeed::new(client()?);
            let poller = Poller::spawn(period, feed);

            let mut seen = std::collections::HashSet::new();
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let fresh: Vec<Notification> = rx
                            .borrow_and_update()
                            .iter()
                            .filter(|n| n.unread && seen.insert(n.id))
                            .cloned()
                            .collect();
                        for n in &fresh {
                            match output_format {
                                OutputFormat::Json => println!("{}", serde_json::to_string(n)?),
                                OutputFormat::Text => print_notification(n),
                            }
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            poller.cancel();
            Ok(())
        }
    }
}

fn print_notification(n: &Notification) {
    let marker = if n.unread { "●" } else { " " };
    let when = n
        .created_at
        .map(|t| t.format("%b %-d, %H:%M").to_string())
        .unwrap_or_default();
    let target = n
        .target_bonafide
        .map(|id| format!(" [request #{}]", id))
        .unwrap_or_default();
    println!("{} {:>4} {} {}{}  {}", marker, n.id, n.verb, n.message, target, when);
}
