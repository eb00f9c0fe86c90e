use clap::Subcommand;
use serde_json::json;

use crate::api::types::{BonafideRequest, Decision, RequestStatus, Stage};
use crate::cli::commands::request::print_requests;
use crate::cli::config::client;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ReviewCommands {
    #[command(about = "Requests waiting at your stage")]
    Incoming,

    #[command(about = "Approve a request at your stage")]
    Approve {
        id: i64,
        #[arg(long, default_value = "")]
        comment: String,
    },

    #[command(about = "Reject a request at your stage")]
    Reject {
        id: i64,
        #[arg(long, default_value = "")]
        comment: String,
    },

    #[command(about = "Requests in your queue that have already been decided")]
    History,
}

pub async fn handle(cmd: ReviewCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ReviewCommands::Incoming => {
            let requests = client()?.incoming_requests().await?;
            let pending: Vec<BonafideRequest> = requests.into_iter().filter(in_queue).collect();
            print_requests(output_format, &pending, "No requests waiting for review")
        }
        ReviewCommands::Approve { id, comment } => decide(output_format, id, Decision::Approved, &comment).await,
        ReviewCommands::Reject { id, comment } => decide(output_format, id, Decision::Rejected, &comment).await,
        ReviewCommands::History => {
            let requests = client()?.incoming_requests().await?;
            let decided: Vec<BonafideRequest> = requests
                .into_iter()
                .filter(already_reviewed)
                .collect();
            print_requests(output_format, &decided, "No reviewed requests yet")
        }
    }
}

async fn decide(output_format: &OutputFormat, id: i64, action: Decision, comment: &str) -> anyhow::Result<()> {
    let updated = client()?.decide(id, action, comment).await?;
    let verb = match action {
        Decision::Approved => "approved",
        Decision::Rejected => "rejected",
    };
    output_success(
        output_format,
        &format!("Request #{} {} (now {})", id, verb, updated.status.label()),
        Some(json!({ "request": updated })),
    )
}

/// The server only returns requests at the caller's stage; anything not yet done stays listed
fn in_queue(request: &BonafideRequest) -> bool {
    !matches!(request.current_stage, Some(Stage::Done))
}

fn already_reviewed(request: &BonafideRequest) -> bool {
    request.status != RequestStatus::Pending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: &str, stage: &str) -> BonafideRequest {
        serde_json::from_value(json!({ "id": 3, "status": status, "current_stage": stage })).unwrap()
    }

    #[test]
    fn draft_at_tutor_stage_stays_in_queue() {
        let draft = request("draft", "tutor");
        assert!(in_queue(&draft));
    }

    #[test]
    fn finished_requests_leave_the_queue() {
        assert!(!in_queue(&request("approved", "done")));
        assert!(in_queue(&request("hod_review", "hod")));
    }

    #[test]
    fn history_excludes_only_pending() {
        assert!(!already_reviewed(&request("pending", "tutor")));
        assert!(already_reviewed(&request("tutor_approved", "hod")));
        assert!(already_reviewed(&request("rejected", "done")));
    }
}
