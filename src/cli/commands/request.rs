use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::api::types::{AiCheckResult, BonafideRequest, BonafideSubmission, StatusFilter, Upload};
use crate::chain::{chain_for, render_text};
use crate::cli::config::client;
use crate::cli::utils::{output_empty_collection, output_json, output_success};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::error::ClientError;

#[derive(Subcommand)]
pub enum RequestCommands {
    #[command(about = "Run the AI check on a permission letter without submitting")]
    Check {
        #[arg(help = "PDF file")]
        file: PathBuf,
    },

    #[command(about = "Submit a bonafide request")]
    Submit {
        #[arg(help = "Permission letter PDF")]
        file: PathBuf,
        #[arg(long, help = "10-digit mobile number")]
        contact: String,
        #[arg(long)]
        reason: String,
        #[arg(long, help = "Defaults to the signed-in name")]
        name: Option<String>,
        #[arg(long, help = "Defaults to the signed-in roll number")]
        roll_number: Option<String>,
        #[arg(long, help = "Run the AI check first and forward its result")]
        precheck: bool,
    },

    #[command(about = "List your requests")]
    Mine {
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
    },

    #[command(about = "Show one request with its approval chain")]
    Show {
        id: i64,
        #[arg(long, help = "One-line chain instead of the full timeline")]
        compact: bool,
    },

    #[command(about = "Get a short-lived link to the uploaded file")]
    FileUrl { id: i64 },
}

pub async fn handle(cmd: RequestCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    let max_bytes = config().upload.max_upload_bytes;

    match cmd {
        RequestCommands::Check { file } => {
            let upload = Upload::from_path(&file)?;
            let result = client()?.check_bonafide(&upload, max_bytes).await?;
            match output_format {
                OutputFormat::Json => output_json(&result),
                OutputFormat::Text => {
                    print_check(&result);
                    Ok(())
                }
            }
        }
        RequestCommands::Submit {
            file,
            contact,
            reason,
            name,
            roll_number,
            precheck,
        } => {
            let api = client()?;
            let user = api.session().get_user();
            let student_name = name
                .or_else(|| user.as_ref().map(|u| u.display_name().to_string()))
                .ok_or(ClientError::NotAuthenticated)?;
            let roll_number = roll_number
                .or_else(|| user.as_ref().map(|u| u.username.clone()))
                .ok_or(ClientError::NotAuthenticated)?;

            let upload = Upload::from_path(&file)?;
            let precheck = if precheck {
                let result = api.check_bonafide(&upload, max_bytes).await?;
                if matches!(output_format, OutputFormat::Text) {
                    print_check(&result);
                }
                Some(result)
            } else {
                None
            };

            let submission = BonafideSubmission {
                student_name,
                roll_number,
                contact,
                reason,
                file: upload,
                precheck,
            };
            let created = api.submit_bonafide(&submission, max_bytes).await?;
            output_success(
                output_format,
                &format!("Request #{} submitted", created.id),
                Some(json!({ "request": created })),
            )
        }
        RequestCommands::Mine { status } => {
            let requests = client()?.my_requests(status).await?;
            print_requests(output_format, &requests, "No requests found")
        }
        RequestCommands::Show { id, compact } => {
            let request = client()?.get_request(id).await?;
            match output_format {
                OutputFormat::Json => output_json(&json!({
                    "request": request,
                    "chain": chain_for(&request),
                })),
                OutputFormat::Text => {
                    print_detail(&request, compact);
                    Ok(())
                }
            }
        }
        RequestCommands::FileUrl { id } => {
            let url = client()?.file_link(id).await?;
            match output_format {
                OutputFormat::Json => output_json(&json!({ "url": url })),
                OutputFormat::Text => {
                    println!("{}", url);
                    Ok(())
                }
            }
        }
    }
}

fn print_check(result: &AiCheckResult) {
    if result.is_valid {
        println!("✅ All fields verified, ready to submit");
    } else {
        println!("⚠️  Some fields missing, review before submitting");
    }
    if let Some(explanation) = result.explanation.as_deref().filter(|e| !e.is_empty()) {
        println!("{}", explanation);
    }
    if let Some(checklist) = result.checklist.as_object() {
        for (item, ok) in checklist {
            let mark = if ok.as_bool().unwrap_or(false) { "✓" } else { "✗" };
            println!("  {} {}", mark, item);
        }
    }
}

pub(crate) fn print_requests(
    output_format: &OutputFormat,
    requests: &[BonafideRequest],
    empty_message: &str,
) -> anyhow::Result<()> {
    if requests.is_empty() {
        return output_empty_collection(output_format, "requests", empty_message);
    }

    match output_format {
        OutputFormat::Json => output_json(&json!({ "requests": requests })),
        OutputFormat::Text => {
            for request in requests {
                println!(
                    "#{:<5} {:<20} {:<12} {:<22} {}",
                    request.id,
                    truncate(&request.student_name, 20),
                    request.roll_number,
                    request.status.label(),
                    render_text(&chain_for(request), true)
                );
            }
            Ok(())
        }
    }
}

pub(crate) fn print_detail(request: &BonafideRequest, compact: bool) {
    println!("Request #{} · {}", request.id, request.status.label());
    println!("Student: {} ({})", request.student_name, request.roll_number);
    println!("Contact: {}", request.contact);
    println!("Reason:  {}", request.reason);
    if let Some(created) = request.created_at {
        println!("Created: {}", created.format("%Y-%m-%d %H:%M"));
    }
    println!();
    print!("{}", render_text(&chain_for(request), compact));
    if compact {
        println!();
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let cut: String = value.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
