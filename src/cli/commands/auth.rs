use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{client, password_or_prompt};
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::error::ClientError;
use crate::guard::{self, Navigation};
use crate::session::{decode_claims, AuthPayload, Designation, Role};
use crate::validation::{StaffSignupForm, StudentSignupForm};

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login with roll number, username or email")]
    Login {
        #[arg(help = "Roll number, username or email")]
        username: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
        #[arg(long = "as", value_name = "ROLE", help = "Require a student or staff account")]
        role: Option<Role>,
    },

    #[command(about = "Create a student account")]
    SignupStudent {
        #[arg(help = "Roll number")]
        roll_number: String,
        #[arg(long)]
        name: String,
        #[arg(long = "class", help = "Class code, e.g. CSE-A")]
        class_code: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Create a staff account")]
    SignupStaff {
        #[arg(help = "Username")]
        username: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "TUTOR, PROGRAM_COORDINATOR, HOD, DEAN or PRINCIPAL")]
        designation: Designation,
        #[arg(long = "class", help = "Class code (tutors and program coordinators)")]
        class_code: Option<String>,
        #[arg(long, help = "Department code (HODs)")]
        department: Option<String>,
        #[arg(long, help = "Dean type (deans)")]
        dean_type: Option<String>,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Clear the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Exchange the refresh token for a new access token")]
    Refresh,

    #[command(about = "Show where a frontend route would land for this session")]
    Route {
        #[arg(help = "Path, e.g. /staff/dashboard or /requestStatus/7")]
        path: String,
    },
}

pub async fn handle(cmd: AuthCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { username, password, role } => {
            let password = password_or_prompt(password)?;
            let api = client()?;
            let payload = match role {
                Some(role) => api.login_as(role, &username, &password).await,
                None => api.login(&username, &password).await,
            }?;
            report_signed_in(output_format, "Logged in", &payload)
        }
        AuthCommands::SignupStudent {
            roll_number,
            name,
            class_code,
            email,
            mobile,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let form = StudentSignupForm {
                username: roll_number,
                name,
                class_code,
                email,
                mobile,
                confirm: password.clone(),
                password,
            };
            let payload = client()?.signup_student(&form).await?;
            report_signed_in(output_format, "Student account created", &payload)
        }
        AuthCommands::SignupStaff {
            username,
            name,
            designation,
            class_code,
            department,
            dean_type,
            email,
            mobile,
            password,
        } => {
            let password = password_or_prompt(password)?;
            let form = StaffSignupForm {
                username,
                name,
                designation: Some(designation),
                class_code,
                hod_department_code: department,
                dean_type,
                email,
                mobile,
                confirm: password.clone(),
                password,
            };
            let payload = client()?.signup_staff(&form).await?;
            report_signed_in(output_format, "Staff account created", &payload)
        }
        AuthCommands::Logout => {
            client()?.session().logout()?;
            output_success(output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let api = client()?;
            let session = api.session();
            let authenticated = session.is_authenticated();
            let role = session.effective_role();
            let expires_at = session
                .access_token()
                .and_then(|t| decode_claims(&t))
                .and_then(|c| c.expires_at());

            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "authenticated": authenticated,
                            "role": role,
                            "expires_at": expires_at,
                            "api_base": api.base_url().as_str(),
                        }))?
                    );
                }
                OutputFormat::Text => {
                    if authenticated {
                        println!("Authenticated ({})", role.map(|r| r.as_str()).unwrap_or("unknown role"));
                        if let Some(at) = expires_at {
                            println!("Access token expires: {}", at.to_rfc3339());
                        }
                    } else {
                        println!("Not authenticated");
                    }
                    println!("API: {}", api.base_url());
                }
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            let api = client()?;
            let session = api.session().current().ok_or(ClientError::NotAuthenticated)?;
            let Some(user) = session.user.as_ref() else {
                return output_error(output_format, "No profile stored for this session", None);
            };

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(user)?),
                OutputFormat::Text => {
                    println!("{} ({})", user.display_name(), user.username);
                    match session.role() {
                        Some(role) => println!("Role: {}", role),
                        None => println!("Role: unknown"),
                    }
                    if let Some(designation) = user.profile.designation() {
                        println!("Designation: {}", designation);
                    }
                    if let Some(class) = user.profile.student_class() {
                        println!("Class: {}", class);
                    }
                    if let Some(department) = user.profile.department() {
                        println!("Department: {}", department);
                    }
                    if !user.email.is_empty() {
                        println!("Email: {}", user.email);
                    }
                }
            }
            Ok(())
        }
        AuthCommands::Refresh => {
            let api = client()?;
            if api.refresh_access().await {
                output_success(output_format, "Access token refreshed", None)
            } else {
                Err(ClientError::session_expired(guard::routes::LANDING).into())
            }
        }
        AuthCommands::Route { path } => {
            let api = client()?;
            let (outcome, target) = match guard::navigate(api.session(), &path) {
                Navigation::Render(route) => ("render", route.spec.name.to_string()),
                Navigation::Redirect(dest) => ("redirect", dest),
                Navigation::NotFound => ("not_found", "404".to_string()),
            };
            match output_format {
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "path": path,
                        "outcome": outcome,
                        "target": target,
                    }))?
                ),
                OutputFormat::Text => println!("{} -> {} {}", path, outcome, target),
            }
            Ok(())
        }
    }
}

fn report_signed_in(
    output_format: &OutputFormat,
    message: &str,
    payload: &AuthPayload,
) -> anyhow::Result<()> {
    let user = payload.user.as_ref();
    let name = user.map(|u| u.display_name().to_string()).unwrap_or_default();
    output_success(
        output_format,
        &format!("{} as {}", message, name),
        Some(json!({
            "user": user,
            "dashboard": user.map(|u| guard::dashboard_for(u.role())),
        })),
    )
}
