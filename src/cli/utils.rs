use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::ClientError;
use crate::validation::FieldErrors;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(
    output_format: &OutputFormat,
    message: &str,
    error_code: Option<&str>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Report a client error. Validation failures are listed per field; every
/// other failure is a single message.
pub fn output_client_error(output_format: &OutputFormat, error: &ClientError) -> anyhow::Result<()> {
    match (output_format, error) {
        (OutputFormat::Json, ClientError::Validation(fields)) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "success": false,
                    "error": "Validation failed",
                    "error_code": error.error_code(),
                    "fields": fields,
                }))?
            );
            Ok(())
        }
        (OutputFormat::Text, ClientError::Validation(fields)) => {
            print_field_errors(fields);
            Ok(())
        }
        (OutputFormat::Text, ClientError::SessionExpired { redirect }) => {
            eprintln!("Error: Session expired. Log in again (redirect: {}).", redirect);
            Ok(())
        }
        _ => output_error(output_format, &error.to_string(), Some(error.error_code())),
    }
}

fn print_field_errors(fields: &FieldErrors) {
    for (field, message) in fields {
        eprintln!("  ⚠ {}: {}", field, message);
    }
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print any serializable value as pretty JSON
pub fn output_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
