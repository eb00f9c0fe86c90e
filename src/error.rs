// Client Error Types
use thiserror::Error;

use crate::session::Role;
use crate::validation::FieldErrors;

/// Errors surfaced by the ApproveX client.
///
/// Mirrors the two user-facing categories: network/parse failures, which are
/// shown once as a generic alert, and validation failures, which are reported
/// per field before anything is sent.
#[derive(Debug, Error)]
pub enum ClientError {
    // Transport
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Parse(#[from] serde_json::Error),

    // Non-2xx from the backend
    #[error("{detail}")]
    Api { status: u16, detail: String },

    // Refresh failed; session was cleared and the caller must go to `redirect`
    #[error("Session expired, redirecting to {redirect}")]
    SessionExpired { redirect: String },

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("{}", role_mismatch(.expected, .actual))]
    UnexpectedRole {
        expected: Role,
        actual: Option<Role>,
    },

    #[error("Validation failed: {}", summarize(.0))]
    Validation(FieldErrors),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session store error: {0}")]
    Store(#[from] std::io::Error),
}

fn role_mismatch(expected: &Role, actual: &Option<Role>) -> String {
    match (expected, actual) {
        (Role::Student, Some(Role::Staff)) => {
            "You are registered as staff. Please use the staff login instead.".to_string()
        }
        (Role::Staff, Some(Role::Student)) => {
            "You are registered as a student. Please use the student login instead.".to_string()
        }
        (expected, None) => format!("Expected a {} account but the server returned no role", expected),
        (expected, Some(actual)) => format!("Expected a {} account, got {}", expected, actual),
    }
}

fn summarize(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{}: {}", field, message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ClientError {
    pub fn api(status: u16, detail: impl Into<String>) -> Self {
        ClientError::Api {
            status,
            detail: detail.into(),
        }
    }

    pub fn session_expired(redirect: impl Into<String>) -> Self {
        ClientError::SessionExpired {
            redirect: redirect.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        ClientError::Config(message.into())
    }

    /// HTTP status when the error came from a backend response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for failures the user can only retry by hand
    pub fn is_network_or_parse(&self) -> bool {
        !matches!(self, ClientError::Validation(_))
    }

    /// Stable code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Network(_) => "NETWORK_ERROR",
            ClientError::Parse(_) => "INVALID_RESPONSE",
            ClientError::Api { status: 401, .. } => "UNAUTHORIZED",
            ClientError::Api { status: 403, .. } => "FORBIDDEN",
            ClientError::Api { status: 404, .. } => "NOT_FOUND",
            ClientError::Api { status, .. } if *status >= 500 => "SERVER_ERROR",
            ClientError::Api { .. } => "BAD_REQUEST",
            ClientError::SessionExpired { .. } => "SESSION_EXPIRED",
            ClientError::NotAuthenticated => "NOT_AUTHENTICATED",
            ClientError::UnexpectedRole { .. } => "ROLE_MISMATCH",
            ClientError::Validation(_) => "VALIDATION_ERROR",
            ClientError::Config(_) => "CONFIG_ERROR",
            ClientError::Store(_) => "STORE_ERROR",
        }
    }
}

/// Pull a human message out of a backend error body.
///
/// The backend answers errors as `{"detail": "..."}`; serializer failures come
/// back as a field map instead, which is passed through as compact JSON.
pub fn detail_from_body(body: Option<&serde_json::Value>, fallback: &str) -> String {
    match body {
        Some(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => serde_json::Value::Object(map.clone()).to_string(),
        },
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}
