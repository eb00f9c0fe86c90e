//! Field-level checks run before anything is sent to the backend.
//!
//! Every validator returns a [`FieldErrors`] map keyed by form field; an
//! empty map means the input is acceptable.

use std::collections::BTreeMap;

use crate::api::types::{BonafideSubmission, Upload};
use crate::session::Designation;

pub type FieldErrors = BTreeMap<String, String>;

/// Default client-side upload cap (5 MB)
pub const MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Clone, Default)]
pub struct StudentSignupForm {
    /// Roll number, used as the username
    pub username: String,
    pub name: String,
    pub class_code: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub confirm: String,
}

#[derive(Debug, Clone, Default)]
pub struct StaffSignupForm {
    pub username: String,
    pub name: String,
    pub designation: Option<Designation>,
    pub class_code: Option<String>,
    pub hod_department_code: Option<String>,
    pub dean_type: Option<String>,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub confirm: String,
}

fn reject(errors: &mut FieldErrors, field: &str, message: &str) {
    errors.insert(field.to_string(), message.to_string());
}

pub fn validate_login(username: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if username.trim().is_empty() {
        reject(&mut errors, "username", "Roll number or email is required");
    }
    if password.is_empty() {
        reject(&mut errors, "password", "Password is required");
    }
    errors
}

pub fn validate_student_signup(form: &StudentSignupForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let roll = form.username.trim();
    if roll.is_empty() {
        reject(&mut errors, "username", "Roll number is required");
    } else if !is_valid_roll_number(roll) {
        reject(&mut errors, "username", "Roll number must be 4-20 alphanumeric characters");
    }
    if form.name.trim().is_empty() {
        reject(&mut errors, "name", "Full name is required");
    }
    if form.class_code.trim().is_empty() {
        reject(&mut errors, "class_code", "Please select your class");
    }
    check_contact_fields(&mut errors, &form.email, &form.mobile, &form.password, &form.confirm);

    errors
}

pub fn validate_staff_signup(form: &StaffSignupForm) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if form.username.trim().is_empty() {
        reject(&mut errors, "username", "Username is required");
    }
    if form.name.trim().is_empty() {
        reject(&mut errors, "name", "Full name is required");
    }
    match form.designation {
        None => reject(&mut errors, "designation", "Select designation"),
        Some(Designation::Other) => reject(&mut errors, "designation", "Unknown designation"),
        Some(_) => {}
    }
    check_contact_fields(&mut errors, &form.email, &form.mobile, &form.password, &form.confirm);

    errors
}

fn check_contact_fields(
    errors: &mut FieldErrors,
    email: &str,
    mobile: &str,
    password: &str,
    confirm: &str,
) {
    if !is_valid_email(email.trim()) {
        reject(errors, "email", "Enter a valid email address");
    }
    if !is_valid_mobile(mobile) {
        reject(errors, "mobile", "Mobile must be exactly 10 digits");
    }
    if password.chars().count() < 6 {
        reject(errors, "password", "Password must be at least 6 characters");
    }
    if password != confirm {
        reject(errors, "confirm", "Passwords do not match");
    }
}

/// Text fields of the bonafide form; the upload itself is checked by
/// [`validate_upload`]
pub fn validate_bonafide(submission: &BonafideSubmission) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if !is_valid_mobile(&submission.contact) {
        reject(&mut errors, "contact", "Enter a valid 10-digit mobile number");
    }
    if submission.reason.trim().is_empty() {
        reject(&mut errors, "reason", "Reason is required");
    }
    if submission.file.bytes.is_empty() {
        reject(&mut errors, "file", "Permission letter PDF is required");
    }

    errors
}

pub fn validate_upload(upload: &Upload, max_bytes: u64) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if upload.bytes.is_empty() {
        reject(&mut errors, "file", "Permission letter PDF is required");
    } else if !upload.file_name.to_ascii_lowercase().ends_with(".pdf")
        || !upload.bytes.starts_with(PDF_MAGIC)
    {
        reject(&mut errors, "file", "Only PDF files are accepted");
    } else if upload.size() > max_bytes {
        let limit_mb = max_bytes / (1024 * 1024);
        errors.insert(
            "file".to_string(),
            format!("File size must be under {}MB", limit_mb.max(1)),
        );
    }

    errors
}

/// Strip spaces, dashes, and parentheses from a phone number
pub fn clean_mobile(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect()
}

pub fn is_valid_mobile(raw: &str) -> bool {
    let cleaned = clean_mobile(raw);
    cleaned.len() == 10 && cleaned.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_roll_number(raw: &str) -> bool {
    (4..=20).contains(&raw.len()) && raw.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// `local@domain.tld` with no whitespace and a dotted domain
pub fn is_valid_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
