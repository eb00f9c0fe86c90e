use crate::error::ClientError;
use crate::session::{AuthPayload, Designation, Role};
use crate::validation::{self, StaffSignupForm, StudentSignupForm};

use super::client::ApiClient;
use super::types::{LoginRequest, StaffSignup, StudentSignup};

pub const LOGIN_PATH: &str = "/api/auth/login/";
pub const STUDENT_SIGNUP_PATH: &str = "/api/auth/student/signup/";
pub const STAFF_SIGNUP_PATH: &str = "/api/auth/staff/signup/";

impl ApiClient {
    /// Log in with a username (or email) and persist the returned session
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthPayload, ClientError> {
        let errors = validation::validate_login(username, password);
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        let payload: AuthPayload = self
            .post_json(
                LOGIN_PATH,
                &LoginRequest {
                    username: username.trim().to_string(),
                    password: password.to_string(),
                },
            )
            .await?;

        self.session().save_auth(&payload)?;
        Ok(payload)
    }

    /// Log in and require a particular role, as the role-specific login
    /// screens do. A mismatch leaves no session behind.
    pub async fn login_as(
        &self,
        expected: Role,
        username: &str,
        password: &str,
    ) -> Result<AuthPayload, ClientError> {
        let payload = self.login(username, password).await?;
        self.verify_role(expected, &payload)?;
        Ok(payload)
    }

    pub async fn signup_student(&self, form: &StudentSignupForm) -> Result<AuthPayload, ClientError> {
        let errors = validation::validate_student_signup(form);
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        let body = StudentSignup {
            username: form.username.trim().to_string(),
            password: form.password.clone(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            class_code: form.class_code.trim().to_string(),
            mobile: validation::clean_mobile(&form.mobile),
        };

        let payload: AuthPayload = self.post_json(STUDENT_SIGNUP_PATH, &body).await?;
        self.session().save_auth(&payload)?;
        self.verify_role(Role::Student, &payload)?;
        Ok(payload)
    }

    pub async fn signup_staff(&self, form: &StaffSignupForm) -> Result<AuthPayload, ClientError> {
        let errors = validation::validate_staff_signup(form);
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }
        let designation = form
            .designation
            .ok_or_else(|| ClientError::config("designation is required"))?;

        let body = StaffSignup {
            username: form.username.trim().to_string(),
            password: form.password.clone(),
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            mobile: validation::clean_mobile(&form.mobile),
            designation,
            // Only the scope field matching the designation is sent
            class_code: matches!(designation, Designation::Tutor | Designation::ProgramCoordinator)
                .then(|| non_blank(&form.class_code))
                .flatten(),
            hod_department_code: (designation == Designation::Hod)
                .then(|| non_blank(&form.hod_department_code))
                .flatten(),
            dean_type: (designation == Designation::Dean)
                .then(|| non_blank(&form.dean_type))
                .flatten(),
        };

        let payload: AuthPayload = self.post_json(STAFF_SIGNUP_PATH, &body).await?;
        self.session().save_auth(&payload)?;
        self.verify_role(Role::Staff, &payload)?;
        Ok(payload)
    }

    fn verify_role(&self, expected: Role, payload: &AuthPayload) -> Result<(), ClientError> {
        let actual = payload.user.as_ref().map(|u| u.role());
        if actual == Some(expected) {
            return Ok(());
        }

        tracing::warn!("Expected a {} account, server returned {:?}", expected, actual);
        if let Err(e) = self.session().logout() {
            tracing::warn!("Failed to clear mismatched session: {}", e);
        }
        Err(ClientError::UnexpectedRole { expected, actual })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
