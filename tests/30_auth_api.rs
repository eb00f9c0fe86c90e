mod common;

use anyhow::Result;
use approvex::session::{Designation, FileStore, Role};
use approvex::validation::{StaffSignupForm, StudentSignupForm};
use approvex::{ApiClient, ClientError, SessionContext};

use common::{MockBackend, PASSWORD};

fn student_form() -> StudentSignupForm {
    StudentSignupForm {
        username: "22CS104".into(),
        name: "Meera Nair".into(),
        class_code: "CSE-B".into(),
        email: "22cs104@college.edu".into(),
        mobile: "98765-43210".into(),
        password: PASSWORD.into(),
        confirm: PASSWORD.into(),
    }
}

fn staff_form(designation: Designation) -> StaffSignupForm {
    StaffSignupForm {
        username: "hod_cse".into(),
        name: "Dr. Ramesh".into(),
        designation: Some(designation),
        class_code: Some("CSE-A".into()),
        hod_department_code: Some("CSE".into()),
        dean_type: Some("ACADEMIC".into()),
        email: "hod@college.edu".into(),
        mobile: "9123456780".into(),
        password: PASSWORD.into(),
        confirm: PASSWORD.into(),
    }
}

#[tokio::test]
async fn login_persists_session() -> Result<()> {
    let backend = MockBackend::start().await?;
    let client = backend.client();

    let payload = client.login(" 21CS001 ", PASSWORD).await?;

    assert_eq!(payload.user.as_ref().map(|u| u.role()), Some(Role::Student));
    assert_eq!(backend.state.last_body().unwrap()["username"], "21CS001");
    assert!(client.session().is_authenticated());
    assert_eq!(client.session().role_from_token(), Some(Role::Student));
    assert_eq!(client.session().get_user().unwrap().name, "Arjun Kumar");
    Ok(())
}

#[tokio::test]
async fn bad_credentials_surface_detail() -> Result<()> {
    let backend = MockBackend::start().await?;
    let client = backend.client();

    let err = client.login("21CS001", "wrong-password").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(err.status_code(), Some(401));
    assert!(!client.session().is_authenticated());
    // Login never goes through the refresh path
    assert_eq!(backend.state.refresh_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn empty_login_is_rejected_locally() -> Result<()> {
    let backend = MockBackend::start().await?;

    let err = backend.client().login("", "").await.unwrap_err();

    let ClientError::Validation(fields) = err else {
        panic!("expected validation error");
    };
    assert!(fields.contains_key("username"));
    assert!(fields.contains_key("password"));
    assert!(backend.state.last_body().is_none());
    Ok(())
}

#[tokio::test]
async fn staff_account_on_student_login_is_signed_out() -> Result<()> {
    let backend = MockBackend::start().await?;
    let client = backend.client();

    let err = client.login_as(Role::Student, "tutor1", PASSWORD).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "You are registered as staff. Please use the staff login instead."
    );
    assert!(client.session().access_token().is_none());
    Ok(())
}

#[tokio::test]
async fn student_signup_sends_cleaned_mobile() -> Result<()> {
    let backend = MockBackend::start().await?;
    let client = backend.client();

    let payload = client.signup_student(&student_form()).await?;

    let body = backend.state.last_body().unwrap();
    assert_eq!(body["mobile"], "9876543210");
    assert_eq!(body["class_code"], "CSE-B");
    assert_eq!(payload.user.unwrap().username, "22CS104");
    assert!(client.session().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn signup_field_errors_pass_through() -> Result<()> {
    let backend = MockBackend::start().await?;
    let form = StudentSignupForm {
        email: "taken@college.edu".into(),
        ..student_form()
    };

    let err = backend.client().signup_student(&form).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    assert_eq!(err.to_string(), r#"{"email":["Email already registered."]}"#);
    Ok(())
}

#[tokio::test]
async fn staff_signup_sends_only_matching_scope() -> Result<()> {
    let backend = MockBackend::start().await?;

    backend.client().signup_staff(&staff_form(Designation::Hod)).await?;
    let body = backend.state.last_body().unwrap();
    assert_eq!(body["designation"], "HOD");
    assert_eq!(body["hod_department_code"], "CSE");
    assert!(body.get("class_code").is_none());
    assert!(body.get("dean_type").is_none());

    backend.client().signup_staff(&staff_form(Designation::Tutor)).await?;
    let body = backend.state.last_body().unwrap();
    assert_eq!(body["class_code"], "CSE-A");
    assert!(body.get("hod_department_code").is_none());

    backend.client().signup_staff(&staff_form(Designation::Dean)).await?;
    let body = backend.state.last_body().unwrap();
    assert_eq!(body["dean_type"], "ACADEMIC");
    assert!(body.get("class_code").is_none());
    Ok(())
}

#[tokio::test]
async fn file_store_keeps_session_between_clients() -> Result<()> {
    let backend = MockBackend::start().await?;
    let dir = tempfile::tempdir()?;

    let first = ApiClient::new(&backend.base_url, SessionContext::new(FileStore::in_dir(dir.path())))?;
    first.login("tutor1", PASSWORD).await?;

    let second = ApiClient::new(&backend.base_url, SessionContext::new(FileStore::in_dir(dir.path())))?;
    assert!(second.session().is_authenticated());
    assert_eq!(second.session().role_from_token(), Some(Role::Staff));
    assert_eq!(
        second.session().get_user().and_then(|u| u.profile.designation()),
        Some(Designation::Tutor)
    );

    second.session().logout()?;
    assert!(!first.session().is_authenticated());
    Ok(())
}
