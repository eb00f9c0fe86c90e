use crate::error::ClientError;
use crate::validation;

use super::client::{ApiClient, Call, FormPart};
use super::types::{
    AiCheckResult, BonafideRequest, BonafideSubmission, Decision, FileLink, StatusFilter,
    StatusUpdate, SubmitResponse, Upload,
};

const BONAFIDE: &str = "/api/auth/bonafide";

fn file_part(upload: &Upload) -> FormPart {
    FormPart::File {
        name: "file".to_string(),
        file_name: upload.file_name.clone(),
        bytes: upload.bytes.clone(),
    }
}

impl ApiClient {
    /// Run the AI validity check on a document without submitting it
    pub async fn check_bonafide(&self, upload: &Upload, max_bytes: u64) -> Result<AiCheckResult, ClientError> {
        let errors = validation::validate_upload(upload, max_bytes);
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        let call = Call::post(format!("{}/check/", BONAFIDE)).multipart(vec![file_part(upload)]);
        self.auth_fetch(call).await
    }

    pub async fn submit_bonafide(
        &self,
        submission: &BonafideSubmission,
        max_bytes: u64,
    ) -> Result<BonafideRequest, ClientError> {
        let mut errors = validation::validate_bonafide(submission);
        errors.extend(validation::validate_upload(&submission.file, max_bytes));
        if !errors.is_empty() {
            return Err(ClientError::Validation(errors));
        }

        let mut parts = vec![
            FormPart::text("student_name", submission.student_name.trim()),
            FormPart::text("roll_number", submission.roll_number.trim()),
            FormPart::text("contact", validation::clean_mobile(&submission.contact)),
            FormPart::text("reason", submission.reason.trim()),
            file_part(&submission.file),
            FormPart::text("purpose", "bonafide"),
        ];
        if let Some(check) = &submission.precheck {
            parts.push(FormPart::text("pre_extracted", non_null_object(&check.extracted)));
            parts.push(FormPart::text("pre_checklist", non_null_object(&check.checklist)));
            parts.push(FormPart::text("pre_is_valid", check.is_valid.to_string()));
        }

        let call = Call::post(format!("{}/submit/", BONAFIDE)).multipart(parts);
        let response: SubmitResponse = self.auth_fetch(call).await?;
        let (created, warning) = response.into_request();
        if let Some(warning) = warning {
            tracing::warn!("Request {} created with warning: {}", created.id, warning);
        }
        tracing::info!("Submitted bonafide request {}", created.id);
        Ok(created)
    }

    /// The signed-in student's own requests
    pub async fn my_requests(&self, filter: Option<StatusFilter>) -> Result<Vec<BonafideRequest>, ClientError> {
        let mut call = Call::get(format!("{}/my/", BONAFIDE));
        if let Some(filter) = filter {
            call = call.query("status", filter.as_str());
        }
        self.auth_fetch(call).await
    }

    /// Requests waiting at the signed-in staff member's stage
    pub async fn incoming_requests(&self) -> Result<Vec<BonafideRequest>, ClientError> {
        self.auth_fetch(Call::get(format!("{}/incoming/", BONAFIDE))).await
    }

    pub async fn get_request(&self, id: i64) -> Result<BonafideRequest, ClientError> {
        self.auth_fetch(Call::get(format!("{}/{}/", BONAFIDE, id))).await
    }

    /// Approve or reject at the caller's stage; the server decides whether
    /// the caller may act and where the request goes next
    pub async fn decide(
        &self,
        id: i64,
        action: Decision,
        comment: &str,
    ) -> Result<BonafideRequest, ClientError> {
        let call = Call::patch(format!("{}/{}/status/", BONAFIDE, id)).json(&StatusUpdate {
            action,
            comment: comment.trim().to_string(),
        })?;
        let updated: BonafideRequest = self.auth_fetch(call).await?;
        tracing::info!("Request {} marked {:?}", id, action);
        Ok(updated)
    }

    pub async fn file_link(&self, id: i64) -> Result<String, ClientError> {
        let link: FileLink = self
            .auth_fetch(Call::post(format!("{}/{}/file-token/", BONAFIDE, id)))
            .await?;
        link.url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ClientError::api(200, "No URL returned"))
    }
}

fn non_null_object(value: &serde_json::Value) -> String {
    if value.is_null() {
        "{}".to_string()
    } else {
        value.to_string()
    }
}
