//! Wire types for the ApproveX REST API

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::ChainStep;
use crate::error::ClientError;

/// Overall request status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Draft,
    Submitted,
    Pending,
    TutorReview,
    TutorApproved,
    TutorRejected,
    HodReview,
    HodApproved,
    HodRejected,
    DeanReview,
    Approved,
    Rejected,
    #[default]
    #[serde(other)]
    Unknown,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Rejected)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            RequestStatus::Rejected | RequestStatus::TutorRejected | RequestStatus::HodRejected
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Draft => "Draft",
            RequestStatus::Submitted => "Submitted",
            RequestStatus::Pending => "Pending",
            RequestStatus::TutorReview => "Under Tutor Review",
            RequestStatus::TutorApproved => "Tutor Approved",
            RequestStatus::TutorRejected => "Tutor Rejected",
            RequestStatus::HodReview => "Under HOD Review",
            RequestStatus::HodApproved => "HOD Approved",
            RequestStatus::HodRejected => "HOD Rejected",
            RequestStatus::DeanReview => "Under Dean Review",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Unknown => "Unknown",
        }
    }
}

/// Filter accepted by `bonafide/my/?status=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::Pending => "pending",
            StatusFilter::Approved => "approved",
            StatusFilter::Rejected => "rejected",
        }
    }
}

/// Approval stage a request is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Tutor,
    Hod,
    Dean,
    Done,
    #[serde(other)]
    Unknown,
}

impl Stage {
    pub const CHAIN: [Stage; 3] = [Stage::Tutor, Stage::Hod, Stage::Dean];

    pub fn title(&self) -> &'static str {
        match self {
            Stage::Tutor => "Tutor",
            Stage::Hod => "HOD",
            Stage::Dean => "Dean",
            Stage::Done => "Done",
            Stage::Unknown => "Unknown",
        }
    }
}

/// Staff verdict, sent as `action` on the status PATCH
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub action: Decision,
    #[serde(default)]
    pub comment: String,
}

/// A bonafide certificate request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BonafideRequest {
    pub id: i64,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub roll_number: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub student_username: Option<String>,

    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub status_display: Option<String>,
    #[serde(default)]
    pub current_stage: Option<Stage>,

    #[serde(default)]
    pub tutor_status: Option<String>,
    #[serde(default)]
    pub tutor_comment: Option<String>,
    #[serde(default)]
    pub tutor_name: Option<String>,
    #[serde(default, with = "lenient_time")]
    pub tutor_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub hod_status: Option<String>,
    #[serde(default)]
    pub hod_comment: Option<String>,
    #[serde(default)]
    pub hod_name: Option<String>,
    #[serde(default, with = "lenient_time")]
    pub hod_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub dean_status: Option<String>,
    #[serde(default)]
    pub dean_comment: Option<String>,
    #[serde(default)]
    pub dean_name: Option<String>,
    #[serde(default, with = "lenient_time")]
    pub dean_at: Option<DateTime<Utc>>,

    // AI extraction
    #[serde(default)]
    pub extracted: serde_json::Value,
    #[serde(default)]
    pub checklist: serde_json::Value,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub ai_confidence: Option<f64>,

    #[serde(default)]
    pub permission_file_url: Option<String>,
    #[serde(default)]
    pub approval_chain: Option<Vec<ChainStep>>,

    #[serde(default, with = "lenient_time")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient_time")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-stage record as stored on the request
#[derive(Debug, Clone, PartialEq)]
pub struct StageRecord<'a> {
    pub stage: Stage,
    pub status: Option<&'a str>,
    pub approver: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub at: Option<DateTime<Utc>>,
}

impl BonafideRequest {
    pub fn stage_record(&self, stage: Stage) -> Option<StageRecord<'_>> {
        let (status, approver, comment, at) = match stage {
            Stage::Tutor => (&self.tutor_status, &self.tutor_name, &self.tutor_comment, self.tutor_at),
            Stage::Hod => (&self.hod_status, &self.hod_name, &self.hod_comment, self.hod_at),
            Stage::Dean => (&self.dean_status, &self.dean_name, &self.dean_comment, self.dean_at),
            Stage::Done | Stage::Unknown => return None,
        };
        Some(StageRecord {
            stage,
            status: status.as_deref(),
            approver: approver.as_deref().filter(|s| !s.is_empty()),
            comment: comment.as_deref().filter(|s| !s.is_empty()),
            at,
        })
    }

    /// Still awaiting a decision from somebody
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
            && !matches!(self.current_stage, Some(Stage::Done))
    }
}

/// Result of the AI validity check on an uploaded document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiCheckResult {
    #[serde(default)]
    pub extracted: serde_json::Value,
    #[serde(default)]
    pub checklist: serde_json::Value,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Body of a successful submit. Students without a class get the created
/// request wrapped together with a warning.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmitResponse {
    Warned { warning: String, result: BonafideRequest },
    Created(BonafideRequest),
}

impl SubmitResponse {
    pub fn into_request(self) -> (BonafideRequest, Option<String>) {
        match self {
            SubmitResponse::Warned { warning, result } => (result, Some(warning)),
            SubmitResponse::Created(request) => (request, None),
        }
    }
}

/// Signed, short-lived link to an uploaded file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLink {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(default)]
    pub verb: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_unread")]
    pub unread: bool,
    #[serde(default)]
    pub target_bonafide: Option<i64>,
    #[serde(default, with = "lenient_time")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_unread() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSignup {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub class_code: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StaffSignup {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub designation: crate::session::Designation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hod_department_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dean_type: Option<String>,
}

/// A file to send as the multipart `file` part
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Fields of the bonafide submission form
#[derive(Debug, Clone)]
pub struct BonafideSubmission {
    pub student_name: String,
    pub roll_number: String,
    pub contact: String,
    pub reason: String,
    pub file: Upload,
    /// Result of an earlier `bonafide/check/`, forwarded so the backend can
    /// skip a second extraction
    pub precheck: Option<AiCheckResult>,
}

/// Timestamps arrive as RFC 3339, or naive when the backend runs without
/// time zones. Anything unparseable becomes `None` instead of failing the
/// whole payload.
pub(crate) mod lenient_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }
}
