use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================
// Platform
// ============================

/// The two platforms a tester can sign up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

impl Platform {
    /// Parse the platform value clients submit. Anything but the two known
    /// values is treated as absent, not as a malformed request.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ios" => Some(Platform::Ios),
            "android" => Some(Platform::Android),
            _ => None,
        }
    }

    /// Numeric code stored in the `type` column of the tester table.
    pub fn type_code(self) -> u8 {
        match self {
            Platform::Ios => 0,
            Platform::Android => 1,
        }
    }

    /// Human-readable label used in email copy.
    pub fn label(self) -> &'static str {
        match self {
            Platform::Ios => "iOS",
            Platform::Android => "Android",
        }
    }
}

// ============================
// Store Records
// ============================

/// A registered beta tester, as stored in the `tester` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tester {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub platform_type: u8,
    pub created_at: DateTime<Utc>,
    pub invite: bool,
}

/// One row appended to the `history` table when a tester is invited.
#[derive(Debug, Serialize)]
pub struct HistoryRecord {
    pub tester_id: Uuid,
    pub invited: bool,
    pub invited_at: DateTime<Utc>,
    pub notes: String,
}

// ============================
// Request Bodies
// ============================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthRequest {
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TesterIdsRequest {
    #[serde(default)]
    pub tester_ids: Vec<Uuid>,
}

/// A tester to invite by email; the admin page sends the rows it already
/// holds rather than having the server re-fetch them.
#[derive(Debug, Deserialize)]
pub struct InviteTarget {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteEmailRequest {
    #[serde(default)]
    pub testers: Vec<InviteTarget>,
    pub invite_link: Option<String>,
}

// ============================
// Response Bodies
// ============================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub email_warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TestersResponse {
    pub success: bool,
    pub data: Vec<Tester>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTestersResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteTestersResponse {
    pub success: bool,
    pub message: String,
    pub invited_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteEmailResponse {
    pub success: bool,
    pub message: String,
    pub success_count: usize,
    pub fail_count: usize,
}

#[derive(Debug, Serialize)]
pub struct KeepAliveResponse {
    pub success: bool,
    pub count: usize,
    pub timestamp: String,
}

// ============================
// Error Types
// ============================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
        }
    }
}
