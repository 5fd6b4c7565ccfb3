use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Canonical application status. Legacy spellings (`under_review`,
/// `interview_scheduled`, ...) are folded into one variant each.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationStatus {
    Pending,
    Applied,
    #[serde(alias = "under_review", alias = "under-review", alias = "in_review")]
    InReview,
    Shortlisted,
    #[serde(alias = "interview_scheduled", alias = "interview-scheduled")]
    Interview,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 8] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Applied,
        ApplicationStatus::InReview,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::InReview => "in-review",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Final outcome reached; the student can no longer withdraw.
    pub fn is_decided(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Accepted | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// Whether a recruiter may move an application from `self` to `next`.
    /// Withdrawal belongs to the student, everything else is open.
    pub fn recruiter_can_set(&self, next: ApplicationStatus) -> bool {
        *self != ApplicationStatus::Withdrawn && next != ApplicationStatus::Withdrawn
    }

    /// Human readable text used in notifications.
    pub fn describe(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "is pending",
            ApplicationStatus::Applied => "has been received",
            ApplicationStatus::InReview => "is under review",
            ApplicationStatus::Shortlisted => "has been shortlisted",
            ApplicationStatus::Interview => "has moved to the interview stage",
            ApplicationStatus::Accepted => "has been accepted",
            ApplicationStatus::Rejected => "was not selected",
            ApplicationStatus::Withdrawn => "was withdrawn",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "applied" => Ok(ApplicationStatus::Applied),
            "in-review" | "in_review" | "under_review" | "under-review" => {
                Ok(ApplicationStatus::InReview)
            }
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "interview" | "interview_scheduled" | "interview-scheduled" => {
                Ok(ApplicationStatus::Interview)
            }
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "withdrawn" => Ok(ApplicationStatus::Withdrawn),
            other => Err(format!("Unknown application status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub internship_id: String,
    pub recruiter_id: String,
    pub user_id: String,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct ApplicationFilter {
    pub recruiter_id: Option<String>,
    pub user_id: Option<String>,
    pub internship_id: Option<String>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn matches(&self, application: &Application) -> bool {
        self.recruiter_id
            .as_ref()
            .is_none_or(|r| &application.recruiter_id == r)
            && self.user_id.as_ref().is_none_or(|u| &application.user_id == u)
            && self
                .internship_id
                .as_ref()
                .is_none_or(|i| &application.internship_id == i)
            && self.status.is_none_or(|s| application.status == s)
    }
}

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyDto {
    #[validate(length(max = 3000, message = "Cover letter is limited to 3000 characters"))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApplicationStatusDto {
    pub status: String,
    #[serde(default)]
    pub notify: Option<bool>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateApplicationStatusDto {
    pub application_ids: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub notify: Option<bool>,
    pub message: Option<String>,
}

/// Outcome for one id of a bulk status update.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub application_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateReport {
    pub status: ApplicationStatus,
    pub updated: usize,
    pub failed: usize,
    pub results: Vec<BulkItemResult>,
}

/// An applicant together with their match score for the posting.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    pub application: Application,
    pub display_name: Option<String>,
    pub skills: Vec<String>,
    pub score: u8,
}
