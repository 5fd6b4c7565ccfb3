use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecruiterStatus {
    Pending,
    Active,
    Suspended,
    Deactivated,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recruiter {
    pub uid: String,
    pub company_name: String,
    pub company_website: Option<String>,
    pub contact_email: Option<String>,
    pub designation: Option<String>,
    pub is_verified: bool,
    pub status: RecruiterStatus,
    #[serde(default)]
    pub internships_created: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRecruiterDto {
    #[validate(length(min = 2, max = 120, message = "Company name must be 2-120 characters"))]
    pub company_name: String,
    #[validate(url(message = "Company website must be a valid URL"))]
    pub company_website: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 80, message = "Designation is too long"))]
    pub designation: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterStatusResponse {
    pub exists: bool,
    pub is_verified: bool,
    pub status: Option<RecruiterStatus>,
    pub can_post: bool,
    pub internships_created: i64,
}
