use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub id: String,
    pub recruiter_id: String,
    pub company_name: String,
    #[serde(default)]
    pub documents: Vec<String>,
    pub status: VerificationStatus,
    pub reviewer_note: Option<String>,
    pub reviewed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVerificationDto {
    #[validate(length(min = 1, max = 10, message = "Provide 1-10 supporting documents"))]
    pub documents: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVerificationDto {
    pub approve: bool,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsernameClaim {
    pub username: String,
    pub uid: String,
    pub claimed_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClaimUsernameDto {
    pub username: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct UsernameAvailability {
    pub username: String,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub id: String,
    pub referrer_uid: String,
    pub referred_uid: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RedeemReferralDto {
    pub code: String,
}
