use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Deactivated,
}

/// Student (or any signed-in user) profile, keyed by auth uid.
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,

    // Matching inputs
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub sectors: Vec<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    pub stipend_preference: Option<u32>,

    pub referral_code: Option<String>,

    #[serde(default)]
    pub account_status: AccountStatus,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        let now = Utc::now();
        Profile {
            uid: uid.into(),
            display_name: None,
            email,
            username: None,
            skills: Vec::new(),
            sectors: Vec::new(),
            location: None,
            preferred_locations: Vec::new(),
            stipend_preference: None,
            referral_code: None,
            account_status: AccountStatus::Active,
            deactivated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }
}

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 80, message = "Display name must be 1-80 characters"))]
    pub display_name: Option<String>,
    #[validate(length(max = 50, message = "At most 50 skills"))]
    pub skills: Option<Vec<String>>,
    #[validate(length(max = 20, message = "At most 20 sectors"))]
    pub sectors: Option<Vec<String>>,
    #[validate(length(max = 120, message = "Location is too long"))]
    pub location: Option<String>,
    #[validate(length(max = 10, message = "At most 10 preferred locations"))]
    pub preferred_locations: Option<Vec<String>>,
    pub stipend_preference: Option<u32>,
}
