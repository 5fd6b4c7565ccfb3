use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{Application, Internship, InternshipStats, Notification, Profile, Recruiter};

/// Everything the platform stores about one user, as a single document.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDataExport {
    pub uid: String,
    pub exported_at: DateTime<Utc>,
    pub profile: Option<Profile>,
    pub recruiter: Option<Recruiter>,
    pub applications: Vec<Application>,
    pub received_applications: Vec<Application>,
    pub internships: Vec<Internship>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusChange {
    pub uid: String,
    pub status: String,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDeletionReport {
    pub uid: String,
    pub profile_deleted: bool,
    pub recruiter_deleted: bool,
    pub internships_deleted: u64,
    pub applications_deleted: u64,
    pub notifications_deleted: u64,
    pub usernames_released: u64,
}

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterAnalytics {
    pub total_internships: usize,
    pub published_internships: usize,
    pub draft_internships: usize,
    pub closed_internships: usize,
    pub total_views: i64,
    pub total_applications: u64,
    pub applications_by_status: BTreeMap<String, u64>,
    /// Applications per view, in percent, rounded to two decimals.
    pub conversion_rate: f64,
    pub internships: Vec<InternshipStats>,
}
