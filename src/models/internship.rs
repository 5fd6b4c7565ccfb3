use chrono::{DateTime, Utc};
use rocket_okapi::okapi::schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Lifecycle of a posting. Older documents used `active`/`inactive`/`expired`,
/// those spellings are still accepted when reading.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InternshipStatus {
    #[serde(alias = "inactive")]
    Draft,
    #[serde(alias = "active")]
    Published,
    #[serde(alias = "expired")]
    Closed,
}

impl InternshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternshipStatus::Draft => "draft",
            InternshipStatus::Published => "published",
            InternshipStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for InternshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" | "inactive" => Ok(InternshipStatus::Draft),
            "published" | "active" => Ok(InternshipStatus::Published),
            "closed" | "expired" => Ok(InternshipStatus::Closed),
            other => Err(format!("Unknown internship status '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    Remote,
    #[serde(alias = "office", alias = "in-office")]
    Onsite,
    Hybrid,
}

impl WorkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkMode::Remote => "remote",
            WorkMode::Onsite => "onsite",
            WorkMode::Hybrid => "hybrid",
        }
    }
}

impl FromStr for WorkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "wfh" => Ok(WorkMode::Remote),
            "onsite" | "office" | "in-office" => Ok(WorkMode::Onsite),
            "hybrid" => Ok(WorkMode::Hybrid),
            other => Err(format!("Unknown work mode '{}'", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Internship {
    pub id: String,
    pub recruiter_id: String,

    // Posting
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub work_mode: WorkMode,
    pub stipend: Option<u32>, // monthly
    pub duration_months: Option<u32>,
    pub sector: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub openings: Option<u32>,
    pub logo_url: Option<String>,
    pub deadline: Option<DateTime<Utc>>,

    // Lifecycle
    pub status: InternshipStatus,
    pub published_at: Option<DateTime<Utc>>,

    // Counters
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub applications: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Internship {
    pub fn is_published(&self) -> bool {
        self.status == InternshipStatus::Published
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternshipDto {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: String,
    pub company: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Description must be 10-5000 characters"))]
    pub description: String,
    #[validate(length(min = 2, max = 120, message = "Location is required"))]
    pub location: String,
    pub work_mode: Option<String>,
    pub stipend: Option<u32>,
    #[validate(range(min = 1, max = 24, message = "Duration must be 1-24 months"))]
    pub duration_months: Option<u32>,
    pub sector: Option<String>,
    #[serde(default)]
    #[validate(length(max = 30, message = "At most 30 skills"))]
    pub skills: Vec<String>,
    #[validate(range(min = 1, message = "Openings must be at least 1"))]
    pub openings: Option<u32>,
    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo_url: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInternshipDto {
    #[validate(length(min = 3, max = 120, message = "Title must be 3-120 characters"))]
    pub title: Option<String>,
    pub company: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Description must be 10-5000 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 2, max = 120, message = "Location cannot be empty"))]
    pub location: Option<String>,
    pub work_mode: Option<String>,
    pub stipend: Option<u32>,
    #[validate(range(min = 1, max = 24, message = "Duration must be 1-24 months"))]
    pub duration_months: Option<u32>,
    pub sector: Option<String>,
    #[validate(length(max = 30, message = "At most 30 skills"))]
    pub skills: Option<Vec<String>>,
    #[validate(range(min = 1, message = "Openings must be at least 1"))]
    pub openings: Option<u32>,
    #[validate(url(message = "Logo must be a valid URL"))]
    pub logo_url: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

impl UpdateInternshipDto {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.work_mode.is_none()
            && self.stipend.is_none()
            && self.duration_months.is_none()
            && self.sector.is_none()
            && self.skills.is_none()
            && self.openings.is_none()
            && self.logo_url.is_none()
            && self.deadline.is_none()
    }
}

/// Filter used by the store when listing postings.
#[derive(Debug, Default, Clone)]
pub struct InternshipFilter {
    pub recruiter_id: Option<String>,
    pub status: Option<InternshipStatus>,
    pub sector: Option<String>,
    pub work_mode: Option<WorkMode>,
    /// Case-insensitive substring of the posting location.
    pub location: Option<String>,
}

impl InternshipFilter {
    pub fn matches(&self, internship: &Internship) -> bool {
        self.recruiter_id
            .as_ref()
            .is_none_or(|r| &internship.recruiter_id == r)
            && self.status.is_none_or(|s| internship.status == s)
            && self.sector.as_ref().is_none_or(|s| {
                internship
                    .sector
                    .as_ref()
                    .is_some_and(|own| own.eq_ignore_ascii_case(s))
            })
            && self.work_mode.is_none_or(|m| internship.work_mode == m)
            && self.location.as_ref().is_none_or(|loc| {
                internship
                    .location
                    .to_lowercase()
                    .contains(&loc.to_lowercase())
            })
    }
}

/// Per-posting numbers shown on the recruiter dashboard.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipStats {
    pub id: String,
    pub title: String,
    pub status: InternshipStatus,
    pub views: i64,
    pub applications: i64,
    pub received_applications: u64,
}

/// Open-Graph card fields for link previews.
#[derive(Debug, Serialize, JsonSchema)]
pub struct InternshipOgMeta {
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: String,
    pub stipend: String,
    pub sector: String,
    pub logo: String,
    pub work_mode: String,
}
