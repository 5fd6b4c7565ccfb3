use chrono::Utc;
use serde::Serialize;
use validator::Validate;

use super::authorization::{is_applicant, owns_internship};
use super::scoring::match_score;
use super::{Caller, ServiceError, ServiceResult};
use crate::config::Settings;
use crate::db::{Page, StatusWrite, Store};
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, ApplyDto, Internship, InternshipFilter,
    InternshipOgMeta, InternshipStatus, Notification, Profile, UpdateProfileDto, WorkMode,
};

const OG_DESCRIPTION_LIMIT: usize = 200;

#[derive(Debug, Default)]
pub struct BrowseQuery {
    pub sector: Option<String>,
    pub location: Option<String>,
    pub work_mode: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, rocket_okapi::okapi::schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipPage {
    pub internships: Vec<Internship>,
    pub page: i64,
    pub limit: i64,
    pub total: u64,
    pub pages: i64,
}

#[derive(Debug, Serialize, rocket_okapi::okapi::schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScoredInternship {
    pub internship: Internship,
    pub score: u8,
}

#[derive(Debug, Serialize, rocket_okapi::okapi::schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewCount {
    pub internship_id: String,
    pub views: i64,
}

/// Student-facing operations plus the public posting views.
pub struct StudentService<'a> {
    store: &'a dyn Store,
    settings: &'a Settings,
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    format!("{}...", cut.trim_end())
}

fn trimmed_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

impl<'a> StudentService<'a> {
    pub fn new(store: &'a dyn Store, settings: &'a Settings) -> Self {
        StudentService { store, settings }
    }

    /// The caller's profile, created empty on first access.
    pub async fn profile(&self, caller: &Caller) -> ServiceResult<Profile> {
        if let Some(profile) = self.store.get_profile(&caller.uid).await? {
            return Ok(profile);
        }
        let profile = Profile::new(&caller.uid, caller.email.clone());
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    async fn active_profile(&self, caller: &Caller) -> ServiceResult<Profile> {
        let profile = self.profile(caller).await?;
        if !profile.is_active() {
            return Err(ServiceError::precondition("Account is deactivated"));
        }
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        caller: &Caller,
        dto: UpdateProfileDto,
    ) -> ServiceResult<Profile> {
        dto.validate()?;
        let mut profile = self.active_profile(caller).await?;

        if let Some(name) = dto.display_name {
            profile.display_name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
        }
        if let Some(skills) = dto.skills {
            profile.skills = trimmed_list(skills);
        }
        if let Some(sectors) = dto.sectors {
            profile.sectors = trimmed_list(sectors);
        }
        if let Some(location) = dto.location {
            profile.location = Some(location.trim().to_string()).filter(|l| !l.is_empty());
        }
        if let Some(locations) = dto.preferred_locations {
            profile.preferred_locations = trimmed_list(locations);
        }
        if let Some(stipend) = dto.stipend_preference {
            profile.stipend_preference = Some(stipend);
        }
        profile.updated_at = Utc::now();

        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn browse(&self, query: BrowseQuery) -> ServiceResult<InternshipPage> {
        let work_mode = query
            .work_mode
            .as_deref()
            .map(|m| m.parse::<WorkMode>().map_err(ServiceError::InvalidArgument))
            .transpose()?;
        let page = Page::new(query.page.unwrap_or(1), query.limit.unwrap_or(20));

        let filter = InternshipFilter {
            status: Some(InternshipStatus::Published),
            sector: query.sector.filter(|s| !s.trim().is_empty()),
            location: query.location.filter(|l| !l.trim().is_empty()),
            work_mode,
            ..Default::default()
        };

        let internships = self.store.list_internships(&filter, Some(page)).await?;
        let total = self.store.count_internships(&filter).await?;

        Ok(InternshipPage {
            internships,
            page: (page.skip as i64 / page.limit) + 1,
            limit: page.limit,
            total,
            pages: (total as f64 / page.limit as f64).ceil() as i64,
        })
    }

    /// Drafts and closed postings are visible only to their owner.
    pub async fn internship(&self, caller: Option<&Caller>, id: &str) -> ServiceResult<Internship> {
        let internship = self
            .store
            .get_internship(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Internship not found"))?;

        let is_owner = caller.is_some_and(|c| owns_internship(&internship, &c.uid));
        if !internship.is_published() && !is_owner {
            return Err(ServiceError::not_found("Internship not found"));
        }
        Ok(internship)
    }

    pub async fn recommended(&self, caller: &Caller, limit: Option<i64>) -> ServiceResult<Vec<ScoredInternship>> {
        let profile = self.profile(caller).await?;
        let limit = limit.unwrap_or(20).clamp(1, 100) as usize;

        let filter = InternshipFilter {
            status: Some(InternshipStatus::Published),
            ..Default::default()
        };
        let mut scored: Vec<ScoredInternship> = self
            .store
            .list_internships(&filter, None)
            .await?
            .into_iter()
            .filter(|i| i.recruiter_id != caller.uid)
            .map(|internship| ScoredInternship {
                score: match_score(&profile, &internship),
                internship,
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(limit);
        Ok(scored)
    }

    pub async fn track_view(&self, id: &str) -> ServiceResult<ViewCount> {
        let views = self
            .store
            .increment_internship_views(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Internship not found"))?;
        Ok(ViewCount {
            internship_id: id.to_string(),
            views,
        })
    }

    pub async fn apply(&self, caller: &Caller, internship_id: &str, dto: ApplyDto) -> ServiceResult<Application> {
        dto.validate()?;
        self.active_profile(caller).await?;

        let internship = self
            .store
            .get_internship(internship_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Internship not found"))?;
        if !internship.is_published() {
            return Err(ServiceError::precondition(
                "This internship is not accepting applications",
            ));
        }
        if owns_internship(&internship, &caller.uid) {
            return Err(ServiceError::denied("You cannot apply to your own internship"));
        }
        if internship.deadline.is_some_and(|d| d < Utc::now()) {
            return Err(ServiceError::precondition("The application deadline has passed"));
        }

        let now = Utc::now();
        let application = Application {
            id: uuid::Uuid::new_v4().to_string(),
            internship_id: internship.id.clone(),
            recruiter_id: internship.recruiter_id.clone(),
            user_id: caller.uid.clone(),
            status: ApplicationStatus::Applied,
            cover_letter: dto
                .cover_letter
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            applied_at: now,
            updated_at: now,
        };

        if !self.store.create_application(&application).await? {
            return Err(ServiceError::exists("You have already applied to this internship"));
        }
        info!("{} applied to internship {}", caller.uid, internship.id);
        Ok(application)
    }

    pub async fn my_applications(&self, caller: &Caller) -> ServiceResult<Vec<Application>> {
        let filter = ApplicationFilter {
            user_id: Some(caller.uid.clone()),
            ..Default::default()
        };
        Ok(self.store.list_applications(&filter).await?)
    }

    pub async fn withdraw(&self, caller: &Caller, id: &str) -> ServiceResult<Application> {
        let mut application = self
            .store
            .get_application(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Application not found"))?;

        if !is_applicant(&application, &caller.uid) {
            return Err(ServiceError::denied("You did not submit this application"));
        }
        if application.status.is_decided() {
            return Err(ServiceError::precondition(format!(
                "Application is already {}",
                application.status
            )));
        }

        let now = Utc::now();
        let decided = [
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
            ApplicationStatus::Withdrawn,
        ];
        match self
            .store
            .update_application_status(id, ApplicationStatus::Withdrawn, &decided, now, None)
            .await?
        {
            StatusWrite::Updated => {}
            StatusWrite::Missing => return Err(ServiceError::not_found("Application not found")),
            StatusWrite::Blocked(current) => {
                return Err(ServiceError::precondition(format!(
                    "Application is already {}",
                    current
                )));
            }
        }
        application.status = ApplicationStatus::Withdrawn;
        application.updated_at = now;
        Ok(application)
    }

    pub async fn notifications(&self, caller: &Caller) -> ServiceResult<Vec<Notification>> {
        Ok(self.store.list_notifications(&caller.uid).await?)
    }

    pub async fn mark_notification_read(&self, caller: &Caller, id: &str) -> ServiceResult<()> {
        if !self.store.mark_notification_read(id, &caller.uid).await? {
            return Err(ServiceError::not_found("Notification not found"));
        }
        Ok(())
    }

    /// Link-preview card for a published posting. Missing fields fall back
    /// to placeholders.
    pub async fn og_meta(&self, id: &str) -> ServiceResult<InternshipOgMeta> {
        let internship = self
            .store
            .get_internship(id)
            .await?
            .filter(Internship::is_published)
            .ok_or_else(|| ServiceError::not_found("Internship not found"))?;

        let or_default = |value: &str, fallback: &str| {
            let value = value.trim();
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };

        Ok(InternshipOgMeta {
            title: or_default(&internship.title, "Internship Opportunity"),
            company: or_default(&internship.company, "Company"),
            description: truncate(
                &or_default(&internship.description, "Apply now on InternHub"),
                OG_DESCRIPTION_LIMIT,
            ),
            location: or_default(&internship.location, "Not specified"),
            stipend: internship
                .stipend
                .filter(|s| *s > 0)
                .map(|s| format!("₹{}/month", s))
                .unwrap_or_else(|| "Not disclosed".to_string()),
            sector: internship
                .sector
                .as_deref()
                .map(|s| or_default(s, "General"))
                .unwrap_or_else(|| "General".to_string()),
            logo: internship
                .logo_url
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| self.settings.default_logo.clone()),
            work_mode: internship.work_mode.as_str().to_string(),
        })
    }
}
