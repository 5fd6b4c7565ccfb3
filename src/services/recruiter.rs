//! Recruiter-side operations: profile bootstrap, posting CRUD and lifecycle,
//! the application status workflow, candidate ranking and analytics.
//!
//! Object-level checks run in a fixed order: recruiter role, document
//! exists, ownership, then payload validation. A non-owner is therefore
//! denied no matter what the payload looks like.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use validator::Validate;

use super::authorization::{is_active_recruiter, owns_application, owns_internship};
use super::scoring::match_score;
use super::{Caller, ServiceError, ServiceResult};
use crate::config::Settings;
use crate::db::{StatusWrite, Store};
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, BulkItemResult, BulkUpdateApplicationStatusDto,
    BulkUpdateReport, CreateInternshipDto, InitializeRecruiterDto, Internship, InternshipFilter,
    InternshipStats, InternshipStatus, Notification, NotificationKind, RankedCandidate, Recruiter,
    RecruiterAnalytics, RecruiterStatus, RecruiterStatusResponse, UpdateApplicationStatusDto,
    UpdateInternshipDto, WorkMode,
};

const MAX_BULK_IDS: usize = 500;

#[derive(Debug, Default, Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationsQuery {
    pub internship_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, rocket_okapi::okapi::schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InternshipDeletion {
    pub internship_id: String,
    pub applications_deleted: u64,
}

pub struct RecruiterService<'a> {
    store: &'a dyn Store,
    settings: &'a Settings,
}

fn parse_work_mode(value: Option<&str>) -> ServiceResult<Option<WorkMode>> {
    value
        .map(|v| v.parse::<WorkMode>().map_err(ServiceError::InvalidArgument))
        .transpose()
}

fn parse_status(value: &str) -> ServiceResult<ApplicationStatus> {
    value.parse().map_err(ServiceError::InvalidArgument)
}

fn clean_list(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(v.to_lowercase()))
        .collect()
}

fn non_blank(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::invalid(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

impl<'a> RecruiterService<'a> {
    pub fn new(store: &'a dyn Store, settings: &'a Settings) -> Self {
        RecruiterService { store, settings }
    }

    /// Fresh read of the caller's recruiter document; fails unless verified
    /// and active.
    pub async fn verify_recruiter_role(&self, uid: &str) -> ServiceResult<Recruiter> {
        let recruiter = self
            .store
            .get_recruiter(uid)
            .await?
            .ok_or_else(|| ServiceError::denied("Recruiter profile required"))?;

        if !is_active_recruiter(&recruiter) {
            debug!(
                "Recruiter gate rejected {} (verified: {}, status: {:?})",
                uid, recruiter.is_verified, recruiter.status
            );
            return Err(ServiceError::denied(
                "Recruiter account is not verified or not active",
            ));
        }
        Ok(recruiter)
    }

    /// Loads the posting and checks that `uid` owns it.
    pub async fn verify_internship_ownership(&self, uid: &str, id: &str) -> ServiceResult<Internship> {
        let internship = self
            .store
            .get_internship(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Internship not found"))?;

        if !owns_internship(&internship, uid) {
            warn!("Recruiter {} attempted to modify internship {} they do not own", uid, id);
            return Err(ServiceError::denied("You do not own this internship"));
        }
        Ok(internship)
    }

    pub async fn initialize_profile(
        &self,
        caller: &Caller,
        dto: InitializeRecruiterDto,
    ) -> ServiceResult<Recruiter> {
        dto.validate()?;
        let now = Utc::now();
        let auto_verify = self.settings.auto_verify_recruiters;

        let recruiter = Recruiter {
            uid: caller.uid.clone(),
            company_name: non_blank(&dto.company_name, "Company name")?,
            company_website: dto.company_website,
            contact_email: dto.contact_email.or_else(|| caller.email.clone()),
            designation: dto.designation,
            is_verified: auto_verify,
            status: if auto_verify {
                RecruiterStatus::Active
            } else {
                RecruiterStatus::Pending
            },
            internships_created: 0,
            created_at: now,
            updated_at: now,
        };

        if !self.store.create_recruiter(&recruiter).await? {
            return Err(ServiceError::exists("Recruiter profile already exists"));
        }
        info!("Recruiter profile created for {} ({})", recruiter.uid, recruiter.company_name);
        Ok(recruiter)
    }

    pub async fn status(&self, caller: &Caller) -> ServiceResult<RecruiterStatusResponse> {
        let recruiter = self.store.get_recruiter(&caller.uid).await?;
        Ok(match recruiter {
            Some(r) => RecruiterStatusResponse {
                exists: true,
                is_verified: r.is_verified,
                status: Some(r.status),
                can_post: is_active_recruiter(&r),
                internships_created: r.internships_created,
            },
            None => RecruiterStatusResponse {
                exists: false,
                is_verified: false,
                status: None,
                can_post: false,
                internships_created: 0,
            },
        })
    }

    pub async fn list_internships(&self, caller: &Caller) -> ServiceResult<Vec<Internship>> {
        self.verify_recruiter_role(&caller.uid).await?;
        let filter = InternshipFilter {
            recruiter_id: Some(caller.uid.clone()),
            ..Default::default()
        };
        Ok(self.store.list_internships(&filter, None).await?)
    }

    pub async fn create_internship(
        &self,
        caller: &Caller,
        dto: CreateInternshipDto,
    ) -> ServiceResult<Internship> {
        let recruiter = self.verify_recruiter_role(&caller.uid).await?;
        dto.validate()?;

        let now = Utc::now();
        let company = dto
            .company
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| recruiter.company_name.clone());

        let internship = Internship {
            id: uuid::Uuid::new_v4().to_string(),
            recruiter_id: caller.uid.clone(),
            title: non_blank(&dto.title, "Title")?,
            company,
            description: non_blank(&dto.description, "Description")?,
            location: non_blank(&dto.location, "Location")?,
            work_mode: parse_work_mode(dto.work_mode.as_deref())?.unwrap_or(WorkMode::Onsite),
            stipend: dto.stipend,
            duration_months: dto.duration_months,
            sector: dto.sector.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            skills: clean_list(&dto.skills),
            openings: dto.openings,
            logo_url: dto.logo_url,
            deadline: dto.deadline,
            status: InternshipStatus::Draft,
            published_at: None,
            views: 0,
            applications: 0,
            created_at: now,
            updated_at: now,
        };

        self.store.create_internship(&internship).await?;
        info!("Internship {} created by {}", internship.id, caller.uid);
        Ok(internship)
    }

    pub async fn update_internship(
        &self,
        caller: &Caller,
        id: &str,
        dto: UpdateInternshipDto,
    ) -> ServiceResult<Internship> {
        self.verify_recruiter_role(&caller.uid).await?;
        let mut internship = self.verify_internship_ownership(&caller.uid, id).await?;

        if dto.is_empty() {
            return Err(ServiceError::invalid("No fields to update"));
        }
        dto.validate()?;

        if let Some(ref title) = dto.title {
            internship.title = non_blank(title, "Title")?;
        }
        if let Some(ref company) = dto.company {
            internship.company = non_blank(company, "Company")?;
        }
        if let Some(ref description) = dto.description {
            internship.description = non_blank(description, "Description")?;
        }
        if let Some(ref location) = dto.location {
            internship.location = non_blank(location, "Location")?;
        }
        if let Some(mode) = parse_work_mode(dto.work_mode.as_deref())? {
            internship.work_mode = mode;
        }
        if let Some(stipend) = dto.stipend {
            internship.stipend = Some(stipend);
        }
        if let Some(duration) = dto.duration_months {
            internship.duration_months = Some(duration);
        }
        if let Some(ref sector) = dto.sector {
            internship.sector = Some(sector.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Some(ref skills) = dto.skills {
            internship.skills = clean_list(skills);
        }
        if let Some(openings) = dto.openings {
            internship.openings = Some(openings);
        }
        if let Some(ref logo) = dto.logo_url {
            internship.logo_url = Some(logo.clone());
        }
        if let Some(deadline) = dto.deadline {
            internship.deadline = Some(deadline);
        }
        internship.updated_at = Utc::now();

        if !self.store.save_internship(&internship).await? {
            return Err(ServiceError::not_found("Internship not found"));
        }
        Ok(internship)
    }

    pub async fn delete_internship(&self, caller: &Caller, id: &str) -> ServiceResult<InternshipDeletion> {
        self.verify_recruiter_role(&caller.uid).await?;
        self.verify_internship_ownership(&caller.uid, id).await?;

        let removed = self
            .store
            .delete_internship_cascade(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Internship not found"))?;

        info!(
            "Internship {} deleted by {} ({} applications removed)",
            id, caller.uid, removed
        );
        Ok(InternshipDeletion {
            internship_id: id.to_string(),
            applications_deleted: removed,
        })
    }

    pub async fn publish_internship(&self, caller: &Caller, id: &str) -> ServiceResult<Internship> {
        self.verify_recruiter_role(&caller.uid).await?;
        let mut internship = self.verify_internship_ownership(&caller.uid, id).await?;

        match internship.status {
            InternshipStatus::Published => return Ok(internship),
            InternshipStatus::Closed => {
                return Err(ServiceError::precondition(
                    "A closed internship cannot be published again",
                ));
            }
            InternshipStatus::Draft => {}
        }

        let now = Utc::now();
        internship.status = InternshipStatus::Published;
        internship.published_at = Some(now);
        internship.updated_at = now;

        if !self.store.save_internship(&internship).await? {
            return Err(ServiceError::not_found("Internship not found"));
        }
        info!("Internship {} published", id);
        Ok(internship)
    }

    pub async fn close_internship(&self, caller: &Caller, id: &str) -> ServiceResult<Internship> {
        self.verify_recruiter_role(&caller.uid).await?;
        let mut internship = self.verify_internship_ownership(&caller.uid, id).await?;

        if internship.status == InternshipStatus::Closed {
            return Ok(internship);
        }
        internship.status = InternshipStatus::Closed;
        internship.updated_at = Utc::now();

        if !self.store.save_internship(&internship).await? {
            return Err(ServiceError::not_found("Internship not found"));
        }
        info!("Internship {} closed", id);
        Ok(internship)
    }

    pub async fn get_applications(
        &self,
        caller: &Caller,
        query: ApplicationsQuery,
    ) -> ServiceResult<Vec<Application>> {
        self.verify_recruiter_role(&caller.uid).await?;

        if let Some(ref internship_id) = query.internship_id {
            self.verify_internship_ownership(&caller.uid, internship_id).await?;
        }
        let status = query.status.as_deref().map(parse_status).transpose()?;

        let filter = ApplicationFilter {
            recruiter_id: Some(caller.uid.clone()),
            internship_id: query.internship_id,
            status,
            ..Default::default()
        };
        Ok(self.store.list_applications(&filter).await?)
    }

    pub async fn verify_application_ownership(&self, uid: &str, id: &str) -> ServiceResult<Application> {
        let application = self
            .store
            .get_application(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Application not found"))?;
        if !owns_application(&application, uid) {
            return Err(ServiceError::denied("You do not own this application"));
        }
        Ok(application)
    }

    /// Re-reads the application, checks ownership and the transition, then
    /// writes the status and (optionally) the notification in one store call.
    /// The write itself refuses a withdrawn application, so a withdrawal that
    /// lands after the read still wins.
    async fn set_status(
        &self,
        uid: &str,
        id: &str,
        status: ApplicationStatus,
        notify: bool,
        message: Option<&str>,
    ) -> ServiceResult<Application> {
        let mut application = self.verify_application_ownership(uid, id).await?;
        if !application.status.recruiter_can_set(status) {
            return Err(ServiceError::precondition(format!(
                "Cannot change application from '{}' to '{}'",
                application.status, status
            )));
        }

        let notification = if notify {
            Some(self.status_notification(&application, status, message).await?)
        } else {
            None
        };

        let now = Utc::now();
        let outcome = self
            .store
            .update_application_status(
                id,
                status,
                &[ApplicationStatus::Withdrawn],
                now,
                notification.as_ref(),
            )
            .await?;
        match outcome {
            StatusWrite::Updated => {}
            StatusWrite::Missing => return Err(ServiceError::not_found("Application not found")),
            StatusWrite::Blocked(current) => {
                return Err(ServiceError::precondition(format!(
                    "Cannot change application from '{}' to '{}'",
                    current, status
                )));
            }
        }

        application.status = status;
        application.updated_at = now;
        Ok(application)
    }

    async fn status_notification(
        &self,
        application: &Application,
        status: ApplicationStatus,
        message: Option<&str>,
    ) -> ServiceResult<Notification> {
        let title = self
            .store
            .get_internship(&application.internship_id)
            .await?
            .map(|i| i.title)
            .unwrap_or_else(|| "an internship".to_string());

        let mut text = format!("Your application for {} {}.", title, status.describe());
        if let Some(extra) = message.map(str::trim).filter(|m| !m.is_empty()) {
            text.push(' ');
            text.push_str(extra);
        }

        let mut notification = Notification::new(
            &application.user_id,
            NotificationKind::ApplicationStatus,
            "Application update",
            text,
        );
        notification.application_id = Some(application.id.clone());
        Ok(notification)
    }

    pub async fn update_application_status(
        &self,
        caller: &Caller,
        id: &str,
        dto: UpdateApplicationStatusDto,
    ) -> ServiceResult<Application> {
        self.verify_recruiter_role(&caller.uid).await?;
        self.verify_application_ownership(&caller.uid, id).await?;
        let status = parse_status(&dto.status)?;

        let application = self
            .set_status(
                &caller.uid,
                id,
                status,
                dto.notify.unwrap_or(true),
                dto.message.as_deref(),
            )
            .await?;
        info!("Application {} set to {} by {}", id, status, caller.uid);
        Ok(application)
    }

    /// Applies one status to many applications. Each id is checked on its
    /// own; failures are reported per item and never roll back the others.
    pub async fn bulk_update_application_status(
        &self,
        caller: &Caller,
        dto: BulkUpdateApplicationStatusDto,
    ) -> ServiceResult<BulkUpdateReport> {
        self.verify_recruiter_role(&caller.uid).await?;
        let status = parse_status(&dto.status)?;

        let mut seen = HashSet::new();
        let ids: Vec<String> = dto
            .application_ids
            .into_iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        if ids.is_empty() {
            return Err(ServiceError::invalid("applicationIds must not be empty"));
        }
        if ids.len() > MAX_BULK_IDS {
            return Err(ServiceError::invalid(format!(
                "At most {} applications can be updated at once",
                MAX_BULK_IDS
            )));
        }

        let notify = dto.notify.unwrap_or(true);
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self
                .set_status(&caller.uid, &id, status, notify, dto.message.as_deref())
                .await;
            results.push(match outcome {
                Ok(_) => BulkItemResult {
                    application_id: id,
                    success: true,
                    error_code: None,
                    error: None,
                },
                Err(ServiceError::Internal(e)) => return Err(ServiceError::Internal(e)),
                Err(e) => BulkItemResult {
                    application_id: id,
                    success: false,
                    error_code: Some(e.code().to_string()),
                    error: Some(e.to_string()),
                },
            });
        }

        let updated = results.iter().filter(|r| r.success).count();
        let failed = results.len() - updated;
        info!(
            "Bulk status {} by {}: {} updated, {} failed",
            status, caller.uid, updated, failed
        );
        Ok(BulkUpdateReport {
            status,
            updated,
            failed,
            results,
        })
    }

    pub async fn rank_candidates(
        &self,
        caller: &Caller,
        internship_id: &str,
    ) -> ServiceResult<Vec<RankedCandidate>> {
        self.verify_recruiter_role(&caller.uid).await?;
        let internship = self
            .verify_internship_ownership(&caller.uid, internship_id)
            .await?;

        let filter = ApplicationFilter {
            recruiter_id: Some(caller.uid.clone()),
            internship_id: Some(internship_id.to_string()),
            ..Default::default()
        };
        let applications = self.store.list_applications(&filter).await?;

        let mut ranked = Vec::with_capacity(applications.len());
        for application in applications {
            if application.status == ApplicationStatus::Withdrawn {
                continue;
            }
            let profile = self.store.get_profile(&application.user_id).await?;
            let (score, display_name, skills) = match profile {
                Some(p) => (match_score(&p, &internship), p.display_name, p.skills),
                None => (1, None, Vec::new()),
            };
            ranked.push(RankedCandidate {
                application,
                display_name,
                skills,
                score,
            });
        }
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(ranked)
    }

    pub async fn analytics(&self, caller: &Caller) -> ServiceResult<RecruiterAnalytics> {
        self.verify_recruiter_role(&caller.uid).await?;

        let internships = self
            .store
            .list_internships(
                &InternshipFilter {
                    recruiter_id: Some(caller.uid.clone()),
                    ..Default::default()
                },
                None,
            )
            .await?;
        let applications = self
            .store
            .list_applications(&ApplicationFilter {
                recruiter_id: Some(caller.uid.clone()),
                ..Default::default()
            })
            .await?;

        let mut by_status: BTreeMap<String, u64> = ApplicationStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut per_internship: HashMap<&str, u64> = HashMap::new();
        for application in &applications {
            *by_status.entry(application.status.as_str().to_string()).or_default() += 1;
            *per_internship.entry(application.internship_id.as_str()).or_default() += 1;
        }

        let count_status = |status: InternshipStatus| {
            internships.iter().filter(|i| i.status == status).count()
        };
        let total_views: i64 = internships.iter().map(|i| i.views).sum();
        let total_applications = applications.len() as u64;
        let conversion_rate = if total_views > 0 {
            ((total_applications as f64 / total_views as f64) * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        let stats = internships
            .iter()
            .map(|i| InternshipStats {
                id: i.id.clone(),
                title: i.title.clone(),
                status: i.status,
                views: i.views,
                applications: i.applications,
                received_applications: per_internship.get(i.id.as_str()).copied().unwrap_or(0),
            })
            .collect();

        Ok(RecruiterAnalytics {
            total_internships: internships.len(),
            published_internships: count_status(InternshipStatus::Published),
            draft_internships: count_status(InternshipStatus::Draft),
            closed_internships: count_status(InternshipStatus::Closed),
            total_views,
            total_applications,
            applications_by_status: by_status,
            conversion_rate,
            internships: stats,
        })
    }
}
