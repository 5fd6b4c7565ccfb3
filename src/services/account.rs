//! GDPR export and the account lifecycle: deactivate, reactivate within the
//! grace window, and permanent deletion.

use chrono::{DateTime, Duration, Utc};

use super::{Caller, ServiceError, ServiceResult};
use crate::config::Settings;
use crate::db::Store;
use crate::models::{
    AccountDeletionReport, AccountStatus, AccountStatusChange, ApplicationFilter, InternshipFilter,
    RecruiterStatus, UserDataExport,
};

/// Reactivation is allowed while `now - deactivated_at <= window`; the
/// boundary itself is inclusive.
pub fn within_reactivation_window(
    deactivated_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window: Duration,
) -> bool {
    now.signed_duration_since(deactivated_at) <= window
}

pub struct AccountService<'a> {
    store: &'a dyn Store,
    settings: &'a Settings,
}

impl<'a> AccountService<'a> {
    pub fn new(store: &'a dyn Store, settings: &'a Settings) -> Self {
        AccountService { store, settings }
    }

    pub async fn export(&self, caller: &Caller) -> ServiceResult<UserDataExport> {
        let uid = caller.uid.as_str();
        let profile = self.store.get_profile(uid).await?;
        let recruiter = self.store.get_recruiter(uid).await?;

        let applications = self
            .store
            .list_applications(&ApplicationFilter {
                user_id: Some(uid.to_string()),
                ..Default::default()
            })
            .await?;
        let received_applications = match recruiter {
            Some(_) => {
                self.store
                    .list_applications(&ApplicationFilter {
                        recruiter_id: Some(uid.to_string()),
                        ..Default::default()
                    })
                    .await?
            }
            None => Vec::new(),
        };
        let internships = self
            .store
            .list_internships(
                &InternshipFilter {
                    recruiter_id: Some(uid.to_string()),
                    ..Default::default()
                },
                None,
            )
            .await?;
        let notifications = self.store.list_notifications(uid).await?;

        info!("Data export generated for {}", uid);
        Ok(UserDataExport {
            uid: uid.to_string(),
            exported_at: Utc::now(),
            profile,
            recruiter,
            applications,
            received_applications,
            internships,
            notifications,
        })
    }

    pub async fn deactivate(&self, caller: &Caller) -> ServiceResult<AccountStatusChange> {
        let now = Utc::now();
        let profile = self.store.get_profile(&caller.uid).await?;
        let recruiter = self.store.get_recruiter(&caller.uid).await?;
        if profile.is_none() && recruiter.is_none() {
            return Err(ServiceError::not_found("Account not found"));
        }

        if let Some(mut profile) = profile {
            profile.account_status = AccountStatus::Deactivated;
            profile.deactivated_at = Some(now);
            profile.updated_at = now;
            self.store.save_profile(&profile).await?;
        } else {
            let mut profile = crate::models::Profile::new(&caller.uid, caller.email.clone());
            profile.account_status = AccountStatus::Deactivated;
            profile.deactivated_at = Some(now);
            self.store.save_profile(&profile).await?;
        }
        // a suspension outlives deactivation
        if let Some(mut recruiter) = recruiter.filter(|r| r.status != RecruiterStatus::Suspended) {
            recruiter.status = RecruiterStatus::Deactivated;
            recruiter.updated_at = now;
            self.store.save_recruiter(&recruiter).await?;
        }

        info!("Account {} deactivated", caller.uid);
        Ok(AccountStatusChange {
            uid: caller.uid.clone(),
            status: "deactivated".to_string(),
            changed_at: now,
        })
    }

    pub async fn reactivate(&self, caller: &Caller) -> ServiceResult<AccountStatusChange> {
        let mut profile = self
            .store
            .get_profile(&caller.uid)
            .await?
            .ok_or_else(|| ServiceError::not_found("Account not found"))?;

        if profile.account_status != AccountStatus::Deactivated {
            return Err(ServiceError::precondition("Account is not deactivated"));
        }
        let deactivated_at = profile
            .deactivated_at
            .ok_or_else(|| ServiceError::precondition("Account has no deactivation date"))?;

        let now = Utc::now();
        let window = Duration::days(self.settings.reactivation_window_days);
        if !within_reactivation_window(deactivated_at, now, window) {
            return Err(ServiceError::denied(format!(
                "Reactivation window of {} days has expired",
                self.settings.reactivation_window_days
            )));
        }

        profile.account_status = AccountStatus::Active;
        profile.deactivated_at = None;
        profile.updated_at = now;
        self.store.save_profile(&profile).await?;

        if let Some(mut recruiter) = self.store.get_recruiter(&caller.uid).await? {
            if recruiter.status == RecruiterStatus::Deactivated {
                recruiter.status = if recruiter.is_verified {
                    RecruiterStatus::Active
                } else {
                    RecruiterStatus::Pending
                };
                recruiter.updated_at = now;
                self.store.save_recruiter(&recruiter).await?;
            }
        }

        info!("Account {} reactivated", caller.uid);
        Ok(AccountStatusChange {
            uid: caller.uid.clone(),
            status: "active".to_string(),
            changed_at: now,
        })
    }

    /// Removes everything stored for the caller. Owned postings go through
    /// the cascade path so their applications and counters stay consistent.
    pub async fn delete(&self, caller: &Caller) -> ServiceResult<AccountDeletionReport> {
        let uid = caller.uid.as_str();
        let mut report = AccountDeletionReport {
            uid: uid.to_string(),
            ..Default::default()
        };

        let owned = self
            .store
            .list_internships(
                &InternshipFilter {
                    recruiter_id: Some(uid.to_string()),
                    ..Default::default()
                },
                None,
            )
            .await?;
        for internship in owned {
            if let Some(removed) = self.store.delete_internship_cascade(&internship.id).await? {
                report.internships_deleted += 1;
                report.applications_deleted += removed;
            }
        }

        report.applications_deleted += self.store.delete_applications_by_user(uid).await?;
        report.notifications_deleted = self.store.delete_notifications_by_user(uid).await?;
        report.usernames_released = self.store.release_usernames(uid).await?;
        report.recruiter_deleted = self.store.delete_recruiter(uid).await?;
        report.profile_deleted = self.store.delete_profile(uid).await?;

        if !report.profile_deleted && !report.recruiter_deleted {
            return Err(ServiceError::not_found("Account not found"));
        }
        info!(
            "Account {} permanently deleted ({} internships, {} applications)",
            uid, report.internships_deleted, report.applications_deleted
        );
        Ok(report)
    }
}
