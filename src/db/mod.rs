use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{Settings, StoreBackend};
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, Internship, InternshipFilter, Notification,
    Profile, Recruiter, Referral, UsernameClaim, VerificationRequest, VerificationStatus,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
    #[error("failed to decode document: {0}")]
    Decode(#[from] mongodb::bson::de::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a guarded application status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    Updated,
    Missing,
    /// The stored status was one of the blocked ones; nothing was written.
    Blocked(ApplicationStatus),
}

/// Offset pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: i64, limit: i64) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        Page {
            skip: (page - 1).saturating_mul(limit) as u64,
            limit,
        }
    }
}

/// Document store behind every service.
///
/// Operations that touch more than one document (cascade delete, status
/// change plus notification, apply plus counter, username claim) are single
/// calls so each backend can make them atomic.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    // profiles/{uid}
    async fn get_profile(&self, uid: &str) -> StoreResult<Option<Profile>>;
    async fn save_profile(&self, profile: &Profile) -> StoreResult<()>;
    async fn delete_profile(&self, uid: &str) -> StoreResult<bool>;
    async fn find_profile_by_referral_code(&self, code: &str) -> StoreResult<Option<Profile>>;

    // recruiters/{uid}
    async fn get_recruiter(&self, uid: &str) -> StoreResult<Option<Recruiter>>;
    /// Returns `false` if the recruiter document already exists.
    async fn create_recruiter(&self, recruiter: &Recruiter) -> StoreResult<bool>;
    async fn save_recruiter(&self, recruiter: &Recruiter) -> StoreResult<()>;
    async fn delete_recruiter(&self, uid: &str) -> StoreResult<bool>;

    // internships/{id}
    async fn get_internship(&self, id: &str) -> StoreResult<Option<Internship>>;
    /// Inserts the posting and bumps the owner's `internshipsCreated`.
    async fn create_internship(&self, internship: &Internship) -> StoreResult<()>;
    /// Writes the editable fields of an existing posting. `views` and
    /// `applications` only move through their own increments. Returns
    /// `false` when the posting is gone.
    async fn save_internship(&self, internship: &Internship) -> StoreResult<bool>;
    async fn list_internships(
        &self,
        filter: &InternshipFilter,
        page: Option<Page>,
    ) -> StoreResult<Vec<Internship>>;
    async fn count_internships(&self, filter: &InternshipFilter) -> StoreResult<u64>;
    /// Bumps `views` on a published posting and returns the new count.
    async fn increment_internship_views(&self, id: &str) -> StoreResult<Option<i64>>;
    /// Deletes the posting, every application pointing at it, and decrements
    /// the owner's `internshipsCreated` by one. `None` if the posting is gone.
    async fn delete_internship_cascade(&self, id: &str) -> StoreResult<Option<u64>>;

    // applications/{id}
    async fn get_application(&self, id: &str) -> StoreResult<Option<Application>>;
    /// Inserts the application and bumps the posting's `applications`.
    /// Returns `false` if the user already applied to that posting.
    async fn create_application(&self, application: &Application) -> StoreResult<bool>;
    async fn list_applications(&self, filter: &ApplicationFilter) -> StoreResult<Vec<Application>>;
    /// Sets the status unless the stored one is in `blocked`, and writes
    /// `notification` only when the status was written.
    async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
        blocked: &[ApplicationStatus],
        updated_at: DateTime<Utc>,
        notification: Option<&Notification>,
    ) -> StoreResult<StatusWrite>;
    /// Deletes the user's applications and decrements `applications` on
    /// each posting they pointed at.
    async fn delete_applications_by_user(&self, uid: &str) -> StoreResult<u64>;

    // notifications/{id}
    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()>;
    async fn list_notifications(&self, uid: &str) -> StoreResult<Vec<Notification>>;
    async fn mark_notification_read(&self, id: &str, uid: &str) -> StoreResult<bool>;
    async fn delete_notifications_by_user(&self, uid: &str) -> StoreResult<u64>;

    // usernames/{username}
    async fn get_username(&self, username: &str) -> StoreResult<Option<UsernameClaim>>;
    /// Claims `claim.username` for `claim.uid`, releasing any name the uid held
    /// before. Returns `false` if another uid owns it.
    async fn claim_username(&self, claim: &UsernameClaim) -> StoreResult<bool>;
    async fn release_usernames(&self, uid: &str) -> StoreResult<u64>;

    // verification_requests/{id}
    async fn insert_verification_request(&self, request: &VerificationRequest) -> StoreResult<()>;
    async fn get_verification_request(&self, id: &str) -> StoreResult<Option<VerificationRequest>>;
    async fn list_verification_requests(
        &self,
        status: Option<VerificationStatus>,
        recruiter_id: Option<&str>,
    ) -> StoreResult<Vec<VerificationRequest>>;
    async fn save_verification_request(&self, request: &VerificationRequest) -> StoreResult<bool>;

    // referrals/{id}
    /// Returns `false` if the referred user already redeemed a code.
    async fn create_referral(&self, referral: &Referral) -> StoreResult<bool>;
    async fn list_referrals_by_referrer(&self, uid: &str) -> StoreResult<Vec<Referral>>;
}

/// Builds the configured backend.
pub async fn connect(settings: &Settings) -> StoreResult<Arc<dyn Store>> {
    match settings.store {
        StoreBackend::Mongo => {
            let store = MongoStore::connect(&settings.mongodb_uri, &settings.database_name).await?;
            info!("✓ MongoDB connected ({})", settings.database_name);
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
