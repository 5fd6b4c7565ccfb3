use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{Page, StatusWrite, Store, StoreResult};
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, Internship, InternshipFilter, Notification,
    Profile, Recruiter, Referral, UsernameClaim, VerificationRequest, VerificationStatus,
};

#[derive(Default)]
struct Collections {
    profiles: HashMap<String, Profile>,
    recruiters: HashMap<String, Recruiter>,
    internships: HashMap<String, Internship>,
    applications: HashMap<String, Application>,
    notifications: HashMap<String, Notification>,
    usernames: HashMap<String, UsernameClaim>,
    verification_requests: HashMap<String, VerificationRequest>,
    referrals: HashMap<String, Referral>,
}

/// In-process store. Every multi-document operation runs under one write
/// lock, which gives it the same all-or-nothing behavior as a transaction.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn get_profile(&self, uid: &str) -> StoreResult<Option<Profile>> {
        Ok(self.inner.read().await.profiles.get(uid).cloned())
    }

    async fn save_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .profiles
            .insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn delete_profile(&self, uid: &str) -> StoreResult<bool> {
        Ok(self.inner.write().await.profiles.remove(uid).is_some())
    }

    async fn find_profile_by_referral_code(&self, code: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .inner
            .read()
            .await
            .profiles
            .values()
            .find(|p| p.referral_code.as_deref() == Some(code))
            .cloned())
    }

    async fn get_recruiter(&self, uid: &str) -> StoreResult<Option<Recruiter>> {
        Ok(self.inner.read().await.recruiters.get(uid).cloned())
    }

    async fn create_recruiter(&self, recruiter: &Recruiter) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.recruiters.contains_key(&recruiter.uid) {
            return Ok(false);
        }
        inner
            .recruiters
            .insert(recruiter.uid.clone(), recruiter.clone());
        Ok(true)
    }

    async fn save_recruiter(&self, recruiter: &Recruiter) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .recruiters
            .insert(recruiter.uid.clone(), recruiter.clone());
        Ok(())
    }

    async fn delete_recruiter(&self, uid: &str) -> StoreResult<bool> {
        Ok(self.inner.write().await.recruiters.remove(uid).is_some())
    }

    async fn get_internship(&self, id: &str) -> StoreResult<Option<Internship>> {
        Ok(self.inner.read().await.internships.get(id).cloned())
    }

    async fn create_internship(&self, internship: &Internship) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .internships
            .insert(internship.id.clone(), internship.clone());
        if let Some(recruiter) = inner.recruiters.get_mut(&internship.recruiter_id) {
            recruiter.internships_created += 1;
        }
        Ok(())
    }

    async fn save_internship(&self, internship: &Internship) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.internships.get_mut(&internship.id) {
            Some(existing) => {
                let (views, applications) = (existing.views, existing.applications);
                *existing = Internship {
                    views,
                    applications,
                    ..internship.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_internships(
        &self,
        filter: &InternshipFilter,
        page: Option<Page>,
    ) -> StoreResult<Vec<Internship>> {
        let inner = self.inner.read().await;
        let matching: Vec<Internship> = inner
            .internships
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        let sorted = newest_first(matching, |i| i.created_at);

        Ok(match page {
            Some(page) => sorted
                .into_iter()
                .skip(page.skip as usize)
                .take(page.limit as usize)
                .collect(),
            None => sorted,
        })
    }

    async fn count_internships(&self, filter: &InternshipFilter) -> StoreResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .internships
            .values()
            .filter(|i| filter.matches(i))
            .count() as u64)
    }

    async fn increment_internship_views(&self, id: &str) -> StoreResult<Option<i64>> {
        let mut inner = self.inner.write().await;
        match inner.internships.get_mut(id) {
            Some(internship) if internship.is_published() => {
                internship.views += 1;
                Ok(Some(internship.views))
            }
            _ => Ok(None),
        }
    }

    async fn delete_internship_cascade(&self, id: &str) -> StoreResult<Option<u64>> {
        let mut inner = self.inner.write().await;
        let Some(internship) = inner.internships.remove(id) else {
            return Ok(None);
        };

        let before = inner.applications.len();
        inner.applications.retain(|_, a| a.internship_id != id);
        let removed = (before - inner.applications.len()) as u64;

        if let Some(recruiter) = inner.recruiters.get_mut(&internship.recruiter_id) {
            recruiter.internships_created -= 1;
        }
        Ok(Some(removed))
    }

    async fn get_application(&self, id: &str) -> StoreResult<Option<Application>> {
        Ok(self.inner.read().await.applications.get(id).cloned())
    }

    async fn create_application(&self, application: &Application) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let duplicate = inner.applications.values().any(|a| {
            a.internship_id == application.internship_id && a.user_id == application.user_id
        });
        if duplicate {
            return Ok(false);
        }
        inner
            .applications
            .insert(application.id.clone(), application.clone());
        if let Some(internship) = inner.internships.get_mut(&application.internship_id) {
            internship.applications += 1;
        }
        Ok(true)
    }

    async fn list_applications(&self, filter: &ApplicationFilter) -> StoreResult<Vec<Application>> {
        let inner = self.inner.read().await;
        let matching = inner
            .applications
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        Ok(newest_first(matching, |a| a.applied_at))
    }

    async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
        blocked: &[ApplicationStatus],
        updated_at: DateTime<Utc>,
        notification: Option<&Notification>,
    ) -> StoreResult<StatusWrite> {
        let mut inner = self.inner.write().await;
        let Some(application) = inner.applications.get_mut(id) else {
            return Ok(StatusWrite::Missing);
        };
        if blocked.contains(&application.status) {
            return Ok(StatusWrite::Blocked(application.status));
        }
        application.status = status;
        application.updated_at = updated_at;

        if let Some(notification) = notification {
            inner
                .notifications
                .insert(notification.id.clone(), notification.clone());
        }
        Ok(StatusWrite::Updated)
    }

    async fn delete_applications_by_user(&self, uid: &str) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let mut postings = Vec::new();
        inner.applications.retain(|_, a| {
            if a.user_id == uid {
                postings.push(a.internship_id.clone());
                false
            } else {
                true
            }
        });
        for id in &postings {
            if let Some(internship) = inner.internships.get_mut(id) {
                internship.applications -= 1;
            }
        }
        Ok(postings.len() as u64)
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .notifications
            .insert(notification.id.clone(), notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, uid: &str) -> StoreResult<Vec<Notification>> {
        let inner = self.inner.read().await;
        let matching = inner
            .notifications
            .values()
            .filter(|n| n.user_id == uid)
            .cloned()
            .collect();
        Ok(newest_first(matching, |n| n.created_at))
    }

    async fn mark_notification_read(&self, id: &str, uid: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.notifications.get_mut(id) {
            Some(notification) if notification.user_id == uid => {
                notification.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_notifications_by_user(&self, uid: &str) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.notifications.len();
        inner.notifications.retain(|_, n| n.user_id != uid);
        Ok((before - inner.notifications.len()) as u64)
    }

    async fn get_username(&self, username: &str) -> StoreResult<Option<UsernameClaim>> {
        Ok(self.inner.read().await.usernames.get(username).cloned())
    }

    async fn claim_username(&self, claim: &UsernameClaim) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.usernames.get(&claim.username) {
            if existing.uid != claim.uid {
                return Ok(false);
            }
        }
        inner.usernames.retain(|_, c| c.uid != claim.uid);
        inner
            .usernames
            .insert(claim.username.clone(), claim.clone());
        Ok(true)
    }

    async fn release_usernames(&self, uid: &str) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.usernames.len();
        inner.usernames.retain(|_, c| c.uid != uid);
        Ok((before - inner.usernames.len()) as u64)
    }

    async fn insert_verification_request(&self, request: &VerificationRequest) -> StoreResult<()> {
        self.inner
            .write()
            .await
            .verification_requests
            .insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn get_verification_request(&self, id: &str) -> StoreResult<Option<VerificationRequest>> {
        Ok(self.inner.read().await.verification_requests.get(id).cloned())
    }

    async fn list_verification_requests(
        &self,
        status: Option<VerificationStatus>,
        recruiter_id: Option<&str>,
    ) -> StoreResult<Vec<VerificationRequest>> {
        let inner = self.inner.read().await;
        let matching = inner
            .verification_requests
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .filter(|r| recruiter_id.is_none_or(|id| r.recruiter_id == id))
            .cloned()
            .collect();
        Ok(newest_first(matching, |r| r.created_at))
    }

    async fn save_verification_request(&self, request: &VerificationRequest) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.verification_requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_referral(&self, referral: &Referral) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if inner
            .referrals
            .values()
            .any(|r| r.referred_uid == referral.referred_uid)
        {
            return Ok(false);
        }
        inner
            .referrals
            .insert(referral.id.clone(), referral.clone());
        Ok(true)
    }

    async fn list_referrals_by_referrer(&self, uid: &str) -> StoreResult<Vec<Referral>> {
        let inner = self.inner.read().await;
        let matching = inner
            .referrals
            .values()
            .filter(|r| r.referrer_uid == uid)
            .cloned()
            .collect();
        Ok(newest_first(matching, |r| r.created_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InternshipStatus, NotificationKind, RecruiterStatus, WorkMode};

    fn recruiter(uid: &str) -> Recruiter {
        let now = Utc::now();
        Recruiter {
            uid: uid.to_string(),
            company_name: "Acme".to_string(),
            company_website: None,
            contact_email: None,
            designation: None,
            is_verified: true,
            status: RecruiterStatus::Active,
            internships_created: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn internship(id: &str, recruiter_id: &str) -> Internship {
        let now = Utc::now();
        Internship {
            id: id.to_string(),
            recruiter_id: recruiter_id.to_string(),
            title: "Backend intern".to_string(),
            company: "Acme".to_string(),
            description: "Work on the API".to_string(),
            location: "Bengaluru".to_string(),
            work_mode: WorkMode::Onsite,
            stipend: Some(10_000),
            duration_months: Some(3),
            sector: Some("Technology".to_string()),
            skills: vec!["rust".to_string()],
            openings: Some(2),
            logo_url: None,
            deadline: None,
            status: InternshipStatus::Published,
            published_at: Some(now),
            views: 0,
            applications: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn application(id: &str, internship_id: &str, user_id: &str) -> Application {
        let now = Utc::now();
        Application {
            id: id.to_string(),
            internship_id: internship_id.to_string(),
            recruiter_id: "R1".to_string(),
            user_id: user_id.to_string(),
            status: ApplicationStatus::Applied,
            cover_letter: None,
            applied_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn cascade_delete_removes_applications_and_decrements_counter() {
        let store = MemoryStore::new();
        store.save_recruiter(&recruiter("R1")).await.unwrap();
        store.create_internship(&internship("I1", "R1")).await.unwrap();
        store.create_internship(&internship("I2", "R1")).await.unwrap();
        store.create_application(&application("A1", "I1", "u1")).await.unwrap();
        store.create_application(&application("A2", "I1", "u2")).await.unwrap();
        store.create_application(&application("A3", "I2", "u1")).await.unwrap();

        let removed = store.delete_internship_cascade("I1").await.unwrap();
        assert_eq!(removed, Some(2));
        assert!(store.get_application("A1").await.unwrap().is_none());
        assert!(store.get_application("A3").await.unwrap().is_some());
        assert_eq!(
            store.get_recruiter("R1").await.unwrap().unwrap().internships_created,
            1
        );
        assert_eq!(store.delete_internship_cascade("I1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_application_is_rejected_and_counter_untouched() {
        let store = MemoryStore::new();
        store.create_internship(&internship("I1", "R1")).await.unwrap();
        assert!(store.create_application(&application("A1", "I1", "u1")).await.unwrap());
        assert!(!store.create_application(&application("A2", "I1", "u1")).await.unwrap());
        assert_eq!(store.get_internship("I1").await.unwrap().unwrap().applications, 1);
    }

    #[tokio::test]
    async fn status_update_on_missing_application_writes_no_notification() {
        let store = MemoryStore::new();
        let notification =
            Notification::new("u1", NotificationKind::ApplicationStatus, "t", "m");
        let outcome = store
            .update_application_status(
                "nope",
                ApplicationStatus::Accepted,
                &[],
                Utc::now(),
                Some(&notification),
            )
            .await
            .unwrap();
        assert_eq!(outcome, StatusWrite::Missing);
        assert!(store.list_notifications("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blocked_status_is_left_alone() {
        let store = MemoryStore::new();
        store.create_internship(&internship("I1", "R1")).await.unwrap();
        store.create_application(&application("A1", "I1", "u1")).await.unwrap();
        store
            .update_application_status("A1", ApplicationStatus::Accepted, &[], Utc::now(), None)
            .await
            .unwrap();

        let notification =
            Notification::new("u1", NotificationKind::ApplicationStatus, "t", "m");
        let outcome = store
            .update_application_status(
                "A1",
                ApplicationStatus::Withdrawn,
                &[ApplicationStatus::Accepted, ApplicationStatus::Rejected],
                Utc::now(),
                Some(&notification),
            )
            .await
            .unwrap();
        assert_eq!(outcome, StatusWrite::Blocked(ApplicationStatus::Accepted));
        let stored = store.get_application("A1").await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Accepted);
        assert!(store.list_notifications("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saving_a_stale_snapshot_keeps_counters() {
        let store = MemoryStore::new();
        store.create_internship(&internship("I1", "R1")).await.unwrap();
        let mut snapshot = store.get_internship("I1").await.unwrap().unwrap();

        store.create_application(&application("A1", "I1", "u1")).await.unwrap();
        assert_eq!(store.increment_internship_views("I1").await.unwrap(), Some(1));

        snapshot.title = "Platform intern".to_string();
        assert!(store.save_internship(&snapshot).await.unwrap());

        let stored = store.get_internship("I1").await.unwrap().unwrap();
        assert_eq!(stored.title, "Platform intern");
        assert_eq!(stored.views, 1);
        assert_eq!(stored.applications, 1);
    }

    #[tokio::test]
    async fn views_only_count_on_published_postings() {
        let store = MemoryStore::new();
        let mut draft = internship("I1", "R1");
        draft.status = InternshipStatus::Draft;
        store.create_internship(&draft).await.unwrap();
        assert_eq!(store.increment_internship_views("I1").await.unwrap(), None);
        assert_eq!(store.increment_internship_views("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_a_users_applications_decrements_counters() {
        let store = MemoryStore::new();
        store.create_internship(&internship("I1", "R1")).await.unwrap();
        store.create_internship(&internship("I2", "R1")).await.unwrap();
        store.create_application(&application("A1", "I1", "u1")).await.unwrap();
        store.create_application(&application("A2", "I2", "u1")).await.unwrap();
        store.create_application(&application("A3", "I1", "u2")).await.unwrap();

        assert_eq!(store.delete_applications_by_user("u1").await.unwrap(), 2);
        assert_eq!(store.get_internship("I1").await.unwrap().unwrap().applications, 1);
        assert_eq!(store.get_internship("I2").await.unwrap().unwrap().applications, 0);
        assert!(store.get_application("A3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn claim_username_moves_previous_name() {
        let store = MemoryStore::new();
        let claim = |name: &str, uid: &str| UsernameClaim {
            username: name.to_string(),
            uid: uid.to_string(),
            claimed_at: Utc::now(),
        };
        assert!(store.claim_username(&claim("alice", "u1")).await.unwrap());
        assert!(!store.claim_username(&claim("alice", "u2")).await.unwrap());
        assert!(store.claim_username(&claim("alice_2", "u1")).await.unwrap());
        assert!(store.get_username("alice").await.unwrap().is_none());
        assert!(store.claim_username(&claim("alice", "u2")).await.unwrap());
    }

    #[tokio::test]
    async fn list_internships_filters_by_location_substring() {
        let store = MemoryStore::new();
        store.create_internship(&internship("I1", "R1")).await.unwrap();
        let filter = InternshipFilter {
            location: Some("bengal".to_string()),
            ..Default::default()
        };
        assert_eq!(store.count_internships(&filter).await.unwrap(), 1);
        let filter = InternshipFilter {
            location: Some("Mumbai".to_string()),
            ..Default::default()
        };
        assert!(store.list_internships(&filter, None).await.unwrap().is_empty());
    }
}
