use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{
    FindOneAndUpdateOptions, FindOptions, IndexOptions, ReplaceOptions, ReturnDocument,
};
use mongodb::{Client, ClientSession, Collection, Cursor, Database, IndexModel};
use serde::de::DeserializeOwned;

use super::{Page, StatusWrite, Store, StoreError, StoreResult};
use crate::models::{
    Application, ApplicationFilter, ApplicationStatus, Internship, InternshipFilter,
    InternshipStatus, Notification,
    Profile, Recruiter, Referral, UsernameClaim, VerificationRequest, VerificationStatus,
};

const PROFILES: &str = "profiles";
const RECRUITERS: &str = "recruiters";
const INTERNSHIPS: &str = "internships";
const APPLICATIONS: &str = "applications";
const NOTIFICATIONS: &str = "notifications";
const USERNAMES: &str = "usernames";
const VERIFICATION_REQUESTS: &str = "verification_requests";
const REFERRALS: &str = "referrals";

const DUPLICATE_KEY: i32 = 11000;

/// Internship fields `save_internship` never writes.
const INTERNSHIP_FIXED_FIELDS: [&str; 5] = ["_id", "id", "createdAt", "views", "applications"];

/// MongoDB-backed store. Multi-document writes run in a transaction, which
/// requires the server to be a replica set.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;

        // Test connection
        client
            .database("admin")
            .run_command(doc! {"ping": 1}, None)
            .await?;

        let store = MongoStore {
            db: client.database(database),
            client,
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = |keys: Document| {
            IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build()
        };
        let plain = |keys: Document| IndexModel::builder().keys(keys).build();

        self.db
            .collection::<Document>(PROFILES)
            .create_index(unique(doc! { "uid": 1 }), None)
            .await?;
        self.db
            .collection::<Document>(RECRUITERS)
            .create_index(unique(doc! { "uid": 1 }), None)
            .await?;

        let internships = self.db.collection::<Document>(INTERNSHIPS);
        internships.create_index(unique(doc! { "id": 1 }), None).await?;
        internships
            .create_index(plain(doc! { "recruiterId": 1, "status": 1 }), None)
            .await?;

        let applications = self.db.collection::<Document>(APPLICATIONS);
        applications.create_index(unique(doc! { "id": 1 }), None).await?;
        applications
            .create_index(unique(doc! { "internshipId": 1, "userId": 1 }), None)
            .await?;
        applications
            .create_index(plain(doc! { "recruiterId": 1, "status": 1 }), None)
            .await?;

        let notifications = self.db.collection::<Document>(NOTIFICATIONS);
        notifications.create_index(unique(doc! { "id": 1 }), None).await?;
        notifications
            .create_index(plain(doc! { "userId": 1 }), None)
            .await?;

        self.db
            .collection::<Document>(USERNAMES)
            .create_index(unique(doc! { "username": 1 }), None)
            .await?;
        self.db
            .collection::<Document>(VERIFICATION_REQUESTS)
            .create_index(unique(doc! { "id": 1 }), None)
            .await?;
        self.db
            .collection::<Document>(REFERRALS)
            .create_index(unique(doc! { "referredUid": 1 }), None)
            .await?;
        Ok(())
    }

    fn profiles(&self) -> Collection<Profile> {
        self.db.collection(PROFILES)
    }

    fn recruiters(&self) -> Collection<Recruiter> {
        self.db.collection(RECRUITERS)
    }

    fn internships(&self) -> Collection<Internship> {
        self.db.collection(INTERNSHIPS)
    }

    fn applications(&self) -> Collection<Application> {
        self.db.collection(APPLICATIONS)
    }

    fn notifications(&self) -> Collection<Notification> {
        self.db.collection(NOTIFICATIONS)
    }

    fn usernames(&self) -> Collection<UsernameClaim> {
        self.db.collection(USERNAMES)
    }

    fn verification_requests(&self) -> Collection<VerificationRequest> {
        self.db.collection(VERIFICATION_REQUESTS)
    }

    fn referrals(&self) -> Collection<Referral> {
        self.db.collection(REFERRALS)
    }

    async fn start_transaction(&self) -> StoreResult<ClientSession> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        Ok(session)
    }

    async fn cascade_delete_in(
        &self,
        session: &mut ClientSession,
        id: &str,
    ) -> StoreResult<Option<u64>> {
        let Some(internship) = self
            .internships()
            .find_one_with_session(doc! { "id": id }, None, session)
            .await?
        else {
            return Ok(None);
        };

        self.internships()
            .delete_one_with_session(doc! { "id": id }, None, session)
            .await?;
        let removed = self
            .applications()
            .delete_many_with_session(doc! { "internshipId": id }, None, session)
            .await?
            .deleted_count;
        self.recruiters()
            .update_one_with_session(
                doc! { "uid": &internship.recruiter_id },
                doc! { "$inc": { "internshipsCreated": -1 } },
                None,
                session,
            )
            .await?;
        Ok(Some(removed))
    }

    async fn status_update_in(
        &self,
        session: &mut ClientSession,
        id: &str,
        status: ApplicationStatus,
        blocked: &[ApplicationStatus],
        updated_at: DateTime<Utc>,
        notification: Option<&Notification>,
    ) -> StoreResult<StatusWrite> {
        let blocked: Vec<&str> = blocked.iter().map(ApplicationStatus::as_str).collect();
        let result = self
            .applications()
            .update_one_with_session(
                doc! { "id": id, "status": { "$nin": blocked } },
                doc! { "$set": {
                    "status": status.as_str(),
                    "updatedAt": bson::to_bson(&updated_at)?
                } },
                None,
                session,
            )
            .await?;
        if result.matched_count == 0 {
            let current = self
                .applications()
                .find_one_with_session(doc! { "id": id }, None, session)
                .await?;
            return Ok(match current {
                Some(application) => StatusWrite::Blocked(application.status),
                None => StatusWrite::Missing,
            });
        }
        if let Some(notification) = notification {
            self.notifications()
                .insert_one_with_session(notification, None, session)
                .await?;
        }
        Ok(StatusWrite::Updated)
    }

    async fn delete_user_applications_in(
        &self,
        session: &mut ClientSession,
        uid: &str,
    ) -> StoreResult<u64> {
        let mut cursor = self
            .applications()
            .find_with_session(doc! { "userId": uid }, None, session)
            .await?;
        let mut postings = Vec::new();
        while cursor.advance(session).await? {
            postings.push(cursor.deserialize_current()?.internship_id);
        }

        let removed = self
            .applications()
            .delete_many_with_session(doc! { "userId": uid }, None, session)
            .await?
            .deleted_count;
        for id in &postings {
            self.internships()
                .update_one_with_session(
                    doc! { "id": id },
                    doc! { "$inc": { "applications": -1 } },
                    None,
                    session,
                )
                .await?;
        }
        Ok(removed)
    }

    async fn apply_in(
        &self,
        session: &mut ClientSession,
        application: &Application,
    ) -> StoreResult<()> {
        self.applications()
            .insert_one_with_session(application, None, session)
            .await?;
        self.internships()
            .update_one_with_session(
                doc! { "id": &application.internship_id },
                doc! { "$inc": { "applications": 1 } },
                None,
                session,
            )
            .await?;
        Ok(())
    }

    async fn claim_in(&self, session: &mut ClientSession, claim: &UsernameClaim) -> StoreResult<bool> {
        let existing = self
            .usernames()
            .find_one_with_session(doc! { "username": &claim.username }, None, session)
            .await?;
        if existing.is_some_and(|c| c.uid != claim.uid) {
            return Ok(false);
        }
        self.usernames()
            .delete_many_with_session(doc! { "uid": &claim.uid }, None, session)
            .await?;
        self.usernames()
            .insert_one_with_session(claim, None, session)
            .await?;
        Ok(true)
    }

    async fn create_internship_in(
        &self,
        session: &mut ClientSession,
        internship: &Internship,
    ) -> StoreResult<()> {
        self.internships()
            .insert_one_with_session(internship, None, session)
            .await?;
        self.recruiters()
            .update_one_with_session(
                doc! { "uid": &internship.recruiter_id },
                doc! { "$inc": { "internshipsCreated": 1 } },
                None,
                session,
            )
            .await?;
        Ok(())
    }
}

/// Commits the session's transaction if `result` is ok, aborts it otherwise.
async fn finish<T>(mut session: ClientSession, result: StoreResult<T>) -> StoreResult<T> {
    match result {
        Ok(value) => {
            session.commit_transaction().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(abort) = session.abort_transaction().await {
                warn!("Failed to abort transaction: {}", abort);
            }
            Err(e)
        }
    }
}

fn is_duplicate_key(err: &StoreError) -> bool {
    let StoreError::Database(err) = err else {
        return false;
    };
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

async fn collect<T>(mut cursor: Cursor<T>) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut items = Vec::new();
    while cursor.advance().await? {
        items.push(cursor.deserialize_current()?);
    }
    Ok(items)
}

fn newest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": -1 }).build()
}

fn internship_filter(filter: &InternshipFilter) -> Document {
    let mut query = doc! {};
    if let Some(ref recruiter_id) = filter.recruiter_id {
        query.insert("recruiterId", recruiter_id);
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if let Some(ref sector) = filter.sector {
        query.insert(
            "sector",
            doc! { "$regex": format!("^{}$", regex::escape(sector)), "$options": "i" },
        );
    }
    if let Some(mode) = filter.work_mode {
        query.insert("workMode", mode.as_str());
    }
    if let Some(ref location) = filter.location {
        query.insert(
            "location",
            doc! { "$regex": regex::escape(location), "$options": "i" },
        );
    }
    query
}

fn application_filter(filter: &ApplicationFilter) -> Document {
    let mut query = doc! {};
    if let Some(ref recruiter_id) = filter.recruiter_id {
        query.insert("recruiterId", recruiter_id);
    }
    if let Some(ref user_id) = filter.user_id {
        query.insert("userId", user_id);
    }
    if let Some(ref internship_id) = filter.internship_id {
        query.insert("internshipId", internship_id);
    }
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    query
}

fn upsert() -> ReplaceOptions {
    ReplaceOptions::builder().upsert(true).build()
}

#[rocket::async_trait]
impl Store for MongoStore {
    async fn get_profile(&self, uid: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles().find_one(doc! { "uid": uid }, None).await?)
    }

    async fn save_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.profiles()
            .replace_one(doc! { "uid": &profile.uid }, profile, upsert())
            .await?;
        Ok(())
    }

    async fn delete_profile(&self, uid: &str) -> StoreResult<bool> {
        let result = self.profiles().delete_one(doc! { "uid": uid }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_profile_by_referral_code(&self, code: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .profiles()
            .find_one(doc! { "referralCode": code }, None)
            .await?)
    }

    async fn get_recruiter(&self, uid: &str) -> StoreResult<Option<Recruiter>> {
        Ok(self.recruiters().find_one(doc! { "uid": uid }, None).await?)
    }

    async fn create_recruiter(&self, recruiter: &Recruiter) -> StoreResult<bool> {
        match self.recruiters().insert_one(recruiter, None).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = StoreError::from(e);
                if is_duplicate_key(&err) { Ok(false) } else { Err(err) }
            }
        }
    }

    async fn save_recruiter(&self, recruiter: &Recruiter) -> StoreResult<()> {
        self.recruiters()
            .replace_one(doc! { "uid": &recruiter.uid }, recruiter, upsert())
            .await?;
        Ok(())
    }

    async fn delete_recruiter(&self, uid: &str) -> StoreResult<bool> {
        let result = self.recruiters().delete_one(doc! { "uid": uid }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn get_internship(&self, id: &str) -> StoreResult<Option<Internship>> {
        Ok(self.internships().find_one(doc! { "id": id }, None).await?)
    }

    async fn create_internship(&self, internship: &Internship) -> StoreResult<()> {
        let mut session = self.start_transaction().await?;
        let result = self.create_internship_in(&mut session, internship).await;
        finish(session, result).await
    }

    async fn save_internship(&self, internship: &Internship) -> StoreResult<bool> {
        let mut fields = bson::to_document(internship)?;
        for key in INTERNSHIP_FIXED_FIELDS {
            fields.remove(key);
        }
        let result = self
            .internships()
            .update_one(doc! { "id": &internship.id }, doc! { "$set": fields }, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list_internships(
        &self,
        filter: &InternshipFilter,
        page: Option<Page>,
    ) -> StoreResult<Vec<Internship>> {
        let mut options = newest_first();
        if let Some(page) = page {
            options.skip = Some(page.skip);
            options.limit = Some(page.limit);
        }
        let cursor = self
            .internships()
            .find(internship_filter(filter), options)
            .await?;
        collect(cursor).await
    }

    async fn count_internships(&self, filter: &InternshipFilter) -> StoreResult<u64> {
        Ok(self
            .internships()
            .count_documents(internship_filter(filter), None)
            .await?)
    }

    async fn increment_internship_views(&self, id: &str) -> StoreResult<Option<i64>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .internships()
            .find_one_and_update(
                doc! { "id": id, "status": InternshipStatus::Published.as_str() },
                doc! { "$inc": { "views": 1 } },
                options,
            )
            .await?;
        Ok(updated.map(|i| i.views))
    }

    async fn delete_internship_cascade(&self, id: &str) -> StoreResult<Option<u64>> {
        let mut session = self.start_transaction().await?;
        let result = self.cascade_delete_in(&mut session, id).await;
        finish(session, result).await
    }

    async fn get_application(&self, id: &str) -> StoreResult<Option<Application>> {
        Ok(self.applications().find_one(doc! { "id": id }, None).await?)
    }

    async fn create_application(&self, application: &Application) -> StoreResult<bool> {
        let mut session = self.start_transaction().await?;
        let result = self.apply_in(&mut session, application).await;
        match finish(session, result).await {
            Ok(()) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_applications(&self, filter: &ApplicationFilter) -> StoreResult<Vec<Application>> {
        let cursor = self
            .applications()
            .find(application_filter(filter), newest_first())
            .await?;
        collect(cursor).await
    }

    async fn update_application_status(
        &self,
        id: &str,
        status: ApplicationStatus,
        blocked: &[ApplicationStatus],
        updated_at: DateTime<Utc>,
        notification: Option<&Notification>,
    ) -> StoreResult<StatusWrite> {
        let mut session = self.start_transaction().await?;
        let result = self
            .status_update_in(&mut session, id, status, blocked, updated_at, notification)
            .await;
        finish(session, result).await
    }

    async fn delete_applications_by_user(&self, uid: &str) -> StoreResult<u64> {
        let mut session = self.start_transaction().await?;
        let result = self.delete_user_applications_in(&mut session, uid).await;
        finish(session, result).await
    }

    async fn insert_notification(&self, notification: &Notification) -> StoreResult<()> {
        self.notifications().insert_one(notification, None).await?;
        Ok(())
    }

    async fn list_notifications(&self, uid: &str) -> StoreResult<Vec<Notification>> {
        let cursor = self
            .notifications()
            .find(doc! { "userId": uid }, newest_first())
            .await?;
        collect(cursor).await
    }

    async fn mark_notification_read(&self, id: &str, uid: &str) -> StoreResult<bool> {
        let result = self
            .notifications()
            .update_one(
                doc! { "id": id, "userId": uid },
                doc! { "$set": { "read": true } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_notifications_by_user(&self, uid: &str) -> StoreResult<u64> {
        let result = self
            .notifications()
            .delete_many(doc! { "userId": uid }, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn get_username(&self, username: &str) -> StoreResult<Option<UsernameClaim>> {
        Ok(self
            .usernames()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn claim_username(&self, claim: &UsernameClaim) -> StoreResult<bool> {
        let mut session = self.start_transaction().await?;
        let result = self.claim_in(&mut session, claim).await;
        match finish(session, result).await {
            Err(e) if is_duplicate_key(&e) => Ok(false),
            other => other,
        }
    }

    async fn release_usernames(&self, uid: &str) -> StoreResult<u64> {
        let result = self
            .usernames()
            .delete_many(doc! { "uid": uid }, None)
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_verification_request(&self, request: &VerificationRequest) -> StoreResult<()> {
        self.verification_requests().insert_one(request, None).await?;
        Ok(())
    }

    async fn get_verification_request(&self, id: &str) -> StoreResult<Option<VerificationRequest>> {
        Ok(self
            .verification_requests()
            .find_one(doc! { "id": id }, None)
            .await?)
    }

    async fn list_verification_requests(
        &self,
        status: Option<VerificationStatus>,
        recruiter_id: Option<&str>,
    ) -> StoreResult<Vec<VerificationRequest>> {
        let mut query = doc! {};
        if let Some(status) = status {
            query.insert("status", bson::to_bson(&status)?);
        }
        if let Some(recruiter_id) = recruiter_id {
            query.insert("recruiterId", recruiter_id);
        }
        let cursor = self
            .verification_requests()
            .find(query, newest_first())
            .await?;
        collect(cursor).await
    }

    async fn save_verification_request(&self, request: &VerificationRequest) -> StoreResult<bool> {
        let result = self
            .verification_requests()
            .replace_one(doc! { "id": &request.id }, request, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn create_referral(&self, referral: &Referral) -> StoreResult<bool> {
        match self.referrals().insert_one(referral, None).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = StoreError::from(e);
                if is_duplicate_key(&err) { Ok(false) } else { Err(err) }
            }
        }
    }

    async fn list_referrals_by_referrer(&self, uid: &str) -> StoreResult<Vec<Referral>> {
        let cursor = self
            .referrals()
            .find(doc! { "referrerUid": uid }, newest_first())
            .await?;
        collect(cursor).await
    }
}
