mod common;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use internhub_server::config::{Settings, StoreBackend};
use internhub_server::db::{Page, StatusWrite, Store, StoreError, StoreResult};
use internhub_server::models::{
    Application, ApplicationFilter, ApplicationStatus, Internship, InternshipFilter, Notification,
    Profile, Recruiter, Referral, UsernameClaim, VerificationRequest, VerificationStatus,
};
use internhub_server::services::SharedSecretVerifier;
use internhub_server::{AppState, build};
use mongodb::bson;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde::de::Error as _;
use serde_json::json;

const RAW_ERROR: &str = "connection to shard-07.internal:27017 refused";

/// Every call fails the way a dropped database connection would.
struct BrokenStore;

fn broken<T>() -> StoreResult<T> {
    Err(StoreError::Decode(bson::de::Error::custom(RAW_ERROR)))
}

#[rocket::async_trait]
impl Store for BrokenStore {
    async fn get_profile(&self, _: &str) -> StoreResult<Option<Profile>> {
        broken()
    }
    async fn save_profile(&self, _: &Profile) -> StoreResult<()> {
        broken()
    }
    async fn delete_profile(&self, _: &str) -> StoreResult<bool> {
        broken()
    }
    async fn find_profile_by_referral_code(&self, _: &str) -> StoreResult<Option<Profile>> {
        broken()
    }
    async fn get_recruiter(&self, _: &str) -> StoreResult<Option<Recruiter>> {
        broken()
    }
    async fn create_recruiter(&self, _: &Recruiter) -> StoreResult<bool> {
        broken()
    }
    async fn save_recruiter(&self, _: &Recruiter) -> StoreResult<()> {
        broken()
    }
    async fn delete_recruiter(&self, _: &str) -> StoreResult<bool> {
        broken()
    }
    async fn get_internship(&self, _: &str) -> StoreResult<Option<Internship>> {
        broken()
    }
    async fn create_internship(&self, _: &Internship) -> StoreResult<()> {
        broken()
    }
    async fn save_internship(&self, _: &Internship) -> StoreResult<bool> {
        broken()
    }
    async fn list_internships(
        &self,
        _: &InternshipFilter,
        _: Option<Page>,
    ) -> StoreResult<Vec<Internship>> {
        broken()
    }
    async fn count_internships(&self, _: &InternshipFilter) -> StoreResult<u64> {
        broken()
    }
    async fn increment_internship_views(&self, _: &str) -> StoreResult<Option<i64>> {
        broken()
    }
    async fn delete_internship_cascade(&self, _: &str) -> StoreResult<Option<u64>> {
        broken()
    }
    async fn get_application(&self, _: &str) -> StoreResult<Option<Application>> {
        broken()
    }
    async fn create_application(&self, _: &Application) -> StoreResult<bool> {
        broken()
    }
    async fn list_applications(&self, _: &ApplicationFilter) -> StoreResult<Vec<Application>> {
        broken()
    }
    async fn update_application_status(
        &self,
        _: &str,
        _: ApplicationStatus,
        _: &[ApplicationStatus],
        _: DateTime<Utc>,
        _: Option<&Notification>,
    ) -> StoreResult<StatusWrite> {
        broken()
    }
    async fn delete_applications_by_user(&self, _: &str) -> StoreResult<u64> {
        broken()
    }
    async fn insert_notification(&self, _: &Notification) -> StoreResult<()> {
        broken()
    }
    async fn list_notifications(&self, _: &str) -> StoreResult<Vec<Notification>> {
        broken()
    }
    async fn mark_notification_read(&self, _: &str, _: &str) -> StoreResult<bool> {
        broken()
    }
    async fn delete_notifications_by_user(&self, _: &str) -> StoreResult<u64> {
        broken()
    }
    async fn get_username(&self, _: &str) -> StoreResult<Option<UsernameClaim>> {
        broken()
    }
    async fn claim_username(&self, _: &UsernameClaim) -> StoreResult<bool> {
        broken()
    }
    async fn release_usernames(&self, _: &str) -> StoreResult<u64> {
        broken()
    }
    async fn insert_verification_request(&self, _: &VerificationRequest) -> StoreResult<()> {
        broken()
    }
    async fn get_verification_request(&self, _: &str) -> StoreResult<Option<VerificationRequest>> {
        broken()
    }
    async fn list_verification_requests(
        &self,
        _: Option<VerificationStatus>,
        _: Option<&str>,
    ) -> StoreResult<Vec<VerificationRequest>> {
        broken()
    }
    async fn save_verification_request(&self, _: &VerificationRequest) -> StoreResult<bool> {
        broken()
    }
    async fn create_referral(&self, _: &Referral) -> StoreResult<bool> {
        broken()
    }
    async fn list_referrals_by_referrer(&self, _: &str) -> StoreResult<Vec<Referral>> {
        broken()
    }
}

async fn broken_app() -> (Client, Header<'static>) {
    let settings = Settings {
        store: StoreBackend::Memory,
        auth_secret: common::SECRET.to_string(),
        ..Default::default()
    };
    let verifier = SharedSecretVerifier::new(common::SECRET);
    let token = verifier.issue("R1", None, false, 3600).expect("token");
    let state = AppState::new(Arc::new(BrokenStore), Arc::new(verifier), settings);
    let client = Client::tracked(build(state)).await.expect("valid rocket instance");
    (client, Header::new("Authorization", format!("Bearer {}", token)))
}

#[rocket::async_test]
async fn store_failures_are_reported_by_reference_only() {
    let (client, bearer) = broken_app().await;

    let response = client.get("/api/v1/recruiter/status").header(bearer).dispatch().await;
    assert_eq!(response.status(), Status::InternalServerError);
    let body = common::json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "internal");

    let message = body["message"].as_str().unwrap();
    let reference = message
        .split("reference: ")
        .nth(1)
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap();
    assert!(uuid::Uuid::parse_str(reference).is_ok());
    assert!(!body.to_string().contains("shard-07"));
}

#[rocket::async_test]
async fn callable_store_failures_are_reported_by_reference_only() {
    let (client, bearer) = broken_app().await;

    let response = client
        .post("/callable/getRecruiterStatus")
        .header(bearer)
        .header(ContentType::JSON)
        .body(json!({ "data": {} }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::InternalServerError);
    let body = common::json(response).await;
    assert_eq!(body["error"]["status"], "INTERNAL");
    assert_eq!(body["error"]["code"], "internal");
    assert!(body["error"]["message"].as_str().unwrap().contains("reference: "));
    assert!(!body.to_string().contains("shard-07"));
}
