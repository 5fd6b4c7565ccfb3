#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use internhub_server::config::{Settings, StoreBackend};
use internhub_server::db::{MemoryStore, Store};
use internhub_server::models::{
    Application, ApplicationStatus, Internship, InternshipStatus, Recruiter, RecruiterStatus,
    WorkMode,
};
use internhub_server::services::SharedSecretVerifier;
use internhub_server::{AppState, build};
use rocket::http::Header;
use rocket::local::asynchronous::{Client, LocalResponse};
use serde_json::Value;

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub client: Client,
    pub store: Arc<MemoryStore>,
    verifier: SharedSecretVerifier,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(Settings {
            store: StoreBackend::Memory,
            auth_secret: SECRET.to_string(),
            ..Default::default()
        })
        .await
    }

    pub async fn with_settings(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();
        let state = AppState::new(
            dyn_store,
            Arc::new(SharedSecretVerifier::new(SECRET)),
            settings,
        );
        let client = Client::tracked(build(state))
            .await
            .expect("valid rocket instance");
        TestApp {
            client,
            store,
            verifier: SharedSecretVerifier::new(SECRET),
        }
    }

    pub fn bearer(&self, uid: &str) -> Header<'static> {
        let token = self.verifier.issue(uid, None, false, 3600).expect("token");
        Header::new("Authorization", format!("Bearer {}", token))
    }

    pub fn admin_bearer(&self, uid: &str) -> Header<'static> {
        let token = self.verifier.issue(uid, None, true, 3600).expect("token");
        Header::new("Authorization", format!("Bearer {}", token))
    }

    pub async fn seed_recruiter(&self, uid: &str, verified: bool) -> Recruiter {
        let recruiter = recruiter(uid, verified);
        assert!(self.store.create_recruiter(&recruiter).await.unwrap());
        recruiter
    }

    pub async fn seed_internship(&self, id: &str, recruiter_id: &str, status: InternshipStatus) -> Internship {
        let internship = internship(id, recruiter_id, status);
        self.store.create_internship(&internship).await.unwrap();
        internship
    }

    pub async fn seed_application(
        &self,
        id: &str,
        internship_id: &str,
        recruiter_id: &str,
        user_id: &str,
    ) -> Application {
        let application = application(id, internship_id, recruiter_id, user_id);
        assert!(self.store.create_application(&application).await.unwrap());
        application
    }
}

pub fn recruiter(uid: &str, verified: bool) -> Recruiter {
    Recruiter {
        uid: uid.to_string(),
        company_name: format!("{} Labs", uid),
        company_website: None,
        contact_email: None,
        designation: None,
        is_verified: verified,
        status: if verified {
            RecruiterStatus::Active
        } else {
            RecruiterStatus::Pending
        },
        internships_created: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn internship(id: &str, recruiter_id: &str, status: InternshipStatus) -> Internship {
    Internship {
        id: id.to_string(),
        recruiter_id: recruiter_id.to_string(),
        title: "Backend Intern".to_string(),
        company: "Acme".to_string(),
        description: "Work on the matching service".to_string(),
        location: "Pune".to_string(),
        work_mode: WorkMode::Hybrid,
        stipend: Some(12_000),
        duration_months: Some(3),
        sector: Some("Technology".to_string()),
        skills: vec!["Rust".to_string()],
        openings: Some(2),
        logo_url: None,
        deadline: None,
        status,
        published_at: None,
        views: 0,
        applications: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn application(id: &str, internship_id: &str, recruiter_id: &str, user_id: &str) -> Application {
    Application {
        id: id.to_string(),
        internship_id: internship_id.to_string(),
        recruiter_id: recruiter_id.to_string(),
        user_id: user_id.to_string(),
        status: ApplicationStatus::Pending,
        cover_letter: None,
        applied_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub async fn json(response: LocalResponse<'_>) -> Value {
    response.into_json::<Value>().await.expect("json body")
}
