use std::sync::Arc;

use crate::config::Settings;
use crate::db::{self, Store, StoreResult};
use crate::services::{
    AccountService, FirebaseTokenVerifier, OnboardingService, RecruiterService,
    SharedSecretVerifier, StudentService, TokenVerifier,
};

/// Shared, managed state: the store, the token verifier and settings.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, verifier: Arc<dyn TokenVerifier>, settings: Settings) -> Self {
        AppState {
            store,
            verifier,
            settings,
        }
    }

    pub async fn from_settings(settings: Settings) -> StoreResult<Self> {
        let store = db::connect(&settings).await?;
        let verifier: Arc<dyn TokenVerifier> = match settings.firebase_project() {
            Some(project_id) => {
                info!("Verifying Firebase ID tokens for project {}", project_id);
                Arc::new(FirebaseTokenVerifier::new(project_id))
            }
            None => {
                warn!("No Firebase project configured, accepting HS256 tokens signed with auth_secret");
                Arc::new(SharedSecretVerifier::new(settings.auth_secret.clone()))
            }
        };
        Ok(AppState::new(store, verifier, settings))
    }

    pub fn recruiters(&self) -> RecruiterService<'_> {
        RecruiterService::new(self.store.as_ref(), &self.settings)
    }

    pub fn students(&self) -> StudentService<'_> {
        StudentService::new(self.store.as_ref(), &self.settings)
    }

    pub fn accounts(&self) -> AccountService<'_> {
        AccountService::new(self.store.as_ref(), &self.settings)
    }

    pub fn onboarding(&self) -> OnboardingService<'_> {
        OnboardingService::new(self.store.as_ref())
    }
}
