pub mod account;
pub mod authorization;
pub mod error;
pub mod onboarding;
pub mod recruiter;
pub mod scoring;
pub mod student;
pub mod token;

pub use account::AccountService;
pub use error::{ServiceError, ServiceResult};
pub use onboarding::OnboardingService;
pub use recruiter::RecruiterService;
pub use student::StudentService;
pub use token::{AuthError, Claims, FirebaseTokenVerifier, SharedSecretVerifier, TokenVerifier};

/// Identity of a request, taken from a verified ID token.
#[derive(Debug, Clone)]
pub struct Caller {
    pub uid: String,
    pub email: Option<String>,
    pub admin: bool,
}

impl From<Claims> for Caller {
    fn from(claims: Claims) -> Self {
        Caller {
            uid: claims.sub,
            email: claims.email,
            admin: claims.admin,
        }
    }
}
