//! Ownership and role predicates shared by every entry point.
//!
//! These are pure; the services pair them with a fresh store read on every
//! call.

use crate::models::{Application, Internship, Recruiter, RecruiterStatus};

/// A recruiter may act only once verified and while active.
pub fn is_active_recruiter(recruiter: &Recruiter) -> bool {
    recruiter.is_verified && recruiter.status == RecruiterStatus::Active
}

pub fn owns_internship(internship: &Internship, uid: &str) -> bool {
    internship.recruiter_id == uid
}

pub fn owns_application(application: &Application, uid: &str) -> bool {
    application.recruiter_id == uid
}

/// The student who submitted the application.
pub fn is_applicant(application: &Application, uid: &str) -> bool {
    application.user_id == uid
}
