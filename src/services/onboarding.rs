//! Onboarding: usernames, recruiter verification review and referrals.

use chrono::Utc;
use validator::Validate;

use super::{Caller, ServiceError, ServiceResult};
use crate::db::Store;
use crate::models::{
    Notification, NotificationKind, Profile, Recruiter, RecruiterStatus, Referral,
    ReviewVerificationDto, SubmitVerificationDto, UsernameAvailability, UsernameClaim,
    VerificationRequest, VerificationStatus,
};
use crate::utils::validation::{generate_referral_code, normalize_username, validate_username};

const REFERRAL_CODE_ATTEMPTS: usize = 5;

pub struct OnboardingService<'a> {
    store: &'a dyn Store,
}

fn checked_username(raw: &str) -> ServiceResult<String> {
    let username = normalize_username(raw);
    if !validate_username(&username) {
        return Err(ServiceError::invalid(
            "Username must be 3-20 characters of letters, digits or underscores",
        ));
    }
    Ok(username)
}

impl<'a> OnboardingService<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        OnboardingService { store }
    }

    async fn profile_or_new(&self, caller: &Caller) -> ServiceResult<Profile> {
        Ok(self
            .store
            .get_profile(&caller.uid)
            .await?
            .unwrap_or_else(|| Profile::new(&caller.uid, caller.email.clone())))
    }

    pub async fn username_availability(&self, raw: &str) -> ServiceResult<UsernameAvailability> {
        let username = checked_username(raw)?;
        let available = self.store.get_username(&username).await?.is_none();
        Ok(UsernameAvailability {
            username,
            available,
        })
    }

    pub async fn claim_username(&self, caller: &Caller, raw: &str) -> ServiceResult<Profile> {
        let username = checked_username(raw)?;
        let claim = UsernameClaim {
            username: username.clone(),
            uid: caller.uid.clone(),
            claimed_at: Utc::now(),
        };
        if !self.store.claim_username(&claim).await? {
            return Err(ServiceError::exists("Username is already taken"));
        }

        let mut profile = self.profile_or_new(caller).await?;
        profile.username = Some(username);
        profile.updated_at = claim.claimed_at;
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn submit_verification(
        &self,
        caller: &Caller,
        dto: SubmitVerificationDto,
    ) -> ServiceResult<VerificationRequest> {
        let recruiter = self
            .store
            .get_recruiter(&caller.uid)
            .await?
            .ok_or_else(|| ServiceError::not_found("Recruiter profile not found"))?;
        if recruiter.is_verified {
            return Err(ServiceError::precondition("Recruiter is already verified"));
        }
        dto.validate()?;

        let pending = self
            .store
            .list_verification_requests(Some(VerificationStatus::Pending), Some(&caller.uid))
            .await?;
        if !pending.is_empty() {
            return Err(ServiceError::exists("A verification request is already pending"));
        }

        let documents: Vec<String> = dto
            .documents
            .into_iter()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        if documents.is_empty() {
            return Err(ServiceError::invalid("Provide 1-10 supporting documents"));
        }

        let request = VerificationRequest {
            id: uuid::Uuid::new_v4().to_string(),
            recruiter_id: recruiter.uid,
            company_name: recruiter.company_name,
            documents,
            status: VerificationStatus::Pending,
            reviewer_note: None,
            reviewed_by: None,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        self.store.insert_verification_request(&request).await?;
        info!("Verification request {} submitted by {}", request.id, request.recruiter_id);
        Ok(request)
    }

    pub async fn my_verification_requests(&self, caller: &Caller) -> ServiceResult<Vec<VerificationRequest>> {
        Ok(self
            .store
            .list_verification_requests(None, Some(&caller.uid))
            .await?)
    }

    pub async fn pending_verifications(&self, caller: &Caller) -> ServiceResult<Vec<VerificationRequest>> {
        require_admin(caller)?;
        Ok(self
            .store
            .list_verification_requests(Some(VerificationStatus::Pending), None)
            .await?)
    }

    /// Approval verifies and activates the recruiter. The recruiter is
    /// notified of either outcome.
    pub async fn review_verification(
        &self,
        caller: &Caller,
        id: &str,
        dto: ReviewVerificationDto,
    ) -> ServiceResult<VerificationRequest> {
        require_admin(caller)?;
        let mut request = self
            .store
            .get_verification_request(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Verification request not found"))?;
        if request.status != VerificationStatus::Pending {
            return Err(ServiceError::precondition("Verification request was already reviewed"));
        }

        let now = Utc::now();
        let mut recruiter: Recruiter = self
            .store
            .get_recruiter(&request.recruiter_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Recruiter profile not found"))?;

        request.status = if dto.approve {
            VerificationStatus::Approved
        } else {
            VerificationStatus::Rejected
        };
        request.reviewer_note = dto.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        request.reviewed_by = Some(caller.uid.clone());
        request.reviewed_at = Some(now);

        if !self.store.save_verification_request(&request).await? {
            return Err(ServiceError::not_found("Verification request not found"));
        }

        if dto.approve {
            recruiter.is_verified = true;
            if recruiter.status == RecruiterStatus::Pending {
                recruiter.status = RecruiterStatus::Active;
            }
            recruiter.updated_at = now;
            self.store.save_recruiter(&recruiter).await?;
        }

        let (title, mut message) = if dto.approve {
            ("Verification approved", "Your company has been verified. You can now post internships.".to_string())
        } else {
            ("Verification rejected", "Your verification request was not approved.".to_string())
        };
        if let Some(note) = &request.reviewer_note {
            message = format!("{} {}", message, note);
        }
        let notification = Notification::new(
            &request.recruiter_id,
            NotificationKind::VerificationDecision,
            title,
            message,
        );
        self.store.insert_notification(&notification).await?;

        info!(
            "Verification request {} {} by {}",
            request.id,
            if dto.approve { "approved" } else { "rejected" },
            caller.uid
        );
        Ok(request)
    }

    /// The caller's referral code, generated on first request.
    pub async fn referral_code(&self, caller: &Caller) -> ServiceResult<String> {
        let mut profile = self.profile_or_new(caller).await?;
        if let Some(code) = &profile.referral_code {
            return Ok(code.clone());
        }

        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let code = generate_referral_code();
            if self.store.find_profile_by_referral_code(&code).await?.is_some() {
                continue;
            }
            profile.referral_code = Some(code.clone());
            profile.updated_at = Utc::now();
            self.store.save_profile(&profile).await?;
            return Ok(code);
        }
        warn!("Could not allocate a unique referral code for {}", caller.uid);
        Err(ServiceError::precondition("Could not allocate a referral code, try again"))
    }

    pub async fn redeem_referral(&self, caller: &Caller, raw: &str) -> ServiceResult<Referral> {
        let code = raw.trim().to_uppercase();
        if code.is_empty() {
            return Err(ServiceError::invalid("Referral code is required"));
        }
        let referrer = self
            .store
            .find_profile_by_referral_code(&code)
            .await?
            .ok_or_else(|| ServiceError::not_found("Referral code not found"))?;
        if referrer.uid == caller.uid {
            return Err(ServiceError::invalid("You cannot redeem your own referral code"));
        }

        let referral = Referral {
            id: uuid::Uuid::new_v4().to_string(),
            referrer_uid: referrer.uid,
            referred_uid: caller.uid.clone(),
            code,
            created_at: Utc::now(),
        };
        if !self.store.create_referral(&referral).await? {
            return Err(ServiceError::exists("You have already redeemed a referral code"));
        }
        Ok(referral)
    }

    pub async fn my_referrals(&self, caller: &Caller) -> ServiceResult<Vec<Referral>> {
        Ok(self.store.list_referrals_by_referrer(&caller.uid).await?)
    }
}

fn require_admin(caller: &Caller) -> ServiceResult<()> {
    if !caller.admin {
        return Err(ServiceError::denied("Admin access required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn caller(uid: &str, admin: bool) -> Caller {
        Caller {
            uid: uid.to_string(),
            email: None,
            admin,
        }
    }

    #[tokio::test]
    async fn usernames_are_exclusive() {
        let store = MemoryStore::new();
        let service = OnboardingService::new(&store);

        let profile = service.claim_username(&caller("u1", false), "Asha").await.unwrap();
        assert_eq!(profile.username.as_deref(), Some("asha"));

        let err = service.claim_username(&caller("u2", false), "ASHA").await.unwrap_err();
        assert_eq!(err.code(), "already-exists");
        assert!(!service.username_availability("asha").await.unwrap().available);
        assert_eq!(
            service.username_availability("no").await.unwrap_err().code(),
            "invalid-argument"
        );
    }

    #[tokio::test]
    async fn referral_codes_redeem_once() {
        let store = MemoryStore::new();
        let service = OnboardingService::new(&store);

        let code = service.referral_code(&caller("u1", false)).await.unwrap();
        assert_eq!(service.referral_code(&caller("u1", false)).await.unwrap(), code);

        let own = service.redeem_referral(&caller("u1", false), &code).await.unwrap_err();
        assert_eq!(own.code(), "invalid-argument");

        let referral = service
            .redeem_referral(&caller("u2", false), &code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(referral.referrer_uid, "u1");

        let again = service.redeem_referral(&caller("u2", false), &code).await.unwrap_err();
        assert_eq!(again.code(), "already-exists");
        assert_eq!(service.my_referrals(&caller("u1", false)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn review_requires_admin() {
        let store = MemoryStore::new();
        let service = OnboardingService::new(&store);
        let err = service
            .pending_verifications(&caller("u1", false))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "permission-denied");
    }
}
