use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;
use serde::Serialize;

use crate::guards::AuthGuard;
use crate::models::{
    ClaimUsernameDto, Profile, RedeemReferralDto, Referral, SubmitVerificationDto,
    UsernameAvailability, VerificationRequest,
};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[derive(Serialize, rocket_okapi::okapi::schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSummary {
    pub code: String,
    pub referrals: Vec<Referral>,
}

#[openapi(tag = "Onboarding")]
#[get("/onboarding/username/<name>")]
pub async fn username_availability(
    state: &State<AppState>,
    name: String,
) -> Result<Json<ApiResponse<UsernameAvailability>>, ApiError> {
    let availability = state.onboarding().username_availability(&name).await?;
    Ok(Json(ApiResponse::success(availability)))
}

#[openapi(tag = "Onboarding")]
#[post("/onboarding/username", data = "<dto>")]
pub async fn claim_username(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<ClaimUsernameDto>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state
        .onboarding()
        .claim_username(&auth.caller, &dto.username)
        .await?;
    Ok(Json(ApiResponse::success_with_message("Username claimed", profile)))
}

#[openapi(tag = "Onboarding")]
#[post("/onboarding/verification-request", data = "<dto>")]
pub async fn submit_verification(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<SubmitVerificationDto>,
) -> Result<Json<ApiResponse<VerificationRequest>>, ApiError> {
    let request = state
        .onboarding()
        .submit_verification(&auth.caller, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Verification request submitted",
        request,
    )))
}

#[openapi(tag = "Onboarding")]
#[get("/onboarding/verification-request")]
pub async fn my_verification_requests(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Vec<VerificationRequest>>>, ApiError> {
    let requests = state.onboarding().my_verification_requests(&auth.caller).await?;
    Ok(Json(ApiResponse::success(requests)))
}

#[openapi(tag = "Onboarding")]
#[get("/onboarding/referral-code")]
pub async fn referral_code(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<ReferralSummary>>, ApiError> {
    let onboarding = state.onboarding();
    let code = onboarding.referral_code(&auth.caller).await?;
    let referrals = onboarding.my_referrals(&auth.caller).await?;
    Ok(Json(ApiResponse::success(ReferralSummary { code, referrals })))
}

#[openapi(tag = "Onboarding")]
#[post("/onboarding/referral", data = "<dto>")]
pub async fn redeem_referral(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<RedeemReferralDto>,
) -> Result<Json<ApiResponse<Referral>>, ApiError> {
    let referral = state
        .onboarding()
        .redeem_referral(&auth.caller, &dto.code)
        .await?;
    Ok(Json(ApiResponse::success_with_message("Referral redeemed", referral)))
}
