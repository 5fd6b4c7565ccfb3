use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::guards::AdminGuard;
use crate::models::{ReviewVerificationDto, VerificationRequest};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Admin")]
#[get("/admin/verification-requests")]
pub async fn pending_verifications(
    state: &State<AppState>,
    admin: AdminGuard,
) -> Result<Json<ApiResponse<Vec<VerificationRequest>>>, ApiError> {
    let requests = state.onboarding().pending_verifications(&admin.caller).await?;
    Ok(Json(ApiResponse::success(requests)))
}

#[openapi(tag = "Admin")]
#[put("/admin/verification-requests/<id>", data = "<dto>")]
pub async fn review_verification(
    state: &State<AppState>,
    admin: AdminGuard,
    id: String,
    dto: Json<ReviewVerificationDto>,
) -> Result<Json<ApiResponse<VerificationRequest>>, ApiError> {
    let request = state
        .onboarding()
        .review_verification(&admin.caller, &id, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Verification request reviewed",
        request,
    )))
}
