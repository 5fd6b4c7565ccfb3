use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{Profile, UpdateProfileDto};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Profile")]
#[get("/profile")]
pub async fn get_profile(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state.students().profile(&auth.caller).await?;
    Ok(Json(ApiResponse::success(profile)))
}

#[openapi(tag = "Profile")]
#[put("/profile", data = "<dto>")]
pub async fn update_profile(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<UpdateProfileDto>,
) -> Result<Json<ApiResponse<Profile>>, ApiError> {
    let profile = state
        .students()
        .update_profile(&auth.caller, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message("Profile updated", profile)))
}
