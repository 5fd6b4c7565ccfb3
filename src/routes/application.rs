use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::Application;
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Applications")]
#[get("/applications")]
pub async fn my_applications(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Vec<Application>>>, ApiError> {
    let applications = state.students().my_applications(&auth.caller).await?;
    Ok(Json(ApiResponse::success(applications)))
}

#[openapi(tag = "Applications")]
#[post("/applications/<id>/withdraw")]
pub async fn withdraw(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let application = state.students().withdraw(&auth.caller, &id).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Application withdrawn",
        application,
    )))
}
