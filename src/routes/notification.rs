use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::Notification;
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Notifications")]
#[get("/notifications")]
pub async fn list_notifications(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = state.students().notifications(&auth.caller).await?;
    Ok(Json(ApiResponse::success(notifications)))
}

#[openapi(tag = "Notifications")]
#[put("/notifications/<id>/read")]
pub async fn mark_read(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state.students().mark_notification_read(&auth.caller, &id).await?;
    Ok(Json(ApiResponse::success_with_message("Notification marked read", ())))
}
