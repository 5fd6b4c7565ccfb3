use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{AccountDeletionReport, AccountStatusChange, UserDataExport};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[openapi(tag = "Account")]
#[get("/account/export")]
pub async fn export_data(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<UserDataExport>>, ApiError> {
    let export = state.accounts().export(&auth.caller).await?;
    Ok(Json(ApiResponse::success(export)))
}

#[openapi(tag = "Account")]
#[post("/account/deactivate")]
pub async fn deactivate(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<AccountStatusChange>>, ApiError> {
    let change = state.accounts().deactivate(&auth.caller).await?;
    Ok(Json(ApiResponse::success_with_message(
        format!(
            "Account deactivated. It can be reactivated within {} days",
            state.settings.reactivation_window_days
        ),
        change,
    )))
}

#[openapi(tag = "Account")]
#[post("/account/reactivate")]
pub async fn reactivate(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<AccountStatusChange>>, ApiError> {
    let change = state.accounts().reactivate(&auth.caller).await?;
    Ok(Json(ApiResponse::success_with_message("Account reactivated", change)))
}

#[openapi(tag = "Account")]
#[delete("/account")]
pub async fn delete_account(
    state: &State<AppState>,
    auth: AuthGuard,
) -> Result<Json<ApiResponse<AccountDeletionReport>>, ApiError> {
    let report = state.accounts().delete(&auth.caller).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Account permanently deleted",
        report,
    )))
}
