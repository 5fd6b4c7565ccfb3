use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::models::InternshipOgMeta;
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

/// Link-preview metadata for a shared internship URL. No auth.
#[openapi(tag = "Open Graph")]
#[get("/og/internships/<id>")]
pub async fn internship_meta(
    state: &State<AppState>,
    id: String,
) -> Result<Json<ApiResponse<InternshipOgMeta>>, ApiError> {
    let meta = state.students().og_meta(&id).await?;
    Ok(Json(ApiResponse::success(meta)))
}
