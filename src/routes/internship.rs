use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::guards::{AuthGuard, MaybeAuth};
use crate::models::{Application, ApplyDto, Internship};
use crate::services::student::{BrowseQuery, InternshipPage, ScoredInternship, ViewCount};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct InternshipListQuery {
    pub sector: Option<String>,
    pub location: Option<String>,
    pub work_mode: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[openapi(tag = "Internships")]
#[get("/internships?<query..>")]
pub async fn browse(
    state: &State<AppState>,
    query: InternshipListQuery,
) -> Result<Json<ApiResponse<InternshipPage>>, ApiError> {
    let page = state
        .students()
        .browse(BrowseQuery {
            sector: query.sector,
            location: query.location,
            work_mode: query.work_mode,
            page: query.page,
            limit: query.limit,
        })
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

#[openapi(tag = "Internships")]
#[get("/internships/recommended?<limit>")]
pub async fn recommended(
    state: &State<AppState>,
    auth: AuthGuard,
    limit: Option<i64>,
) -> Result<Json<ApiResponse<Vec<ScoredInternship>>>, ApiError> {
    let scored = state.students().recommended(&auth.caller, limit).await?;
    Ok(Json(ApiResponse::success(scored)))
}

#[openapi(tag = "Internships")]
#[get("/internships/<id>")]
pub async fn get_internship(
    state: &State<AppState>,
    auth: MaybeAuth,
    id: String,
) -> Result<Json<ApiResponse<Internship>>, ApiError> {
    let internship = state.students().internship(auth.caller.as_ref(), &id).await?;
    Ok(Json(ApiResponse::success(internship)))
}

#[openapi(tag = "Internships")]
#[post("/internships/<id>/view")]
pub async fn track_view(
    state: &State<AppState>,
    id: String,
) -> Result<Json<ApiResponse<ViewCount>>, ApiError> {
    let count = state.students().track_view(&id).await?;
    Ok(Json(ApiResponse::success(count)))
}

#[openapi(tag = "Internships")]
#[post("/internships/<id>/apply", data = "<dto>")]
pub async fn apply(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
    dto: Json<ApplyDto>,
) -> Result<Json<ApiResponse<Application>>, ApiError> {
    let application = state
        .students()
        .apply(&auth.caller, &id, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Application submitted",
        application,
    )))
}
