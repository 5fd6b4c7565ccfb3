use rocket::State;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::guards::AuthGuard;
use crate::models::{
    Application, BulkUpdateApplicationStatusDto, BulkUpdateReport, CreateInternshipDto,
    InitializeRecruiterDto, Internship, RankedCandidate, Recruiter, RecruiterAnalytics,
    RecruiterStatusResponse, UpdateApplicationStatusDto, UpdateInternshipDto,
};
use crate::services::recruiter::{ApplicationsQuery, InternshipDeletion};
use crate::state::AppState;
use crate::utils::{ApiError, ApiResponse};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[openapi(tag = "Recruiter")]
#[post("/recruiter/profile", data = "<dto>")]
pub async fn initialize_profile(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<InitializeRecruiterDto>,
) -> ApiResult<Recruiter> {
    let recruiter = state
        .recruiters()
        .initialize_profile(&auth.caller, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Recruiter profile created",
        recruiter,
    )))
}

#[openapi(tag = "Recruiter")]
#[get("/recruiter/status")]
pub async fn get_status(state: &State<AppState>, auth: AuthGuard) -> ApiResult<RecruiterStatusResponse> {
    let status = state.recruiters().status(&auth.caller).await?;
    Ok(Json(ApiResponse::success(status)))
}

#[openapi(tag = "Recruiter")]
#[get("/recruiter/internships")]
pub async fn list_internships(state: &State<AppState>, auth: AuthGuard) -> ApiResult<Vec<Internship>> {
    let internships = state.recruiters().list_internships(&auth.caller).await?;
    Ok(Json(ApiResponse::success(internships)))
}

#[openapi(tag = "Recruiter")]
#[post("/recruiter/internships", data = "<dto>")]
pub async fn create_internship(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<CreateInternshipDto>,
) -> ApiResult<Internship> {
    let internship = state
        .recruiters()
        .create_internship(&auth.caller, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Internship created",
        internship,
    )))
}

#[openapi(tag = "Recruiter")]
#[put("/recruiter/internships/<id>", data = "<dto>")]
pub async fn update_internship(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
    dto: Json<UpdateInternshipDto>,
) -> ApiResult<Internship> {
    let internship = state
        .recruiters()
        .update_internship(&auth.caller, &id, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        "Internship updated",
        internship,
    )))
}

#[openapi(tag = "Recruiter")]
#[delete("/recruiter/internships/<id>")]
pub async fn delete_internship(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
) -> ApiResult<InternshipDeletion> {
    let deletion = state.recruiters().delete_internship(&auth.caller, &id).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Internship deleted",
        deletion,
    )))
}

#[openapi(tag = "Recruiter")]
#[post("/recruiter/internships/<id>/publish")]
pub async fn publish_internship(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
) -> ApiResult<Internship> {
    let internship = state.recruiters().publish_internship(&auth.caller, &id).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Internship published",
        internship,
    )))
}

#[openapi(tag = "Recruiter")]
#[post("/recruiter/internships/<id>/close")]
pub async fn close_internship(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
) -> ApiResult<Internship> {
    let internship = state.recruiters().close_internship(&auth.caller, &id).await?;
    Ok(Json(ApiResponse::success_with_message(
        "Internship closed",
        internship,
    )))
}

#[openapi(tag = "Recruiter")]
#[get("/recruiter/internships/<id>/candidates")]
pub async fn rank_candidates(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
) -> ApiResult<Vec<RankedCandidate>> {
    let candidates = state.recruiters().rank_candidates(&auth.caller, &id).await?;
    Ok(Json(ApiResponse::success(candidates)))
}

#[derive(FromForm, serde::Deserialize, rocket_okapi::okapi::schemars::JsonSchema)]
pub struct ApplicationListQuery {
    pub internship_id: Option<String>,
    pub status: Option<String>,
}

#[openapi(tag = "Recruiter")]
#[get("/recruiter/applications?<query..>")]
pub async fn get_applications(
    state: &State<AppState>,
    auth: AuthGuard,
    query: ApplicationListQuery,
) -> ApiResult<Vec<Application>> {
    let query = ApplicationsQuery {
        internship_id: query.internship_id,
        status: query.status,
    };
    let applications = state.recruiters().get_applications(&auth.caller, query).await?;
    Ok(Json(ApiResponse::success(applications)))
}

#[openapi(tag = "Recruiter")]
#[put("/recruiter/applications/<id>/status", data = "<dto>")]
pub async fn update_application_status(
    state: &State<AppState>,
    auth: AuthGuard,
    id: String,
    dto: Json<UpdateApplicationStatusDto>,
) -> ApiResult<Application> {
    let application = state
        .recruiters()
        .update_application_status(&auth.caller, &id, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        format!("Application marked {}", application.status),
        application,
    )))
}

#[openapi(tag = "Recruiter")]
#[put("/recruiter/applications/status", data = "<dto>")]
pub async fn bulk_update_application_status(
    state: &State<AppState>,
    auth: AuthGuard,
    dto: Json<BulkUpdateApplicationStatusDto>,
) -> ApiResult<BulkUpdateReport> {
    let report = state
        .recruiters()
        .bulk_update_application_status(&auth.caller, dto.into_inner())
        .await?;
    Ok(Json(ApiResponse::success_with_message(
        format!("{} updated, {} failed", report.updated, report.failed),
        report,
    )))
}

#[openapi(tag = "Recruiter")]
#[get("/recruiter/analytics")]
pub async fn analytics(state: &State<AppState>, auth: AuthGuard) -> ApiResult<RecruiterAnalytics> {
    let analytics = state.recruiters().analytics(&auth.caller).await?;
    Ok(Json(ApiResponse::success(analytics)))
}
