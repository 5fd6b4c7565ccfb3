//! RPC-style endpoint: `POST /callable/<name>` with `{"data": {...}}`.
//!
//! Every function except `trackInternshipView` needs a verified ID token.
//! Ownership is settled before the payload is decoded in full, so a caller
//! who does not own the target always gets `permission-denied`.

use rocket::State;
use rocket::serde::json::{Error as JsonError, Json};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::guards::AuthGuard;
use crate::models::{
    BulkUpdateApplicationStatusDto, CreateInternshipDto, InitializeRecruiterDto,
    UpdateApplicationStatusDto, UpdateInternshipDto,
};
use crate::services::recruiter::ApplicationsQuery;
use crate::services::{AuthError, Caller};
use crate::state::AppState;
use crate::utils::{ApiError, CallableResponse};

#[derive(Debug, Deserialize)]
pub struct CallableRequest {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InternshipRef {
    internship_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationRef {
    application_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InternshipUpdate {
    internship_id: String,
    #[serde(default)]
    updates: UpdateInternshipDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationStatusUpdate {
    application_id: String,
    #[serde(flatten)]
    update: UpdateApplicationStatusDto,
}

fn parse<T: DeserializeOwned>(data: Value) -> Result<T, ApiError> {
    let data = if data.is_null() {
        Value::Object(Default::default())
    } else {
        data
    };
    serde_json::from_value(data).map_err(|e| ApiError::bad_request(format!("Invalid request data: {}", e)))
}

fn authenticated(auth: Result<AuthGuard, AuthError>, name: &str) -> Result<Caller, ApiError> {
    auth.map(|guard| guard.caller).map_err(|e| {
        debug!("Callable {} rejected: {}", name, e);
        ApiError::unauthorized("The function must be called while authenticated")
    })
}

#[post("/callable/<name>", data = "<request>")]
pub async fn call(
    state: &State<AppState>,
    auth: Result<AuthGuard, AuthError>,
    name: &str,
    request: Result<Json<CallableRequest>, JsonError<'_>>,
) -> CallableResponse {
    let data = match request {
        Ok(request) => request.into_inner().data,
        Err(e) => {
            debug!("Callable {} body rejected: {}", name, e);
            return ApiError::bad_request("Request body must be a JSON object with a `data` field")
                .into();
        }
    };
    match dispatch(state, auth, name, data).await {
        Ok(response) => response,
        Err(err) => err.into(),
    }
}

async fn dispatch(
    state: &AppState,
    auth: Result<AuthGuard, AuthError>,
    name: &str,
    data: Value,
) -> Result<CallableResponse, ApiError> {
    if name == "trackInternshipView" {
        let target: InternshipRef = parse(data)?;
        let count = state.students().track_view(&target.internship_id).await?;
        return Ok(CallableResponse::ok(count));
    }

    let known = matches!(
        name,
        "initializeRecruiterProfile"
            | "getRecruiterStatus"
            | "createInternship"
            | "updateInternship"
            | "deleteInternship"
            | "publishInternship"
            | "closeInternship"
            | "getApplications"
            | "updateApplicationStatus"
            | "bulkUpdateApplicationStatus"
            | "getRecruiterAnalytics"
            | "exportUserData"
            | "deactivateAccount"
            | "reactivateAccount"
            | "deleteAccount"
    );
    if !known {
        return Err(ApiError::not_found(format!("Unknown function '{}'", name)));
    }
    let caller = authenticated(auth, name)?;

    let recruiters = state.recruiters();
    let accounts = state.accounts();
    let response = match name {
        "initializeRecruiterProfile" => {
            let dto: InitializeRecruiterDto = parse(data)?;
            CallableResponse::ok(recruiters.initialize_profile(&caller, dto).await?)
        }
        "getRecruiterStatus" => CallableResponse::ok(recruiters.status(&caller).await?),
        "createInternship" => {
            let dto: CreateInternshipDto = parse(data)?;
            CallableResponse::ok(recruiters.create_internship(&caller, dto).await?)
        }
        "updateInternship" => {
            let target: InternshipRef = parse(data.clone())?;
            recruiters.verify_recruiter_role(&caller.uid).await?;
            recruiters
                .verify_internship_ownership(&caller.uid, &target.internship_id)
                .await?;
            let req: InternshipUpdate = parse(data)?;
            CallableResponse::ok(
                recruiters
                    .update_internship(&caller, &req.internship_id, req.updates)
                    .await?,
            )
        }
        "deleteInternship" => {
            let target: InternshipRef = parse(data)?;
            CallableResponse::ok(recruiters.delete_internship(&caller, &target.internship_id).await?)
        }
        "publishInternship" => {
            let target: InternshipRef = parse(data)?;
            CallableResponse::ok(recruiters.publish_internship(&caller, &target.internship_id).await?)
        }
        "closeInternship" => {
            let target: InternshipRef = parse(data)?;
            CallableResponse::ok(recruiters.close_internship(&caller, &target.internship_id).await?)
        }
        "getApplications" => {
            let query: ApplicationsQuery = parse(data)?;
            CallableResponse::ok(recruiters.get_applications(&caller, query).await?)
        }
        "updateApplicationStatus" => {
            let target: ApplicationRef = parse(data.clone())?;
            recruiters.verify_recruiter_role(&caller.uid).await?;
            recruiters
                .verify_application_ownership(&caller.uid, &target.application_id)
                .await?;
            let req: ApplicationStatusUpdate = parse(data)?;
            CallableResponse::ok(
                recruiters
                    .update_application_status(&caller, &req.application_id, req.update)
                    .await?,
            )
        }
        "bulkUpdateApplicationStatus" => {
            let dto: BulkUpdateApplicationStatusDto = parse(data)?;
            CallableResponse::ok(recruiters.bulk_update_application_status(&caller, dto).await?)
        }
        "getRecruiterAnalytics" => CallableResponse::ok(recruiters.analytics(&caller).await?),
        "exportUserData" => CallableResponse::ok(accounts.export(&caller).await?),
        "deactivateAccount" => CallableResponse::ok(accounts.deactivate(&caller).await?),
        "reactivateAccount" => CallableResponse::ok(accounts.reactivate(&caller).await?),
        "deleteAccount" => CallableResponse::ok(accounts.delete(&caller).await?),
        _ => return Err(ApiError::not_found(format!("Unknown function '{}'", name))),
    };
    Ok(response)
}
