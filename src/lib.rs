#[macro_use]
extern crate rocket;

pub mod config;
pub mod db;
pub mod guards;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use state::AppState;

use rocket::fairing::{AdHoc, Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::{Value, json};
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

use crate::config::{Config, Settings};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() -> Status {
    Status::NoContent
}

/* ----------------------------- ERRORS ----------------------------- */

fn error_body(code: &str, message: &str) -> Value {
    json!({
        "success": false,
        "message": message,
        "code": code,
    })
}

#[catch(400)]
fn bad_request() -> Value {
    error_body("invalid-argument", "Malformed request")
}

#[catch(401)]
fn unauthorized() -> Value {
    error_body("unauthenticated", "A valid bearer ID token is required")
}

#[catch(403)]
fn forbidden() -> Value {
    error_body("permission-denied", "You do not have access to this resource")
}

#[catch(404)]
fn not_found() -> Value {
    error_body("not-found", "Resource not found (check /api/v1 prefix)")
}

#[catch(422)]
fn unprocessable() -> Value {
    error_body("invalid-argument", "Request body could not be parsed")
}

#[catch(500)]
fn internal_error() -> Value {
    error_body("internal", "Internal server error")
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/v1/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- ASSEMBLY ----------------------------- */

fn mount(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(CORS)
        .mount("/", routes![options_handler, routes::callable::call])
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Recruiter
                routes::recruiter::initialize_profile,
                routes::recruiter::get_status,
                routes::recruiter::list_internships,
                routes::recruiter::create_internship,
                routes::recruiter::update_internship,
                routes::recruiter::delete_internship,
                routes::recruiter::publish_internship,
                routes::recruiter::close_internship,
                routes::recruiter::rank_candidates,
                routes::recruiter::get_applications,
                routes::recruiter::update_application_status,
                routes::recruiter::bulk_update_application_status,
                routes::recruiter::analytics,
                // Internships
                routes::internship::browse,
                routes::internship::recommended,
                routes::internship::get_internship,
                routes::internship::track_view,
                routes::internship::apply,
                // Applications
                routes::application::my_applications,
                routes::application::withdraw,
                // Profile
                routes::profile::get_profile,
                routes::profile::update_profile,
                // Account
                routes::account::export_data,
                routes::account::deactivate,
                routes::account::reactivate,
                routes::account::delete_account,
                // Notifications
                routes::notification::list_notifications,
                routes::notification::mark_read,
                // Onboarding
                routes::onboarding::username_availability,
                routes::onboarding::claim_username,
                routes::onboarding::submit_verification,
                routes::onboarding::my_verification_requests,
                routes::onboarding::referral_code,
                routes::onboarding::redeem_referral,
                // Admin
                routes::admin::pending_verifications,
                routes::admin::review_verification,
                // Open Graph
                routes::og::internship_meta,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error
            ],
        )
}

/// Application with an already-built state. Used by tests and embedders.
pub fn build(state: AppState) -> Rocket<Build> {
    mount(rocket::build()).manage(state)
}

/// Application configured from `Rocket.toml` and `ROCKET_*` env vars; the
/// store connection is made at ignition.
pub fn rocket() -> Rocket<Build> {
    mount(rocket::custom(Config::figment())).attach(AdHoc::try_on_ignite(
        "Application State",
        |rocket| async {
            let settings = match Settings::from_figment(rocket.figment()) {
                Ok(settings) => settings,
                Err(e) => {
                    error!("{}", e);
                    return Err(rocket);
                }
            };
            match AppState::from_settings(settings).await {
                Ok(state) => {
                    if Config::is_development() {
                        info!("📚 Swagger UI → /api/docs");
                    }
                    Ok(rocket.manage(state))
                }
                Err(e) => {
                    error!("Failed to initialize store: {}", e);
                    Err(rocket)
                }
            }
        },
    ))
}
