mod common;

use chrono::{Duration, Utc};
use common::{TestApp, json};
use internhub_server::db::Store;
use internhub_server::models::{AccountStatus, InternshipStatus, Profile, RecruiterStatus};
use rocket::http::Status;

async fn deactivated_profile(app: &TestApp, uid: &str, days_ago: i64) {
    let mut profile = Profile::new(uid, None);
    profile.account_status = AccountStatus::Deactivated;
    profile.deactivated_at = Some(Utc::now() - Duration::days(days_ago));
    app.store.save_profile(&profile).await.unwrap();
}

#[rocket::async_test]
async fn deactivate_then_reactivate() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;

    let response = app
        .client
        .post("/api/v1/account/deactivate")
        .header(app.bearer("R1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let recruiter = app.store.get_recruiter("R1").await.unwrap().unwrap();
    assert_eq!(recruiter.status, RecruiterStatus::Deactivated);

    let response = app
        .client
        .post("/api/v1/account/reactivate")
        .header(app.bearer("R1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(json(response).await["data"]["status"], "active");

    let recruiter = app.store.get_recruiter("R1").await.unwrap().unwrap();
    assert_eq!(recruiter.status, RecruiterStatus::Active);
    let profile = app.store.get_profile("R1").await.unwrap().unwrap();
    assert_eq!(profile.account_status, AccountStatus::Active);
    assert!(profile.deactivated_at.is_none());
}

#[rocket::async_test]
async fn suspension_survives_deactivate_and_reactivate() {
    let app = TestApp::new().await;
    let mut suspended = common::recruiter("R1", true);
    suspended.status = RecruiterStatus::Suspended;
    app.store.create_recruiter(&suspended).await.unwrap();

    for path in ["/api/v1/account/deactivate", "/api/v1/account/reactivate"] {
        let response = app.client.post(path).header(app.bearer("R1")).dispatch().await;
        assert_eq!(response.status(), Status::Ok, "{}", path);
        let recruiter = app.store.get_recruiter("R1").await.unwrap().unwrap();
        assert_eq!(recruiter.status, RecruiterStatus::Suspended, "{}", path);
    }

    let response = app
        .client
        .get("/api/v1/recruiter/status")
        .header(app.bearer("R1"))
        .dispatch()
        .await;
    assert_eq!(json(response).await["data"]["canPost"], false);
}

#[rocket::async_test]
async fn deactivating_an_unknown_account_is_not_found() {
    let app = TestApp::new().await;
    let response = app
        .client
        .post("/api/v1/account/deactivate")
        .header(app.bearer("ghost"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn reactivation_window_is_enforced() {
    let app = TestApp::new().await;
    deactivated_profile(&app, "recent", 29).await;
    deactivated_profile(&app, "stale", 31).await;

    let response = app
        .client
        .post("/api/v1/account/reactivate")
        .header(app.bearer("recent"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = app
        .client
        .post("/api/v1/account/reactivate")
        .header(app.bearer("stale"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
    assert_eq!(json(response).await["code"], "permission-denied");

    // "recent" is active again
    let response = app
        .client
        .post("/api/v1/account/reactivate")
        .header(app.bearer("recent"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::PreconditionFailed);
}

#[rocket::async_test]
async fn deactivated_students_cannot_apply() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    deactivated_profile(&app, "S1", 1).await;

    let response = app
        .client
        .post("/api/v1/internships/I1/apply")
        .header(app.bearer("S1"))
        .header(rocket::http::ContentType::JSON)
        .body("{}")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::PreconditionFailed);
}

#[rocket::async_test]
async fn export_collects_everything_about_the_caller() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_recruiter("R2", true).await;
    app.seed_internship("I2", "R2", InternshipStatus::Published).await;
    app.seed_application("A1", "I1", "R1", "S1").await;
    app.seed_application("A2", "I2", "R2", "R1").await;

    let response = app
        .client
        .get("/api/v1/account/export")
        .header(app.bearer("R1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let export = json(response).await["data"].clone();
    assert_eq!(export["uid"], "R1");
    assert!(export["exportedAt"].is_string());
    assert_eq!(export["recruiter"]["uid"], "R1");
    assert_eq!(export["internships"].as_array().unwrap().len(), 1);
    assert_eq!(export["applications"][0]["id"], "A2");
    assert_eq!(export["receivedApplications"][0]["id"], "A1");
}

#[rocket::async_test]
async fn permanent_delete_removes_owned_data() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_recruiter("R2", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_internship("I2", "R2", InternshipStatus::Published).await;
    app.seed_application("A1", "I1", "R1", "S1").await;
    app.seed_application("A2", "I2", "R2", "R1").await;
    app.seed_application("A3", "I2", "R2", "S1").await;

    let response = app
        .client
        .delete("/api/v1/account")
        .header(app.bearer("R1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let report = json(response).await["data"].clone();
    assert_eq!(report["internshipsDeleted"], 1);
    assert_eq!(report["applicationsDeleted"], 2);
    assert_eq!(report["recruiterDeleted"], true);

    assert!(app.store.get_recruiter("R1").await.unwrap().is_none());
    assert!(app.store.get_internship("I1").await.unwrap().is_none());
    assert!(app.store.get_application("A1").await.unwrap().is_none());
    assert!(app.store.get_application("A2").await.unwrap().is_none());
    assert!(app.store.get_application("A3").await.unwrap().is_some());
    let other = app.store.get_internship("I2").await.unwrap().unwrap();
    assert_eq!(other.applications, 1);
}

#[rocket::async_test]
async fn deleting_a_student_releases_their_application_slots() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;

    let response = app
        .client
        .post("/api/v1/internships/I1/apply")
        .header(app.bearer("S1"))
        .header(rocket::http::ContentType::JSON)
        .body("{}")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(app.store.get_internship("I1").await.unwrap().unwrap().applications, 1);

    let response = app
        .client
        .delete("/api/v1/account")
        .header(app.bearer("S1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(json(response).await["data"]["applicationsDeleted"], 1);
    assert_eq!(app.store.get_internship("I1").await.unwrap().unwrap().applications, 0);
}
