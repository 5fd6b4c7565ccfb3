mod common;

use common::{TestApp, json};
use internhub_server::db::Store;
use internhub_server::models::{ApplicationStatus, InternshipStatus};
use rocket::http::{ContentType, Status};
use serde_json::json;

#[rocket::async_test]
async fn requests_without_a_valid_token_are_rejected() {
    let app = TestApp::new().await;

    let response = app.client.get("/api/v1/recruiter/status").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    assert_eq!(json(response).await["code"], "unauthenticated");

    let response = app
        .client
        .get("/api/v1/profile")
        .header(rocket::http::Header::new("Authorization", "Bearer not-a-jwt"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = app
        .client
        .get("/api/v1/profile")
        .header(rocket::http::Header::new("x-user-id", "S1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn apply_once_to_published_postings() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_internship("I2", "R1", InternshipStatus::Draft).await;

    let body = json!({ "coverLetter": "I like Rust" }).to_string();
    let response = app
        .client
        .post("/api/v1/internships/I1/apply")
        .header(app.bearer("S1"))
        .header(ContentType::JSON)
        .body(&body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let application = json(response).await["data"].clone();
    assert_eq!(application["status"], "applied");
    assert_eq!(application["recruiterId"], "R1");

    let response = app
        .client
        .post("/api/v1/internships/I1/apply")
        .header(app.bearer("S1"))
        .header(ContentType::JSON)
        .body(&body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    assert_eq!(json(response).await["code"], "already-exists");

    let response = app
        .client
        .post("/api/v1/internships/I2/apply")
        .header(app.bearer("S1"))
        .header(ContentType::JSON)
        .body("{}")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::PreconditionFailed);

    let response = app
        .client
        .post("/api/v1/internships/I1/apply")
        .header(app.bearer("R1"))
        .header(ContentType::JSON)
        .body("{}")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let internship = app.store.get_internship("I1").await.unwrap().unwrap();
    assert_eq!(internship.applications, 1);
}

#[rocket::async_test]
async fn drafts_are_hidden_from_everyone_but_the_owner() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_internship("I2", "R1", InternshipStatus::Draft).await;

    let response = app.client.get("/api/v1/internships").dispatch().await;
    let page = json(response).await["data"].clone();
    assert_eq!(page["total"], 1);
    assert_eq!(page["internships"][0]["id"], "I1");

    let response = app.client.get("/api/v1/internships/I2").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    let response = app
        .client
        .get("/api/v1/internships/I2")
        .header(app.bearer("R1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}

#[rocket::async_test]
async fn browse_filters_by_location_and_mode() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;

    let response = app
        .client
        .get("/api/v1/internships?location=pun&work_mode=hybrid")
        .dispatch()
        .await;
    assert_eq!(json(response).await["data"]["total"], 1);

    let response = app.client.get("/api/v1/internships?location=Delhi").dispatch().await;
    assert_eq!(json(response).await["data"]["total"], 0);

    let response = app.client.get("/api/v1/internships?work_mode=space").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn paging_past_the_end_is_empty() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;

    let response = app
        .client
        .get("/api/v1/internships?page=9223372036854775807&limit=100")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let page = json(response).await["data"].clone();
    assert_eq!(page["total"], 1);
    assert!(page["internships"].as_array().unwrap().is_empty());
}

#[rocket::async_test]
async fn responses_carry_cors_headers() {
    let app = TestApp::new().await;

    let response = app
        .client
        .options("/api/v1/recruiter/internships")
        .header(rocket::http::Header::new("Origin", "https://app.internhub.in"))
        .header(rocket::http::Header::new("Access-Control-Request-Method", "POST"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);
    let headers = response.headers();
    assert_eq!(
        headers.get_one("Access-Control-Allow-Origin"),
        Some("https://app.internhub.in")
    );
    assert!(headers.get_one("Access-Control-Allow-Methods").unwrap().contains("POST"));
    assert!(
        headers
            .get_one("Access-Control-Allow-Headers")
            .unwrap()
            .contains("Authorization")
    );

    let response = app
        .client
        .get("/api/v1/internships")
        .header(rocket::http::Header::new("Origin", "https://app.internhub.in"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("https://app.internhub.in")
    );
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Credentials"),
        Some("true")
    );
}

#[rocket::async_test]
async fn view_tracking_needs_no_auth() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_internship("I2", "R1", InternshipStatus::Draft).await;

    let response = app.client.post("/api/v1/internships/I1/view").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(json(response).await["data"]["views"], 1);

    // the count reflects views recorded elsewhere in between
    app.store.increment_internship_views("I1").await.unwrap();
    let response = app.client.post("/api/v1/internships/I1/view").dispatch().await;
    assert_eq!(json(response).await["data"]["views"], 3);

    let response = app.client.post("/api/v1/internships/I2/view").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn withdraw_until_decided() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_application("A1", "I1", "R1", "S1").await;
    app.seed_application("A2", "I1", "R1", "S2").await;

    let response = app
        .client
        .post("/api/v1/applications/A1/withdraw")
        .header(app.bearer("S2"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = app
        .client
        .post("/api/v1/applications/A1/withdraw")
        .header(app.bearer("S1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let withdrawn = app.store.get_application("A1").await.unwrap().unwrap();
    assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);

    let response = app
        .client
        .post("/api/v1/applications/A1/withdraw")
        .header(app.bearer("S1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::PreconditionFailed);
}

#[rocket::async_test]
async fn decided_applications_cannot_be_withdrawn() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_application("A1", "I1", "R1", "S1").await;

    let response = app
        .client
        .put("/api/v1/recruiter/applications/A1/status")
        .header(app.bearer("R1"))
        .header(ContentType::JSON)
        .body(json!({ "status": "accepted" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = app
        .client
        .post("/api/v1/applications/A1/withdraw")
        .header(app.bearer("S1"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::PreconditionFailed);
    let accepted = app.store.get_application("A1").await.unwrap().unwrap();
    assert_eq!(accepted.status, ApplicationStatus::Accepted);
}

#[rocket::async_test]
async fn recommendations_rank_by_match_score() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    let mut other = common::internship("I2", "R1", InternshipStatus::Published);
    other.skills = vec!["Kotlin".to_string()];
    other.sector = Some("Finance".to_string());
    app.store.create_internship(&other).await.unwrap();

    let body = json!({ "skills": ["rust"], "sectors": ["Technology"] }).to_string();
    let response = app
        .client
        .put("/api/v1/profile")
        .header(app.bearer("S1"))
        .header(ContentType::JSON)
        .body(body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = app
        .client
        .get("/api/v1/internships/recommended")
        .header(app.bearer("S1"))
        .dispatch()
        .await;
    let scored = json(response).await["data"].clone();
    let scored = scored.as_array().unwrap();
    assert_eq!(scored.len(), 2);
    assert_eq!(scored[0]["internship"]["id"], "I1");
    let top = scored[0]["score"].as_u64().unwrap();
    let bottom = scored[1]["score"].as_u64().unwrap();
    assert!(top > bottom);
    assert!((1..=100).contains(&bottom));
}

#[rocket::async_test]
async fn open_graph_falls_back_to_placeholders() {
    let app = TestApp::new().await;
    let mut bare = common::internship("I1", "R1", InternshipStatus::Published);
    bare.title = "  ".to_string();
    bare.company = String::new();
    bare.stipend = None;
    bare.sector = None;
    bare.description = "x".repeat(250);
    app.store.create_internship(&bare).await.unwrap();

    let response = app.client.get("/api/v1/og/internships/I1").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let meta = json(response).await["data"].clone();
    assert_eq!(meta["title"], "Internship Opportunity");
    assert_eq!(meta["company"], "Company");
    assert_eq!(meta["stipend"], "Not disclosed");
    assert_eq!(meta["sector"], "General");
    assert_eq!(meta["logo"], "/static/default-company-logo.png");
    assert_eq!(meta["work_mode"], "hybrid");
    assert_eq!(meta["description"].as_str().unwrap().chars().count(), 203);

    let response = app.client.get("/api/v1/og/internships/nope").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn open_graph_hides_unpublished_postings() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Draft).await;
    app.seed_internship("I2", "R1", InternshipStatus::Closed).await;

    for path in ["/api/v1/og/internships/I1", "/api/v1/og/internships/I2"] {
        let response = app.client.get(path).dispatch().await;
        assert_eq!(response.status(), Status::NotFound, "{}", path);
        assert!(!json(response).await.to_string().contains("Backend Intern"));
    }
}

#[rocket::async_test]
async fn notifications_are_private() {
    let app = TestApp::new().await;
    app.seed_recruiter("R1", true).await;
    app.seed_internship("I1", "R1", InternshipStatus::Published).await;
    app.seed_application("A1", "I1", "R1", "S1").await;

    app.client
        .put("/api/v1/recruiter/applications/A1/status")
        .header(app.bearer("R1"))
        .header(ContentType::JSON)
        .body(json!({ "status": "interview" }).to_string())
        .dispatch()
        .await;

    let response = app
        .client
        .get("/api/v1/notifications")
        .header(app.bearer("S1"))
        .dispatch()
        .await;
    let notifications = json(response).await["data"].clone();
    let id = notifications[0]["id"].as_str().unwrap().to_string();

    let path = format!("/api/v1/notifications/{}/read", id);
    let response = app.client.put(path.as_str()).header(app.bearer("S2")).dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    let response = app.client.put(path.as_str()).header(app.bearer("S1")).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert!(app.store.list_notifications("S1").await.unwrap()[0].read);
}
