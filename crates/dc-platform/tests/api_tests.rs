//! REST API Integration Tests
//!
//! Drives the axum router in-process: identity headers, status codes,
//! error bodies and a full approval round trip.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use dc_common::Role;
use dc_platform::shared::HealthState;
use dc_platform::{api_router, AppState, ClinicPlatform, InMemoryDirectory, Practitioner};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> (Router, HealthState) {
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .register(Practitioner::new("prof-lee", "Dr. Lee", Role::Professor).with_specialty("Orthodontics"))
        .unwrap();
    directory
        .register(Practitioner::new("stu-ana", "Ana Ruiz", Role::Student).with_specialty("Orthodontics"))
        .unwrap();

    let platform = Arc::new(ClinicPlatform::in_memory(directory));
    let health = HealthState::new(Arc::clone(&platform), Some("test".to_string()));
    (api_router(AppState::new(platform), health.clone()), health)
}

fn app() -> Router {
    setup().0
}

fn request(method: &str, uri: &str, actor: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((id, role)) = actor {
        builder = builder.header("x-actor-id", id).header("x-actor-role", role);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

const STUDENT: Option<(&str, &str)> = Some(("stu-ana", "student"));
const PROFESSOR: Option<(&str, &str)> = Some(("prof-lee", "professor"));
const PATIENT: Option<(&str, &str)> = Some(("pat-sam", "patient"));
const ADMIN: Option<(&str, &str)> = Some(("admin", "admin"));

fn approval_body() -> Value {
    json!({
        "patientId": "pat-sam",
        "professorId": "prof-lee",
        "specialty": "Orthodontics",
        "description": "Brackets on upper arch"
    })
}

fn slot_body(start: &str, end: &str) -> Value {
    json!({
        "specialty": "Orthodontics",
        "practitionerId": "stu-ana",
        "slot": { "date": "2026-03-02", "startTime": start, "endTime": end }
    })
}

mod identity_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let app = app();
        let (status, body) = send(&app, request("GET", "/api/appointments", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_unknown_role_is_unauthorized() {
        let app = app();
        let (status, _) = send(
            &app,
            request("GET", "/api/appointments", Some(("x", "janitor")), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

mod approval_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_and_approve() {
        let app = app();

        let (status, created) = send(
            &app,
            request("POST", "/api/approvals", STUDENT, Some(approval_body())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, pending) = send(&app, request("GET", "/api/approvals/pending", PROFESSOR, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let (status, decided) = send(
            &app,
            request(
                "POST",
                &format!("/api/approvals/{}/respond", id),
                PROFESSOR,
                Some(json!({ "decision": "approved", "response": "ok" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decided["status"], "approved");
        assert_eq!(decided["response"], "ok");
        assert!(decided["responseDate"].is_string());

        let (status, count) = send(&app, request("GET", "/api/notifications/unread-count", STUDENT, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(count["count"], 1);
    }

    #[tokio::test]
    async fn test_patient_respond_is_forbidden() {
        let app = app();
        let (_, created) = send(
            &app,
            request("POST", "/api/approvals", STUDENT, Some(approval_body())),
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            request(
                "POST",
                &format!("/api/approvals/{}/respond", id),
                PATIENT,
                Some(json!({ "decision": "approved", "response": "ok" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "FORBIDDEN");
        assert_eq!(body["reason"], "RoleNotPermitted");
    }

    #[tokio::test]
    async fn test_missing_response_is_bad_request() {
        let app = app();
        let (_, created) = send(
            &app,
            request("POST", "/api/approvals", STUDENT, Some(approval_body())),
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            request(
                "POST",
                &format!("/api/approvals/{}/respond", id),
                PROFESSOR,
                Some(json!({ "decision": "rejected" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "MISSING_REQUIRED_FIELD");
    }

    #[tokio::test]
    async fn test_unknown_request_is_not_found() {
        let app = app();
        let (status, body) = send(&app, request("GET", "/api/approvals/0NOPE", ADMIN, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }
}

mod appointment_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_double_booking_conflicts() {
        let app = app();

        let (status, booked) = send(
            &app,
            request("POST", "/api/appointments", PATIENT, Some(slot_body("09:00:00", "10:00:00"))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booked["status"], "pending");
        assert_eq!(booked["startTime"], "09:00");

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/appointments",
                Some(("pat-joe", "patient")),
                Some(slot_body("09:30:00", "10:30:00")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "SLOT_CONFLICT");

        let (status, page) = send(&app, request("GET", "/api/appointments", ADMIN, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 1);
    }

    #[tokio::test]
    async fn test_open_slots() {
        let app = app();
        send(
            &app,
            request("POST", "/api/appointments", PATIENT, Some(slot_body("08:00:00", "09:00:00"))),
        )
        .await;

        let (status, slots) = send(
            &app,
            request(
                "GET",
                "/api/appointments/slots?practitionerId=stu-ana&date=2026-03-02",
                PATIENT,
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(slots.as_array().unwrap().len(), 9);
    }
}

mod schedule_api_tests {
    use super::*;

    fn schedule_body(capacity: u32) -> Value {
        json!({
            "title": "Orthodontics Clinic",
            "scheduleType": "clinic",
            "instructorId": "prof-lee",
            "room": "Clinic 2",
            "dayOfWeek": "tuesday",
            "startTime": "09:00:00",
            "endTime": "12:00:00",
            "capacity": capacity
        })
    }

    #[tokio::test]
    async fn test_only_admin_creates_schedules() {
        let app = app();
        let (status, body) = send(
            &app,
            request("POST", "/api/schedules", PROFESSOR, Some(schedule_body(8))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["reason"], "RoleNotPermitted");
    }

    #[tokio::test]
    async fn test_enrollment_until_full() {
        let app = app();
        let (status, created) = send(
            &app,
            request("POST", "/api/schedules", ADMIN, Some(schedule_body(1))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            request("POST", &format!("/api/schedules/{}/enrollments", id), STUDENT, None),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            &app,
            request(
                "POST",
                &format!("/api/schedules/{}/enrollments", id),
                Some(("stu-ben", "student")),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "CAPACITY_EXCEEDED");

        let (status, availability) = send(
            &app,
            request("GET", &format!("/api/schedules/{}/availability", id), STUDENT, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(availability["enrolled"], 1);
        assert_eq!(availability["isFull"], true);
    }
}

mod booking_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_guided_booking() {
        let app = app();

        let (status, flow) = send(&app, request("POST", "/api/bookings", PATIENT, None)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = flow["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            request(
                "PUT",
                &format!("/api/bookings/{}/specialty", id),
                PATIENT,
                Some(json!({ "specialty": "Orthodontics" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            request(
                "PUT",
                &format!("/api/bookings/{}/practitioner", id),
                PATIENT,
                Some(json!({ "practitionerId": "stu-ana" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, flow) = send(
            &app,
            request(
                "PUT",
                &format!("/api/bookings/{}/slot", id),
                PATIENT,
                Some(json!({ "slot": { "date": "2026-03-02", "startTime": "10:00:00", "endTime": "11:00:00" } })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(flow["step"], "confirming");

        let (status, confirmed) = send(
            &app,
            request("POST", &format!("/api/bookings/{}/confirm", id), PATIENT, None),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(confirmed["flow"]["step"], "finalized");
        assert_eq!(confirmed["appointment"]["practitionerId"], "stu-ana");
    }
}

mod health_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_readiness_follows_flag() {
        let (app, health) = setup();

        let (status, _) = send(&app, request("GET", "/health/live", None, None)).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, request("GET", "/health/ready", None, None)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        health.set_ready();
        let (status, _) = send(&app, request("GET", "/health/ready", None, None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_config_lists_specialties() {
        let app = app();
        let (status, config) = send(&app, request("GET", "/api/config", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(config["features"]["notificationsEnabled"], true);
        assert_eq!(config["specialties"], json!(["Orthodontics"]));
        assert_eq!(config["bookingPolicy"]["slotMinutes"], 60);
    }
}
