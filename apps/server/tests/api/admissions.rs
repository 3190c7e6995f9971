//! Admission request review and approval.

use crate::support::{
    admin, admit_patient, assert_allocation_consistent, assert_error_code, assert_status,
    bed_status, doctor, id_of, seed_ward, submit_request, with_test_app,
};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

fn ids(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn approval_creates_stay_and_occupies_bed() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Internal Medicine", 2).await?;
            let doctor = doctor();
            let patient_id = Uuid::new_v4();
            let request_id = submit_request(app, &doctor, patient_id, "normal").await?;

            let (status, request) = app
                .json(
                    Method::GET,
                    &format!("/api/v1/admissions/{request_id}"),
                    None,
                    &doctor,
                )
                .await?;
            assert_status(status, StatusCode::OK, "get request");
            assert_eq!(request["status"], "pending");
            assert_eq!(request["doctor_id"], doctor.id.to_string());

            let admin = admin();
            let (status, approval) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/approve"),
                    Some(ward.placement(0)),
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::OK, "approve");
            assert_eq!(approval["request"]["status"], "approved");
            assert_eq!(approval["request"]["decided_by"], admin.id.to_string());

            let stay = &approval["stay"];
            assert_eq!(stay["status"], "admitted");
            assert_eq!(stay["patient_id"], patient_id.to_string());
            assert_eq!(stay["bed_id"], ward.bed_ids[0].to_string());
            assert_eq!(stay["admission_request_id"], request_id.to_string());
            assert_eq!(approval["request"]["stay_id"], stay["id"]);

            assert_eq!(bed_status(app, ward.bed_ids[0]).await?, "occupied");
            assert_eq!(bed_status(app, ward.bed_ids[1]).await?, "available");
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn occupied_bed_cannot_be_approved_twice() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Internal Medicine", 1).await?;
            admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;

            let second = submit_request(app, &doctor(), Uuid::new_v4(), "emergency").await?;
            let (status, body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{second}/approve"),
                    Some(ward.placement(0)),
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "approve onto occupied bed");
            assert_error_code(&body, "INVALID_STATE")?;

            // The losing request stays pending and nothing else changed.
            let (status, request) = app
                .json(
                    Method::GET,
                    &format!("/api/v1/admissions/{second}"),
                    None,
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::OK, "get request");
            assert_eq!(request["status"], "pending");
            assert!(request["stay_id"].is_null());
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn housekeeping_beds_are_not_available() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Maternity", 1).await?;
            let admin = admin();
            let (status, _bed) = app
                .json(
                    Method::PATCH,
                    &format!("/api/v1/rooms/{}/beds/{}", ward.room_id, ward.bed_ids[0]),
                    Some(json!({ "status": "maintenance" })),
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::OK, "set maintenance");

            let request_id = submit_request(app, &doctor(), Uuid::new_v4(), "normal").await?;
            let (status, body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/approve"),
                    Some(ward.placement(0)),
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "approve onto maintenance bed");
            assert_error_code(&body, "INVALID_STATE")?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn placement_must_match_bed_location() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let first = seed_ward(app, "North", 1).await?;
            let second = seed_ward(app, "South", 1).await?;
            let request_id = submit_request(app, &doctor(), Uuid::new_v4(), "normal").await?;

            let mismatched = json!({
                "ward_id": second.ward_id,
                "room_id": first.room_id,
                "bed_id": first.bed_ids[0],
            });
            let (status, body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/approve"),
                    Some(mismatched),
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "mismatched placement");
            assert_error_code(&body, "VALIDATION_ERROR")?;

            let unknown_bed = json!({
                "ward_id": first.ward_id,
                "room_id": first.room_id,
                "bed_id": Uuid::new_v4(),
            });
            let (status, body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/approve"),
                    Some(unknown_bed),
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "unknown bed");
            assert_error_code(&body, "NOT_FOUND")?;

            assert_eq!(bed_status(app, first.bed_ids[0]).await?, "available");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn patient_cannot_hold_two_stays() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Neurology", 2).await?;
            let patient_id = Uuid::new_v4();
            admit_patient(app, patient_id, ward.placement(0)).await?;

            let again = submit_request(app, &doctor(), patient_id, "normal").await?;
            let (status, body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{again}/approve"),
                    Some(ward.placement(1)),
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "second stay for patient");
            assert_error_code(&body, "INVALID_STATE")?;
            assert_eq!(bed_status(app, ward.bed_ids[1]).await?, "available");

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn decided_requests_are_no_longer_pending() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Geriatrics", 1).await?;
            let request_id = submit_request(app, &doctor(), Uuid::new_v4(), "normal").await?;
            let admin = admin();

            let (status, rejected) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/reject"),
                    Some(json!({ "reason": "Outpatient follow-up is sufficient" })),
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::OK, "reject");
            assert_eq!(rejected["status"], "rejected");
            assert_eq!(
                rejected["rejection_reason"],
                "Outpatient follow-up is sufficient"
            );

            let (status, body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/approve"),
                    Some(ward.placement(0)),
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "approve rejected request");
            assert_error_code(&body, "NOT_FOUND")?;

            let (status, _body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/reject"),
                    Some(json!({ "reason": "again" })),
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "reject twice");

            assert_eq!(bed_status(app, ward.bed_ids[0]).await?, "available");
            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn triage_queue_puts_emergencies_first() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let doctor = doctor();
            let mut submitted = Vec::new();
            for urgency in ["normal", "emergency", "normal", "emergency"] {
                submitted.push(submit_request(app, &doctor, Uuid::new_v4(), urgency).await?);
                // Distinct submission times keep the expected order deterministic.
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
            let [normal_old, emergency, normal_new, decided] = submitted[..] else {
                unreachable!("four requests were submitted");
            };

            let (status, _body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{decided}/reject"),
                    Some(json!({ "reason": "Duplicate" })),
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::OK, "reject");

            let (status, queue) = app
                .json(Method::GET, "/api/v1/admissions", None, &admin())
                .await?;
            assert_status(status, StatusCode::OK, "list pending");
            assert_eq!(
                ids(&queue),
                vec![
                    emergency.to_string(),
                    normal_old.to_string(),
                    normal_new.to_string()
                ]
            );

            // Reading the queue does not change it.
            let (_status, again) = app
                .json(Method::GET, "/api/v1/admissions", None, &admin())
                .await?;
            assert_eq!(ids(&again), ids(&queue));

            let (status, everything) = app
                .json(Method::GET, "/api/v1/admissions?all=true", None, &admin())
                .await?;
            assert_status(status, StatusCode::OK, "list all");
            assert_eq!(ids(&everything).len(), 4);

            let (status, rejected) = app
                .json(
                    Method::GET,
                    "/api/v1/admissions?status=rejected",
                    None,
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::OK, "list rejected");
            assert_eq!(ids(&rejected), vec![decided.to_string()]);

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn roles_are_enforced() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Dermatology", 1).await?;

            let (status, body) = app
                .json(
                    Method::POST,
                    "/api/v1/admissions",
                    Some(json!({
                        "patient_id": Uuid::new_v4(),
                        "diagnosis": "Cellulitis",
                    })),
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::FORBIDDEN, "admin submits");
            assert_error_code(&body, "FORBIDDEN")?;

            let request_id = submit_request(app, &doctor(), Uuid::new_v4(), "normal").await?;
            let (status, body) = app
                .json(
                    Method::POST,
                    &format!("/api/v1/admissions/{request_id}/approve"),
                    Some(ward.placement(0)),
                    &doctor(),
                )
                .await?;
            assert_status(status, StatusCode::FORBIDDEN, "doctor approves");
            assert_error_code(&body, "FORBIDDEN")?;

            let (status, _headers, bytes) = app
                .request(
                    Method::POST,
                    "/api/v1/admissions",
                    Some(json!({ "patient_id": Uuid::new_v4(), "diagnosis": "Asthma" })),
                    None,
                )
                .await?;
            assert_status(status, StatusCode::UNAUTHORIZED, "anonymous submit");
            let body: Value = serde_json::from_slice(&bytes)?;
            assert_error_code(&body, "UNAUTHENTICATED")?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn submission_requires_a_diagnosis() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, body) = app
                .json(
                    Method::POST,
                    "/api/v1/admissions",
                    Some(json!({ "patient_id": Uuid::new_v4(), "diagnosis": "" })),
                    &doctor(),
                )
                .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "empty diagnosis");
            assert_error_code(&body, "VALIDATION_ERROR")?;

            let (_status, queue) = app
                .json(Method::GET, "/api/v1/admissions", None, &admin())
                .await?;
            assert!(ids(&queue).is_empty());

            // Defaults to normal urgency.
            let (status, request) = app
                .json(
                    Method::POST,
                    "/api/v1/admissions",
                    Some(json!({ "patient_id": Uuid::new_v4(), "diagnosis": "Asthma" })),
                    &doctor(),
                )
                .await?;
            assert_status(status, StatusCode::CREATED, "submit");
            assert_eq!(request["urgency"], "normal");
            id_of(&request)?;

            Ok(())
        })
    })
    .await
}
