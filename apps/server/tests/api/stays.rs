//! Stay lifecycle: care, transfer and discharge.

use crate::support::{
    admin, admit_patient, assert_allocation_consistent, assert_error_code, assert_status,
    bed_status, doctor, seed_ward, with_test_app, TestApp,
};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;
use wardflow::auth::Actor;

async fn stay_action(
    app: &TestApp,
    stay_id: Uuid,
    action: &str,
    body: Option<Value>,
    actor: &Actor,
) -> anyhow::Result<(StatusCode, Value)> {
    app.json(
        Method::POST,
        &format!("/api/v1/stays/{stay_id}/{action}"),
        body,
        actor,
    )
    .await
}

#[tokio::test]
async fn full_stay_with_transfer_and_discharge() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Pulmonology", 2).await?;
            let icu = seed_ward(app, "ICU", 1).await?;
            let doctor = doctor();
            let admin = admin();
            let stay_id = admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;

            let (status, stay) = stay_action(app, stay_id, "begin-care", None, &doctor).await?;
            assert_status(status, StatusCode::OK, "begin care");
            assert_eq!(stay["status"], "under_care");

            let (status, stay) = stay_action(
                app,
                stay_id,
                "transfer",
                Some(json!({
                    "reason": "Needs ventilation support",
                    "suggested_ward_id": icu.ward_id,
                })),
                &doctor,
            )
            .await?;
            assert_status(status, StatusCode::OK, "request transfer");
            assert_eq!(stay["status"], "transfer_requested");
            assert_eq!(stay["transfer_reason"], "Needs ventilation support");
            assert_eq!(stay["transfer_suggested_ward_id"], icu.ward_id.to_string());

            // Requesting a transfer does not touch beds.
            assert_eq!(bed_status(app, ward.bed_ids[0]).await?, "occupied");
            assert_eq!(bed_status(app, icu.bed_ids[0]).await?, "available");

            let (status, stay) = stay_action(
                app,
                stay_id,
                "transfer/complete",
                Some(icu.placement(0)),
                &admin,
            )
            .await?;
            assert_status(status, StatusCode::OK, "complete transfer");
            assert_eq!(stay["status"], "under_care");
            assert_eq!(stay["ward_id"], icu.ward_id.to_string());
            assert_eq!(stay["bed_id"], icu.bed_ids[0].to_string());
            assert!(stay["transfer_reason"].is_null());

            assert_eq!(bed_status(app, ward.bed_ids[0]).await?, "available");
            assert_eq!(bed_status(app, icu.bed_ids[0]).await?, "occupied");
            assert_allocation_consistent(&app.state).await?;

            let (status, stay) = stay_action(
                app,
                stay_id,
                "discharge",
                Some(json!({ "discharge_summary": "Recovered, oral antibiotics" })),
                &doctor,
            )
            .await?;
            assert_status(status, StatusCode::OK, "request discharge");
            assert_eq!(stay["status"], "discharge_requested");
            assert_eq!(bed_status(app, icu.bed_ids[0]).await?, "occupied");

            let (status, stay) =
                stay_action(app, stay_id, "discharge/approve", None, &admin).await?;
            assert_status(status, StatusCode::OK, "approve discharge");
            assert_eq!(stay["status"], "discharged");
            assert_eq!(stay["discharged_by"], admin.id.to_string());
            assert!(stay["discharged_at"].is_string());

            assert_eq!(bed_status(app, icu.bed_ids[0]).await?, "available");
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn transitions_outside_the_lifecycle_are_invalid() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Cardiology", 2).await?;
            let doctor = doctor();
            let admin = admin();
            let stay_id = admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;

            // No direct discharge without a request.
            let (status, body) =
                stay_action(app, stay_id, "discharge/approve", None, &admin).await?;
            assert_status(status, StatusCode::CONFLICT, "approve without request");
            assert_error_code(&body, "INVALID_STATE")?;

            // No transfer completion without a pending transfer.
            let (status, body) = stay_action(
                app,
                stay_id,
                "transfer/complete",
                Some(ward.placement(1)),
                &admin,
            )
            .await?;
            assert_status(status, StatusCode::CONFLICT, "complete without request");
            assert_error_code(&body, "INVALID_STATE")?;
            assert_eq!(bed_status(app, ward.bed_ids[1]).await?, "available");

            let (status, _stay) = stay_action(app, stay_id, "begin-care", None, &doctor).await?;
            assert_status(status, StatusCode::OK, "begin care");
            let (status, body) = stay_action(app, stay_id, "begin-care", None, &doctor).await?;
            assert_status(status, StatusCode::CONFLICT, "begin care twice");
            assert_error_code(&body, "INVALID_STATE")?;

            let (status, _stay) = stay_action(
                app,
                stay_id,
                "discharge",
                Some(json!({ "discharge_summary": "Stable" })),
                &doctor,
            )
            .await?;
            assert_status(status, StatusCode::OK, "request discharge");
            let (status, _stay) =
                stay_action(app, stay_id, "discharge/approve", None, &admin).await?;
            assert_status(status, StatusCode::OK, "approve discharge");

            // Discharged is terminal.
            for (action, body) in [
                ("begin-care", None),
                ("transfer", Some(json!({ "reason": "late" }))),
                ("discharge", Some(json!({ "discharge_summary": "again" }))),
            ] {
                let (status, body) = stay_action(app, stay_id, action, body, &doctor).await?;
                assert_status(status, StatusCode::CONFLICT, action);
                assert_error_code(&body, "INVALID_STATE")?;
            }
            let (status, body) = app
                .json(
                    Method::PUT,
                    &format!("/api/v1/stays/{stay_id}/treatment-plan"),
                    Some(json!({ "treatment_plan": "n/a" })),
                    &doctor,
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "plan after discharge");
            assert_error_code(&body, "INVALID_STATE")?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn cancelled_transfer_keeps_the_bed() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Orthopedics", 2).await?;
            let stay_id = admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;

            let (status, _stay) = stay_action(
                app,
                stay_id,
                "transfer",
                Some(json!({ "reason": "Closer to physiotherapy" })),
                &doctor(),
            )
            .await?;
            assert_status(status, StatusCode::OK, "request transfer");

            let (status, stay) = stay_action(
                app,
                stay_id,
                "transfer/cancel",
                Some(json!({ "reason": "Physiotherapy comes to the ward" })),
                &admin(),
            )
            .await?;
            assert_status(status, StatusCode::OK, "cancel transfer");
            assert_eq!(stay["status"], "under_care");
            assert_eq!(stay["bed_id"], ward.bed_ids[0].to_string());
            assert!(stay["transfer_reason"].is_null());

            assert_eq!(bed_status(app, ward.bed_ids[0]).await?, "occupied");
            assert_eq!(bed_status(app, ward.bed_ids[1]).await?, "available");

            let (status, body) =
                stay_action(app, stay_id, "transfer/cancel", Some(json!({})), &admin()).await?;
            assert_status(status, StatusCode::CONFLICT, "cancel twice");
            assert_error_code(&body, "INVALID_STATE")?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn transfer_onto_unavailable_bed_changes_nothing() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Nephrology", 2).await?;
            let moving = admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;
            admit_patient(app, Uuid::new_v4(), ward.placement(1)).await?;

            let (status, _stay) = stay_action(
                app,
                moving,
                "transfer",
                Some(json!({ "reason": "Window bed" })),
                &doctor(),
            )
            .await?;
            assert_status(status, StatusCode::OK, "request transfer");

            let (status, body) = stay_action(
                app,
                moving,
                "transfer/complete",
                Some(ward.placement(1)),
                &admin(),
            )
            .await?;
            assert_status(status, StatusCode::CONFLICT, "transfer onto occupied bed");
            assert_error_code(&body, "INVALID_STATE")?;

            let (status, body) = stay_action(
                app,
                moving,
                "transfer/complete",
                Some(ward.placement(0)),
                &admin(),
            )
            .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "transfer onto own bed");
            assert_error_code(&body, "VALIDATION_ERROR")?;

            let (status, stay) = app
                .json(
                    Method::GET,
                    &format!("/api/v1/stays/{moving}"),
                    None,
                    &doctor(),
                )
                .await?;
            assert_status(status, StatusCode::OK, "get stay");
            assert_eq!(stay["status"], "transfer_requested");
            assert_eq!(stay["bed_id"], ward.bed_ids[0].to_string());
            assert_allocation_consistent(&app.state).await?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn transfer_request_validates_input() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Urology", 1).await?;
            let stay_id = admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;

            let (status, body) = stay_action(
                app,
                stay_id,
                "transfer",
                Some(json!({ "reason": " " })),
                &doctor(),
            )
            .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "blank reason");
            assert_error_code(&body, "VALIDATION_ERROR")?;

            let (status, body) = stay_action(
                app,
                stay_id,
                "transfer",
                Some(json!({ "reason": "ICU", "suggested_ward_id": Uuid::new_v4() })),
                &doctor(),
            )
            .await?;
            assert_status(status, StatusCode::BAD_REQUEST, "unknown suggested ward");
            assert_error_code(&body, "VALIDATION_ERROR")?;

            let (status, body) = stay_action(
                app,
                stay_id,
                "transfer",
                Some(json!({ "reason": "ICU" })),
                &admin(),
            )
            .await?;
            assert_status(status, StatusCode::FORBIDDEN, "admin requests transfer");
            assert_error_code(&body, "FORBIDDEN")?;

            let (status, body) = stay_action(
                app,
                Uuid::new_v4(),
                "transfer",
                Some(json!({ "reason": "ICU" })),
                &doctor(),
            )
            .await?;
            assert_status(status, StatusCode::NOT_FOUND, "unknown stay");
            assert_error_code(&body, "NOT_FOUND")?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn treatment_plan_and_stay_listing() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Hematology", 2).await?;
            let patient_id = Uuid::new_v4();
            let stay_id = admit_patient(app, patient_id, ward.placement(0)).await?;
            admit_patient(app, Uuid::new_v4(), ward.placement(1)).await?;

            let (status, stay) = app
                .json(
                    Method::PUT,
                    &format!("/api/v1/stays/{stay_id}/treatment-plan"),
                    Some(json!({ "treatment_plan": "IV iron, recheck Hb in 48h" })),
                    &doctor(),
                )
                .await?;
            assert_status(status, StatusCode::OK, "update plan");
            assert_eq!(stay["treatment_plan"], "IV iron, recheck Hb in 48h");
            assert_eq!(stay["status"], "admitted");

            let (status, stays) = app
                .json(
                    Method::GET,
                    &format!("/api/v1/stays?patient_id={patient_id}"),
                    None,
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::OK, "list by patient");
            assert_eq!(stays.as_array().map(Vec::len), Some(1));
            assert_eq!(stays[0]["id"], stay_id.to_string());

            let (status, stays) = app
                .json(
                    Method::GET,
                    &format!("/api/v1/stays?ward_id={}&active=true", ward.ward_id),
                    None,
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::OK, "list by ward");
            assert_eq!(stays.as_array().map(Vec::len), Some(2));

            Ok(())
        })
    })
    .await
}
