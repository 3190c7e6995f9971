//! Removing wards, rooms and beds.

use crate::support::{
    admin, admit_patient, assert_error_code, assert_status, doctor, seed_ward, with_test_app,
    TestApp,
};
use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

async fn discharge(app: &TestApp, stay_id: Uuid) -> anyhow::Result<()> {
    let (status, _stay) = app
        .json(
            Method::POST,
            &format!("/api/v1/stays/{stay_id}/discharge"),
            Some(json!({ "discharge_summary": "Discharged home" })),
            &doctor(),
        )
        .await?;
    assert_status(status, StatusCode::OK, "request discharge");
    let (status, _stay) = app
        .json(
            Method::POST,
            &format!("/api/v1/stays/{stay_id}/discharge/approve"),
            None,
            &admin(),
        )
        .await?;
    assert_status(status, StatusCode::OK, "approve discharge");
    Ok(())
}

#[tokio::test]
async fn occupied_ward_cannot_be_deleted() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Infectious Diseases", 2).await?;
            let stay_id = admit_patient(app, Uuid::new_v4(), ward.placement(1)).await?;
            let admin = admin();

            let (status, body) = app
                .json(
                    Method::DELETE,
                    &format!("/api/v1/wards/{}", ward.ward_id),
                    None,
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "delete occupied ward");
            assert_error_code(&body, "CONFLICT")?;

            // Nothing was removed.
            let (status, beds) = app
                .json(
                    Method::GET,
                    &format!("/api/v1/rooms/{}/beds", ward.room_id),
                    None,
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::OK, "list beds");
            assert_eq!(beds.as_array().map(Vec::len), Some(2));

            discharge(app, stay_id).await?;

            let (status, body) = app
                .json(
                    Method::DELETE,
                    &format!("/api/v1/wards/{}", ward.ward_id),
                    None,
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "delete ward");
            assert!(body.is_null());

            for path in [
                format!("/api/v1/wards/{}", ward.ward_id),
                format!("/api/v1/rooms/{}", ward.room_id),
                format!("/api/v1/beds/{}", ward.bed_ids[0]),
            ] {
                let (status, _body) = app.json(Method::GET, &path, None, &admin).await?;
                assert_status(status, StatusCode::NOT_FOUND, &path);
            }

            // The discharged stay survives its bed.
            let (status, stay) = app
                .json(Method::GET, &format!("/api/v1/stays/{stay_id}"), None, &admin)
                .await?;
            assert_status(status, StatusCode::OK, "get stay");
            assert_eq!(stay["status"], "discharged");

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn occupied_room_and_bed_cannot_be_deleted() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let ward = seed_ward(app, "Endocrinology", 2).await?;
            admit_patient(app, Uuid::new_v4(), ward.placement(0)).await?;
            let admin = admin();

            let (status, body) = app
                .json(
                    Method::DELETE,
                    &format!("/api/v1/wards/{}/rooms/{}", ward.ward_id, ward.room_id),
                    None,
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "delete occupied room");
            assert_error_code(&body, "CONFLICT")?;

            let (status, body) = app
                .json(
                    Method::DELETE,
                    &format!("/api/v1/rooms/{}/beds/{}", ward.room_id, ward.bed_ids[0]),
                    None,
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::CONFLICT, "delete occupied bed");
            assert_error_code(&body, "CONFLICT")?;

            let (status, _body) = app
                .json(
                    Method::DELETE,
                    &format!("/api/v1/rooms/{}/beds/{}", ward.room_id, ward.bed_ids[1]),
                    None,
                    &admin,
                )
                .await?;
            assert_status(status, StatusCode::NO_CONTENT, "delete free bed");

            let (status, body) = app
                .json(
                    Method::DELETE,
                    &format!("/api/v1/wards/{}", ward.ward_id),
                    None,
                    &doctor(),
                )
                .await?;
            assert_status(status, StatusCode::FORBIDDEN, "doctor deletes ward");
            assert_error_code(&body, "FORBIDDEN")?;

            Ok(())
        })
    })
    .await
}

#[tokio::test]
async fn deleting_unknown_ward_is_not_found() -> anyhow::Result<()> {
    with_test_app(|app| {
        Box::pin(async move {
            let (status, body) = app
                .json(
                    Method::DELETE,
                    &format!("/api/v1/wards/{}", Uuid::new_v4()),
                    None,
                    &admin(),
                )
                .await?;
            assert_status(status, StatusCode::NOT_FOUND, "delete unknown ward");
            assert_error_code(&body, "NOT_FOUND")?;
            Ok(())
        })
    })
    .await
}
