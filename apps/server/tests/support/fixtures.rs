use anyhow::Context as _;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;
use wardflow::auth::Actor;

use super::{assert_status, TestApp};

pub fn admin() -> Actor {
    Actor::admin(Uuid::new_v4())
}

pub fn doctor() -> Actor {
    Actor::doctor(Uuid::new_v4())
}

/// A ward with one room and `beds` available beds, numbered `B1..`.
#[derive(Debug, Clone)]
pub struct SeededWard {
    pub ward_id: Uuid,
    pub room_id: Uuid,
    pub bed_ids: Vec<Uuid>,
}

impl SeededWard {
    pub fn placement(&self, bed_index: usize) -> Value {
        json!({
            "ward_id": self.ward_id,
            "room_id": self.room_id,
            "bed_id": self.bed_ids[bed_index],
        })
    }
}

pub fn id_of(value: &Value) -> anyhow::Result<Uuid> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .context("response has an id")?;
    Ok(id.parse()?)
}

pub async fn create_ward(app: &TestApp, admin: &Actor, name: &str) -> anyhow::Result<Uuid> {
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/wards",
            Some(json!({ "name": name })),
            admin,
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "create ward");
    id_of(&body)
}

pub async fn create_room(
    app: &TestApp,
    admin: &Actor,
    ward_id: Uuid,
    room_number: &str,
) -> anyhow::Result<Uuid> {
    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/wards/{ward_id}/rooms"),
            Some(json!({ "room_number": room_number, "room_type": "general" })),
            admin,
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "create room");
    id_of(&body)
}

pub async fn create_bed(
    app: &TestApp,
    admin: &Actor,
    room_id: Uuid,
    bed_number: &str,
) -> anyhow::Result<Uuid> {
    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/rooms/{room_id}/beds"),
            Some(json!({ "bed_number": bed_number })),
            admin,
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "create bed");
    id_of(&body)
}

pub async fn seed_ward(app: &TestApp, name: &str, beds: usize) -> anyhow::Result<SeededWard> {
    let admin = admin();
    let ward_id = create_ward(app, &admin, name).await?;
    let room_id = create_room(app, &admin, ward_id, "101").await?;
    let mut bed_ids = Vec::with_capacity(beds);
    for n in 1..=beds {
        bed_ids.push(create_bed(app, &admin, room_id, &format!("B{n}")).await?);
    }
    Ok(SeededWard {
        ward_id,
        room_id,
        bed_ids,
    })
}

pub async fn submit_request(
    app: &TestApp,
    doctor: &Actor,
    patient_id: Uuid,
    urgency: &str,
) -> anyhow::Result<Uuid> {
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/admissions",
            Some(json!({
                "patient_id": patient_id,
                "diagnosis": "Community-acquired pneumonia",
                "urgency": urgency,
            })),
            doctor,
        )
        .await?;
    assert_status(status, StatusCode::CREATED, "submit admission request");
    id_of(&body)
}

/// Submits and approves a request onto `placement`, returning the new stay id.
pub async fn admit_patient(
    app: &TestApp,
    patient_id: Uuid,
    placement: Value,
) -> anyhow::Result<Uuid> {
    let request_id = submit_request(app, &doctor(), patient_id, "normal").await?;
    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/admissions/{request_id}/approve"),
            Some(placement),
            &admin(),
        )
        .await?;
    assert_status(status, StatusCode::OK, "approve admission request");
    id_of(&body["stay"])
}

pub async fn bed_status(app: &TestApp, bed_id: Uuid) -> anyhow::Result<String> {
    let (status, body) = app
        .json(
            Method::GET,
            &format!("/api/v1/beds/{bed_id}"),
            None,
            &doctor(),
        )
        .await?;
    assert_status(status, StatusCode::OK, "get bed");
    Ok(body["status"]
        .as_str()
        .context("bed has a status")?
        .to_string())
}
