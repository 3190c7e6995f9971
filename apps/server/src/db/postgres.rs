//! PostgreSQL storage backend

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;
use wardflow_models::{
    AdmissionFilter, AdmissionRequest, Bed, BedFilter, DailyNote, NoteOrder, Room, RoomFilter,
    Stay, StayFilter, Ward, WardFilter,
};

use super::traits::{Store, StoreTransaction, TxMode};
use crate::config::DatabaseConfig;
use crate::{Error, Result};

const WARD_COLUMNS: &str = "id, name, description, total_beds, active, created_at";
const ROOM_COLUMNS: &str = "id, ward_id, room_number, room_type, active, created_at";
const BED_COLUMNS: &str = "b.id, b.room_id, b.bed_number, b.status, b.updated_at";
const REQUEST_COLUMNS: &str = "id, doctor_id, patient_id, diagnosis, treatment_plan, urgency, \
     recommended_ward_id, recommended_room_type, status, rejection_reason, requested_at, \
     decided_at, decided_by, stay_id";
const STAY_COLUMNS: &str = "id, patient_id, doctor_id, admission_request_id, ward_id, room_id, \
     bed_id, diagnosis, treatment_plan, urgency, status, admitted_at, discharged_at, \
     transfer_reason, transfer_suggested_ward_id, transfer_requested_by, transfer_requested_at, \
     discharge_summary, discharge_requested_by, discharge_requested_at, discharged_by, updated_at";

/// Build the connection pool described by `config`.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let statement_timeout = format!("{}s", config.statement_timeout_seconds);
    let pool = PgPoolOptions::new()
        .min_connections(config.pool_min_size)
        .max_connections(config.pool_max_size)
        .acquire_timeout(Duration::from_secs(config.pool_timeout_seconds))
        .after_connect(move |conn, _meta| {
            let statement_timeout = statement_timeout.clone();
            Box::pin(async move {
                sqlx::query("SELECT set_config('statement_timeout', $1, false)")
                    .bind(statement_timeout)
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: String,
}

impl PostgresStore {
    pub fn new(pool: PgPool, lock_timeout_seconds: u64) -> Self {
        Self {
            pool,
            lock_timeout: format!("{lock_timeout_seconds}s"),
        }
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self, mode: TxMode) -> Result<Box<dyn StoreTransaction>> {
        let mut tx = self.pool.begin().await?;
        match mode {
            TxMode::ReadWrite => {
                sqlx::query("SELECT set_config('lock_timeout', $1, true)")
                    .bind(&self.lock_timeout)
                    .execute(&mut *tx)
                    .await?;
            }
            TxMode::Snapshot => {
                sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
                    .execute(&mut *tx)
                    .await?;
            }
        }
        Ok(Box::new(PostgresTransactionContext::new(tx)))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

/// PostgreSQL transaction context
pub struct PostgresTransactionContext {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PostgresTransactionContext {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx: Some(tx) }
    }

    fn tx_mut(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        self.tx.as_mut().ok_or_else(|| {
            Error::Internal("Transaction already committed or rolled back".to_string())
        })
    }

    async fn fetch_optional<T>(
        &mut self,
        mut query: QueryBuilder<'_, Postgres>,
        map: fn(&PgRow) -> Result<T>,
    ) -> Result<Option<T>> {
        let tx = self.tx_mut()?;
        let row = query.build().fetch_optional(&mut **tx).await?;
        row.as_ref().map(map).transpose()
    }

    async fn fetch_all<T>(
        &mut self,
        mut query: QueryBuilder<'_, Postgres>,
        map: fn(&PgRow) -> Result<T>,
    ) -> Result<Vec<T>> {
        let tx = self.tx_mut()?;
        let rows = query.build().fetch_all(&mut **tx).await?;
        rows.iter().map(map).collect()
    }

    async fn execute(&mut self, mut query: QueryBuilder<'_, Postgres>) -> Result<u64> {
        let tx = self.tx_mut()?;
        Ok(query.build().execute(&mut **tx).await?.rows_affected())
    }
}

fn select(columns: &str, from: &str) -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!("SELECT {columns} FROM {from} WHERE TRUE"))
}

fn parse<T>(value: String) -> Result<T>
where
    T: FromStr<Err = wardflow_models::Error>,
{
    value
        .parse()
        .map_err(|e: wardflow_models::Error| Error::Internal(format!("corrupt row: {e}")))
}

fn parse_opt<T>(value: Option<String>) -> Result<Option<T>>
where
    T: FromStr<Err = wardflow_models::Error>,
{
    value.map(parse).transpose()
}

fn ward_from_row(row: &PgRow) -> Result<Ward> {
    Ok(Ward {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        total_beds: row.try_get("total_beds")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn room_from_row(row: &PgRow) -> Result<Room> {
    Ok(Room {
        id: row.try_get("id")?,
        ward_id: row.try_get("ward_id")?,
        room_number: row.try_get("room_number")?,
        room_type: parse(row.try_get("room_type")?)?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn bed_from_row(row: &PgRow) -> Result<Bed> {
    Ok(Bed {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        bed_number: row.try_get("bed_number")?,
        status: parse(row.try_get("status")?)?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn request_from_row(row: &PgRow) -> Result<AdmissionRequest> {
    Ok(AdmissionRequest {
        id: row.try_get("id")?,
        doctor_id: row.try_get("doctor_id")?,
        patient_id: row.try_get("patient_id")?,
        diagnosis: row.try_get("diagnosis")?,
        treatment_plan: row.try_get("treatment_plan")?,
        urgency: parse(row.try_get("urgency")?)?,
        recommended_ward_id: row.try_get("recommended_ward_id")?,
        recommended_room_type: parse_opt(row.try_get("recommended_room_type")?)?,
        status: parse(row.try_get("status")?)?,
        rejection_reason: row.try_get("rejection_reason")?,
        requested_at: row.try_get("requested_at")?,
        decided_at: row.try_get("decided_at")?,
        decided_by: row.try_get("decided_by")?,
        stay_id: row.try_get("stay_id")?,
    })
}

fn stay_from_row(row: &PgRow) -> Result<Stay> {
    Ok(Stay {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        doctor_id: row.try_get("doctor_id")?,
        admission_request_id: row.try_get("admission_request_id")?,
        ward_id: row.try_get("ward_id")?,
        room_id: row.try_get("room_id")?,
        bed_id: row.try_get("bed_id")?,
        diagnosis: row.try_get("diagnosis")?,
        treatment_plan: row.try_get("treatment_plan")?,
        urgency: parse(row.try_get("urgency")?)?,
        status: parse(row.try_get("status")?)?,
        admitted_at: row.try_get("admitted_at")?,
        discharged_at: row.try_get("discharged_at")?,
        transfer_reason: row.try_get("transfer_reason")?,
        transfer_suggested_ward_id: row.try_get("transfer_suggested_ward_id")?,
        transfer_requested_by: row.try_get("transfer_requested_by")?,
        transfer_requested_at: row.try_get("transfer_requested_at")?,
        discharge_summary: row.try_get("discharge_summary")?,
        discharge_requested_by: row.try_get("discharge_requested_by")?,
        discharge_requested_at: row.try_get("discharge_requested_at")?,
        discharged_by: row.try_get("discharged_by")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn note_from_row(row: &PgRow) -> Result<DailyNote> {
    Ok(DailyNote {
        id: row.try_get("id")?,
        stay_id: row.try_get("stay_id")?,
        doctor_id: row.try_get("doctor_id")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
    })
}

fn push_bed_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &BedFilter) {
    if let Some(room_id) = filter.room_id {
        query.push(" AND b.room_id = ").push_bind(room_id);
    }
    if let Some(ward_id) = filter.ward_id {
        query.push(" AND r.ward_id = ").push_bind(ward_id);
    }
    if let Some(status) = filter.status {
        query.push(" AND b.status = ").push_bind(status.as_str());
    }
}

fn beds_query(filter: &BedFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = select(BED_COLUMNS, "beds b JOIN rooms r ON r.id = b.room_id");
    push_bed_filter(&mut query, filter);
    query
}

#[async_trait]
impl StoreTransaction for PostgresTransactionContext {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| Error::Internal("Transaction already committed".to_string()))?;

        tx.commit().await.map_err(Error::Database)
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| Error::Internal("Transaction already rolled back".to_string()))?;

        tx.rollback().await.map_err(Error::Database)
    }

    async fn insert_ward(&mut self, ward: &Ward) -> Result<()> {
        let mut query = QueryBuilder::new(
            "INSERT INTO wards (id, name, description, total_beds, active, created_at) VALUES (",
        );
        query
            .separated(", ")
            .push_bind(ward.id)
            .push_bind(ward.name.clone())
            .push_bind(ward.description.clone())
            .push_bind(ward.total_beds)
            .push_bind(ward.active)
            .push_bind(ward.created_at);
        query.push(")");
        self.execute(query).await?;
        Ok(())
    }

    async fn update_ward(&mut self, ward: &Ward) -> Result<()> {
        let mut query = QueryBuilder::new("UPDATE wards SET name = ");
        query
            .push_bind(ward.name.clone())
            .push(", description = ")
            .push_bind(ward.description.clone())
            .push(", total_beds = ")
            .push_bind(ward.total_beds)
            .push(", active = ")
            .push_bind(ward.active)
            .push(" WHERE id = ")
            .push_bind(ward.id);
        self.execute(query).await?;
        Ok(())
    }

    async fn delete_ward(&mut self, id: Uuid) -> Result<()> {
        let mut query = QueryBuilder::new("DELETE FROM wards WHERE id = ");
        query.push_bind(id);
        self.execute(query).await?;
        Ok(())
    }

    async fn get_ward(&mut self, id: Uuid) -> Result<Option<Ward>> {
        let mut query = select(WARD_COLUMNS, "wards");
        query.push(" AND id = ").push_bind(id);
        self.fetch_optional(query, ward_from_row).await
    }

    async fn list_wards(&mut self, filter: &WardFilter) -> Result<Vec<Ward>> {
        let mut query = select(WARD_COLUMNS, "wards");
        if let Some(active) = filter.active {
            query.push(" AND active = ").push_bind(active);
        }
        query.push(" ORDER BY name, id");
        self.fetch_all(query, ward_from_row).await
    }

    async fn insert_room(&mut self, room: &Room) -> Result<()> {
        let mut query = QueryBuilder::new(
            "INSERT INTO rooms (id, ward_id, room_number, room_type, active, created_at) VALUES (",
        );
        query
            .separated(", ")
            .push_bind(room.id)
            .push_bind(room.ward_id)
            .push_bind(room.room_number.clone())
            .push_bind(room.room_type.as_str())
            .push_bind(room.active)
            .push_bind(room.created_at);
        query.push(")");
        self.execute(query).await?;
        Ok(())
    }

    async fn update_room(&mut self, room: &Room) -> Result<()> {
        let mut query = QueryBuilder::new("UPDATE rooms SET room_number = ");
        query
            .push_bind(room.room_number.clone())
            .push(", room_type = ")
            .push_bind(room.room_type.as_str())
            .push(", active = ")
            .push_bind(room.active)
            .push(" WHERE id = ")
            .push_bind(room.id);
        self.execute(query).await?;
        Ok(())
    }

    async fn delete_room(&mut self, id: Uuid) -> Result<()> {
        let mut query = QueryBuilder::new("DELETE FROM rooms WHERE id = ");
        query.push_bind(id);
        self.execute(query).await?;
        Ok(())
    }

    async fn get_room(&mut self, id: Uuid) -> Result<Option<Room>> {
        let mut query = select(ROOM_COLUMNS, "rooms");
        query.push(" AND id = ").push_bind(id);
        self.fetch_optional(query, room_from_row).await
    }

    async fn find_room_by_number(
        &mut self,
        ward_id: Uuid,
        room_number: &str,
    ) -> Result<Option<Room>> {
        let mut query = select(ROOM_COLUMNS, "rooms");
        query
            .push(" AND ward_id = ")
            .push_bind(ward_id)
            .push(" AND room_number = ")
            .push_bind(room_number.to_string());
        self.fetch_optional(query, room_from_row).await
    }

    async fn list_rooms(&mut self, filter: &RoomFilter) -> Result<Vec<Room>> {
        let mut query = select(ROOM_COLUMNS, "rooms");
        if let Some(ward_id) = filter.ward_id {
            query.push(" AND ward_id = ").push_bind(ward_id);
        }
        if let Some(active) = filter.active {
            query.push(" AND active = ").push_bind(active);
        }
        query.push(" ORDER BY room_number, id");
        self.fetch_all(query, room_from_row).await
    }

    async fn insert_bed(&mut self, bed: &Bed) -> Result<()> {
        let mut query = QueryBuilder::new(
            "INSERT INTO beds (id, room_id, bed_number, status, updated_at) VALUES (",
        );
        query
            .separated(", ")
            .push_bind(bed.id)
            .push_bind(bed.room_id)
            .push_bind(bed.bed_number.clone())
            .push_bind(bed.status.as_str())
            .push_bind(bed.updated_at);
        query.push(")");
        self.execute(query).await?;
        Ok(())
    }

    async fn update_bed(&mut self, bed: &Bed) -> Result<()> {
        let mut query = QueryBuilder::new("UPDATE beds SET bed_number = ");
        query
            .push_bind(bed.bed_number.clone())
            .push(", status = ")
            .push_bind(bed.status.as_str())
            .push(", updated_at = ")
            .push_bind(bed.updated_at)
            .push(" WHERE id = ")
            .push_bind(bed.id);
        self.execute(query).await?;
        Ok(())
    }

    async fn delete_bed(&mut self, id: Uuid) -> Result<()> {
        let mut query = QueryBuilder::new("DELETE FROM beds WHERE id = ");
        query.push_bind(id);
        self.execute(query).await?;
        Ok(())
    }

    async fn get_bed(&mut self, id: Uuid) -> Result<Option<Bed>> {
        let mut query = select(BED_COLUMNS, "beds b");
        query.push(" AND b.id = ").push_bind(id);
        self.fetch_optional(query, bed_from_row).await
    }

    async fn lock_bed(&mut self, id: Uuid) -> Result<Option<Bed>> {
        let mut query = select(BED_COLUMNS, "beds b");
        query.push(" AND b.id = ").push_bind(id).push(" FOR UPDATE");
        self.fetch_optional(query, bed_from_row).await
    }

    async fn lock_beds(&mut self, filter: &BedFilter) -> Result<Vec<Bed>> {
        let mut query = beds_query(filter);
        query.push(" ORDER BY b.id FOR UPDATE OF b");
        self.fetch_all(query, bed_from_row).await
    }

    async fn find_bed_by_number(&mut self, room_id: Uuid, bed_number: &str) -> Result<Option<Bed>> {
        let mut query = select(BED_COLUMNS, "beds b");
        query
            .push(" AND b.room_id = ")
            .push_bind(room_id)
            .push(" AND b.bed_number = ")
            .push_bind(bed_number.to_string());
        self.fetch_optional(query, bed_from_row).await
    }

    async fn list_beds(&mut self, filter: &BedFilter) -> Result<Vec<Bed>> {
        let mut query = beds_query(filter);
        query.push(" ORDER BY b.bed_number, b.id");
        self.fetch_all(query, bed_from_row).await
    }

    async fn insert_request(&mut self, request: &AdmissionRequest) -> Result<()> {
        let mut query = QueryBuilder::new(format!(
            "INSERT INTO admission_requests ({REQUEST_COLUMNS}) VALUES ("
        ));
        query
            .separated(", ")
            .push_bind(request.id)
            .push_bind(request.doctor_id)
            .push_bind(request.patient_id)
            .push_bind(request.diagnosis.clone())
            .push_bind(request.treatment_plan.clone())
            .push_bind(request.urgency.as_str())
            .push_bind(request.recommended_ward_id)
            .push_bind(request.recommended_room_type.map(|t| t.as_str()))
            .push_bind(request.status.as_str())
            .push_bind(request.rejection_reason.clone())
            .push_bind(request.requested_at)
            .push_bind(request.decided_at)
            .push_bind(request.decided_by)
            .push_bind(request.stay_id);
        query.push(")");
        self.execute(query).await?;
        Ok(())
    }

    async fn update_request(&mut self, request: &AdmissionRequest) -> Result<()> {
        // Only the decision fields change after submission.
        let mut query = QueryBuilder::new("UPDATE admission_requests SET status = ");
        query
            .push_bind(request.status.as_str())
            .push(", rejection_reason = ")
            .push_bind(request.rejection_reason.clone())
            .push(", decided_at = ")
            .push_bind(request.decided_at)
            .push(", decided_by = ")
            .push_bind(request.decided_by)
            .push(", stay_id = ")
            .push_bind(request.stay_id)
            .push(" WHERE id = ")
            .push_bind(request.id);
        self.execute(query).await?;
        Ok(())
    }

    async fn get_request(&mut self, id: Uuid) -> Result<Option<AdmissionRequest>> {
        let mut query = select(REQUEST_COLUMNS, "admission_requests");
        query.push(" AND id = ").push_bind(id);
        self.fetch_optional(query, request_from_row).await
    }

    async fn lock_request(&mut self, id: Uuid) -> Result<Option<AdmissionRequest>> {
        let mut query = select(REQUEST_COLUMNS, "admission_requests");
        query.push(" AND id = ").push_bind(id).push(" FOR UPDATE");
        self.fetch_optional(query, request_from_row).await
    }

    async fn list_requests(&mut self, filter: &AdmissionFilter) -> Result<Vec<AdmissionRequest>> {
        let mut query = select(REQUEST_COLUMNS, "admission_requests");
        if let Some(status) = filter.effective_status() {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(doctor_id) = filter.doctor_id {
            query.push(" AND doctor_id = ").push_bind(doctor_id);
        }
        if let Some(patient_id) = filter.patient_id {
            query.push(" AND patient_id = ").push_bind(patient_id);
        }
        query.push(" ORDER BY (urgency = 'emergency') DESC, requested_at, id");
        self.fetch_all(query, request_from_row).await
    }

    async fn insert_stay(&mut self, stay: &Stay) -> Result<()> {
        let mut query =
            QueryBuilder::new(format!("INSERT INTO stays ({STAY_COLUMNS}) VALUES ("));
        query
            .separated(", ")
            .push_bind(stay.id)
            .push_bind(stay.patient_id)
            .push_bind(stay.doctor_id)
            .push_bind(stay.admission_request_id)
            .push_bind(stay.ward_id)
            .push_bind(stay.room_id)
            .push_bind(stay.bed_id)
            .push_bind(stay.diagnosis.clone())
            .push_bind(stay.treatment_plan.clone())
            .push_bind(stay.urgency.as_str())
            .push_bind(stay.status.as_str())
            .push_bind(stay.admitted_at)
            .push_bind(stay.discharged_at)
            .push_bind(stay.transfer_reason.clone())
            .push_bind(stay.transfer_suggested_ward_id)
            .push_bind(stay.transfer_requested_by)
            .push_bind(stay.transfer_requested_at)
            .push_bind(stay.discharge_summary.clone())
            .push_bind(stay.discharge_requested_by)
            .push_bind(stay.discharge_requested_at)
            .push_bind(stay.discharged_by)
            .push_bind(stay.updated_at);
        query.push(")");
        self.execute(query).await?;
        Ok(())
    }

    async fn update_stay(&mut self, stay: &Stay) -> Result<()> {
        let mut query = QueryBuilder::new("UPDATE stays SET ward_id = ");
        query
            .push_bind(stay.ward_id)
            .push(", room_id = ")
            .push_bind(stay.room_id)
            .push(", bed_id = ")
            .push_bind(stay.bed_id)
            .push(", treatment_plan = ")
            .push_bind(stay.treatment_plan.clone())
            .push(", status = ")
            .push_bind(stay.status.as_str())
            .push(", discharged_at = ")
            .push_bind(stay.discharged_at)
            .push(", transfer_reason = ")
            .push_bind(stay.transfer_reason.clone())
            .push(", transfer_suggested_ward_id = ")
            .push_bind(stay.transfer_suggested_ward_id)
            .push(", transfer_requested_by = ")
            .push_bind(stay.transfer_requested_by)
            .push(", transfer_requested_at = ")
            .push_bind(stay.transfer_requested_at)
            .push(", discharge_summary = ")
            .push_bind(stay.discharge_summary.clone())
            .push(", discharge_requested_by = ")
            .push_bind(stay.discharge_requested_by)
            .push(", discharge_requested_at = ")
            .push_bind(stay.discharge_requested_at)
            .push(", discharged_by = ")
            .push_bind(stay.discharged_by)
            .push(", updated_at = ")
            .push_bind(stay.updated_at)
            .push(" WHERE id = ")
            .push_bind(stay.id);
        self.execute(query).await?;
        Ok(())
    }

    async fn get_stay(&mut self, id: Uuid) -> Result<Option<Stay>> {
        let mut query = select(STAY_COLUMNS, "stays");
        query.push(" AND id = ").push_bind(id);
        self.fetch_optional(query, stay_from_row).await
    }

    async fn lock_stay(&mut self, id: Uuid) -> Result<Option<Stay>> {
        let mut query = select(STAY_COLUMNS, "stays");
        query.push(" AND id = ").push_bind(id).push(" FOR UPDATE");
        self.fetch_optional(query, stay_from_row).await
    }

    async fn active_stay_for_bed(&mut self, bed_id: Uuid) -> Result<Option<Stay>> {
        let mut query = select(STAY_COLUMNS, "stays");
        query
            .push(" AND status <> 'discharged' AND bed_id = ")
            .push_bind(bed_id);
        self.fetch_optional(query, stay_from_row).await
    }

    async fn active_stay_for_patient(&mut self, patient_id: Uuid) -> Result<Option<Stay>> {
        let mut query = select(STAY_COLUMNS, "stays");
        query
            .push(" AND status <> 'discharged' AND patient_id = ")
            .push_bind(patient_id);
        self.fetch_optional(query, stay_from_row).await
    }

    async fn count_active_stays_on_beds(&mut self, bed_ids: &[Uuid]) -> Result<u64> {
        if bed_ids.is_empty() {
            return Ok(0);
        }
        let tx = self.tx_mut()?;
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stays WHERE status <> 'discharged' AND bed_id = ANY($1)",
        )
        .bind(bed_ids)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count as u64)
    }

    async fn count_active_stays(&mut self) -> Result<u64> {
        let tx = self.tx_mut()?;
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stays WHERE status <> 'discharged'")
                .fetch_one(&mut **tx)
                .await?;
        Ok(count as u64)
    }

    async fn list_stays(&mut self, filter: &StayFilter) -> Result<Vec<Stay>> {
        let mut query = select(STAY_COLUMNS, "stays");
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        match filter.active {
            Some(true) => {
                query.push(" AND status <> 'discharged'");
            }
            Some(false) => {
                query.push(" AND status = 'discharged'");
            }
            None => {}
        }
        if let Some(doctor_id) = filter.doctor_id {
            query.push(" AND doctor_id = ").push_bind(doctor_id);
        }
        if let Some(patient_id) = filter.patient_id {
            query.push(" AND patient_id = ").push_bind(patient_id);
        }
        if let Some(ward_id) = filter.ward_id {
            query.push(" AND ward_id = ").push_bind(ward_id);
        }
        query.push(" ORDER BY admitted_at, id");
        self.fetch_all(query, stay_from_row).await
    }

    async fn insert_note(&mut self, note: &DailyNote) -> Result<()> {
        let mut query = QueryBuilder::new(
            "INSERT INTO daily_notes (id, stay_id, doctor_id, text, created_at) VALUES (",
        );
        query
            .separated(", ")
            .push_bind(note.id)
            .push_bind(note.stay_id)
            .push_bind(note.doctor_id)
            .push_bind(note.text.clone())
            .push_bind(note.created_at);
        query.push(")");
        self.execute(query).await?;
        Ok(())
    }

    async fn list_notes(&mut self, stay_id: Uuid, order: NoteOrder) -> Result<Vec<DailyNote>> {
        let mut query = select("id, stay_id, doctor_id, text, created_at", "daily_notes");
        query.push(" AND stay_id = ").push_bind(stay_id);
        query.push(match order {
            NoteOrder::NewestFirst => " ORDER BY created_at DESC, seq DESC",
            NoteOrder::OldestFirst => " ORDER BY created_at, seq",
        });
        self.fetch_all(query, note_from_row).await
    }
}
