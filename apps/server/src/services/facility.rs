//! Facility registry: wards, rooms and beds

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use wardflow_models::{
    Bed, BedFilter, BedStatus, BedUpdate, NewBed, NewRoom, NewWard, Room, RoomFilter, RoomUpdate,
    Ward, WardFilter, WardUpdate,
};

use crate::auth::{Actor, Role};
use crate::db::{Store, StoreTransaction, TxMode};
use crate::{Error, Result};

#[derive(Clone)]
pub struct FacilityService {
    store: Arc<dyn Store>,
}

fn duplicate(err: Error, what: impl FnOnce() -> String) -> Error {
    if err.is_unique_violation() {
        Error::Conflict(what())
    } else {
        err
    }
}

impl FacilityService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    // Wards

    pub async fn create_ward(&self, actor: &Actor, input: NewWard) -> Result<Ward> {
        actor.require(Role::Admin, "create ward")?;
        input.validate()?;

        let ward = Ward {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            total_beds: input.total_beds,
            active: input.active,
            created_at: Utc::now(),
        };

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        tx.insert_ward(&ward).await?;
        tx.commit().await?;

        tracing::info!(ward_id = %ward.id, name = %ward.name, "Ward created");
        Ok(ward)
    }

    pub async fn update_ward(&self, actor: &Actor, id: Uuid, update: WardUpdate) -> Result<Ward> {
        actor.require(Role::Admin, "update ward")?;
        update.validate()?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut ward = tx
            .get_ward(id)
            .await?
            .ok_or_else(|| Error::not_found("ward", id))?;
        update.apply(&mut ward);
        tx.update_ward(&ward).await?;
        tx.commit().await?;

        tracing::info!(ward_id = %id, active = ward.active, "Ward updated");
        Ok(ward)
    }

    /// Removes the ward with all its rooms and beds, unless a patient occupies one.
    pub async fn delete_ward(&self, actor: &Actor, id: Uuid) -> Result<()> {
        actor.require(Role::Admin, "delete ward")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let ward = tx
            .get_ward(id)
            .await?
            .ok_or_else(|| Error::not_found("ward", id))?;

        let beds = tx
            .lock_beds(&BedFilter {
                ward_id: Some(id),
                ..Default::default()
            })
            .await?;
        ensure_unoccupied(&mut *tx, &beds, || format!("ward '{}'", ward.name)).await?;

        tx.delete_ward(id).await?;
        tx.commit().await?;

        tracing::info!(ward_id = %id, beds_removed = beds.len(), "Ward deleted");
        Ok(())
    }

    pub async fn get_ward(&self, id: Uuid) -> Result<Ward> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.get_ward(id)
            .await?
            .ok_or_else(|| Error::not_found("ward", id))
    }

    pub async fn list_wards(&self, filter: &WardFilter) -> Result<Vec<Ward>> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.list_wards(filter).await
    }

    // Rooms

    pub async fn create_room(&self, actor: &Actor, ward_id: Uuid, input: NewRoom) -> Result<Room> {
        actor.require(Role::Admin, "create room")?;
        input.validate()?;

        let room = Room {
            id: Uuid::new_v4(),
            ward_id,
            room_number: input.room_number.trim().to_string(),
            room_type: input.room_type,
            active: input.active,
            created_at: Utc::now(),
        };

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        if tx.get_ward(ward_id).await?.is_none() {
            return Err(Error::not_found("ward", ward_id));
        }
        ensure_room_number_free(&mut *tx, ward_id, &room.room_number, None).await?;
        tx.insert_room(&room)
            .await
            .map_err(|e| duplicate(e, || room_taken(&room.room_number)))?;
        tx.commit().await?;

        tracing::info!(
            ward_id = %ward_id,
            room_id = %room.id,
            room_number = %room.room_number,
            "Room created"
        );
        Ok(room)
    }

    pub async fn update_room(
        &self,
        actor: &Actor,
        ward_id: Uuid,
        room_id: Uuid,
        update: RoomUpdate,
    ) -> Result<Room> {
        actor.require(Role::Admin, "update room")?;
        update.validate()?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut room = room_in_ward(&mut *tx, ward_id, room_id).await?;
        update.apply(&mut room);
        ensure_room_number_free(&mut *tx, ward_id, &room.room_number, Some(room_id)).await?;
        tx.update_room(&room)
            .await
            .map_err(|e| duplicate(e, || room_taken(&room.room_number)))?;
        tx.commit().await?;

        tracing::info!(room_id = %room_id, active = room.active, "Room updated");
        Ok(room)
    }

    pub async fn delete_room(&self, actor: &Actor, ward_id: Uuid, room_id: Uuid) -> Result<()> {
        actor.require(Role::Admin, "delete room")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let room = room_in_ward(&mut *tx, ward_id, room_id).await?;
        let beds = tx
            .lock_beds(&BedFilter {
                room_id: Some(room_id),
                ..Default::default()
            })
            .await?;
        ensure_unoccupied(&mut *tx, &beds, || format!("room {}", room.room_number)).await?;

        tx.delete_room(room_id).await?;
        tx.commit().await?;

        tracing::info!(room_id = %room_id, beds_removed = beds.len(), "Room deleted");
        Ok(())
    }

    pub async fn get_room(&self, id: Uuid) -> Result<Room> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.get_room(id)
            .await?
            .ok_or_else(|| Error::not_found("room", id))
    }

    /// Rooms of a ward; the ward must exist.
    pub async fn list_rooms(&self, ward_id: Uuid, filter: &RoomFilter) -> Result<Vec<Room>> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        if tx.get_ward(ward_id).await?.is_none() {
            return Err(Error::not_found("ward", ward_id));
        }
        let filter = RoomFilter {
            ward_id: Some(ward_id),
            ..filter.clone()
        };
        tx.list_rooms(&filter).await
    }

    // Beds

    pub async fn create_bed(&self, actor: &Actor, room_id: Uuid, input: NewBed) -> Result<Bed> {
        actor.require(Role::Admin, "create bed")?;
        input.validate()?;

        let status = input.status.unwrap_or(BedStatus::Available);
        ensure_staff_settable(status)?;

        let bed = Bed {
            id: Uuid::new_v4(),
            room_id,
            bed_number: input.bed_number.trim().to_string(),
            status,
            updated_at: Utc::now(),
        };

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        if tx.get_room(room_id).await?.is_none() {
            return Err(Error::not_found("room", room_id));
        }
        ensure_bed_number_free(&mut *tx, room_id, &bed.bed_number, None).await?;
        tx.insert_bed(&bed)
            .await
            .map_err(|e| duplicate(e, || bed_taken(&bed.bed_number)))?;
        tx.commit().await?;

        tracing::info!(
            room_id = %room_id,
            bed_id = %bed.id,
            status = %bed.status,
            "Bed created"
        );
        Ok(bed)
    }

    /// Renames a bed or changes its housekeeping status.
    ///
    /// `occupied` is owned by the stay workflow: it cannot be set here, and an
    /// occupied bed keeps that status while its stay is active.
    pub async fn update_bed(
        &self,
        actor: &Actor,
        room_id: Uuid,
        bed_id: Uuid,
        update: BedUpdate,
    ) -> Result<Bed> {
        actor.require(Role::Admin, "update bed")?;
        update.validate()?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let mut bed = locked_bed_in_room(&mut *tx, room_id, bed_id).await?;

        if let Some(status) = update.status.filter(|s| *s != bed.status) {
            ensure_staff_settable(status)?;
            if let Some(stay) = tx.active_stay_for_bed(bed_id).await? {
                return Err(Error::InvalidState(format!(
                    "bed {} is occupied by stay {}",
                    bed.bed_number, stay.id
                )));
            }
            bed.status = status;
        }
        if let Some(number) = update.bed_number {
            bed.bed_number = number.trim().to_string();
            ensure_bed_number_free(&mut *tx, room_id, &bed.bed_number, Some(bed_id)).await?;
        }
        bed.updated_at = Utc::now();

        tx.update_bed(&bed)
            .await
            .map_err(|e| duplicate(e, || bed_taken(&bed.bed_number)))?;
        tx.commit().await?;

        tracing::info!(bed_id = %bed_id, status = %bed.status, "Bed updated");
        Ok(bed)
    }

    pub async fn delete_bed(&self, actor: &Actor, room_id: Uuid, bed_id: Uuid) -> Result<()> {
        actor.require(Role::Admin, "delete bed")?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        let bed = locked_bed_in_room(&mut *tx, room_id, bed_id).await?;
        ensure_unoccupied(&mut *tx, std::slice::from_ref(&bed), || {
            format!("bed {}", bed.bed_number)
        })
        .await?;

        tx.delete_bed(bed_id).await?;
        tx.commit().await?;

        tracing::info!(bed_id = %bed_id, "Bed deleted");
        Ok(())
    }

    pub async fn get_bed(&self, id: Uuid) -> Result<Bed> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.get_bed(id)
            .await?
            .ok_or_else(|| Error::not_found("bed", id))
    }

    pub async fn list_beds(&self, filter: &BedFilter) -> Result<Vec<Bed>> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        tx.list_beds(filter).await
    }
}

fn room_taken(number: &str) -> String {
    format!("room number '{number}' already exists in this ward")
}

fn bed_taken(number: &str) -> String {
    format!("bed number '{number}' already exists in this room")
}

fn ensure_staff_settable(status: BedStatus) -> Result<()> {
    if !status.is_staff_settable() {
        return Err(Error::InvalidState(format!(
            "bed status '{status}' is set only by admission and transfer"
        )));
    }
    Ok(())
}

async fn room_in_ward(tx: &mut dyn StoreTransaction, ward_id: Uuid, room_id: Uuid) -> Result<Room> {
    tx.get_room(room_id)
        .await?
        .filter(|room| room.ward_id == ward_id)
        .ok_or_else(|| Error::NotFound(format!("room {room_id} does not exist in ward {ward_id}")))
}

async fn locked_bed_in_room(
    tx: &mut dyn StoreTransaction,
    room_id: Uuid,
    bed_id: Uuid,
) -> Result<Bed> {
    tx.lock_bed(bed_id)
        .await?
        .filter(|bed| bed.room_id == room_id)
        .ok_or_else(|| Error::NotFound(format!("bed {bed_id} does not exist in room {room_id}")))
}

async fn ensure_room_number_free(
    tx: &mut dyn StoreTransaction,
    ward_id: Uuid,
    number: &str,
    except: Option<Uuid>,
) -> Result<()> {
    match tx.find_room_by_number(ward_id, number).await? {
        Some(existing) if Some(existing.id) != except => Err(Error::Conflict(room_taken(number))),
        _ => Ok(()),
    }
}

async fn ensure_bed_number_free(
    tx: &mut dyn StoreTransaction,
    room_id: Uuid,
    number: &str,
    except: Option<Uuid>,
) -> Result<()> {
    match tx.find_bed_by_number(room_id, number).await? {
        Some(existing) if Some(existing.id) != except => Err(Error::Conflict(bed_taken(number))),
        _ => Ok(()),
    }
}

/// `beds` must already be locked by the caller's transaction.
async fn ensure_unoccupied(
    tx: &mut dyn StoreTransaction,
    beds: &[Bed],
    scope: impl FnOnce() -> String,
) -> Result<()> {
    let ids: Vec<Uuid> = beds.iter().map(|b| b.id).collect();
    let active = tx.count_active_stays_on_beds(&ids).await?;
    if active > 0 {
        return Err(Error::Conflict(format!(
            "{} has {active} bed(s) with an active stay",
            scope()
        )));
    }
    Ok(())
}
