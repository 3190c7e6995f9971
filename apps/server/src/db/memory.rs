//! In-memory storage backend
//!
//! A single async mutex serializes read-write transactions. Each transaction edits a
//! private copy of the state that replaces the shared state only on commit, so a
//! dropped transaction leaves nothing behind. Snapshot transactions clone the state
//! and release the mutex immediately.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;
use wardflow_models::{
    triage_order, AdmissionFilter, AdmissionRequest, Bed, BedFilter, DailyNote, NoteOrder, Room,
    RoomFilter, Stay, StayFilter, Ward, WardFilter,
};

use super::traits::{Store, StoreTransaction, TxMode};
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    wards: HashMap<Uuid, Ward>,
    rooms: HashMap<Uuid, Room>,
    beds: HashMap<Uuid, Bed>,
    requests: HashMap<Uuid, AdmissionRequest>,
    stays: HashMap<Uuid, Stay>,
    // Insertion order doubles as the note sequence.
    notes: Vec<DailyNote>,
}

impl MemoryState {
    fn room_ward(&self, room_id: Uuid) -> Option<Uuid> {
        self.rooms.get(&room_id).map(|r| r.ward_id)
    }

    fn beds_matching(&self, filter: &BedFilter) -> Vec<Bed> {
        self.beds
            .values()
            .filter(|bed| filter.matches(bed, self.room_ward(bed.room_id)))
            .cloned()
            .collect()
    }
}

/// Process-local store used by tests and `database.backend = "memory"`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self, mode: TxMode) -> Result<Box<dyn StoreTransaction>> {
        let tx = match mode {
            TxMode::ReadWrite => {
                let guard = self.state.clone().lock_owned().await;
                let working = guard.clone();
                MemoryTransaction {
                    guard: Some(guard),
                    working,
                    mode,
                }
            }
            TxMode::Snapshot => {
                let working = self.state.lock().await.clone();
                MemoryTransaction {
                    guard: None,
                    working,
                    mode,
                }
            }
        };
        Ok(Box::new(tx))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

pub struct MemoryTransaction {
    guard: Option<OwnedMutexGuard<MemoryState>>,
    working: MemoryState,
    mode: TxMode,
}

impl MemoryTransaction {
    fn writable(&mut self) -> Result<&mut MemoryState> {
        if self.mode == TxMode::Snapshot {
            return Err(Error::Internal(
                "write attempted in a read-only transaction".to_string(),
            ));
        }
        Ok(&mut self.working)
    }
}

fn missing(entity: &str, id: Uuid) -> Error {
    Error::Internal(format!("{entity} {id} vanished inside its transaction"))
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        if let Some(mut guard) = self.guard.take() {
            *guard = std::mem::take(&mut self.working);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn insert_ward(&mut self, ward: &Ward) -> Result<()> {
        self.writable()?.wards.insert(ward.id, ward.clone());
        Ok(())
    }

    async fn update_ward(&mut self, ward: &Ward) -> Result<()> {
        let state = self.writable()?;
        let slot = state
            .wards
            .get_mut(&ward.id)
            .ok_or_else(|| missing("ward", ward.id))?;
        *slot = ward.clone();
        Ok(())
    }

    async fn delete_ward(&mut self, id: Uuid) -> Result<()> {
        let state = self.writable()?;
        state.wards.remove(&id);
        let room_ids: Vec<Uuid> = state
            .rooms
            .values()
            .filter(|r| r.ward_id == id)
            .map(|r| r.id)
            .collect();
        for room_id in room_ids {
            state.rooms.remove(&room_id);
            state.beds.retain(|_, bed| bed.room_id != room_id);
        }
        Ok(())
    }

    async fn get_ward(&mut self, id: Uuid) -> Result<Option<Ward>> {
        Ok(self.working.wards.get(&id).cloned())
    }

    async fn list_wards(&mut self, filter: &WardFilter) -> Result<Vec<Ward>> {
        let mut wards: Vec<Ward> = self
            .working
            .wards
            .values()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect();
        wards.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(wards)
    }

    async fn insert_room(&mut self, room: &Room) -> Result<()> {
        self.writable()?.rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn update_room(&mut self, room: &Room) -> Result<()> {
        let state = self.writable()?;
        let slot = state
            .rooms
            .get_mut(&room.id)
            .ok_or_else(|| missing("room", room.id))?;
        *slot = room.clone();
        Ok(())
    }

    async fn delete_room(&mut self, id: Uuid) -> Result<()> {
        let state = self.writable()?;
        state.rooms.remove(&id);
        state.beds.retain(|_, bed| bed.room_id != id);
        Ok(())
    }

    async fn get_room(&mut self, id: Uuid) -> Result<Option<Room>> {
        Ok(self.working.rooms.get(&id).cloned())
    }

    async fn find_room_by_number(
        &mut self,
        ward_id: Uuid,
        room_number: &str,
    ) -> Result<Option<Room>> {
        Ok(self
            .working
            .rooms
            .values()
            .find(|r| r.ward_id == ward_id && r.room_number == room_number)
            .cloned())
    }

    async fn list_rooms(&mut self, filter: &RoomFilter) -> Result<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .working
            .rooms
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number).then(a.id.cmp(&b.id)));
        Ok(rooms)
    }

    async fn insert_bed(&mut self, bed: &Bed) -> Result<()> {
        self.writable()?.beds.insert(bed.id, bed.clone());
        Ok(())
    }

    async fn update_bed(&mut self, bed: &Bed) -> Result<()> {
        let state = self.writable()?;
        let slot = state
            .beds
            .get_mut(&bed.id)
            .ok_or_else(|| missing("bed", bed.id))?;
        *slot = bed.clone();
        Ok(())
    }

    async fn delete_bed(&mut self, id: Uuid) -> Result<()> {
        self.writable()?.beds.remove(&id);
        Ok(())
    }

    async fn get_bed(&mut self, id: Uuid) -> Result<Option<Bed>> {
        Ok(self.working.beds.get(&id).cloned())
    }

    async fn lock_bed(&mut self, id: Uuid) -> Result<Option<Bed>> {
        self.writable()?;
        self.get_bed(id).await
    }

    async fn lock_beds(&mut self, filter: &BedFilter) -> Result<Vec<Bed>> {
        let state = self.writable()?;
        let mut beds = state.beds_matching(filter);
        beds.sort_by_key(|b| b.id);
        Ok(beds)
    }

    async fn find_bed_by_number(&mut self, room_id: Uuid, bed_number: &str) -> Result<Option<Bed>> {
        Ok(self
            .working
            .beds
            .values()
            .find(|b| b.room_id == room_id && b.bed_number == bed_number)
            .cloned())
    }

    async fn list_beds(&mut self, filter: &BedFilter) -> Result<Vec<Bed>> {
        let mut beds = self.working.beds_matching(filter);
        beds.sort_by(|a, b| a.bed_number.cmp(&b.bed_number).then(a.id.cmp(&b.id)));
        Ok(beds)
    }

    async fn insert_request(&mut self, request: &AdmissionRequest) -> Result<()> {
        self.writable()?
            .requests
            .insert(request.id, request.clone());
        Ok(())
    }

    async fn update_request(&mut self, request: &AdmissionRequest) -> Result<()> {
        let state = self.writable()?;
        let slot = state
            .requests
            .get_mut(&request.id)
            .ok_or_else(|| missing("admission request", request.id))?;
        *slot = request.clone();
        Ok(())
    }

    async fn get_request(&mut self, id: Uuid) -> Result<Option<AdmissionRequest>> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn lock_request(&mut self, id: Uuid) -> Result<Option<AdmissionRequest>> {
        self.writable()?;
        self.get_request(id).await
    }

    async fn list_requests(&mut self, filter: &AdmissionFilter) -> Result<Vec<AdmissionRequest>> {
        let mut requests: Vec<AdmissionRequest> = self
            .working
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by(triage_order);
        Ok(requests)
    }

    async fn insert_stay(&mut self, stay: &Stay) -> Result<()> {
        self.writable()?.stays.insert(stay.id, stay.clone());
        Ok(())
    }

    async fn update_stay(&mut self, stay: &Stay) -> Result<()> {
        let state = self.writable()?;
        let slot = state
            .stays
            .get_mut(&stay.id)
            .ok_or_else(|| missing("stay", stay.id))?;
        *slot = stay.clone();
        Ok(())
    }

    async fn get_stay(&mut self, id: Uuid) -> Result<Option<Stay>> {
        Ok(self.working.stays.get(&id).cloned())
    }

    async fn lock_stay(&mut self, id: Uuid) -> Result<Option<Stay>> {
        self.writable()?;
        self.get_stay(id).await
    }

    async fn active_stay_for_bed(&mut self, bed_id: Uuid) -> Result<Option<Stay>> {
        Ok(self
            .working
            .stays
            .values()
            .find(|s| s.is_active() && s.bed_id == bed_id)
            .cloned())
    }

    async fn active_stay_for_patient(&mut self, patient_id: Uuid) -> Result<Option<Stay>> {
        Ok(self
            .working
            .stays
            .values()
            .find(|s| s.is_active() && s.patient_id == patient_id)
            .cloned())
    }

    async fn count_active_stays_on_beds(&mut self, bed_ids: &[Uuid]) -> Result<u64> {
        Ok(self
            .working
            .stays
            .values()
            .filter(|s| s.is_active() && bed_ids.contains(&s.bed_id))
            .count() as u64)
    }

    async fn count_active_stays(&mut self) -> Result<u64> {
        Ok(self.working.stays.values().filter(|s| s.is_active()).count() as u64)
    }

    async fn list_stays(&mut self, filter: &StayFilter) -> Result<Vec<Stay>> {
        let mut stays: Vec<Stay> = self
            .working
            .stays
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        stays.sort_by(|a, b| a.admitted_at.cmp(&b.admitted_at).then(a.id.cmp(&b.id)));
        Ok(stays)
    }

    async fn insert_note(&mut self, note: &DailyNote) -> Result<()> {
        self.writable()?.notes.push(note.clone());
        Ok(())
    }

    async fn list_notes(&mut self, stay_id: Uuid, order: NoteOrder) -> Result<Vec<DailyNote>> {
        let mut notes: Vec<DailyNote> = self
            .working
            .notes
            .iter()
            .filter(|n| n.stay_id == stay_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order among equal timestamps.
        notes.sort_by_key(|n| n.created_at);
        if order == NoteOrder::NewestFirst {
            notes.reverse();
        }
        Ok(notes)
    }
}
