//! Core traits for allocation storage backends

use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;
use wardflow_models::{
    AdmissionFilter, AdmissionRequest, Bed, BedFilter, DailyNote, NoteOrder, Room, RoomFilter,
    Stay, StayFilter, Ward, WardFilter,
};

/// How a transaction may interact with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    /// Locks and writes allowed; changes become visible on commit.
    ReadWrite,
    /// Read-only view of one consistent point in time.
    Snapshot,
}

/// Entry point of a storage backend.
///
/// Every operation of the service layer runs inside exactly one transaction obtained
/// here. Backends must guarantee that a transaction dropped without `commit` leaves
/// no trace.
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self, mode: TxMode) -> Result<Box<dyn StoreTransaction>>;

    /// Short backend name for logs and the service info endpoint.
    fn backend_name(&self) -> &'static str;
}

/// Transaction context for atomic operations
///
/// `lock_*` methods read a row and hold a write lock on it until the transaction
/// ends. Callers lock request or stay rows before bed rows, and lock several beds
/// in ascending id order.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;

    // Wards

    async fn insert_ward(&mut self, ward: &Ward) -> Result<()>;
    async fn update_ward(&mut self, ward: &Ward) -> Result<()>;
    /// Removes the ward together with its rooms and beds.
    async fn delete_ward(&mut self, id: Uuid) -> Result<()>;
    async fn get_ward(&mut self, id: Uuid) -> Result<Option<Ward>>;
    /// Ordered by name, then id.
    async fn list_wards(&mut self, filter: &WardFilter) -> Result<Vec<Ward>>;

    // Rooms

    async fn insert_room(&mut self, room: &Room) -> Result<()>;
    async fn update_room(&mut self, room: &Room) -> Result<()>;
    /// Removes the room together with its beds.
    async fn delete_room(&mut self, id: Uuid) -> Result<()>;
    async fn get_room(&mut self, id: Uuid) -> Result<Option<Room>>;
    async fn find_room_by_number(&mut self, ward_id: Uuid, room_number: &str)
        -> Result<Option<Room>>;
    /// Ordered by room number, then id.
    async fn list_rooms(&mut self, filter: &RoomFilter) -> Result<Vec<Room>>;

    // Beds

    async fn insert_bed(&mut self, bed: &Bed) -> Result<()>;
    async fn update_bed(&mut self, bed: &Bed) -> Result<()>;
    async fn delete_bed(&mut self, id: Uuid) -> Result<()>;
    async fn get_bed(&mut self, id: Uuid) -> Result<Option<Bed>>;
    async fn lock_bed(&mut self, id: Uuid) -> Result<Option<Bed>>;
    /// Locks every bed matching `filter`, in ascending id order.
    async fn lock_beds(&mut self, filter: &BedFilter) -> Result<Vec<Bed>>;
    async fn find_bed_by_number(&mut self, room_id: Uuid, bed_number: &str) -> Result<Option<Bed>>;
    /// Ordered by bed number, then id.
    async fn list_beds(&mut self, filter: &BedFilter) -> Result<Vec<Bed>>;

    // Admission requests

    async fn insert_request(&mut self, request: &AdmissionRequest) -> Result<()>;
    async fn update_request(&mut self, request: &AdmissionRequest) -> Result<()>;
    async fn get_request(&mut self, id: Uuid) -> Result<Option<AdmissionRequest>>;
    async fn lock_request(&mut self, id: Uuid) -> Result<Option<AdmissionRequest>>;
    /// Ordered emergency first, then oldest first, then by id.
    async fn list_requests(&mut self, filter: &AdmissionFilter) -> Result<Vec<AdmissionRequest>>;

    // Stays

    async fn insert_stay(&mut self, stay: &Stay) -> Result<()>;
    async fn update_stay(&mut self, stay: &Stay) -> Result<()>;
    async fn get_stay(&mut self, id: Uuid) -> Result<Option<Stay>>;
    async fn lock_stay(&mut self, id: Uuid) -> Result<Option<Stay>>;
    async fn active_stay_for_bed(&mut self, bed_id: Uuid) -> Result<Option<Stay>>;
    async fn active_stay_for_patient(&mut self, patient_id: Uuid) -> Result<Option<Stay>>;
    /// Number of non-discharged stays on any of `bed_ids`.
    async fn count_active_stays_on_beds(&mut self, bed_ids: &[Uuid]) -> Result<u64>;
    async fn count_active_stays(&mut self) -> Result<u64>;
    /// Ordered by admission time, then id.
    async fn list_stays(&mut self, filter: &StayFilter) -> Result<Vec<Stay>>;

    // Notes

    async fn insert_note(&mut self, note: &DailyNote) -> Result<()>;
    /// Ties on `created_at` keep insertion order.
    async fn list_notes(&mut self, stay_id: Uuid, order: NoteOrder) -> Result<Vec<DailyNote>>;
}
