//! Append-only daily notes

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use wardflow_models::{DailyNote, NewNote, NoteOrder};

use crate::auth::{Actor, Role};
use crate::db::{Store, TxMode};
use crate::{Error, Result};

#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn Store>,
}

impl NoteService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn add_note(
        &self,
        actor: &Actor,
        stay_id: Uuid,
        input: NewNote,
    ) -> Result<DailyNote> {
        let doctor_id = actor.require(Role::Doctor, "add note")?;
        input.validate()?;

        let mut tx = self.store.begin(TxMode::ReadWrite).await?;
        // Locking the stay orders the note against a concurrent discharge.
        let stay = tx
            .lock_stay(stay_id)
            .await?
            .ok_or_else(|| Error::not_found("stay", stay_id))?;
        if !stay.is_active() {
            return Err(Error::InvalidState(format!(
                "stay {stay_id} is {}; notes are closed",
                stay.status
            )));
        }

        let note = DailyNote {
            id: Uuid::new_v4(),
            stay_id,
            doctor_id,
            text: input.text,
            created_at: Utc::now(),
        };
        tx.insert_note(&note).await?;
        tx.commit().await?;

        tracing::info!(
            stay_id = %stay_id,
            note_id = %note.id,
            doctor_id = %doctor_id,
            "Note added"
        );
        Ok(note)
    }

    pub async fn list_notes(&self, stay_id: Uuid, order: NoteOrder) -> Result<Vec<DailyNote>> {
        let mut tx = self.store.begin(TxMode::Snapshot).await?;
        if tx.get_stay(stay_id).await?.is_none() {
            return Err(Error::not_found("stay", stay_id));
        }
        tx.list_notes(stay_id, order).await
    }
}
