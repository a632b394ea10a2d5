use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::slot;

use super::{Engine, EngineError};

/// Schema checks applied to every write, whatever the caller validated.
pub(crate) fn validate_draft(draft: &ReservationDraft) -> Result<(), EngineError> {
    let name_len = draft.name.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len) {
        return Err(EngineError::Invalid("name"));
    }
    if draft.table == 0 {
        return Err(EngineError::Invalid("table"));
    }
    if draft.contact.trim().is_empty() {
        return Err(EngineError::Invalid("contact"));
    }
    if !slot::is_valid_time(&draft.time) {
        return Err(EngineError::Invalid("time"));
    }
    Ok(())
}

impl Engine {
    /// Store a new reservation under a fresh id.
    pub async fn insert(&self, draft: ReservationDraft) -> Result<Reservation, EngineError> {
        validate_draft(&draft)?;
        let _gate = self.write_gate.read().await;
        if self.len() >= MAX_RESERVATIONS {
            return Err(EngineError::LimitExceeded("too many reservations"));
        }

        let reservation = draft.into_reservation(Ulid::new());
        let ts = self.table_or_create(reservation.table);
        let mut guard = ts.write().await;
        let event = Event::ReservationCreated {
            reservation: reservation.clone(),
        };
        self.persist_and_apply(&mut [&mut *guard], &event).await?;
        Ok(reservation)
    }

    /// Replace every field of an existing reservation. The table may change.
    pub async fn replace(
        &self,
        id: Ulid,
        draft: ReservationDraft,
    ) -> Result<Reservation, EngineError> {
        validate_draft(&draft)?;
        let _gate = self.write_gate.read().await;
        let reservation = draft.into_reservation(id);
        let event = Event::ReservationUpdated {
            reservation: reservation.clone(),
        };

        loop {
            let old_table = self.table_for(&id).ok_or(EngineError::NotFound(id))?;
            let new_table = reservation.table;
            let old_ts = self.get_table(old_table).ok_or(EngineError::NotFound(id))?;

            if old_table == new_table {
                let mut guard = old_ts.write().await;
                if !guard.contains(id) {
                    continue;
                }
                self.persist_and_apply(&mut [&mut *guard], &event).await?;
            } else {
                let new_ts = self.table_or_create(new_table);
                // Lock in table order so two cross-table moves can't deadlock.
                let (mut old_guard, mut new_guard) = if old_table < new_table {
                    let o = old_ts.write().await;
                    (o, new_ts.write().await)
                } else {
                    let n = new_ts.write().await;
                    (old_ts.write().await, n)
                };
                if !old_guard.contains(id) {
                    continue;
                }
                self.persist_and_apply(&mut [&mut *old_guard, &mut *new_guard], &event)
                    .await?;
            }
            return Ok(reservation);
        }
    }

    /// Remove a reservation outright, returning what was stored.
    pub async fn remove(&self, id: Ulid) -> Result<Reservation, EngineError> {
        let _gate = self.write_gate.read().await;
        let (_, mut guard) = self.resolve_write(&id).await?;
        let removed = guard.get(id).cloned().ok_or(EngineError::NotFound(id))?;
        self.persist_and_apply(&mut [&mut *guard], &Event::ReservationDeleted { id })
            .await?;
        Ok(removed)
    }
}
