use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;
use crate::slot;

use super::{Engine, EngineError};

/// Half-width of the window in which another reservation blocks a table.
pub const CONFLICT_RADIUS_MS: Ms = HOUR_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCheck {
    /// An existing reservation on the table falls inside the window.
    Conflict(Ulid),
    NoConflict,
}

/// `[slot - 1h, slot + 1h]` around `date` at `time`, both ends inclusive.
/// `None` when `time` is not `HH:MM`.
pub fn conflict_window(date: NaiveDate, time: &str) -> Option<Window> {
    slot::slot_instant(date, time).map(|at| Window::around(at, CONFLICT_RADIUS_MS))
}

/// First reservation on the table (in instant order) inside the window.
pub fn first_in_window<'a>(ts: &'a TableState, window: &Window) -> Option<&'a Reservation> {
    ts.within(window).next().map(|b| &b.reservation)
}

impl Engine {
    /// Would a reservation for `table` at `date` `time` collide with an
    /// existing one within an hour either side?
    ///
    /// This is a plain read. Nothing is held between this check and a later
    /// insert, so two concurrent requests can both see `NoConflict`.
    pub async fn check_conflict(
        &self,
        table: u32,
        date: NaiveDate,
        time: &str,
    ) -> Result<ConflictCheck, EngineError> {
        let window = conflict_window(date, time).ok_or(EngineError::Invalid("time"))?;
        Ok(match self.find_in_window(table, &window).await {
            Some(hit) => ConflictCheck::Conflict(hit.id),
            None => ConflictCheck::NoConflict,
        })
    }
}
