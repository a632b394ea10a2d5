use chrono::NaiveDate;

use crate::model::*;

use super::Engine;

/// Reservations on the table at exactly `date` and `time`, in id order.
pub fn exact_matches<'a>(ts: &'a TableState, date: NaiveDate, time: &str) -> Vec<&'a Reservation> {
    let mut out: Vec<&Reservation> = ts
        .reservations()
        .filter(|r| r.matches_slot(ts.table, date, time))
        .collect();
    out.sort_by_key(|r| r.id);
    out
}

/// Status of a slot given its exact matches in id order: the first match's
/// stored status, or `Disponível` when there is none.
///
/// "First" is the earliest id (ULIDs sort by creation time). Several exact
/// matches can only exist through the check-then-insert race or updates,
/// and no other tie-break is applied.
pub fn slot_status(matches: &[Reservation]) -> Status {
    matches.first().map_or(Status::Disponivel, |r| r.status)
}

impl Engine {
    /// Exact-match lookup; no window. Read-only.
    pub async fn resolve_availability(&self, table: u32, date: NaiveDate, time: &str) -> Status {
        slot_status(&self.find_exact(table, date, time).await)
    }
}
