use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::availability::exact_matches;
use super::conflict::first_in_window;
use super::{Engine, SharedTableState};

impl Engine {
    fn table_handles(&self) -> Vec<SharedTableState> {
        self.tables.iter().map(|e| e.value().clone()).collect()
    }

    /// Every reservation matching `pred`, in creation (id) order.
    async fn scan(&self, pred: impl Fn(&Reservation) -> bool) -> Vec<Reservation> {
        let mut out = Vec::new();
        for ts in self.table_handles() {
            let guard = ts.read().await;
            out.extend(guard.reservations().filter(|r| pred(r)).cloned());
        }
        out.sort_by_key(|r| r.id);
        out
    }

    pub async fn list(&self) -> Vec<Reservation> {
        self.scan(|_| true).await
    }

    pub async fn get(&self, id: Ulid) -> Option<Reservation> {
        let ts = self.get_table(self.table_for(&id)?)?;
        let guard = ts.read().await;
        guard.get(id).cloned()
    }

    /// Exact, case-sensitive customer name match.
    pub async fn find_by_name(&self, name: &str) -> Vec<Reservation> {
        self.scan(|r| r.name == name).await
    }

    /// Reservations on `table` at exactly `date` and `time`, in id order.
    pub async fn find_exact(&self, table: u32, date: NaiveDate, time: &str) -> Vec<Reservation> {
        let Some(ts) = self.get_table(table) else {
            return Vec::new();
        };
        let guard = ts.read().await;
        exact_matches(&guard, date, time).into_iter().cloned().collect()
    }

    /// First reservation on `table` whose slot instant lies in `window`.
    pub async fn find_in_window(&self, table: u32, window: &Window) -> Option<Reservation> {
        let ts = self.get_table(table)?;
        let guard = ts.read().await;
        first_in_window(&guard, window).cloned()
    }
}
