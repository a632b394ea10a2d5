use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::slot;

/// Unix milliseconds (UTC), the only instant type.
pub type Ms = i64;

pub const HOUR_MS: Ms = 3_600_000;

/// Closed interval `[start, end]` on the slot timeline. Both ends count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Ms,
    pub end: Ms,
}

impl Window {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start <= end, "Window start must not be after end");
        Self { start, end }
    }

    /// Symmetric window of `radius` on each side of `at`.
    pub fn around(at: Ms, radius: Ms) -> Self {
        Self::new(at - radius, at + radius)
    }

    pub fn contains(&self, t: Ms) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Reservation status as stored and reported on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Reservado,
    Ocupado,
    #[default]
    #[serde(rename = "Disponível")]
    Disponivel,
    Cancelado,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Reservado => "Reservado",
            Status::Ocupado => "Ocupado",
            Status::Disponivel => "Disponível",
            Status::Cancelado => "Cancelado",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record binding a customer to a table for a date and time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub name: String,
    pub table: u32,
    pub status: Status,
    pub date: NaiveDate,
    pub contact: String,
    pub time: String,
}

impl Reservation {
    /// Instant of the booked slot, or `None` if `time` is not `HH:MM`.
    pub fn slot_at(&self) -> Option<Ms> {
        slot::slot_instant(self.date, &self.time)
    }

    pub fn matches_slot(&self, table: u32, date: NaiveDate, time: &str) -> bool {
        self.table == table && self.date == date && self.time == time
    }
}

/// Everything of a reservation except its id. This is what gets written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDraft {
    pub name: String,
    pub table: u32,
    pub status: Status,
    pub date: NaiveDate,
    pub contact: String,
    pub time: String,
}

impl ReservationDraft {
    pub fn into_reservation(self, id: Ulid) -> Reservation {
        Reservation {
            id,
            name: self.name,
            table: self.table,
            status: self.status,
            date: self.date,
            contact: self.contact,
            time: self.time,
        }
    }
}

/// A reservation placed on its table's timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub at: Ms,
    pub reservation: Reservation,
}

/// All reservations of one table, sorted by slot instant.
#[derive(Debug, Clone)]
pub struct TableState {
    pub table: u32,
    pub bookings: Vec<Booking>,
}

impl TableState {
    pub fn new(table: u32) -> Self {
        Self {
            table,
            bookings: Vec::new(),
        }
    }

    /// Insert maintaining sort order by instant; equal instants keep
    /// insertion order. Records without a parseable time are not indexed.
    pub fn insert(&mut self, reservation: Reservation) -> bool {
        let Some(at) = reservation.slot_at() else {
            return false;
        };
        let pos = self.bookings.partition_point(|b| b.at <= at);
        self.bookings.insert(pos, Booking { at, reservation });
        true
    }

    pub fn remove(&mut self, id: Ulid) -> Option<Reservation> {
        let pos = self.bookings.iter().position(|b| b.reservation.id == id)?;
        Some(self.bookings.remove(pos).reservation)
    }

    pub fn get(&self, id: Ulid) -> Option<&Reservation> {
        self.reservations().find(|r| r.id == id)
    }

    pub fn contains(&self, id: Ulid) -> bool {
        self.get(id).is_some()
    }

    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.bookings.iter().map(|b| &b.reservation)
    }

    /// Bookings whose instant lies inside the closed window, in instant order.
    pub fn within(&self, window: &Window) -> impl Iterator<Item = &Booking> {
        let lo = self.bookings.partition_point(|b| b.at < window.start);
        let hi = self.bookings.partition_point(|b| b.at <= window.end);
        self.bookings[lo..hi.max(lo)].iter()
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

/// The event types: flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ReservationCreated { reservation: Reservation },
    ReservationUpdated { reservation: Reservation },
    ReservationDeleted { id: Ulid },
}
