//! Request-level reservation operations.
//!
//! Each operation validates its inputs in a fixed order (required fields,
//! opening-hours slot, parsing) before touching the engine, and reports
//! failures as a [`ServiceError`] the HTTP layer turns into a status code.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ulid::Ulid;

use crate::engine::{ConflictCheck, Engine, EngineError};
use crate::model::{Reservation, ReservationDraft, Status};
use crate::observability;
use crate::slot;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("all reservation fields are required")]
    MissingFields,
    #[error("customer name is required")]
    MissingName,
    #[error("table, date and time are required")]
    MissingSlot,
    #[error("reservation id is required")]
    MissingId,
    #[error("time {0:?} is outside opening hours")]
    SlotNotAllowed(String),
    #[error("invalid table: {0}")]
    InvalidTable(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid {0}")]
    InvalidField(&'static str),
    #[error("table {table} already booked near {date} {time} (reservation {existing})")]
    Conflict {
        table: u32,
        date: NaiveDate,
        time: String,
        existing: Ulid,
    },
    #[error("reservation not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Storage(EngineError),
}

impl From<EngineError> for ServiceError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::NotFound(id) => ServiceError::NotFound(id.to_string()),
            EngineError::Invalid(field) => ServiceError::InvalidField(field),
            other => ServiceError::Storage(other),
        }
    }
}

/// A table number as the client sent it: JSON number or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableField {
    Number(i64),
    Text(String),
}

impl TableField {
    fn is_blank(&self) -> bool {
        match self {
            TableField::Number(n) => *n == 0,
            TableField::Text(s) => s.trim().is_empty(),
        }
    }

    fn parse(&self) -> Result<u32, ServiceError> {
        let invalid = || ServiceError::InvalidTable(self.to_string());
        let n = match self {
            TableField::Number(n) => *n,
            TableField::Text(s) => s.trim().parse().map_err(|_| invalid())?,
        };
        u32::try_from(n).ok().filter(|&t| t > 0).ok_or_else(invalid)
    }
}

impl std::fmt::Display for TableField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableField::Number(n) => write!(f, "{n}"),
            TableField::Text(s) => f.write_str(s),
        }
    }
}

/// Body of create and update requests. Every field is optional at this
/// level so a missing one yields our own error rather than a decode failure.
/// Portuguese field names are accepted as aliases; `status` is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPayload {
    #[serde(default, alias = "nome")]
    pub name: Option<String>,
    #[serde(default, alias = "mesa")]
    pub table: Option<TableField>,
    #[serde(default, alias = "data")]
    pub date: Option<String>,
    #[serde(default, alias = "contato")]
    pub contact: Option<String>,
    #[serde(default, alias = "horario")]
    pub time: Option<String>,
}

/// Query of the status-by-table and availability lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotQuery {
    #[serde(default, alias = "mesa")]
    pub table: Option<String>,
    #[serde(default, alias = "data")]
    pub date: Option<String>,
    #[serde(default, alias = "horario")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerQuery {
    #[serde(default, alias = "nome")]
    pub name: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    slot::parse_date(raw).ok_or_else(|| ServiceError::InvalidDate(raw.to_string()))
}

impl ReservationPayload {
    /// All five fields, non-empty, turned into a draft with `status`.
    fn into_draft(self, status: Status) -> Result<ReservationDraft, ServiceError> {
        let (Some(name), Some(table), Some(date), Some(contact), Some(time)) = (
            present(&self.name),
            self.table.as_ref().filter(|t| !t.is_blank()),
            present(&self.date),
            present(&self.contact),
            present(&self.time),
        ) else {
            return Err(ServiceError::MissingFields);
        };
        Ok(ReservationDraft {
            name: name.to_string(),
            table: table.parse()?,
            status,
            date: parse_date(date)?,
            contact: contact.to_string(),
            time: time.to_string(),
        })
    }

    fn is_complete(&self) -> bool {
        present(&self.name).is_some()
            && self.table.as_ref().is_some_and(|t| !t.is_blank())
            && present(&self.date).is_some()
            && present(&self.contact).is_some()
            && present(&self.time).is_some()
    }

    fn check_slot(&self) -> Result<(), ServiceError> {
        let time = self.time.as_deref().unwrap_or_default();
        if slot::is_allowed_slot(time) {
            Ok(())
        } else {
            Err(ServiceError::SlotNotAllowed(time.to_string()))
        }
    }
}

impl SlotQuery {
    fn parse(&self) -> Result<(u32, NaiveDate, &str), ServiceError> {
        let (Some(table), Some(date), Some(time)) =
            (present(&self.table), present(&self.date), present(&self.time))
        else {
            return Err(ServiceError::MissingSlot);
        };
        let table = TableField::Text(table.to_string()).parse()?;
        Ok((table, parse_date(date)?, time))
    }
}

fn parse_id(raw: Option<&str>) -> Result<Ulid, ServiceError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(ServiceError::MissingId)?;
    // An id we could never have issued is simply unknown.
    Ulid::from_string(raw).map_err(|_| ServiceError::NotFound(raw.to_string()))
}

#[derive(Clone)]
pub struct ReservationService {
    engine: Arc<Engine>,
}

impl ReservationService {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Create a reservation with status `Reservado`, unless the table is
    /// booked within an hour of the requested slot.
    ///
    /// The conflict check and the insert are separate engine calls; two
    /// overlapping requests racing each other can both get through.
    pub async fn create(&self, payload: ReservationPayload) -> Result<Reservation, ServiceError> {
        if !payload.is_complete() {
            return Err(ServiceError::MissingFields);
        }
        payload.check_slot()?;
        let draft = payload.into_draft(Status::Reservado)?;

        match self
            .engine
            .check_conflict(draft.table, draft.date, &draft.time)
            .await?
        {
            ConflictCheck::Conflict(existing) => {
                metrics::counter!(observability::CONFLICTS_TOTAL).increment(1);
                info!(table = draft.table, date = %draft.date, time = %draft.time, %existing, "reservation conflict");
                Err(ServiceError::Conflict {
                    table: draft.table,
                    date: draft.date,
                    time: draft.time,
                    existing,
                })
            }
            ConflictCheck::NoConflict => {
                let reservation = self.engine.insert(draft).await?;
                info!(id = %reservation.id, table = reservation.table, "reservation created");
                Ok(reservation)
            }
        }
    }

    pub async fn list(&self) -> Vec<Reservation> {
        self.engine.list().await
    }

    pub async fn list_by_customer(&self, query: &CustomerQuery) -> Result<Vec<Reservation>, ServiceError> {
        let name = present(&query.name).ok_or(ServiceError::MissingName)?;
        Ok(self.engine.find_by_name(name).await)
    }

    /// Status of an exact table/date/time slot.
    pub async fn status_by_table(&self, query: &SlotQuery) -> Result<Status, ServiceError> {
        let (table, date, time) = query.parse()?;
        Ok(self.engine.resolve_availability(table, date, time).await)
    }

    /// Same lookup as [`Self::status_by_table`], exposed as the availability check.
    pub async fn availability(&self, query: &SlotQuery) -> Result<Status, ServiceError> {
        self.status_by_table(query).await
    }

    /// Replace every field and reset the status to `Reservado`. No conflict
    /// check is made on update.
    pub async fn update(
        &self,
        id: Option<&str>,
        payload: ReservationPayload,
    ) -> Result<Reservation, ServiceError> {
        if id.is_none_or(|s| s.trim().is_empty()) {
            return Err(ServiceError::MissingId);
        }
        payload.check_slot()?;
        let draft = payload.into_draft(Status::Reservado)?;
        let id = parse_id(id)?;
        let reservation = self.engine.replace(id, draft).await?;
        info!(%id, table = reservation.table, "reservation updated");
        Ok(reservation)
    }

    /// Remove a reservation outright.
    pub async fn delete(&self, id: Option<&str>) -> Result<Reservation, ServiceError> {
        let id = parse_id(id)?;
        let removed = self.engine.remove(id).await?;
        info!(%id, table = removed.table, "reservation deleted");
        Ok(removed)
    }
}
