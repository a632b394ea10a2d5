mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;

pub use availability::{exact_matches, slot_status};
pub use conflict::{conflict_window, first_in_window, ConflictCheck, CONFLICT_RADIUS_MS};
pub use error::EngineError;

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, OwnedRwLockWriteGuard, RwLock};
use ulid::Ulid;

use crate::limits::WAL_CHANNEL_CAPACITY;
use crate::model::*;
use crate::observability;
use crate::wal::Wal;

pub type SharedTableState = Arc<RwLock<TableState>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Compact {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceCompact {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and group-commits appends: take the
/// first append, drain whatever else is already queued, then one fsync for
/// the whole batch.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let WalCommand::Append { event, response } = cmd else {
            handle_non_append(&mut wal, cmd);
            continue;
        };
        let mut batch = vec![(event, response)];
        let mut deferred = None;
        loop {
            match rx.try_recv() {
                Ok(WalCommand::Append { event, response }) => batch.push((event, response)),
                Ok(other) => {
                    deferred = Some(other);
                    break;
                }
                Err(_) => break,
            }
        }
        commit_batch(&mut wal, &mut batch);
        if let Some(other) = deferred {
            handle_non_append(&mut wal, other);
        }
    }
}

fn commit_batch(wal: &mut Wal, batch: &mut Vec<(Event, oneshot::Sender<io::Result<()>>)>) {
    metrics::histogram!(observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
    let started = std::time::Instant::now();
    let result = flush_batch(wal, batch);
    metrics::histogram!(observability::WAL_FLUSH_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
    for (_, tx) in batch.drain(..) {
        let r = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let append_err = batch
        .iter()
        .find_map(|(event, _)| wal.append_buffered(event).err());
    // Flush even after an append error so half-buffered bytes don't leak
    // into the next batch. Events buffered before the failing one reach disk
    // even though every caller in the batch gets the error, so they are
    // absent in memory yet come back on the next replay.
    let flush_err = wal.flush_sync().err();
    match append_err.or(flush_err) {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Compact { events, response } => {
            let result = Wal::write_compact_file(wal.path(), &events)
                .and_then(|()| wal.swap_compact_file());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceCompact { response } => {
            let _ = response.send(wal.appends_since_compact());
        }
        WalCommand::Append { .. } => unreachable!(),
    }
}

/// The "Reservas" collection: reservations grouped per table, each table
/// behind its own lock, plus a reverse index from reservation id to table.
pub struct Engine {
    pub tables: DashMap<u32, SharedTableState>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Reverse lookup: reservation id → table number.
    pub(super) id_to_table: DashMap<Ulid, u32>,
    /// Writers hold it shared from WAL append through apply; compaction holds
    /// it exclusively so the snapshot matches the log.
    pub(super) write_gate: RwLock<()>,
}

/// Apply an event to one table (caller holds the lock). An update that moves
/// a reservation is applied to the old table and then to the new one.
fn apply_to_table(ts: &mut TableState, event: &Event, id_map: &DashMap<Ulid, u32>) {
    match event {
        Event::ReservationCreated { reservation } => {
            if ts.insert(reservation.clone()) {
                id_map.insert(reservation.id, ts.table);
            }
        }
        Event::ReservationUpdated { reservation } => {
            ts.remove(reservation.id);
            if reservation.table == ts.table && ts.insert(reservation.clone()) {
                id_map.insert(reservation.id, ts.table);
            }
        }
        Event::ReservationDeleted { id } => {
            if ts.remove(*id).is_some() {
                id_map.remove(id);
            }
        }
    }
}

/// Tables an event touches, in the order it must be applied to them.
fn event_tables(event: &Event, id_map: &DashMap<Ulid, u32>) -> Vec<u32> {
    match event {
        Event::ReservationCreated { reservation } => vec![reservation.table],
        Event::ReservationUpdated { reservation } => {
            match id_map.get(&reservation.id).map(|t| *t) {
                Some(old) if old != reservation.table => vec![old, reservation.table],
                _ => vec![reservation.table],
            }
        }
        Event::ReservationDeleted { id } => id_map.get(id).map(|t| *t).into_iter().collect(),
    }
}

impl Engine {
    pub fn new(wal_path: PathBuf) -> io::Result<Self> {
        let (events, valid_len) = Wal::replay(&wal_path)?;
        let dropped = Wal::truncate(&wal_path, valid_len)?;
        if dropped > 0 {
            tracing::warn!("truncated {dropped} bytes of torn WAL tail at {}", wal_path.display());
        }
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(WAL_CHANNEL_CAPACITY);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let id_to_table = DashMap::new();
        let mut replayed: HashMap<u32, TableState> = HashMap::new();
        for event in &events {
            for table in event_tables(event, &id_to_table) {
                let ts = replayed
                    .entry(table)
                    .or_insert_with(|| TableState::new(table));
                apply_to_table(ts, event, &id_to_table);
            }
        }

        let engine = Self {
            tables: replayed
                .into_iter()
                .map(|(table, ts)| (table, Arc::new(RwLock::new(ts))))
                .collect(),
            wal_tx,
            id_to_table,
            write_gate: RwLock::new(()),
        };
        tracing::info!(
            "replayed {} events, {} reservations on {} tables",
            events.len(),
            engine.len(),
            engine.tables.len()
        );
        metrics::gauge!(observability::RESERVATIONS_STORED).set(engine.len() as f64);
        Ok(engine)
    }

    /// Number of stored reservations.
    pub fn len(&self) -> usize {
        self.id_to_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_table.is_empty()
    }

    /// Write event to WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub fn get_table(&self, table: u32) -> Option<SharedTableState> {
        self.tables.get(&table).map(|e| e.value().clone())
    }

    pub(super) fn table_or_create(&self, table: u32) -> SharedTableState {
        self.tables
            .entry(table)
            .or_insert_with(|| Arc::new(RwLock::new(TableState::new(table))))
            .clone()
    }

    pub fn table_for(&self, id: &Ulid) -> Option<u32> {
        self.id_to_table.get(id).map(|e| *e.value())
    }

    /// WAL-append, then apply to every locked table the event touches.
    pub(super) async fn persist_and_apply(
        &self,
        tables: &mut [&mut TableState],
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        for ts in tables.iter_mut() {
            apply_to_table(ts, event, &self.id_to_table);
        }
        metrics::gauge!(observability::RESERVATIONS_STORED).set(self.len() as f64);
        Ok(())
    }

    /// Resolve id → table and take that table's write lock. Retries when the
    /// reservation moved to another table while we waited for the lock.
    pub(super) async fn resolve_write(
        &self,
        id: &Ulid,
    ) -> Result<(u32, OwnedRwLockWriteGuard<TableState>), EngineError> {
        loop {
            let table = self.table_for(id).ok_or(EngineError::NotFound(*id))?;
            let ts = self.get_table(table).ok_or(EngineError::NotFound(*id))?;
            let guard = ts.write_owned().await;
            if guard.contains(*id) {
                return Ok((table, guard));
            }
        }
    }

    /// Rewrite the WAL as one `ReservationCreated` per live reservation.
    /// Returns the number of events written.
    pub async fn compact(&self) -> Result<usize, EngineError> {
        let _gate = self.write_gate.write().await;
        let events: Vec<Event> = self
            .list()
            .await
            .into_iter()
            .map(|reservation| Event::ReservationCreated { reservation })
            .collect();
        let written = events.len();
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))?;
        Ok(written)
    }

    pub async fn appends_since_compact(&self) -> Result<u64, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))
    }
}
