use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::engine::Engine;

/// Background task that rewrites the WAL once enough appends pile up.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        if let Err(e) = compact_if_needed(&engine, threshold).await {
            tracing::error!("compaction failed: {e}");
        }
    }
}

/// Compact when at least `threshold` appends happened since the last
/// compaction. Returns whether it ran.
pub async fn compact_if_needed(
    engine: &Engine,
    threshold: u64,
) -> Result<bool, crate::engine::EngineError> {
    let appends = engine.appends_since_compact().await?;
    if appends < threshold {
        return Ok(false);
    }
    let written = engine.compact().await?;
    metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL).increment(1);
    info!("compacted WAL: {appends} appends -> {written} events");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ReservationDraft, Status};
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn test_wal_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("mesas_test_compactor");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }

    fn draft(time: &str) -> ReservationDraft {
        ReservationDraft {
            name: "Carla Dias".into(),
            table: 8,
            status: Status::Reservado,
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            contact: "carla@example.com".into(),
            time: time.into(),
        }
    }

    #[tokio::test]
    async fn compacts_only_past_threshold() {
        let engine = Engine::new(test_wal_path("threshold.wal")).unwrap();
        let r = engine.insert(draft("10:00")).await.unwrap();
        engine.replace(r.id, draft("11:00")).await.unwrap();

        assert!(!compact_if_needed(&engine, 3).await.unwrap());
        engine.replace(r.id, draft("12:00")).await.unwrap();
        assert!(compact_if_needed(&engine, 3).await.unwrap());
        assert_eq!(engine.appends_since_compact().await.unwrap(), 0);
        assert_eq!(engine.list().await.len(), 1);
    }
}
