use std::path::PathBuf;
use std::time::Duration;

/// Name of the reservation collection; also the WAL file stem.
pub const COLLECTION: &str = "Reservas";

/// Server settings, read once from `MESAS_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub metrics_port: Option<u16>,
    pub compact_threshold: u64,
    pub compact_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3010,
            data_dir: PathBuf::from("./data"),
            metrics_port: None,
            compact_threshold: 1000,
            compact_interval: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable numbers fall back to defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind: get("MESAS_BIND").unwrap_or(defaults.bind),
            port: get("MESAS_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            data_dir: get("MESAS_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            metrics_port: get("MESAS_METRICS_PORT").and_then(|v| v.trim().parse().ok()),
            compact_threshold: get("MESAS_COMPACT_THRESHOLD")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.compact_threshold),
            compact_interval: get("MESAS_COMPACT_INTERVAL_SECS")
                .and_then(|v| v.trim().parse().ok())
                .map_or(defaults.compact_interval, Duration::from_secs),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(format!("{COLLECTION}.wal"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(lookup(&[]));
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.addr(), "0.0.0.0:3010");
        assert_eq!(cfg.wal_path(), PathBuf::from("./data/Reservas.wal"));
    }

    #[test]
    fn reads_overrides() {
        let cfg = Config::from_lookup(lookup(&[
            ("MESAS_BIND", "127.0.0.1"),
            ("MESAS_PORT", "8080"),
            ("MESAS_DATA_DIR", "/var/lib/mesas"),
            ("MESAS_METRICS_PORT", "9100"),
            ("MESAS_COMPACT_THRESHOLD", "50"),
            ("MESAS_COMPACT_INTERVAL_SECS", "5"),
        ]));
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.wal_path(), PathBuf::from("/var/lib/mesas/Reservas.wal"));
        assert_eq!(cfg.metrics_port, Some(9100));
        assert_eq!(cfg.compact_threshold, 50);
        assert_eq!(cfg.compact_interval, Duration::from_secs(5));
    }

    #[test]
    fn garbage_numbers_fall_back() {
        let cfg = Config::from_lookup(lookup(&[("MESAS_PORT", "http"), ("MESAS_METRICS_PORT", "x")]));
        assert_eq!(cfg.port, 3010);
        assert_eq!(cfg.metrics_port, None);
    }
}
