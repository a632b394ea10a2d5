pub mod api;
pub mod compactor;
pub mod config;
pub mod engine;
pub mod form;
pub mod limits;
pub mod model;
pub mod observability;
pub mod service;
pub mod slot;
pub mod wal;
