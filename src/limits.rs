//! Schema and capacity limits enforced by the engine on every write.

/// Customer name length, in characters.
pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 200;

/// Upper bound on stored reservations.
pub const MAX_RESERVATIONS: usize = 1_000_000;

/// Capacity of the WAL group-commit channel.
pub const WAL_CHANNEL_CAPACITY: usize = 4096;

/// Largest WAL entry payload replay will allocate for, in bytes.
pub const MAX_WAL_ENTRY_LEN: usize = 1 << 20;
