//! Settings persistence, backed by libSQL or memory.

pub mod libsql_backend;
pub mod memory;
pub(crate) mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlStore;
pub use memory::MemoryStore;
pub use traits::{SettingsStore, settings_keys};
