//! Per-principal OAuth credential records and the stores that persist them.
//!
//! Only provider identifiers, tokens and profile ids are ever stored here;
//! genotype results never reach a store.

pub mod file;
pub mod memory;
pub mod record;
pub mod sqlite;
pub mod store;

pub use {
    file::JsonFileCredentialStore,
    memory::MemoryCredentialStore,
    record::{ApiBase, CredentialRecord},
    sqlite::SqliteCredentialStore,
    store::CredentialStore,
};
