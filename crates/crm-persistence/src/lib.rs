//! Persistencia Diesel para el trait `record_store::RecordStore`.
//! Expone el módulo `schema` y el almacén `DieselRecordStore`; la
//! implementación está en `record_persistence.rs`.

mod record_persistence;
pub mod schema;

#[cfg(not(feature = "pg"))]
pub use record_persistence::new_sqlite_for_test;
pub use record_persistence::{new_from_env, DieselRecordStore, ENV_DB_URL};
