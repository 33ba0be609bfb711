//! Crate `record-store` — contrato de almacén de registros CRUD
//!
//! Este crate define los tipos básicos (`RecordId`, `EntityType`, `Record`,
//! `Filter`), el contrato de persistencia `RecordStore` y una implementación
//! en memoria útil para pruebas (`InMemoryRecordStore`).
//!
//! Diseño resumido:
//! - Almacén genérico: `search` / `read` / `create` / `write` sobre entidades
//!   identificadas por su nombre de almacén (`crm.lead`, `res.partner`, ...).
//! - Filtros de igualdad exacta; el orden de `search` lo define el almacén.
//! - Cada llamada es atómica; no hay transacciones entre llamadas.
//!
//! Ejemplo rápido:
//! ```rust
//! use record_store::{EntityType, Fields, Filter, InMemoryRecordStore, RecordStore};
//! let store = InMemoryRecordStore::new();
//! let mut fields = Fields::new();
//! fields.insert("name".into(), serde_json::json!("Acme Corp"));
//! let id = store.create(EntityType::Partner, fields).unwrap();
//! let found = store.search(EntityType::Partner, &[Filter::eq("name", "Acme Corp")]).unwrap();
//! assert_eq!(found, vec![id]);
//! ```
pub mod domain;
pub mod errors;
pub mod repository;
pub mod stubs;

pub use domain::*;
pub use errors::*;
pub use repository::*;
pub use stubs::*;
