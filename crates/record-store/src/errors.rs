// Archivo: errors.rs
// Propósito: definir los errores del almacén de registros y el alias
// Result<T> usado por las APIs del crate.
use crate::domain::{EntityType, RecordId};
use thiserror::Error;

/// Errores comunes del almacén de registros.
///
/// - `NotFound`: registro inexistente para la entidad indicada.
/// - `Rejected`: el almacén rechazó un `create`/`write` (restricción, permisos).
/// - `Storage`: error al acceder al backend (BD, pool, mutex).
/// - `Serialization`: los campos no pudieron (de)serializarse.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Registro no encontrado.
    #[error("No encontrado: {entity} #{id}")]
    NotFound { entity: EntityType, id: RecordId },
    /// El almacén se negó a crear o escribir el registro.
    #[error("Escritura rechazada en {entity}: {reason}")]
    Rejected { entity: EntityType, reason: String },
    /// Error genérico de almacenamiento.
    #[error("Error de almacenamiento: {0}")]
    Storage(String),
    /// Error de serialización de campos.
    #[error("Error de serialización: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Indica si el error proviene de una operación de escritura rechazada.
    pub fn is_rejection(&self) -> bool {
        matches!(self, StoreError::Rejected { .. })
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Alias de resultado usado por las APIs del crate.
pub type Result<T> = std::result::Result<T, StoreError>;
