// Archivo: repository.rs
// Propósito: definir el trait `RecordStore`, el contrato CRUD genérico que
// consume el núcleo de conversión. Lo implementan el almacén en memoria
// (`stubs`) y el backend Diesel (`crm-persistence`).
use crate::domain::{EntityType, Fields, Filter, Record, RecordId};
use crate::errors::Result;
use serde_json::json;

/// Campo de los contactos que referencia al partner propietario.
pub const CONTACT_PARTNER_FIELD: &str = "partner_id";
/// Campo de los contactos con el tipo de dirección.
pub const CONTACT_KIND_FIELD: &str = "type";
/// Tipo de dirección considerado "por defecto".
pub const DEFAULT_CONTACT_KIND: &str = "default";

/// Contrato mínimo del almacén de registros.
///
/// Cada llamada es atómica por sí misma; el trait no ofrece transacciones
/// que abarquen varias llamadas.
pub trait RecordStore: Send + Sync {
    /// Busca registros de `entity` que cumplan todos los `filters` (igualdad
    /// exacta). El orden es el del almacén.
    fn search(&self, entity: EntityType, filters: &[Filter]) -> Result<Vec<RecordId>>;

    /// Lee registros completos en el orden solicitado. Un id inexistente
    /// produce `StoreError::NotFound`.
    fn read(&self, entity: EntityType, ids: &[RecordId]) -> Result<Vec<Record>>;

    /// Crea un registro y devuelve el id asignado.
    fn create(&self, entity: EntityType, values: Fields) -> Result<RecordId>;

    /// Escribe `values` sobre cada registro de `ids`. Un id inexistente
    /// produce `StoreError::NotFound`.
    fn write(&self, entity: EntityType, ids: &[RecordId], values: Fields) -> Result<bool>;

    /// Resuelve el contacto por defecto de un partner: el contacto de menor
    /// id con `type = "default"`; si no hay, el contacto de menor id del
    /// partner; si el partner no tiene contactos, `None`.
    fn resolve_default_contact(&self, partner_id: RecordId) -> Result<Option<RecordId>> {
        let owned = Filter::eq(CONTACT_PARTNER_FIELD, partner_id);
        let defaults = self.search(EntityType::Contact,
                                   &[owned.clone(), Filter::eq(CONTACT_KIND_FIELD, json!(DEFAULT_CONTACT_KIND))])?;
        if let Some(id) = defaults.into_iter().min() {
            return Ok(Some(id));
        }
        Ok(self.search(EntityType::Contact, &[owned])?.into_iter().min())
    }

    /// Lee un único registro.
    fn read_one(&self, entity: EntityType, id: RecordId) -> Result<Record> {
        let mut records = self.read(entity, &[id])?;
        records.pop().ok_or(crate::errors::StoreError::NotFound { entity, id })
    }

    /// Verifica si existe un registro con el id dado.
    fn exists(&self, entity: EntityType, id: RecordId) -> Result<bool> {
        match self.read(entity, &[id]) {
            Ok(records) => Ok(!records.is_empty()),
            Err(crate::errors::StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
