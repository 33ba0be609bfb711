use crate::DomainError;
use record_store::{EntityType, Fields, Filter, Record, RecordId, RecordStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Entidad del dominio CRM que se guarda como `Record` en un `RecordStore`.
///
/// La conversión se hace vía serde: los campos del registro más `id` forman
/// un objeto JSON que se deserializa en la entidad, y a la inversa.
pub trait StoredEntity: Serialize + DeserializeOwned + Sized {
  /// Tipo de entidad en el almacén.
  const ENTITY: EntityType;

  /// Id asignado por el almacén (`None` si aún no se ha guardado).
  fn id(&self) -> Option<RecordId>;

  /// Reconstruye la entidad a partir de un registro leído del almacén.
  fn from_record(record: &Record) -> Result<Self, DomainError> {
    if record.entity != Self::ENTITY {
      return Err(DomainError::ValidationError(format!("se esperaba un registro {} y se recibió {}",
                                                      Self::ENTITY,
                                                      record.entity)));
    }
    let mut map: serde_json::Map<String, JsonValue> =
      record.fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    map.insert("id".into(), JsonValue::from(record.id));
    Ok(serde_json::from_value(JsonValue::Object(map))?)
  }

  /// Campos a persistir (todo menos `id`).
  fn to_fields(&self) -> Result<Fields, DomainError> {
    match serde_json::to_value(self)? {
      JsonValue::Object(map) => Ok(map.into_iter().filter(|(k, _)| k != "id").collect()),
      other => Err(DomainError::SerializationError(format!("{} no se serializa como objeto: {}", Self::ENTITY, other))),
    }
  }
}

/// Acceso tipado a un `RecordStore`. Implementado para cualquier almacén,
/// incluido `dyn RecordStore`.
pub trait EntityStore {
  /// Lee entidades por id, en el orden solicitado.
  fn browse<E: StoredEntity>(&self, ids: &[RecordId]) -> Result<Vec<E>, DomainError>;

  /// Lee una única entidad.
  fn browse_one<E: StoredEntity>(&self, id: RecordId) -> Result<E, DomainError>;

  /// Busca ids de la entidad `E` que cumplan los filtros.
  fn search_ids<E: StoredEntity>(&self, filters: &[Filter]) -> Result<Vec<RecordId>, DomainError>;

  /// Crea la entidad y devuelve el id asignado por el almacén.
  fn insert<E: StoredEntity>(&self, entity: &E) -> Result<RecordId, DomainError>;

  /// Lee todas las entidades `E` (útil para listados y pruebas).
  fn list_all<E: StoredEntity>(&self) -> Result<Vec<E>, DomainError> {
    let ids = self.search_ids::<E>(&[])?;
    self.browse(&ids)
  }
}

impl<S> EntityStore for S where S: RecordStore + ?Sized
{
  fn browse<E: StoredEntity>(&self, ids: &[RecordId]) -> Result<Vec<E>, DomainError> {
    self.read(E::ENTITY, ids)?.iter().map(E::from_record).collect()
  }

  fn browse_one<E: StoredEntity>(&self, id: RecordId) -> Result<E, DomainError> {
    let record = self.read_one(E::ENTITY, id)?;
    E::from_record(&record)
  }

  fn search_ids<E: StoredEntity>(&self, filters: &[Filter]) -> Result<Vec<RecordId>, DomainError> {
    Ok(self.search(E::ENTITY, filters)?)
  }

  fn insert<E: StoredEntity>(&self, entity: &E) -> Result<RecordId, DomainError> {
    let fields = entity.to_fields()?;
    Ok(self.create(E::ENTITY, fields)?)
  }
}
