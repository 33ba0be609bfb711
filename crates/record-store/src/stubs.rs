// Archivo: stubs.rs
// Propósito: almacén de registros en memoria para pruebas y wiring rápido.
//
// No es durable. Además de implementar `RecordStore` lleva un diario de
// llamadas (para verificar qué consultas se emitieron) y admite "guardas" de
// escritura que permiten simular rechazos del almacén en los tests.
use crate::domain::{EntityType, Fields, Filter, Record, RecordId};
use crate::errors::{Result, StoreError};
use crate::repository::RecordStore;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Operación registrada en el diario del almacén en memoria.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Search { entity: EntityType, filters: Vec<Filter> },
    Read { entity: EntityType, ids: Vec<RecordId> },
    Create { entity: EntityType },
    Write { entity: EntityType, ids: Vec<RecordId> },
}

impl StoreCall {
    pub fn entity(&self) -> EntityType {
        match self {
            StoreCall::Search { entity, .. }
            | StoreCall::Read { entity, .. }
            | StoreCall::Create { entity }
            | StoreCall::Write { entity, .. } => *entity,
        }
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, StoreCall::Create { .. } | StoreCall::Write { .. })
    }
}

/// Intento de escritura que se presenta a las guardas antes de aplicarlo.
#[derive(Debug)]
pub struct WriteAttempt<'a> {
    pub entity: EntityType,
    /// Vacío para `create`.
    pub ids: &'a [RecordId],
    pub values: &'a Fields,
}

type WriteGuard = Box<dyn Fn(&WriteAttempt<'_>) -> Option<String> + Send + Sync>;

#[derive(Default)]
struct Tables {
    last_id: i64,
    records: HashMap<EntityType, BTreeMap<RecordId, Record>>,
}

/// Almacén en memoria. Las búsquedas devuelven ids en orden ascendente.
pub struct InMemoryRecordStore {
    tables: Mutex<Tables>,
    journal: Mutex<Vec<StoreCall>>,
    guards: Mutex<Vec<WriteGuard>>,
}

impl InMemoryRecordStore {
    /// Crea un almacén vacío.
    pub fn new() -> Self {
        Self { tables: Mutex::new(Tables::default()),
               journal: Mutex::new(Vec::new()),
               guards: Mutex::new(Vec::new()) }
    }

    /// Añade una guarda de escritura. Si la guarda devuelve `Some(motivo)`,
    /// el `create`/`write` falla con `StoreError::Rejected` sin modificar
    /// nada.
    pub fn with_write_guard<F>(self, guard: F) -> Self
        where F: Fn(&WriteAttempt<'_>) -> Option<String> + Send + Sync + 'static
    {
        self.add_write_guard(guard);
        self
    }

    /// Igual que `with_write_guard` pero sobre una instancia ya compartida.
    pub fn add_write_guard<F>(&self, guard: F)
        where F: Fn(&WriteAttempt<'_>) -> Option<String> + Send + Sync + 'static
    {
        self.guards.lock().unwrap_or_else(|e| e.into_inner()).push(Box::new(guard));
    }

    /// Copia del diario de llamadas.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.journal.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Vacía el diario de llamadas.
    pub fn clear_calls(&self) {
        self.journal.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Número de registros de una entidad.
    pub fn count(&self, entity: EntityType) -> Result<usize> {
        let tables = self.lock(&self.tables)?;
        Ok(tables.records.get(&entity).map(|t| t.len()).unwrap_or(0))
    }

    /// Helper para mapear `Mutex::lock()` en un `Result` con
    /// `StoreError::Storage`.
    fn lock<'a, T>(&'a self, m: &'a Mutex<T>) -> Result<MutexGuard<'a, T>> {
        m.lock().map_err(|e| StoreError::Storage(format!("mutex poisoned: {:?}", e)))
    }

    fn record_call(&self, call: StoreCall) {
        self.journal.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    fn check_guards(&self, attempt: &WriteAttempt<'_>) -> Result<()> {
        let guards = self.lock(&self.guards)?;
        for guard in guards.iter() {
            if let Some(reason) = guard(attempt) {
                log::debug!("escritura rechazada en {}: {}", attempt.entity, reason);
                return Err(StoreError::Rejected { entity: attempt.entity, reason });
            }
        }
        Ok(())
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn search(&self, entity: EntityType, filters: &[Filter]) -> Result<Vec<RecordId>> {
        self.record_call(StoreCall::Search { entity, filters: filters.to_vec() });
        let tables = self.lock(&self.tables)?;
        Ok(tables.records
                 .get(&entity)
                 .map(|t| t.values().filter(|r| r.matches(filters)).map(|r| r.id).collect())
                 .unwrap_or_default())
    }

    fn read(&self, entity: EntityType, ids: &[RecordId]) -> Result<Vec<Record>> {
        self.record_call(StoreCall::Read { entity, ids: ids.to_vec() });
        let tables = self.lock(&self.tables)?;
        let table = tables.records.get(&entity);
        ids.iter()
           .map(|id| {
               table.and_then(|t| t.get(id))
                    .cloned()
                    .ok_or(StoreError::NotFound { entity, id: *id })
           })
           .collect()
    }

    fn create(&self, entity: EntityType, values: Fields) -> Result<RecordId> {
        self.record_call(StoreCall::Create { entity });
        self.check_guards(&WriteAttempt { entity, ids: &[], values: &values })?;
        let mut tables = self.lock(&self.tables)?;
        tables.last_id += 1;
        let id = RecordId(tables.last_id);
        let now = Utc::now();
        let record = Record { id, entity, fields: values, created_at: now, updated_at: now };
        tables.records.entry(entity).or_default().insert(id, record);
        Ok(id)
    }

    fn write(&self, entity: EntityType, ids: &[RecordId], values: Fields) -> Result<bool> {
        self.record_call(StoreCall::Write { entity, ids: ids.to_vec() });
        self.check_guards(&WriteAttempt { entity, ids, values: &values })?;
        let mut tables = self.lock(&self.tables)?;
        let table = tables.records.entry(entity).or_default();
        // Validar todos los ids antes de tocar nada: la llamada es atómica.
        if let Some(missing) = ids.iter().find(|id| !table.contains_key(id)) {
            return Err(StoreError::NotFound { entity, id: *missing });
        }
        if values.is_empty() {
            return Ok(true);
        }
        let now = Utc::now();
        for id in ids {
            if let Some(record) = table.get_mut(id) {
                record.merge(&values);
                record.updated_at = now;
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn ids_are_increasing_across_entities() -> Result<()> {
        let store = InMemoryRecordStore::new();
        let a = store.create(EntityType::Partner, fields(&[("name", json!("A"))]))?;
        let b = store.create(EntityType::Contact, fields(&[("name", json!("B"))]))?;
        let c = store.create(EntityType::Partner, fields(&[("name", json!("C"))]))?;
        assert!(a < b && b < c);
        assert_eq!(store.count(EntityType::Partner)?, 2);
        Ok(())
    }

    #[test]
    fn write_with_unknown_id_changes_nothing() -> Result<()> {
        let store = InMemoryRecordStore::new();
        let a = store.create(EntityType::Lead, fields(&[("name", json!("A"))]))?;
        let res = store.write(EntityType::Lead, &[a, RecordId(99)], fields(&[("name", json!("Z"))]));
        assert_eq!(res, Err(StoreError::NotFound { entity: EntityType::Lead, id: RecordId(99) }));
        assert_eq!(store.read_one(EntityType::Lead, a)?.get("name"), &json!("A"));
        Ok(())
    }

    #[test]
    fn write_guard_rejects_without_mutation() -> Result<()> {
        let store = InMemoryRecordStore::new().with_write_guard(|w| {
                                                   if w.entity == EntityType::Partner {
                                                       Some("solo lectura".into())
                                                   } else {
                                                       None
                                                   }
                                               });
        let res = store.create(EntityType::Partner, fields(&[("name", json!("A"))]));
        assert!(matches!(res, Err(StoreError::Rejected { .. })));
        assert_eq!(store.count(EntityType::Partner)?, 0);
        assert!(store.create(EntityType::Lead, fields(&[("name", json!("L"))])).is_ok());
        Ok(())
    }

    #[test]
    fn mutex_poisoning_returns_error() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryRecordStore::new());
        let poisoned = store.clone();
        let handle = thread::spawn(move || {
            let _g = poisoned.tables.lock().unwrap();
            panic!("force poison");
        });
        let _ = handle.join();

        match store.search(EntityType::Partner, &[]) {
            Err(StoreError::Storage(_)) => (),
            other => panic!("expected Storage error, got {:?}", other),
        }
    }
}
