// Archivo: domain.rs
// Propósito: tipos básicos compartidos por todos los almacenes de registros:
// identificadores, tipos de entidad, registros y filtros de búsqueda.
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// Identificador de registro asignado por el almacén. Siempre positivo y
/// creciente dentro de un mismo almacén.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    pub fn get(self) -> i64 {
        self.0
    }

    /// Interpreta un valor JSON de referencia (many2one). `null`, `false`,
    /// `0` o cualquier valor no numérico equivalen a "sin referencia".
    pub fn from_json(value: &JsonValue) -> Option<RecordId> {
        value.as_i64().filter(|v| *v > 0).map(RecordId)
    }
}

/// `deserialize_with` para campos many2one `Option<RecordId>`: aplica las
/// mismas reglas que `RecordId::from_json` (`null`, `false` y `0` son `None`).
pub fn deserialize_reference<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
    where D: Deserializer<'de>
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(RecordId::from_json(&value))
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(RecordId)
    }
}

impl From<RecordId> for JsonValue {
    fn from(id: RecordId) -> Self {
        JsonValue::from(id.0)
    }
}

/// Tipos de entidad que el núcleo de conversión maneja en el almacén.
///
/// El nombre de almacén (`store_name`) es estable y lo comparten todos los
/// backends (memoria, Diesel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    #[serde(rename = "crm.lead")]
    Lead,
    #[serde(rename = "res.partner")]
    Partner,
    #[serde(rename = "res.partner.address")]
    Contact,
    #[serde(rename = "res.partner.function")]
    JobFunction,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [EntityType::Lead, EntityType::Partner, EntityType::Contact, EntityType::JobFunction];

    pub fn store_name(&self) -> &'static str {
        match self {
            EntityType::Lead => "crm.lead",
            EntityType::Partner => "res.partner",
            EntityType::Contact => "res.partner.address",
            EntityType::JobFunction => "res.partner.function",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.store_name())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL.iter()
                       .copied()
                       .find(|e| e.store_name() == s)
                       .ok_or_else(|| format!("tipo de entidad desconocido: {}", s))
    }
}

/// Valores de campos de un registro, en orden de inserción.
pub type Fields = IndexMap<String, JsonValue>;

/// Registro completo devuelto por `RecordStore::read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub entity: EntityType,
    pub fields: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Valor de un campo; `Null` si el campo no existe.
    pub fn get(&self, field: &str) -> &JsonValue {
        self.fields.get(field).unwrap_or(&JsonValue::Null)
    }

    /// Referencia many2one almacenada en `field`, si existe.
    pub fn reference(&self, field: &str) -> Option<RecordId> {
        RecordId::from_json(self.get(field))
    }

    /// Aplica `values` sobre los campos actuales (merge por clave).
    pub fn merge(&mut self, values: &Fields) {
        for (k, v) in values {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Comprueba si el registro satisface todos los filtros.
    pub fn matches(&self, filters: &[Filter]) -> bool {
        filters.iter().all(|f| f.matches(self))
    }
}

/// Predicado de igualdad exacta sobre un campo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: JsonValue,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self { field: field.into(), value: value.into() }
    }

    /// Igualdad exacta. Un campo ausente se compara como `null`.
    pub fn matches(&self, record: &Record) -> bool {
        record.get(&self.field) == &self.value
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} = {})", self.field, self.value)
    }
}
