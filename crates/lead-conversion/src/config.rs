use crate::errors::ConversionError;
use crate::request::ConversionAction;
use crm_domain::AddressKind;
use record_store::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ENV_TIE_BREAK: &str = "CRM_TIE_BREAK";
pub const ENV_DEFAULT_ACTION: &str = "CRM_DEFAULT_ACTION";
pub const ENV_CONTACT_KIND: &str = "CRM_CONTACT_KIND";

/// Regla para elegir entre varias coincidencias de una búsqueda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
  /// El id más bajo (registro más antiguo). Determinista en cualquier almacén.
  #[default]
  LowestId,
  /// El primero en el orden devuelto por el almacén.
  StoreOrder,
}

impl TieBreak {
  pub fn pick(&self, ids: &[RecordId]) -> Option<RecordId> {
    match self {
      TieBreak::LowestId => ids.iter().min().copied(),
      TieBreak::StoreOrder => ids.first().copied(),
    }
  }
}

impl fmt::Display for TieBreak {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      TieBreak::LowestId => "lowest_id",
      TieBreak::StoreOrder => "store_order",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for TieBreak {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "lowest_id" => Ok(TieBreak::LowestId),
      "store_order" => Ok(TieBreak::StoreOrder),
      other => Err(format!("regla de desempate desconocida: {}", other)),
    }
  }
}

/// Configuración del flujo de conversión.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
  pub tie_break: TieBreak,
  /// Acción propuesta cuando no se encontró partner candidato.
  pub default_action: ConversionAction,
  /// Tipo de dirección del contacto creado con la acción `create`.
  pub contact_kind: AddressKind,
}

impl Default for ConversionConfig {
  fn default() -> Self {
    ConversionConfig { tie_break: TieBreak::LowestId,
                       default_action: ConversionAction::Exist,
                       contact_kind: AddressKind::Default }
  }
}

impl ConversionConfig {
  /// Lee la configuración del entorno (cargando `.env` si existe). Las
  /// variables ausentes toman el valor por defecto.
  pub fn from_env() -> Result<Self, ConversionError> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Igual que `from_env` pero con una función de búsqueda arbitraria.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConversionError>
    where F: Fn(&str) -> Option<String>
  {
    let mut config = ConversionConfig::default();
    if let Some(v) = lookup(ENV_TIE_BREAK) {
      config.tie_break = v.parse().map_err(|e| ConversionError::Config(format!("{}: {}", ENV_TIE_BREAK, e)))?;
    }
    if let Some(v) = lookup(ENV_DEFAULT_ACTION) {
      config.default_action = v.parse().map_err(|e| ConversionError::Config(format!("{}: {}", ENV_DEFAULT_ACTION, e)))?;
    }
    if let Some(v) = lookup(ENV_CONTACT_KIND) {
      config.contact_kind = v.parse().map_err(|e| ConversionError::Config(format!("{}: {}", ENV_CONTACT_KIND, e)))?;
    }
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  #[test]
  fn tie_break_pick() {
    let ids = [RecordId(9), RecordId(3), RecordId(5)];
    assert_eq!(TieBreak::LowestId.pick(&ids), Some(RecordId(3)));
    assert_eq!(TieBreak::StoreOrder.pick(&ids), Some(RecordId(9)));
    assert_eq!(TieBreak::LowestId.pick(&[]), None);
  }

  #[test]
  fn from_lookup_overrides_defaults() -> Result<(), ConversionError> {
    let env: HashMap<&str, &str> =
      [(ENV_TIE_BREAK, "store_order"), (ENV_DEFAULT_ACTION, "Create")].into_iter().collect();
    let config = ConversionConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()))?;
    assert_eq!(config.tie_break, TieBreak::StoreOrder);
    assert_eq!(config.default_action, ConversionAction::Create);
    assert_eq!(config.contact_kind, AddressKind::Default);
    Ok(())
  }

  #[test]
  fn from_lookup_rejects_unknown_values() {
    let res = ConversionConfig::from_lookup(|k| (k == ENV_DEFAULT_ACTION).then(|| "merge".to_string()));
    assert!(matches!(res, Err(ConversionError::Config(_))));
  }

  #[test]
  fn config_deserializes_with_defaults() -> Result<(), serde_json::Error> {
    let config: ConversionConfig = serde_json::from_str(r#"{"default_action": "create"}"#)?;
    assert_eq!(config.default_action, ConversionAction::Create);
    assert_eq!(config.tie_break, TieBreak::LowestId);
    Ok(())
  }
}
