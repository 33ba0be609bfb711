use record_store::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Acción elegida por el usuario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionAction {
  /// Enlazar con un partner existente.
  #[default]
  Exist,
  /// Crear un partner nuevo (y su contacto).
  Create,
}

impl fmt::Display for ConversionAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConversionAction::Exist => "exist",
      ConversionAction::Create => "create",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for ConversionAction {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "exist" => Ok(ConversionAction::Exist),
      "create" => Ok(ConversionAction::Create),
      other => Err(format!("acción desconocida: {} (se espera exist|create)", other)),
    }
  }
}

/// Borrador de conversión de una interacción.
///
/// Sólo lo crea `ConversionOrchestrator::initiate`; el llamador ajusta la
/// acción y el partner elegido y lo entrega (por valor) a `execute`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRequest {
  interaction_id: Uuid,
  lead_ids: Vec<RecordId>,
  pub action: ConversionAction,
  pub selected_partner: Option<RecordId>,
}

impl ConversionRequest {
  pub(crate) fn draft(interaction_id: Uuid,
                      lead_ids: Vec<RecordId>,
                      action: ConversionAction,
                      selected_partner: Option<RecordId>)
                      -> Self {
    Self { interaction_id, lead_ids, action, selected_partner }
  }

  pub fn interaction_id(&self) -> Uuid {
    self.interaction_id
  }

  pub fn lead_ids(&self) -> &[RecordId] {
    &self.lead_ids
  }

  pub fn with_action(mut self, action: ConversionAction) -> Self {
    self.action = action;
    self
  }

  pub fn select_partner(mut self, partner_id: Option<RecordId>) -> Self {
    self.selected_partner = partner_id;
    self
  }
}

/// Partners resueltos, uno por lead procesado y en el mismo orden.
/// `None` cuando no había nada que asignar (acción `exist` sin partner).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
  pub partner_ids: Vec<Option<RecordId>>,
}

impl ConversionResult {
  pub fn len(&self) -> usize {
    self.partner_ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.partner_ids.is_empty()
  }

  /// Primer partner resuelto (destino de la vista de resultado).
  pub fn first_partner(&self) -> Option<RecordId> {
    self.partner_ids.iter().flatten().next().copied()
  }

  /// Partners resueltos sin huecos ni duplicados, en orden de aparición.
  pub fn resolved(&self) -> Vec<RecordId> {
    let mut out: Vec<RecordId> = Vec::new();
    for id in self.partner_ids.iter().flatten() {
      if !out.contains(id) {
        out.push(*id);
      }
    }
    out
  }
}
