use crate::request::ConversionResult;
use record_store::{EntityType, RecordId};
use serde::{Deserialize, Serialize};

pub const ACT_WINDOW: &str = "ir.actions.act_window";

/// Descriptor de resultado que se entrega a la capa de presentación para
/// navegar a la vista del partner resultante. El núcleo no renderiza nada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerAction {
  #[serde(rename = "type")]
  pub kind: String,
  pub res_model: EntityType,
  /// Partner a abrir: el primero resuelto, si lo hay.
  pub res_id: Option<RecordId>,
  /// Todos los partners resueltos en el lote.
  pub partner_ids: Vec<RecordId>,
  pub view_mode: String,
}

impl PartnerAction {
  pub fn from_result(result: &ConversionResult) -> Self {
    Self { kind: ACT_WINDOW.to_string(),
           res_model: EntityType::Partner,
           res_id: result.first_partner(),
           partner_ids: result.resolved(),
           view_mode: "form,tree".to_string() }
  }
}
