use crm_domain::DomainError;
use record_store::{RecordId, StoreError};
use thiserror::Error;

// Errores del flujo de conversión lead -> partner.
//
// `AlreadyLinked` y `PartnerNotFound` se detectan antes de modificar nada.
// `StoreWrite` detiene el lote en el lead que falló; `converted` lista los
// leads que ya quedaron enlazados antes del fallo.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
  /// Algún lead del lote ya tiene partner.
  #[error("Ya hay un partner definido en los leads: {}", join_ids(.lead_ids))]
  AlreadyLinked { lead_ids: Vec<RecordId> },

  /// Una llamada `create`/`write` al almacén falló.
  #[error("Error de escritura al convertir el lead {lead_id} (ya convertidos: [{}]): {source}", join_ids(.converted))]
  StoreWrite {
    lead_id: RecordId,
    converted: Vec<RecordId>,
    #[source]
    source: StoreError,
  },

  /// El partner elegido por el usuario no existe.
  #[error("El partner seleccionado no existe: {0}")]
  PartnerNotFound(RecordId),

  /// Uso del orquestador fuera de secuencia.
  #[error("Estado inválido: {0}")]
  InvalidState(String),

  /// Configuración inválida (variables de entorno).
  #[error("Error de configuración: {0}")]
  Config(String),

  /// Errores de lectura del almacén.
  #[error("Error del almacén: {0}")]
  Store(#[from] StoreError),

  /// Errores del dominio CRM (validación, serialización).
  #[error("Error de dominio: {0}")]
  Domain(#[from] DomainError),
}

impl ConversionError {
  pub(crate) fn write_failed(lead_id: RecordId, source: StoreError) -> Self {
    ConversionError::StoreWrite { lead_id, converted: Vec::new(), source }
  }

  /// Leads que quedaron modificados antes del error (sólo `StoreWrite`).
  pub fn converted_leads(&self) -> &[RecordId] {
    match self {
      ConversionError::StoreWrite { converted, .. } => converted,
      _ => &[],
    }
  }
}

fn join_ids(ids: &[RecordId]) -> String {
  ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}
