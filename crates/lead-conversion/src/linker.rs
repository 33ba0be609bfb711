use crate::errors::ConversionError;
use crm_domain::Lead;
use record_store::{EntityType, Fields, RecordId, RecordStore, StoreError};
use std::sync::Arc;

/// Escribe en el lead el partner y el contacto resueltos.
pub struct LeadLinker {
  store: Arc<dyn RecordStore>,
}

impl LeadLinker {
  pub fn new(store: Arc<dyn RecordStore>) -> Self {
    Self { store }
  }

  /// Fija `partner_id` y/o `partner_address_id` en el lead. Sólo se escriben
  /// los valores presentes; si no hay ninguno no se llama al almacén.
  /// Reaplicar los mismos valores no cambia nada observable.
  pub fn link_lead_to_partner(&self,
                              lead_id: RecordId,
                              partner_id: Option<RecordId>,
                              contact_id: Option<RecordId>)
                              -> Result<(), ConversionError> {
    let mut values = Fields::new();
    if let Some(p) = partner_id {
      values.insert(Lead::PARTNER_FIELD.to_string(), p.into());
    }
    if let Some(c) = contact_id {
      values.insert(Lead::PARTNER_ADDRESS_FIELD.to_string(), c.into());
    }
    if values.is_empty() {
      return Ok(());
    }
    let written = self.store
                      .write(EntityType::Lead, &[lead_id], values)
                      .map_err(|e| ConversionError::write_failed(lead_id, e))?;
    if !written {
      return Err(ConversionError::write_failed(lead_id,
                                               StoreError::Rejected { entity: EntityType::Lead,
                                                                      reason: "write devolvió false".into() }));
    }
    log::debug!("lead {} enlazado a partner {:?} / contacto {:?}", lead_id, partner_id, contact_id);
    Ok(())
  }
}
