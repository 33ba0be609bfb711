use crate::config::TieBreak;
use crate::errors::ConversionError;
use crm_domain::{AddressKind, Contact, DomainError, EntityStore, JobFunction, Lead, Partner, StoredEntity};
use record_store::{EntityType, Filter, RecordId, RecordStore};
use std::sync::Arc;

/// Crea un partner nuevo y su contacto a partir de los datos de un lead.
///
/// No hay compensación: si el contacto falla tras crear el partner, el
/// partner queda creado salvo que el almacén deshaga la transacción.
pub struct PartnerCreator {
  store: Arc<dyn RecordStore>,
  contact_kind: AddressKind,
  tie_break: TieBreak,
}

impl PartnerCreator {
  pub fn new(store: Arc<dyn RecordStore>, contact_kind: AddressKind, tie_break: TieBreak) -> Self {
    Self { store, contact_kind, tie_break }
  }

  /// Devuelve `(partner_id, contact_id)` de los registros creados.
  pub fn create_partner_and_contact(&self, lead: &Lead) -> Result<(RecordId, RecordId), ConversionError> {
    let lead_id = lead.id
                      .ok_or_else(|| DomainError::ValidationError("el lead debe estar guardado para convertirlo".into()))?;

    let partner = Partner::new(lead.partner_display_name()).with_owner(lead.user_id)
                                                           .with_comment(lead.description.clone());
    let partner_id = self.store
                         .create(EntityType::Partner, partner.to_fields()?)
                         .map_err(|e| ConversionError::write_failed(lead_id, e))?;

    let function = self.resolve_function(lead)?;
    let contact = Contact { id: None,
                            partner_id: Some(partner_id),
                            kind: self.contact_kind,
                            name: Some(lead.name.clone()),
                            phone: lead.phone.clone(),
                            mobile: lead.mobile.clone(),
                            email: lead.email_from.clone(),
                            fax: lead.fax.clone(),
                            title: lead.title.clone(),
                            function,
                            street: lead.street.clone(),
                            street2: lead.street2.clone(),
                            zip: lead.zip.clone(),
                            city: lead.city.clone(),
                            country_id: lead.country_id,
                            state_id: lead.state_id };
    let contact_id = self.store
                         .create(EntityType::Contact, contact.to_fields()?)
                         .map_err(|e| ConversionError::write_failed(lead_id, e))?;

    log::info!("lead {}: creado partner {} con contacto {}", lead_id, partner_id, contact_id);
    Ok((partner_id, contact_id))
  }

  /// Puesto con nombre igual a `function_name`; `None` si no hay.
  fn resolve_function(&self, lead: &Lead) -> Result<Option<RecordId>, ConversionError> {
    let Some(function_name) = lead.function() else {
      return Ok(None);
    };
    let ids = self.store.search_ids::<JobFunction>(&[Filter::eq(JobFunction::NAME_FIELD, function_name)])?;
    let picked = self.tie_break.pick(&ids);
    if picked.is_none() {
      log::debug!("puesto '{}' no encontrado; el contacto queda sin puesto", function_name);
    }
    Ok(picked)
  }
}
