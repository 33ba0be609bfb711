use crate::config::TieBreak;
use crate::errors::ConversionError;
use crm_domain::{Contact, EntityStore, Lead, Partner};
use record_store::{Filter, RecordId, RecordStore};
use std::sync::Arc;

/// Busca un partner existente plausible para un lead.
///
/// Sólo lectura. Coincidencias por igualdad exacta:
/// 1. `res.partner.name` == `partner_name` del lead (o su `name`).
/// 2. si no hubo coincidencia y el lead tiene email, `res.partner.address.email`
///    == `email_from`; se devuelve el partner del contacto elegido.
pub struct PartnerMatcher {
  store: Arc<dyn RecordStore>,
  tie_break: TieBreak,
}

impl PartnerMatcher {
  pub fn new(store: Arc<dyn RecordStore>, tie_break: TieBreak) -> Self {
    Self { store, tie_break }
  }

  pub fn find_existing_partner(&self, lead: &Lead) -> Result<Option<RecordId>, ConversionError> {
    if let Some(partner_id) = self.match_by_name(lead)? {
      log::debug!("lead {:?}: partner {} encontrado por nombre", lead.id, partner_id);
      return Ok(Some(partner_id));
    }
    let found = self.match_by_email(lead)?;
    match found {
      Some(partner_id) => log::debug!("lead {:?}: partner {} encontrado por email", lead.id, partner_id),
      None => log::debug!("lead {:?}: sin partner candidato", lead.id),
    }
    Ok(found)
  }

  fn match_by_name(&self, lead: &Lead) -> Result<Option<RecordId>, ConversionError> {
    let name = lead.partner_display_name();
    if name.trim().is_empty() {
      return Ok(None);
    }
    let ids = self.store.search_ids::<Partner>(&[Filter::eq(Partner::NAME_FIELD, name)])?;
    Ok(self.tie_break.pick(&ids))
  }

  fn match_by_email(&self, lead: &Lead) -> Result<Option<RecordId>, ConversionError> {
    let Some(email) = lead.email() else {
      return Ok(None);
    };
    let ids = self.store.search_ids::<Contact>(&[Filter::eq(Contact::EMAIL_FIELD, email)])?;
    let Some(contact_id) = self.tie_break.pick(&ids) else {
      return Ok(None);
    };
    let contact: Contact = self.store.browse_one(contact_id)?;
    Ok(contact.partner_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crm_domain::DomainStubs;

  #[test]
  fn sample_leads_match_as_expected() -> Result<(), ConversionError> {
    let (store, ids) = DomainStubs::sample_store()?;
    let store: Arc<dyn RecordStore> = Arc::new(store);
    let matcher = PartnerMatcher::new(store.clone(), TieBreak::LowestId);

    let by_name: Lead = store.browse_one(ids.lead_by_name)?;
    assert_eq!(matcher.find_existing_partner(&by_name)?, Some(ids.acme));

    let by_email: Lead = store.browse_one(ids.lead_by_email)?;
    assert_eq!(matcher.find_existing_partner(&by_email)?, Some(ids.globex));

    let fresh: Lead = store.browse_one(ids.lead_new)?;
    assert_eq!(matcher.find_existing_partner(&fresh)?, None);
    Ok(())
  }

  #[test]
  fn lead_without_email_stops_after_name_search() -> Result<(), ConversionError> {
    let (store, _) = DomainStubs::sample_store()?;
    let store = Arc::new(store);
    let matcher = PartnerMatcher::new(store.clone(), TieBreak::LowestId);
    store.clear_calls();

    let lead = Lead::new("Nobody")?;
    assert_eq!(matcher.find_existing_partner(&lead)?, None);
    assert_eq!(store.calls().len(), 1);
    Ok(())
  }
}
