use crate::action::PartnerAction;
use crate::config::ConversionConfig;
use crate::creator::PartnerCreator;
use crate::errors::ConversionError;
use crate::linker::LeadLinker;
use crate::matcher::PartnerMatcher;
use crate::request::{ConversionAction, ConversionRequest, ConversionResult};
use crm_domain::{EntityStore, Lead};
use record_store::{EntityType, RecordId, RecordStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Estado de una interacción de conversión.
///
/// `Init -> Suggesting -> Executing -> Completed`. Las precondiciones fallidas
/// llevan a `Rejected`; un partner inexistente o un fallo de escritura a
/// `Error`. `Rejected`, `Completed` y `Error` son terminales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionState {
  Init,
  Suggesting,
  Executing,
  Rejected,
  Completed,
  Error,
}

impl ConversionState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, ConversionState::Rejected | ConversionState::Completed | ConversionState::Error)
  }
}

impl fmt::Display for ConversionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConversionState::Init => "init",
      ConversionState::Suggesting => "suggesting",
      ConversionState::Executing => "executing",
      ConversionState::Rejected => "rejected",
      ConversionState::Completed => "completed",
      ConversionState::Error => "error",
    };
    write!(f, "{}", s)
  }
}

/// Coordina una interacción de conversión de leads en partners.
///
/// Cada instancia atiende una sola interacción: `initiate` valida y propone,
/// `execute` (o `make_partner`) aplica la decisión del usuario. Los leads del
/// lote se procesan en orden y el primer fallo de escritura detiene el lote
/// sin deshacer los leads ya enlazados.
pub struct ConversionOrchestrator {
  id: Uuid,
  state: ConversionState,
  lead_ids: Vec<RecordId>,
  config: ConversionConfig,
  store: Arc<dyn RecordStore>,
  matcher: PartnerMatcher,
  creator: PartnerCreator,
  linker: LeadLinker,
}

impl ConversionOrchestrator {
  pub fn new(store: Arc<dyn RecordStore>, config: ConversionConfig) -> Self {
    let matcher = PartnerMatcher::new(store.clone(), config.tie_break);
    let creator = PartnerCreator::new(store.clone(), config.contact_kind, config.tie_break);
    let linker = LeadLinker::new(store.clone());
    Self { id: Uuid::new_v4(),
           state: ConversionState::Init,
           lead_ids: Vec::new(),
           config,
           store,
           matcher,
           creator,
           linker }
  }

  /// Identificador de la interacción; viaja en el `ConversionRequest`.
  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn state(&self) -> ConversionState {
    self.state
  }

  pub fn config(&self) -> &ConversionConfig {
    &self.config
  }

  /// Abre la interacción para `lead_ids` y devuelve el borrador con la
  /// sugerencia inicial. No modifica el almacén.
  ///
  /// Los ids repetidos se descartan conservando la primera aparición, así
  /// cada lead se convierte una sola vez. Falla con `AlreadyLinked` si algún
  /// lead ya tiene partner.
  pub fn initiate(&mut self, lead_ids: &[RecordId]) -> Result<ConversionRequest, ConversionError> {
    if self.state != ConversionState::Init {
      return Err(self.invalid_state("initiate"));
    }
    if lead_ids.is_empty() {
      return Err(ConversionError::InvalidState("no hay leads que convertir".into()));
    }
    let lead_ids = unique_in_order(lead_ids);
    if let Err(e) = self.check_not_linked(&lead_ids) {
      self.fail(precondition_state(&e), &e);
      return Err(e);
    }

    let selected_partner = match self.suggest_partner(&lead_ids) {
      Ok(partner) => partner,
      Err(e) => {
        self.fail(ConversionState::Error, &e);
        return Err(e);
      }
    };
    let action = match selected_partner {
      Some(_) => ConversionAction::Exist,
      None => self.config.default_action,
    };
    self.lead_ids = lead_ids;
    self.transition(ConversionState::Suggesting);
    log::info!("interacción {}: {} lead(s), sugerencia {} / {:?}",
               self.id,
               self.lead_ids.len(),
               action,
               selected_partner);
    Ok(ConversionRequest::draft(self.id, self.lead_ids.clone(), action, selected_partner))
  }

  /// Partner sugerido para el lote: el candidato del primer lead, si lo hay.
  /// Sólo lectura; la capa de presentación puede llamarlo directamente.
  pub fn suggest_partner(&self, lead_ids: &[RecordId]) -> Result<Option<RecordId>, ConversionError> {
    let Some(first) = lead_ids.first() else {
      return Ok(None);
    };
    let lead: Lead = self.store.browse_one(*first)?;
    self.matcher.find_existing_partner(&lead)
  }

  /// Aplica la decisión del usuario a todos los leads de la interacción.
  ///
  /// Devuelve un partner por lead, en el mismo orden que `lead_ids`. Ante un
  /// `StoreWrite` el error lista en `converted` los leads ya enlazados.
  pub fn execute(&mut self, request: ConversionRequest) -> Result<ConversionResult, ConversionError> {
    if self.state != ConversionState::Suggesting {
      return Err(self.invalid_state("execute"));
    }
    if request.interaction_id() != self.id {
      return Err(ConversionError::InvalidState(format!("la petición pertenece a la interacción {}, no a {}",
                                                       request.interaction_id(),
                                                       self.id)));
    }

    // Los leads pudieron cambiar entre la sugerencia y la confirmación.
    if let Err(e) = self.check_not_linked(request.lead_ids()) {
      self.fail(precondition_state(&e), &e);
      return Err(e);
    }
    if request.action == ConversionAction::Exist {
      if let Some(partner_id) = request.selected_partner {
        match self.store.exists(EntityType::Partner, partner_id) {
          Ok(true) => {}
          Ok(false) => {
            let e = ConversionError::PartnerNotFound(partner_id);
            self.fail(ConversionState::Error, &e);
            return Err(e);
          }
          Err(e) => {
            let e = ConversionError::from(e);
            self.fail(ConversionState::Error, &e);
            return Err(e);
          }
        }
      }
    }

    self.transition(ConversionState::Executing);
    match self.convert_all(&request) {
      Ok(result) => {
        self.transition(ConversionState::Completed);
        log::info!("interacción {}: {} lead(s) convertidos con acción {}",
                   self.id,
                   result.len(),
                   request.action);
        Ok(result)
      }
      Err(e) => {
        self.fail(ConversionState::Error, &e);
        Err(e)
      }
    }
  }

  /// `execute` seguido del descriptor de la vista del partner resultante.
  pub fn make_partner(&mut self, request: ConversionRequest) -> Result<PartnerAction, ConversionError> {
    let result = self.execute(request)?;
    Ok(PartnerAction::from_result(&result))
  }

  fn convert_all(&self, request: &ConversionRequest) -> Result<ConversionResult, ConversionError> {
    let mut result = ConversionResult::default();
    let mut converted: Vec<RecordId> = Vec::new();
    for lead_id in request.lead_ids() {
      let partner_id = match self.convert_one(*lead_id, request) {
        Ok(partner_id) => partner_id,
        Err(ConversionError::StoreWrite { lead_id, source, .. }) => {
          return Err(ConversionError::StoreWrite { lead_id, converted, source });
        }
        Err(other) => return Err(other),
      };
      if partner_id.is_some() {
        converted.push(*lead_id);
      }
      result.partner_ids.push(partner_id);
    }
    Ok(result)
  }

  fn convert_one(&self, lead_id: RecordId, request: &ConversionRequest) -> Result<Option<RecordId>, ConversionError> {
    match request.action {
      ConversionAction::Create => {
        let lead: Lead = self.store.browse_one(lead_id)?;
        let (partner_id, contact_id) = self.creator.create_partner_and_contact(&lead)?;
        self.linker.link_lead_to_partner(lead_id, Some(partner_id), Some(contact_id))?;
        Ok(Some(partner_id))
      }
      ConversionAction::Exist => {
        let Some(partner_id) = request.selected_partner else {
          log::debug!("lead {}: acción exist sin partner, no se enlaza", lead_id);
          return Ok(None);
        };
        let contact_id = self.store.resolve_default_contact(partner_id)?;
        self.linker.link_lead_to_partner(lead_id, Some(partner_id), contact_id)?;
        Ok(Some(partner_id))
      }
    }
  }

  /// Lee los leads y falla con `AlreadyLinked` listando los que ya tienen
  /// partner.
  fn check_not_linked(&self, lead_ids: &[RecordId]) -> Result<(), ConversionError> {
    let leads: Vec<Lead> = self.store.browse(lead_ids)?;
    let linked: Vec<RecordId> = leads.iter().filter(|l| l.is_linked()).filter_map(|l| l.id).collect();
    if linked.is_empty() {
      Ok(())
    } else {
      Err(ConversionError::AlreadyLinked { lead_ids: linked })
    }
  }

  fn transition(&mut self, next: ConversionState) {
    log::debug!("interacción {}: {} -> {}", self.id, self.state, next);
    self.state = next;
  }

  fn fail(&mut self, next: ConversionState, error: &ConversionError) {
    log::warn!("interacción {}: {} -> {}: {}", self.id, self.state, next, error);
    self.state = next;
  }

  fn invalid_state(&self, operation: &str) -> ConversionError {
    ConversionError::InvalidState(format!("{} no permitido en estado {}", operation, self.state))
  }
}

/// `AlreadyLinked` rechaza la interacción; un fallo de lectura es un error.
fn precondition_state(error: &ConversionError) -> ConversionState {
  match error {
    ConversionError::AlreadyLinked { .. } => ConversionState::Rejected,
    _ => ConversionState::Error,
  }
}

fn unique_in_order(ids: &[RecordId]) -> Vec<RecordId> {
  let mut unique: Vec<RecordId> = Vec::with_capacity(ids.len());
  for id in ids {
    if !unique.contains(id) {
      unique.push(*id);
    }
  }
  unique
}
