use crm_domain::{Contact, DomainStubs, EntityStore, Lead, Partner};
use lead_conversion::{ConversionAction, ConversionConfig, ConversionError, ConversionOrchestrator, ConversionState,
                      PartnerMatcher, TieBreak};
use record_store::{EntityType, InMemoryRecordStore, RecordId, StoreCall};
use std::sync::Arc;

fn orchestrator(store: &Arc<InMemoryRecordStore>) -> ConversionOrchestrator {
  ConversionOrchestrator::new(store.clone(), ConversionConfig::default())
}

#[test]
fn already_linked_lead_is_rejected_without_changes() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let before: Lead = store.browse_one(ids.lead_linked)?;
  store.clear_calls();

  let mut orch = orchestrator(&store);
  let res = orch.initiate(&[ids.lead_new, ids.lead_linked]);

  assert_eq!(res.err(), Some(ConversionError::AlreadyLinked { lead_ids: vec![ids.lead_linked] }));
  assert_eq!(orch.state(), ConversionState::Rejected);
  assert!(store.calls().iter().all(|c| !c.is_mutation()));
  let after: Lead = store.browse_one(ids.lead_linked)?;
  assert_eq!(before, after);
  Ok(())
}

#[test]
fn lead_linked_between_initiate_and_execute_is_rejected() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_new])?;

  // Otro usuario asigna partner mientras se decide.
  let mut linked = record_store::Fields::new();
  linked.insert(Lead::PARTNER_FIELD.to_string(), ids.globex.into());
  record_store::RecordStore::write(store.as_ref(), EntityType::Lead, &[ids.lead_new], linked)?;
  let partners_before = store.count(EntityType::Partner)?;

  let res = orch.execute(request.with_action(ConversionAction::Create));
  assert!(matches!(res, Err(ConversionError::AlreadyLinked { .. })));
  assert_eq!(orch.state(), ConversionState::Rejected);
  assert_eq!(store.count(EntityType::Partner)?, partners_before);
  Ok(())
}

#[test]
fn name_match_skips_email_search() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let matcher = PartnerMatcher::new(store.clone(), TieBreak::LowestId);

  let lead = Lead::new("Jane")?.with_partner_name("Acme Corp").with_email("hank@globex.test");
  store.clear_calls();
  assert_eq!(matcher.find_existing_partner(&lead)?, Some(ids.acme));

  let contact_searches = store.calls()
                              .into_iter()
                              .filter(|c| matches!(c, StoreCall::Search { entity: EntityType::Contact, .. }))
                              .count();
  assert_eq!(contact_searches, 0);
  Ok(())
}

#[test]
fn email_match_returns_contact_owner() -> Result<(), ConversionError> {
  let store = Arc::new(InMemoryRecordStore::new());
  let owner = store.insert(&Partner::new("P"))?;
  store.insert(&Contact::new(owner, "Alice").with_email("a@b.com"))?;
  let matcher = PartnerMatcher::new(store.clone(), TieBreak::LowestId);

  let lead = Lead::new("Unrelated")?.with_email("a@b.com");
  assert_eq!(matcher.find_existing_partner(&lead)?, Some(owner));
  Ok(())
}

#[test]
fn create_builds_partner_and_contact_and_links_lead() -> Result<(), ConversionError> {
  let store = Arc::new(InMemoryRecordStore::new());
  let lead_id = store.insert(&Lead::new("Jane")?.with_partner_name("X"))?;

  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[lead_id])?;
  assert_eq!(request.selected_partner, None);
  let result = orch.execute(request.with_action(ConversionAction::Create))?;
  assert_eq!(orch.state(), ConversionState::Completed);

  let partner_id = result.first_partner().ok_or_else(|| ConversionError::InvalidState("sin partner".into()))?;
  let partner: Partner = store.browse_one(partner_id)?;
  assert_eq!(partner.name, "X");

  let lead: Lead = store.browse_one(lead_id)?;
  assert_eq!(lead.partner_id, Some(partner_id));
  let contact_id = lead.partner_address_id.ok_or_else(|| ConversionError::InvalidState("sin contacto".into()))?;
  let contact: Contact = store.browse_one(contact_id)?;
  assert_eq!(contact.name.as_deref(), Some("Jane"));
  assert_eq!(contact.partner_id, Some(partner_id));
  Ok(())
}

#[test]
fn exist_links_selected_partner_and_default_contact() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let partners = store.count(EntityType::Partner)?;
  let contacts = store.count(EntityType::Contact)?;

  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_by_name])?;
  assert_eq!(request.action, ConversionAction::Exist);
  assert_eq!(request.selected_partner, Some(ids.acme));
  let result = orch.execute(request)?;

  assert_eq!(result.partner_ids, vec![Some(ids.acme)]);
  let lead: Lead = store.browse_one(ids.lead_by_name)?;
  assert_eq!(lead.partner_id, Some(ids.acme));
  assert_eq!(lead.partner_address_id, Some(ids.acme_contact));
  assert_eq!(store.count(EntityType::Partner)?, partners);
  assert_eq!(store.count(EntityType::Contact)?, contacts);
  Ok(())
}

#[test]
fn exist_falls_back_to_any_contact_of_partner() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_by_email])?;
  assert_eq!(request.selected_partner, Some(ids.globex));
  orch.execute(request)?;

  let lead: Lead = store.browse_one(ids.lead_by_email)?;
  assert_eq!(lead.partner_id, Some(ids.globex));
  assert_eq!(lead.partner_address_id, Some(ids.globex_invoice));
  Ok(())
}

#[test]
fn exist_without_partner_changes_nothing() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_new])?;
  assert_eq!(request.action, ConversionAction::Exist);
  store.clear_calls();

  let result = orch.execute(request.select_partner(None))?;
  assert_eq!(result.partner_ids, vec![None]);
  assert_eq!(orch.state(), ConversionState::Completed);
  assert!(store.calls().iter().all(|c| !c.is_mutation()));
  Ok(())
}

#[test]
fn unknown_selected_partner_is_an_error() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_new])?;
  store.clear_calls();

  let res = orch.execute(request.select_partner(Some(RecordId(9_999))));
  assert_eq!(res.err(), Some(ConversionError::PartnerNotFound(RecordId(9_999))));
  assert_eq!(orch.state(), ConversionState::Error);
  assert!(store.calls().iter().all(|c| !c.is_mutation()));
  Ok(())
}

#[test]
fn matcher_is_deterministic() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  // Dos partners con el mismo nombre: gana el id más bajo.
  store.insert(&Partner::new("Acme Corp"))?;
  let matcher = PartnerMatcher::new(store.clone(), TieBreak::LowestId);
  let lead: Lead = store.browse_one(ids.lead_by_name)?;

  let first = matcher.find_existing_partner(&lead)?;
  let second = matcher.find_existing_partner(&lead)?;
  assert_eq!(first, second);
  assert_eq!(first, Some(ids.acme));
  Ok(())
}

#[test]
fn batch_stops_at_failing_lead() -> Result<(), ConversionError> {
  let store = Arc::new(InMemoryRecordStore::new());
  let partner = store.insert(&Partner::new("Shared"))?;
  let leads = [store.insert(&Lead::new("L1")?)?, store.insert(&Lead::new("L2")?)?, store.insert(&Lead::new("L3")?)?];
  let failing = leads[1];
  store.add_write_guard(move |attempt| {
         (attempt.entity == EntityType::Lead && attempt.ids.contains(&failing)).then(|| "disco lleno".to_string())
       });

  let mut orch = orchestrator(&store);
  let request = orch.initiate(&leads)?;
  let res = orch.execute(request.with_action(ConversionAction::Exist).select_partner(Some(partner)));

  let err = res.err().ok_or_else(|| ConversionError::InvalidState("se esperaba un error".into()))?;
  match &err {
    ConversionError::StoreWrite { lead_id, converted, .. } => {
      assert_eq!(*lead_id, failing);
      assert_eq!(converted, &vec![leads[0]]);
    }
    other => panic!("expected StoreWrite, got {:?}", other),
  }
  assert_eq!(err.converted_leads(), &[leads[0]]);
  assert_eq!(orch.state(), ConversionState::Error);

  // El tercer lead no se llegó a procesar.
  let third: Lead = store.browse_one(leads[2])?;
  assert!(!third.is_linked());
  Ok(())
}

#[test]
fn make_partner_returns_view_descriptor() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_by_name])?;
  let action = orch.make_partner(request)?;

  assert_eq!(action.res_model, EntityType::Partner);
  assert_eq!(action.res_id, Some(ids.acme));
  assert_eq!(action.partner_ids, vec![ids.acme]);
  Ok(())
}

#[test]
fn finished_interaction_cannot_be_reused() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_by_name])?;
  orch.execute(request.clone())?;
  assert!(orch.state().is_terminal());

  assert!(matches!(orch.execute(request), Err(ConversionError::InvalidState(_))));
  assert!(matches!(orch.initiate(&[ids.lead_new]), Err(ConversionError::InvalidState(_))));
  Ok(())
}

#[test]
fn default_action_comes_from_config() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let config = ConversionConfig { default_action: ConversionAction::Create, ..Default::default() };
  let mut orch = ConversionOrchestrator::new(Arc::new(store), config);
  let request = orch.initiate(&[ids.lead_new])?;
  assert_eq!(request.action, ConversionAction::Create);
  assert_eq!(request.selected_partner, None);
  Ok(())
}

#[test]
fn repeated_lead_ids_convert_once() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  let partners_before = store.count(EntityType::Partner)?;

  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_new, ids.lead_by_name, ids.lead_new])?;
  assert_eq!(request.lead_ids(), &[ids.lead_new, ids.lead_by_name]);

  let result = orch.execute(request.with_action(ConversionAction::Create))?;
  assert_eq!(result.len(), 2);
  assert_eq!(store.count(EntityType::Partner)?, partners_before + 2);
  let lead: Lead = store.browse_one(ids.lead_new)?;
  assert_eq!(lead.partner_id, result.first_partner());
  Ok(())
}

#[test]
fn rejected_partner_create_leaves_lead_unlinked() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  store.add_write_guard(|a| (a.entity == EntityType::Partner).then(|| "partners bloqueados".to_string()));
  let contacts_before = store.count(EntityType::Contact)?;

  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_new])?;
  let res = orch.execute(request.with_action(ConversionAction::Create));

  match res {
    Err(ConversionError::StoreWrite { lead_id, converted, .. }) => {
      assert_eq!(lead_id, ids.lead_new);
      assert!(converted.is_empty());
    }
    other => panic!("expected StoreWrite, got {:?}", other),
  }
  assert_eq!(orch.state(), ConversionState::Error);
  assert_eq!(store.count(EntityType::Contact)?, contacts_before);
  let lead: Lead = store.browse_one(ids.lead_new)?;
  assert!(!lead.is_linked());
  assert_eq!(lead.partner_address_id, None);
  Ok(())
}

#[test]
fn rejected_contact_create_keeps_partner_and_leaves_lead_unlinked() -> Result<(), ConversionError> {
  let (store, ids) = DomainStubs::sample_store()?;
  let store = Arc::new(store);
  store.add_write_guard(|a| (a.entity == EntityType::Contact).then(|| "contactos bloqueados".to_string()));
  let partners_before = store.count(EntityType::Partner)?;
  let contacts_before = store.count(EntityType::Contact)?;

  let mut orch = orchestrator(&store);
  let request = orch.initiate(&[ids.lead_new])?;
  let res = orch.execute(request.with_action(ConversionAction::Create));

  match res {
    Err(ConversionError::StoreWrite { lead_id, converted, .. }) => {
      assert_eq!(lead_id, ids.lead_new);
      assert!(converted.is_empty());
    }
    other => panic!("expected StoreWrite, got {:?}", other),
  }
  assert_eq!(orch.state(), ConversionState::Error);
  // Sin transacción entre llamadas: el partner creado se queda huérfano.
  assert_eq!(store.count(EntityType::Partner)?, partners_before + 1);
  assert_eq!(store.count(EntityType::Contact)?, contacts_before);
  let lead: Lead = store.browse_one(ids.lead_new)?;
  assert!(!lead.is_linked());
  Ok(())
}

#[test]
fn false_and_zero_references_count_as_unlinked() -> Result<(), ConversionError> {
  let store = Arc::new(InMemoryRecordStore::new());
  store.insert(&Partner::new("Owner"))?;
  let mut orphan = record_store::Fields::new();
  orphan.insert("name".into(), serde_json::json!("Orphan"));
  orphan.insert("email".into(), serde_json::json!("a@b.com"));
  orphan.insert("partner_id".into(), serde_json::json!(0));
  record_store::RecordStore::create(store.as_ref(), EntityType::Contact, orphan)?;

  let mut leads = Vec::new();
  for empty in [serde_json::json!(false), serde_json::json!(0)] {
    let mut fields = record_store::Fields::new();
    fields.insert("name".into(), serde_json::json!("Legacy"));
    fields.insert("email".into(), serde_json::json!("a@b.com"));
    fields.insert(Lead::PARTNER_FIELD.into(), empty);
    leads.push(record_store::RecordStore::create(store.as_ref(), EntityType::Lead, fields)?);
  }

  let mut orch = orchestrator(&store);
  let request = orch.initiate(&leads)?;
  assert_eq!(orch.state(), ConversionState::Suggesting);
  assert_eq!(request.selected_partner, None);
  Ok(())
}
