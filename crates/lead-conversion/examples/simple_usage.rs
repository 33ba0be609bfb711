use crm_domain::{DomainStubs, EntityStore, Lead};
use lead_conversion::{ConversionAction, ConversionConfig, ConversionOrchestrator};
use std::sync::Arc;

fn main() {
  // Almacén en memoria con partners, contactos y leads de ejemplo.
  let (store, ids) = DomainStubs::sample_store().expect("no se pudo poblar el almacén");
  let store = Arc::new(store);
  let config = ConversionConfig::from_env().expect("configuración inválida");

  // 1) Lead que coincide por nombre con "Acme Corp": se enlaza con él.
  let mut orch = ConversionOrchestrator::new(store.clone(), config.clone());
  let request = orch.initiate(&[ids.lead_by_name]).expect("initiate");
  println!("sugerencia: {} -> {:?}", request.action, request.selected_partner);
  let action = orch.make_partner(request).expect("make_partner");
  println!("{}", serde_json::to_string_pretty(&action).expect("json"));

  // 2) Lead sin coincidencias: se crea un partner nuevo con su contacto.
  let mut orch = ConversionOrchestrator::new(store.clone(), config.clone());
  let request = orch.initiate(&[ids.lead_new]).expect("initiate");
  let result = orch.execute(request.with_action(ConversionAction::Create)).expect("execute");
  let lead: Lead = store.browse_one(ids.lead_new).expect("lead");
  println!("partners creados: {:?}; lead ahora: {}", result.resolved(), lead);

  // 3) Lead ya enlazado: la interacción se rechaza.
  let mut orch = ConversionOrchestrator::new(store, config);
  match orch.initiate(&[ids.lead_linked]) {
    Ok(_) => println!("inesperado: el lead enlazado fue aceptado"),
    Err(e) => println!("rechazado ({}): {}", orch.state(), e),
  }
}
