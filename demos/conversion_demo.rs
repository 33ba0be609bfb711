use crm_domain::{DomainStubs, EntityStore, Lead};
use lead_conversion::{ConversionAction, ConversionConfig, ConversionError, ConversionOrchestrator};
use record_store::{EntityType, RecordStore};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
  // Base SQLite temporal; con la feature `pg` se usa CRM_DB_URL.
  let path = std::env::temp_dir().join(format!("crm_demo_{}.db", std::process::id()));
  #[cfg(not(feature = "pg"))]
  let store: Arc<dyn RecordStore> = Arc::new(crm_persistence::new_sqlite_for_test(&path.to_string_lossy())?);
  #[cfg(feature = "pg")]
  let store: Arc<dyn RecordStore> = Arc::new(crm_persistence::new_from_env()?);

  let ids = DomainStubs::seed(store.as_ref())?;
  let config = ConversionConfig::default();

  // Lote de dos leads: la sugerencia sale del primero (coincide por nombre).
  let mut orch = ConversionOrchestrator::new(store.clone(), config.clone());
  let request = orch.initiate(&[ids.lead_by_name, ids.lead_by_email])?;
  println!("sugerencia: {} / {:?}", request.action, request.selected_partner);
  let view = orch.make_partner(request)?;
  println!("vista resultado:\n{}", serde_json::to_string_pretty(&view)?);
  for id in [ids.lead_by_name, ids.lead_by_email] {
    let lead: Lead = store.browse_one(id)?;
    println!("  {} -> partner {:?}, contacto {:?}", lead, lead.partner_id, lead.partner_address_id);
  }

  // Crear partner nuevo desde el lead sin coincidencias.
  let mut orch = ConversionOrchestrator::new(store.clone(), config.clone());
  let request = orch.initiate(&[ids.lead_new])?;
  let result = orch.execute(request.with_action(ConversionAction::Create))?;
  println!("partner creado: {:?}", result.first_partner());

  // Fallo de escritura a mitad de lote sobre un almacén en memoria.
  let (memory, mem_ids) = DomainStubs::sample_store()?;
  let failing = mem_ids.lead_by_email;
  memory.add_write_guard(move |a| {
          (a.entity == EntityType::Lead && a.ids.contains(&failing)).then(|| "bloqueo simulado".to_string())
        });
  let mut orch = ConversionOrchestrator::new(Arc::new(memory), config);
  let request = orch.initiate(&[mem_ids.lead_by_name, mem_ids.lead_by_email, mem_ids.lead_new])?;
  match orch.execute(request) {
    Err(e @ ConversionError::StoreWrite { .. }) => {
      println!("estado {}: {} (ya enlazados: {:?})", orch.state(), e, e.converted_leads())
    }
    other => println!("resultado inesperado: {:?}", other),
  }

  let _ = std::fs::remove_file(path);
  Ok(())
}
