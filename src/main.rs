use anyhow::Context;
use crm_domain::{DomainStubs, EntityStore, Lead, Partner};
use lead_conversion::{ConversionAction, ConversionConfig, ConversionOrchestrator};
use record_store::{RecordId, RecordStore};
use std::io::{self, Write};
use std::sync::Arc;

/// Menú interactivo para convertir leads en partners sobre el almacén
/// configurado por `crm-persistence` (`CRM_DB_URL` / `DATABASE_URL`).
///
/// Opciones soportadas:
/// 1) Ver leads
/// 2) Ver partners
/// 3) Crear lead
/// 4) Convertir leads en partner
/// 5) Cargar datos de ejemplo
/// 6) Salir
fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()
                                              .add_directive(tracing::Level::INFO.into()))
                           .init();

  let config = ConversionConfig::from_env().context("configuración de conversión inválida")?;
  let store: Arc<dyn RecordStore> =
    Arc::new(crm_persistence::new_from_env().context("no se pudo abrir el almacén de registros")?);
  log::info!("lead2partner listo (desempate: {}, acción por defecto: {})",
             config.tie_break,
             config.default_action);

  loop {
    println!("\n== Lead -> Partner ==");
    println!("1) Ver leads");
    println!("2) Ver partners");
    println!("3) Crear lead");
    println!("4) Convertir leads en partner");
    println!("5) Cargar datos de ejemplo");
    println!("6) Salir");
    let choice = prompt("Elige una opción: ")?;
    match choice.trim() {
      "1" => match store.list_all::<Lead>() {
        Ok(leads) => {
          println!("\nID     | PARTNER | NOMBRE");
          println!("------------------------------------------------");
          for l in leads {
            let id = l.id.map(|i| i.to_string()).unwrap_or_default();
            let partner = l.partner_id.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
            println!("{:<6} | {:<7} | {} ({})", id, partner, l.name, l.partner_display_name());
          }
        }
        Err(e) => eprintln!("Error listando leads: {}", e),
      },
      "2" => match store.list_all::<Partner>() {
        Ok(partners) => {
          for p in partners {
            println!("{}", p);
          }
        }
        Err(e) => eprintln!("Error listando partners: {}", e),
      },
      "3" => create_lead(store.as_ref())?,
      "4" => convert(store.clone(), &config)?,
      "5" => match DomainStubs::seed(store.as_ref()) {
        Ok(ids) => println!("Datos de ejemplo cargados: {:?}", ids),
        Err(e) => eprintln!("Error cargando datos de ejemplo: {}", e),
      },
      "6" => {
        println!("Saliendo...");
        break;
      }
      other => println!("Opción inválida: {}", other),
    }
  }
  Ok(())
}

fn create_lead(store: &dyn RecordStore) -> anyhow::Result<()> {
  let name = prompt("Nombre del lead: ")?;
  let mut lead = match Lead::new(name.trim()) {
    Ok(l) => l,
    Err(e) => {
      eprintln!("{}", e);
      return Ok(());
    }
  };
  if let Some(v) = optional(&prompt("Empresa (enter para vacío): ")?) {
    lead = lead.with_partner_name(v);
  }
  if let Some(v) = optional(&prompt("Email (enter para vacío): ")?) {
    lead = lead.with_email(v);
  }
  let function = prompt("Puesto (enter para vacío): ")?;
  lead = lead.with_function(None, optional(&function));
  match store.insert(&lead) {
    Ok(id) => println!("Lead creado: {}", id),
    Err(e) => eprintln!("Error creando lead: {}", e),
  }
  Ok(())
}

fn convert(store: Arc<dyn RecordStore>, config: &ConversionConfig) -> anyhow::Result<()> {
  let raw = prompt("Ids de leads separados por coma: ")?;
  let lead_ids = match raw.split(',').filter(|s| !s.trim().is_empty()).map(str::parse).collect::<Result<Vec<RecordId>, _>>() {
    Ok(ids) => ids,
    Err(e) => {
      eprintln!("Id inválido: {}", e);
      return Ok(());
    }
  };

  let mut orch = ConversionOrchestrator::new(store, config.clone());
  let request = match orch.initiate(&lead_ids) {
    Ok(r) => r,
    Err(e) => {
      eprintln!("No se puede convertir: {}", e);
      return Ok(());
    }
  };
  let suggested = request.selected_partner.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
  println!("Sugerencia: acción '{}', partner {}", request.action, suggested);

  let answer = prompt(&format!("Acción [exist|create] (enter para '{}'): ", request.action))?;
  let action = match optional(&answer).map(str::parse::<ConversionAction>) {
    None => request.action,
    Some(Ok(a)) => a,
    Some(Err(e)) => {
      eprintln!("{}", e);
      return Ok(());
    }
  };
  let mut request = request.with_action(action);
  if action == ConversionAction::Exist {
    let answer = prompt(&format!("Partner id (enter para {}, '-' para ninguno): ", suggested))?;
    match answer.trim() {
      "" => {}
      "-" => request = request.select_partner(None),
      other => match other.parse::<RecordId>() {
        Ok(p) => request = request.select_partner(Some(p)),
        Err(e) => {
          eprintln!("Id inválido: {}", e);
          return Ok(());
        }
      },
    }
  }

  match orch.make_partner(request) {
    Ok(view) => println!("{}", serde_json::to_string_pretty(&view)?),
    Err(e) => {
      eprintln!("Conversión fallida ({}): {}", orch.state(), e);
      if !e.converted_leads().is_empty() {
        eprintln!("Leads ya enlazados antes del fallo: {:?}", e.converted_leads());
      }
    }
  }
  Ok(())
}

fn optional(s: &str) -> Option<&str> {
  let s = s.trim();
  (!s.is_empty()).then_some(s)
}

fn prompt(msg: &str) -> io::Result<String> {
  print!("{}", msg);
  io::stdout().flush()?;
  let mut s = String::new();
  io::stdin().read_line(&mut s)?;
  Ok(s)
}
