//! lead-conversion: conversión de leads CRM en partners
//!
//! Orquesta una interacción de conversión sobre cualquier
//! `record_store::RecordStore`: valida que los leads no tengan partner,
//! sugiere un partner existente (por nombre y luego por email de contacto) y
//! aplica la decisión del usuario: enlazar con un partner existente o crear
//! partner y contacto nuevos a partir de los datos del lead.
//!
//! ```
//! use std::sync::Arc;
//! use crm_domain::DomainStubs;
//! use lead_conversion::{ConversionAction, ConversionConfig, ConversionOrchestrator};
//!
//! let (store, ids) = DomainStubs::sample_store().unwrap();
//! let mut orch = ConversionOrchestrator::new(Arc::new(store), ConversionConfig::default());
//! let request = orch.initiate(&[ids.lead_new]).unwrap();
//! let result = orch.execute(request.with_action(ConversionAction::Create)).unwrap();
//! assert!(result.first_partner().is_some());
//! ```

pub mod action;
pub mod config;
pub mod creator;
pub mod errors;
pub mod linker;
pub mod matcher;
pub mod orchestrator;
pub mod request;

pub use action::PartnerAction;
pub use config::{ConversionConfig, TieBreak};
pub use creator::PartnerCreator;
pub use errors::ConversionError;
pub use linker::LeadLinker;
pub use matcher::PartnerMatcher;
pub use orchestrator::{ConversionOrchestrator, ConversionState};
pub use request::{ConversionAction, ConversionRequest, ConversionResult};
