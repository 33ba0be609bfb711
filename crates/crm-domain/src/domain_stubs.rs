use crate::domain_repository::EntityStore;
use crate::{AddressKind, Contact, DomainError, JobFunction, Lead, Partner};
use record_store::{InMemoryRecordStore, RecordId, RecordStore};

/// Ids de los registros creados por `DomainStubs::seed`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleIds {
  pub acme: RecordId,
  pub acme_contact: RecordId,
  pub globex: RecordId,
  pub globex_invoice: RecordId,
  pub ceo: RecordId,
  /// Lead cuyo `partner_name` coincide con "Acme Corp".
  pub lead_by_name: RecordId,
  /// Lead sin coincidencia por nombre pero con el email de un contacto de Globex.
  pub lead_by_email: RecordId,
  /// Lead sin ninguna coincidencia.
  pub lead_new: RecordId,
  /// Lead que ya tiene partner asignado.
  pub lead_linked: RecordId,
}

pub struct DomainStubs;

impl DomainStubs {
  /// Crea un almacén en memoria pre-poblado con partners, contactos,
  /// puestos y leads de ejemplo.
  pub fn sample_store() -> Result<(InMemoryRecordStore, SampleIds), DomainError> {
    let store = InMemoryRecordStore::new();
    let ids = Self::seed(&store)?;
    Ok((store, ids))
  }

  /// Inserta los datos de ejemplo en cualquier `RecordStore`.
  pub fn seed(store: &dyn RecordStore) -> Result<SampleIds, DomainError> {
    let ceo = store.insert(&JobFunction::new("CEO", Some("CEO")))?;
    store.insert(&JobFunction::new("Sales Manager", Some("SM")))?;

    let acme = store.insert(&Partner::new("Acme Corp").with_comment(Some("Cliente histórico".into())))?;
    let acme_contact = store.insert(&Contact::new(acme, "Wile E. Coyote").with_email("wile@acme.test"))?;
    let globex = store.insert(&Partner::new("Globex"))?;
    let globex_invoice =
      store.insert(&Contact::new(globex, "Hank Scorpio").with_kind(AddressKind::Invoice).with_email("hank@globex.test"))?;

    let lead_by_name = store.insert(&Lead::new("Road Runner order")?.with_partner_name("Acme Corp"))?;
    let lead_by_email = store.insert(&Lead::new("Hammock district")?.with_partner_name("Globex Corporation")
                                                                   .with_email("hank@globex.test"))?;
    let lead_new = store.insert(&Lead::new("Jane Doe")?.with_partner_name("Initech")
                                                      .with_email("jane@initech.test")
                                                      .with_function(Some("Ms."), Some("CEO"))
                                                      .with_address("1 Infinite Loop", "95014", "Cupertino")
                                                      .with_description("Interesada en el plan anual"))?;
    let lead_linked = store.insert(&Lead::new("Already customer")?.with_partner(acme))?;

    Ok(SampleIds { acme,
                   acme_contact,
                   globex,
                   globex_invoice,
                   ceo,
                   lead_by_name,
                   lead_by_email,
                   lead_new,
                   lead_linked })
  }
}
