// contact.rs
use crate::domain_repository::StoredEntity;
use record_store::{EntityType, RecordId, DEFAULT_CONTACT_KIND};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tipo de dirección de un contacto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressKind {
  #[default]
  Default,
  Invoice,
  Delivery,
  Contact,
  Other,
}

impl fmt::Display for AddressKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      AddressKind::Default => DEFAULT_CONTACT_KIND,
      AddressKind::Invoice => "invoice",
      AddressKind::Delivery => "delivery",
      AddressKind::Contact => "contact",
      AddressKind::Other => "other",
    };
    write!(f, "{}", s)
  }
}

impl FromStr for AddressKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "default" => Ok(AddressKind::Default),
      "invoice" => Ok(AddressKind::Invoice),
      "delivery" => Ok(AddressKind::Delivery),
      "contact" => Ok(AddressKind::Contact),
      "other" => Ok(AddressKind::Other),
      other => Err(format!("tipo de dirección desconocido: {}", other)),
    }
  }
}

/// Contacto/dirección asociado a un partner (`res.partner.address`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
  pub id: Option<RecordId>,
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub partner_id: Option<RecordId>,
  #[serde(rename = "type")]
  pub kind: AddressKind,
  pub name: Option<String>,
  pub phone: Option<String>,
  pub mobile: Option<String>,
  pub email: Option<String>,
  pub fax: Option<String>,
  pub title: Option<String>,
  /// Puesto (`res.partner.function`).
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub function: Option<RecordId>,
  pub street: Option<String>,
  pub street2: Option<String>,
  pub zip: Option<String>,
  pub city: Option<String>,
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub country_id: Option<RecordId>,
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub state_id: Option<RecordId>,
}

impl Contact {
  pub const EMAIL_FIELD: &'static str = "email";

  pub fn new(partner_id: RecordId, name: impl Into<String>) -> Self {
    Self { partner_id: Some(partner_id), name: Some(name.into()), ..Default::default() }
  }

  pub fn with_kind(mut self, kind: AddressKind) -> Self {
    self.kind = kind;
    self
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email = Some(email.into());
    self
  }
}

impl StoredEntity for Contact {
  const ENTITY: EntityType = EntityType::Contact;

  fn id(&self) -> Option<RecordId> {
    self.id
  }
}

/// Puesto de trabajo (`res.partner.function`), tabla de búsqueda.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobFunction {
  pub id: Option<RecordId>,
  pub name: String,
  pub code: Option<String>,
}

impl JobFunction {
  pub const NAME_FIELD: &'static str = "name";

  pub fn new(name: impl Into<String>, code: Option<&str>) -> Self {
    Self { id: None, name: name.into(), code: code.map(str::to_string) }
  }
}

impl StoredEntity for JobFunction {
  const ENTITY: EntityType = EntityType::JobFunction;

  fn id(&self) -> Option<RecordId> {
    self.id
  }
}
