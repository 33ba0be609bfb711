// lead.rs
use crate::domain_repository::StoredEntity;
use crate::DomainError;
use record_store::{EntityType, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Oportunidad/lead comercial que se quiere convertir en partner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lead {
  pub id: Option<RecordId>,
  pub name: String,
  pub partner_name: Option<String>,
  pub email_from: Option<String>,
  pub phone: Option<String>,
  pub mobile: Option<String>,
  pub fax: Option<String>,
  pub title: Option<String>,
  pub function_name: Option<String>,
  pub street: Option<String>,
  pub street2: Option<String>,
  pub zip: Option<String>,
  pub city: Option<String>,
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub country_id: Option<RecordId>,
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub state_id: Option<RecordId>,
  /// Comercial asignado.
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub user_id: Option<RecordId>,
  pub description: Option<String>,
  /// Partner propietario; debe estar vacío para poder convertir.
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub partner_id: Option<RecordId>,
  /// Contacto del partner, lo fija la conversión.
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub partner_address_id: Option<RecordId>,
}

impl Lead {
  pub const PARTNER_FIELD: &'static str = "partner_id";
  pub const PARTNER_ADDRESS_FIELD: &'static str = "partner_address_id";

  pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
    let name = name.into();
    if name.trim().is_empty() {
      return Err(DomainError::ValidationError("El nombre del lead no puede estar vacío".to_string()));
    }
    Ok(Self { name, ..Default::default() })
  }

  pub fn with_partner_name(mut self, partner_name: impl Into<String>) -> Self {
    self.partner_name = Some(partner_name.into());
    self
  }

  pub fn with_email(mut self, email: impl Into<String>) -> Self {
    self.email_from = Some(email.into());
    self
  }

  pub fn with_phones(mut self, phone: Option<&str>, mobile: Option<&str>, fax: Option<&str>) -> Self {
    self.phone = phone.map(str::to_string);
    self.mobile = mobile.map(str::to_string);
    self.fax = fax.map(str::to_string);
    self
  }

  pub fn with_function(mut self, title: Option<&str>, function_name: Option<&str>) -> Self {
    self.title = title.map(str::to_string);
    self.function_name = function_name.map(str::to_string);
    self
  }

  pub fn with_address(mut self, street: &str, zip: &str, city: &str) -> Self {
    self.street = Some(street.to_string());
    self.zip = Some(zip.to_string());
    self.city = Some(city.to_string());
    self
  }

  pub fn with_location(mut self, country_id: Option<RecordId>, state_id: Option<RecordId>) -> Self {
    self.country_id = country_id;
    self.state_id = state_id;
    self
  }

  pub fn with_user(mut self, user_id: RecordId) -> Self {
    self.user_id = Some(user_id);
    self
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_partner(mut self, partner_id: RecordId) -> Self {
    self.partner_id = Some(partner_id);
    self
  }

  /// El lead ya tiene un partner asignado.
  pub fn is_linked(&self) -> bool {
    self.partner_id.is_some()
  }

  /// Nombre que tendrá el partner: `partner_name` si existe, si no `name`.
  /// Un `partner_name` vacío o sólo con espacios cuenta como ausente, así
  /// nunca se busca ni se crea un partner con nombre en blanco.
  pub fn partner_display_name(&self) -> &str {
    non_empty(&self.partner_name).unwrap_or(&self.name)
  }

  /// Email del lead si no está vacío.
  pub fn email(&self) -> Option<&str> {
    non_empty(&self.email_from)
  }

  /// Nombre del puesto si no está vacío.
  pub fn function(&self) -> Option<&str> {
    non_empty(&self.function_name)
  }
}

impl StoredEntity for Lead {
  const ENTITY: EntityType = EntityType::Lead;

  fn id(&self) -> Option<RecordId> {
    self.id
  }
}

impl fmt::Display for Lead {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let id = self.id.map(|i| i.to_string()).unwrap_or_else(|| "-".into());
    write!(f, "Lead(#{}: {}, partner: {})", id, self.name, self.partner_display_name())
  }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|s| !s.trim().is_empty())
}
