// partner.rs
use crate::domain_repository::StoredEntity;
use record_store::{EntityType, RecordId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Partner (empresa o persona) persistido en `res.partner`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Partner {
  pub id: Option<RecordId>,
  pub name: String,
  /// Usuario responsable.
  #[serde(deserialize_with = "record_store::deserialize_reference")]
  pub user_id: Option<RecordId>,
  pub comment: Option<String>,
}

impl Partner {
  pub const NAME_FIELD: &'static str = "name";

  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Default::default() }
  }

  pub fn with_owner(mut self, user_id: Option<RecordId>) -> Self {
    self.user_id = user_id;
    self
  }

  pub fn with_comment(mut self, comment: Option<String>) -> Self {
    self.comment = comment;
    self
  }
}

impl StoredEntity for Partner {
  const ENTITY: EntityType = EntityType::Partner;

  fn id(&self) -> Option<RecordId> {
    self.id
  }
}

impl fmt::Display for Partner {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.id {
      Some(id) => write!(f, "Partner(#{}: {})", id, self.name),
      None => write!(f, "Partner({})", self.name),
    }
  }
}
