mod contact;
mod domain_repository;
mod domain_stubs;
mod errors;
mod lead;
mod partner;

pub use contact::{AddressKind, Contact, JobFunction};
pub use domain_repository::{EntityStore, StoredEntity};
pub use domain_stubs::{DomainStubs, SampleIds};
pub use errors::DomainError;
pub use lead::Lead;
pub use partner::Partner;
