//! Error types for `rouser-core`.

use std::fmt;

use thiserror::Error;

use crate::subject::SubjectId;

/// A provisioning step that runs after the subject has been created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
  CreatePrincipal,
  LookupRole,
  GrantRole,
  Login,
  AttachConfiguration,
  StoreVisibility,
}

impl fmt::Display for ProvisionStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::CreatePrincipal => "create principal",
      Self::LookupRole => "look up role",
      Self::GrantRole => "grant role",
      Self::Login => "log in",
      Self::AttachConfiguration => "attach configuration",
      Self::StoreVisibility => "store subsystem visibility",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("role not found: {0:?}")]
  RoleNotFound(String),

  #[error("no subject with first name {0:?}")]
  SubjectNotFound(String),

  /// The subject exists but a later step failed; it is left as is.
  #[error("subject {subject_id} partially provisioned, {step} failed: {source}")]
  Provisioning {
    subject_id: SubjectId,
    step:       ProvisionStep,
    #[source]
    source:     Box<Error>,
  },

  #[error("invalid subsystem visibility {0:?}")]
  InvalidVisibility(String),

  #[error("directory error: {0}")]
  Directory(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn directory<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Directory(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
