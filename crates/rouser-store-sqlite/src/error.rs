//! Error type for `rouser-store-sqlite`.

use rouser_core::{configuration::ConfigurationId, role::RoleId, subject::SubjectId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("password hashing error: {0}")]
  PasswordHash(String),

  /// Unknown principal, wrong password, or inactive subject.
  #[error("invalid credentials")]
  InvalidCredentials,

  #[error("subject {0:?} already exists")]
  DuplicateSubject(String),

  #[error("subject {0:?} already has a principal")]
  DuplicatePrincipal(String),

  #[error("subject not found: {0}")]
  SubjectNotFound(SubjectId),

  #[error("no subject named {0:?}")]
  UnknownSubject(String),

  #[error("role not found: {0}")]
  RoleNotFound(RoleId),

  /// The configuration id on an update is not the one the subject holds.
  #[error("configuration {configuration_id} does not belong to subject {subject_id}")]
  ConfigurationNotOwned { configuration_id: ConfigurationId, subject_id: SubjectId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
