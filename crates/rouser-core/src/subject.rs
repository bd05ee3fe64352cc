//! Subject — a user identity record held by the directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::configuration::Configuration;

/// Identifier assigned to a subject by the directory.
pub type SubjectId = i64;

/// A persisted user identity.
///
/// `name` is the identity key and is unique within a directory. The
/// `session_id` is transient: it is only set on the handle returned by
/// [`SubjectDirectory::login`](crate::directory::SubjectDirectory::login) and
/// is never stored. No directory operation takes it back as input; it only
/// identifies a login in logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub id:                 SubjectId,
  pub name:               String,
  pub first_name:         String,
  pub last_name:          String,
  pub email_address:      String,
  pub factive:            bool,
  pub fsystem:            bool,
  pub user_configuration: Option<Configuration>,
  pub created_at:         DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub session_id:         Option<Uuid>,
}

/// The unsaved form of a [`Subject`], submitted to
/// [`SubjectDirectory::create_subject`](crate::directory::SubjectDirectory::create_subject).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubject {
  pub name:          String,
  pub first_name:    String,
  pub last_name:     String,
  pub email_address: String,
  pub factive:       bool,
  pub fsystem:       bool,
}

impl NewSubject {
  /// An active, non-system subject with the given name.
  pub fn new(name: impl Into<String>) -> Self {
    let name = name.into();
    Self {
      first_name:    name.clone(),
      name,
      last_name:     String::new(),
      email_address: String::new(),
      factive:       true,
      fsystem:       false,
    }
  }

  pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
    self.first_name = first_name.into();
    self
  }

  pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
    self.last_name = last_name.into();
    self
  }

  pub fn email_address(mut self, email_address: impl Into<String>) -> Self {
    self.email_address = email_address.into();
    self
  }

  pub fn system(mut self, fsystem: bool) -> Self {
    self.fsystem = fsystem;
    self
  }
}
