//! The fixed account the procedures provision and remove.

use serde::{Deserialize, Serialize};

use crate::{
  role::SUPER_USER_ROLE,
  subject::NewSubject,
  visibility::SubsystemVisibility,
};

/// Target parameters for [`provision_user`](crate::provision::provision_user)
/// and [`remove_user`](crate::provision::remove_user).
///
/// Every field has a default, so a partial table in a config file only
/// overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
  pub name:          String,
  pub first_name:    String,
  pub last_name:     String,
  pub email_address: String,
  pub password:      String,
  pub role:          String,
  pub visibility:    SubsystemVisibility,
}

impl Default for UserProfile {
  fn default() -> Self {
    Self {
      name:          "Username".to_owned(),
      first_name:    "Username".to_owned(),
      last_name:     "ReadOnly".to_owned(),
      email_address: "username@localhost".to_owned(),
      password:      "password".to_owned(),
      role:          SUPER_USER_ROLE.to_owned(),
      visibility:    SubsystemVisibility::all_visible(),
    }
  }
}

impl UserProfile {
  /// The unsaved subject described by this profile.
  pub fn new_subject(&self) -> NewSubject {
    NewSubject::new(&self.name)
      .first_name(&self.first_name)
      .last_name(&self.last_name)
      .email_address(&self.email_address)
  }
}
