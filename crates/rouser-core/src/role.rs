//! Role — a named permission bundle owned by the directory.

use serde::{Deserialize, Serialize};

pub type RoleId = i64;

/// Name of the built-in role granted to the provisioned user.
pub const SUPER_USER_ROLE: &str = "Super User Role";

/// Name of the built-in role covering every inventory resource.
pub const ALL_RESOURCES_ROLE: &str = "All Resources Role";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id:          RoleId,
  pub name:        String,
  pub description: Option<String>,
}
