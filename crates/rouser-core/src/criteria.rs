//! Query types for [`SubjectDirectory`](crate::directory::SubjectDirectory)
//! lookups.
//!
//! Text filters follow the console's criteria rules: a non-strict filter
//! matches any value containing the filter text, ignoring ASCII case; a
//! strict filter matches the whole value exactly. Case folding is ASCII-only
//! so in-memory matching agrees with SQLite's `lower()`.

use serde::{Deserialize, Serialize};

use crate::{
  role::Role,
  subject::{Subject, SubjectId},
};

/// Filter parameters for subject lookups. Unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectCriteria {
  pub name:       Option<String>,
  pub first_name: Option<String>,
  pub strict:     bool,
}

impl SubjectCriteria {
  pub fn by_first_name(first_name: impl Into<String>) -> Self {
    Self { first_name: Some(first_name.into()), ..Self::default() }
  }

  pub fn by_name(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Self::default() }
  }

  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  /// Evaluate the criteria against an in-memory subject.
  pub fn matches(&self, subject: &Subject) -> bool {
    text_matches(self.name.as_deref(), &subject.name, self.strict)
      && text_matches(self.first_name.as_deref(), &subject.first_name, self.strict)
  }
}

/// Filter parameters for role lookups. Unset filters match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCriteria {
  pub name:       Option<String>,
  /// Restrict to roles granted to this subject.
  pub subject_id: Option<SubjectId>,
  pub strict:     bool,
}

impl RoleCriteria {
  pub fn by_name(name: impl Into<String>) -> Self {
    Self { name: Some(name.into()), ..Self::default() }
  }

  pub fn by_subject(subject_id: SubjectId) -> Self {
    Self { subject_id: Some(subject_id), ..Self::default() }
  }

  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  /// Evaluate the name filter against an in-memory role. The subject filter
  /// needs grant data and is left to the backend.
  pub fn matches_name(&self, role: &Role) -> bool {
    text_matches(self.name.as_deref(), &role.name, self.strict)
  }
}

fn text_matches(filter: Option<&str>, value: &str, strict: bool) -> bool {
  match filter {
    None => true,
    Some(f) if strict => f == value,
    Some(f) => value.to_ascii_lowercase().contains(&f.to_ascii_lowercase()),
  }
}
