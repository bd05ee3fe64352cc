//! Per-subject user configuration: a set of named simple properties.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier assigned to a configuration when it is first persisted.
pub type ConfigurationId = i64;

/// A single name/value property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySimple {
  pub name:             String,
  pub string_value:     String,
  /// Whether this value overrides a template default.
  pub override_default: bool,
}

impl PropertySimple {
  pub fn new(name: impl Into<String>, string_value: impl Into<String>) -> Self {
    Self {
      name:             name.into(),
      string_value:     string_value.into(),
      override_default: false,
    }
  }
}

/// A subject's configuration. `id` is `None` until the owning subject has been
/// updated in the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
  pub id:         Option<ConfigurationId>,
  pub properties: BTreeMap<String, PropertySimple>,
}

impl Configuration {
  pub fn new() -> Self { Self::default() }

  /// Insert `property`, replacing any existing property of the same name.
  pub fn put(&mut self, property: PropertySimple) -> Option<PropertySimple> {
    self.properties.insert(property.name.clone(), property)
  }

  pub fn get(&self, name: &str) -> Option<&PropertySimple> { self.properties.get(name) }

  pub fn len(&self) -> usize { self.properties.len() }

  pub fn is_empty(&self) -> bool { self.properties.is_empty() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn put_replaces_by_name() {
    let mut c = Configuration::new();
    assert!(c.put(PropertySimple::new(".ui.a", "1")).is_none());
    let old = c.put(PropertySimple::new(".ui.a", "2")).unwrap();
    assert_eq!(old.string_value, "1");
    assert_eq!(c.len(), 1);
    assert_eq!(c.get(".ui.a").unwrap().string_value, "2");
  }

  #[test]
  fn new_property_does_not_override() {
    assert!(!PropertySimple::new("x", "y").override_default);
  }
}
