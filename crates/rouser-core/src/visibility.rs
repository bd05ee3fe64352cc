//! Typed form of the `.ui.showSubsystems` user preference.
//!
//! The console stores which subsystem views a user sees as eight `1`/`0`
//! flags joined with `|`, e.g. `1|1|0|1|1|1|1|1`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, configuration::PropertySimple};

/// Configuration property holding the packed visibility flags.
pub const SHOW_SUBSYSTEMS_PROPERTY: &str = ".ui.showSubsystems";

/// Subsystem views, in the order their flags appear in the packed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsystem {
  ConfigurationChanges,
  SuspectMetrics,
  Operations,
  Alerts,
  Drift,
  Events,
  BundleDeployments,
  Availability,
}

impl Subsystem {
  pub const ALL: [Subsystem; 8] = [
    Self::ConfigurationChanges,
    Self::SuspectMetrics,
    Self::Operations,
    Self::Alerts,
    Self::Drift,
    Self::Events,
    Self::BundleDeployments,
    Self::Availability,
  ];

  fn index(self) -> usize { self as usize }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemVisibility([bool; 8]);

impl SubsystemVisibility {
  pub fn all_visible() -> Self { Self([true; 8]) }

  pub fn none_visible() -> Self { Self([false; 8]) }

  pub fn is_visible(&self, subsystem: Subsystem) -> bool { self.0[subsystem.index()] }

  pub fn set(&mut self, subsystem: Subsystem, visible: bool) {
    self.0[subsystem.index()] = visible;
  }

  /// The configuration property carrying these flags.
  pub fn to_property(&self) -> PropertySimple {
    PropertySimple::new(SHOW_SUBSYSTEMS_PROPERTY, self.to_string())
  }
}

impl Default for SubsystemVisibility {
  fn default() -> Self { Self::all_visible() }
}

impl fmt::Display for SubsystemVisibility {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, visible) in self.0.iter().enumerate() {
      if i > 0 {
        f.write_str("|")?;
      }
      f.write_str(if *visible { "1" } else { "0" })?;
    }
    Ok(())
  }
}

impl FromStr for SubsystemVisibility {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || Error::InvalidVisibility(s.to_owned());
    let mut flags = [false; 8];
    let mut count = 0;
    for token in s.split('|') {
      let slot = flags.get_mut(count).ok_or_else(invalid)?;
      *slot = match token {
        "1" => true,
        "0" => false,
        _ => return Err(invalid()),
      };
      count += 1;
    }
    if count != flags.len() {
      return Err(invalid());
    }
    Ok(Self(flags))
  }
}

impl Serialize for SubsystemVisibility {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for SubsystemVisibility {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}
