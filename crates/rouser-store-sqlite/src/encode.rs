//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and booleans as integers.

use chrono::{DateTime, Utc};
use rouser_core::{
  configuration::{Configuration, PropertySimple},
  role::Role,
  subject::Subject,
};

use crate::{Error, Result};

/// Column list matching [`subject_from_row`].
pub const SUBJECT_COLUMNS: &str = "subject_id, name, first_name, last_name, email_address, \
                                   factive, fsystem, configuration_id, created_at";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `properties` row.
pub struct RawProperty {
  pub name:             String,
  pub string_value:     String,
  pub override_default: bool,
}

/// Raw values read from a `subjects` row, plus its configuration properties.
pub struct RawSubject {
  pub subject_id:       i64,
  pub name:             String,
  pub first_name:       String,
  pub last_name:        String,
  pub email_address:    String,
  pub factive:          bool,
  pub fsystem:          bool,
  pub configuration_id: Option<i64>,
  pub created_at:       String,
  pub properties:       Vec<RawProperty>,
}

pub fn subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubject> {
  Ok(RawSubject {
    subject_id:       row.get(0)?,
    name:             row.get(1)?,
    first_name:       row.get(2)?,
    last_name:        row.get(3)?,
    email_address:    row.get(4)?,
    factive:          row.get(5)?,
    fsystem:          row.get(6)?,
    configuration_id: row.get(7)?,
    created_at:       row.get(8)?,
    properties:       Vec::new(),
  })
}

pub fn role_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Role> {
  Ok(Role {
    id:          row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
  })
}

impl RawSubject {
  pub fn into_subject(self) -> Result<Subject> {
    let user_configuration = self.configuration_id.map(|id| {
      let mut config = Configuration { id: Some(id), ..Configuration::default() };
      for p in self.properties {
        config.put(PropertySimple {
          name:             p.name,
          string_value:     p.string_value,
          override_default: p.override_default,
        });
      }
      config
    });

    Ok(Subject {
      id: self.subject_id,
      name: self.name,
      first_name: self.first_name,
      last_name: self.last_name,
      email_address: self.email_address,
      factive: self.factive,
      fsystem: self.fsystem,
      user_configuration,
      created_at: decode_dt(&self.created_at)?,
      session_id: None,
    })
  }
}
