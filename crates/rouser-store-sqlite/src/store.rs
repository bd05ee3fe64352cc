//! [`SqliteDirectory`] — the SQLite implementation of [`SubjectDirectory`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use rouser_core::{
  criteria::{RoleCriteria, SubjectCriteria},
  directory::SubjectDirectory,
  role::{Role, RoleId, SUPER_USER_ROLE},
  subject::{NewSubject, Subject, SubjectId},
};

use crate::{
  Error, Result,
  encode::{RawProperty, RawSubject, SUBJECT_COLUMNS, encode_dt, role_from_row, subject_from_row},
  password::{hash_password, verify_password},
  schema::SCHEMA,
};

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Fill in the configuration properties of each raw subject.
fn attach_properties(
  conn: &rusqlite::Connection,
  raws: &mut [RawSubject],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(
    "SELECT name, string_value, override_default
     FROM properties WHERE configuration_id = ?1 ORDER BY name",
  )?;
  for raw in raws.iter_mut() {
    if let Some(configuration_id) = raw.configuration_id {
      raw.properties = stmt
        .query_map(rusqlite::params![configuration_id], |row| {
          Ok(RawProperty {
            name:             row.get(0)?,
            string_value:     row.get(1)?,
            override_default: row.get(2)?,
          })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    }
  }
  Ok(())
}

fn subject_by_name(
  conn: &rusqlite::Connection,
  name: &str,
) -> rusqlite::Result<Option<RawSubject>> {
  let raw = conn
    .query_row(
      &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE name = ?1"),
      rusqlite::params![name],
      subject_from_row,
    )
    .optional()?;
  let Some(raw) = raw else { return Ok(None) };
  let mut raws = [raw];
  attach_properties(conn, &mut raws)?;
  let [raw] = raws;
  Ok(Some(raw))
}

fn subject_exists(conn: &rusqlite::Connection, id: SubjectId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM subjects WHERE subject_id = ?1",
        rusqlite::params![id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// Remove a configuration and its properties.
fn drop_configuration(conn: &rusqlite::Connection, configuration_id: i64) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM properties WHERE configuration_id = ?1",
    rusqlite::params![configuration_id],
  )?;
  conn.execute(
    "DELETE FROM configurations WHERE configuration_id = ?1",
    rusqlite::params![configuration_id],
  )?;
  Ok(())
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// A subject/role directory backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  /// Open (or create) a directory at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  /// Open an in-memory directory — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Create a system administrator holding the super user role, or reset the
  /// password of an existing subject with that name and make sure it holds
  /// the role.
  pub async fn bootstrap_admin(&self, name: &str, password: &str) -> Result<Subject> {
    let password_hash = hash_password(password)?;
    let name = name.to_owned();
    let created_at = encode_dt(Utc::now());

    let raw: RawSubject = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT OR IGNORE INTO subjects
             (name, first_name, last_name, email_address, factive, fsystem, created_at)
           VALUES (?1, ?1, 'Administrator', '', 1, 1, ?2)",
          rusqlite::params![name, created_at],
        )?;
        tx.execute(
          "INSERT INTO principals (name, password_hash) VALUES (?1, ?2)
           ON CONFLICT(name) DO UPDATE SET password_hash = excluded.password_hash",
          rusqlite::params![name, password_hash],
        )?;
        tx.execute(
          "INSERT OR IGNORE INTO subject_roles (subject_id, role_id)
           SELECT s.subject_id, r.role_id FROM subjects s, roles r
           WHERE s.name = ?1 AND r.name = ?2",
          rusqlite::params![name, SUPER_USER_ROLE],
        )?;
        let raw = subject_by_name(&tx, &name)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    debug!(subject_id = raw.subject_id, "admin bootstrapped");
    raw.into_subject()
  }
}

// ─── SubjectDirectory impl ───────────────────────────────────────────────────

impl SubjectDirectory for SqliteDirectory {
  type Error = Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn find_subjects_by_criteria(&self, criteria: &SubjectCriteria) -> Result<Vec<Subject>> {
    let name = criteria.name.clone();
    let first_name = criteria.first_name.clone();
    let strict = criteria.strict;

    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {SUBJECT_COLUMNS} FROM subjects
           WHERE (?1 IS NULL OR CASE WHEN ?3 THEN name = ?1
                                     ELSE instr(lower(name), lower(?1)) > 0 END)
             AND (?2 IS NULL OR CASE WHEN ?3 THEN first_name = ?2
                                     ELSE instr(lower(first_name), lower(?2)) > 0 END)
           ORDER BY subject_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut raws = stmt
          .query_map(rusqlite::params![name, first_name, strict], subject_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        attach_properties(conn, &mut raws)?;
        Ok(raws)
      })
      .await?;

    debug!(found = raws.len(), "find_subjects_by_criteria");
    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn create_subject(&self, subject: NewSubject) -> Result<Subject> {
    let name = subject.name.clone();
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let row = subject.clone();

    let id: Option<SubjectId> = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM subjects WHERE name = ?1",
            rusqlite::params![row.name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(None);
        }
        conn.execute(
          "INSERT INTO subjects
             (name, first_name, last_name, email_address, factive, fsystem, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            row.name,
            row.first_name,
            row.last_name,
            row.email_address,
            row.factive,
            row.fsystem,
            at_str,
          ],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let id = id.ok_or(Error::DuplicateSubject(name))?;
    debug!(subject_id = id, "create_subject");

    Ok(Subject {
      id,
      name: subject.name,
      first_name: subject.first_name,
      last_name: subject.last_name,
      email_address: subject.email_address,
      factive: subject.factive,
      fsystem: subject.fsystem,
      user_configuration: None,
      created_at,
      session_id: None,
    })
  }

  async fn update_subject(&self, mut subject: Subject) -> Result<Subject> {
    let row = subject.clone();
    let properties: Vec<(String, String, bool)> = subject
      .user_configuration
      .iter()
      .flat_map(|c| c.properties.values())
      .map(|p| (p.name.clone(), p.string_value.clone(), p.override_default))
      .collect();

    let outcome: Result<Option<i64>, Error> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let previous: Option<(String, Option<i64>)> = tx
          .query_row(
            "SELECT name, configuration_id FROM subjects WHERE subject_id = ?1",
            rusqlite::params![row.id],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;
        let Some((old_name, previous)) = previous else {
          return Ok(Err(Error::SubjectNotFound(row.id)));
        };

        let renamed = old_name != row.name;
        if renamed {
          let taken = tx
            .query_row(
              "SELECT 1 FROM subjects WHERE name = ?1",
              rusqlite::params![row.name],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if taken {
            return Ok(Err(Error::DuplicateSubject(row.name.clone())));
          }
        }

        let configuration_id = match &row.user_configuration {
          None => None,
          Some(config) => {
            let id = match config.id {
              Some(id) if previous == Some(id) => id,
              Some(id) => {
                return Ok(Err(Error::ConfigurationNotOwned {
                  configuration_id: id,
                  subject_id:       row.id,
                }));
              }
              None => {
                tx.execute("INSERT INTO configurations DEFAULT VALUES", [])?;
                tx.last_insert_rowid()
              }
            };
            tx.execute(
              "DELETE FROM properties WHERE configuration_id = ?1",
              rusqlite::params![id],
            )?;
            for (name, value, override_default) in &properties {
              tx.execute(
                "INSERT INTO properties (configuration_id, name, string_value, override_default)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id, name, value, override_default],
              )?;
            }
            Some(id)
          }
        };

        // The principal is keyed by subject name; both sides move together and
        // the foreign key is checked at commit.
        if renamed {
          tx.pragma_update(None, "defer_foreign_keys", true)?;
          tx.execute(
            "UPDATE principals SET name = ?2 WHERE name = ?1",
            rusqlite::params![old_name, row.name],
          )?;
        }

        tx.execute(
          "UPDATE subjects SET
             name = ?2, first_name = ?3, last_name = ?4, email_address = ?5,
             factive = ?6, fsystem = ?7, configuration_id = ?8
           WHERE subject_id = ?1",
          rusqlite::params![
            row.id,
            row.name,
            row.first_name,
            row.last_name,
            row.email_address,
            row.factive,
            row.fsystem,
            configuration_id,
          ],
        )?;

        if let Some(old) = previous
          && Some(old) != configuration_id
        {
          drop_configuration(&tx, old)?;
        }

        tx.commit()?;
        Ok(Ok(configuration_id))
      })
      .await?;

    let configuration_id = outcome?;
    if let Some(config) = subject.user_configuration.as_mut() {
      config.id = configuration_id;
    }
    debug!(subject_id = subject.id, ?configuration_id, "update_subject");
    Ok(subject)
  }

  async fn delete_subjects(&self, ids: &[SubjectId]) -> Result<()> {
    let ids = ids.to_vec();

    let missing: Option<SubjectId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for id in ids {
          let row: Option<(String, Option<i64>)> = tx
            .query_row(
              "SELECT name, configuration_id FROM subjects WHERE subject_id = ?1",
              rusqlite::params![id],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
          let Some((name, configuration_id)) = row else {
            // Dropping the transaction rolls back earlier deletions.
            return Ok(Some(id));
          };

          tx.execute("DELETE FROM subject_roles WHERE subject_id = ?1", rusqlite::params![id])?;
          tx.execute("DELETE FROM principals WHERE name = ?1", rusqlite::params![name])?;
          tx.execute("DELETE FROM subjects WHERE subject_id = ?1", rusqlite::params![id])?;
          if let Some(configuration_id) = configuration_id {
            drop_configuration(&tx, configuration_id)?;
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match missing {
      Some(id) => Err(Error::SubjectNotFound(id)),
      None => Ok(()),
    }
  }

  // ── Credentials ───────────────────────────────────────────────────────────

  async fn create_principal(&self, name: &str, password: &str) -> Result<()> {
    let password_hash = hash_password(password)?;
    let name_owned = name.to_owned();

    // (subject exists, principal already present)
    let (subject_exists, principal_exists): (bool, bool) = self
      .conn
      .call(move |conn| {
        let subject = conn
          .query_row(
            "SELECT 1 FROM subjects WHERE name = ?1",
            rusqlite::params![name_owned],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        let principal = conn
          .query_row(
            "SELECT 1 FROM principals WHERE name = ?1",
            rusqlite::params![name_owned],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if subject && !principal {
          conn.execute(
            "INSERT INTO principals (name, password_hash) VALUES (?1, ?2)",
            rusqlite::params![name_owned, password_hash],
          )?;
        }
        Ok((subject, principal))
      })
      .await?;

    if !subject_exists {
      return Err(Error::UnknownSubject(name.to_owned()));
    }
    if principal_exists {
      return Err(Error::DuplicatePrincipal(name.to_owned()));
    }
    debug!(name, "create_principal");
    Ok(())
  }

  async fn login(&self, name: &str, password: &str) -> Result<Subject> {
    let name_owned = name.to_owned();

    let found: Option<(String, RawSubject)> = self
      .conn
      .call(move |conn| {
        let hash: Option<String> = conn
          .query_row(
            "SELECT password_hash FROM principals WHERE name = ?1",
            rusqlite::params![name_owned],
            |r| r.get(0),
          )
          .optional()?;
        let Some(hash) = hash else { return Ok(None) };
        Ok(subject_by_name(conn, &name_owned)?.map(|raw| (hash, raw)))
      })
      .await?;

    let (hash, raw) = found.ok_or(Error::InvalidCredentials)?;
    if !raw.factive || !verify_password(password, &hash) {
      return Err(Error::InvalidCredentials);
    }

    let mut subject = raw.into_subject()?;
    subject.session_id = Some(Uuid::new_v4());
    debug!(name, subject_id = subject.id, "login");
    Ok(subject)
  }

  // ── Roles ─────────────────────────────────────────────────────────────────

  async fn find_roles_by_criteria(&self, criteria: &RoleCriteria) -> Result<Vec<Role>> {
    let name = criteria.name.clone();
    let subject_id = criteria.subject_id;
    let strict = criteria.strict;

    let roles = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.role_id, r.name, r.description FROM roles r
           WHERE (?1 IS NULL OR CASE WHEN ?3 THEN r.name = ?1
                                     ELSE instr(lower(r.name), lower(?1)) > 0 END)
             AND (?2 IS NULL OR EXISTS (
                   SELECT 1 FROM subject_roles sr
                   WHERE sr.role_id = r.role_id AND sr.subject_id = ?2))
           ORDER BY r.role_id",
        )?;
        let roles = stmt
          .query_map(rusqlite::params![name, subject_id, strict], role_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(roles)
      })
      .await?;

    Ok(roles)
  }

  async fn add_roles_to_subject(&self, subject_id: SubjectId, role_ids: &[RoleId]) -> Result<()> {
    let role_ids = role_ids.to_vec();

    let outcome: Result<(), Error> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !subject_exists(&tx, subject_id)? {
          return Ok(Err(Error::SubjectNotFound(subject_id)));
        }
        for role_id in role_ids {
          let known = tx
            .query_row(
              "SELECT 1 FROM roles WHERE role_id = ?1",
              rusqlite::params![role_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !known {
            return Ok(Err(Error::RoleNotFound(role_id)));
          }
          tx.execute(
            "INSERT OR IGNORE INTO subject_roles (subject_id, role_id) VALUES (?1, ?2)",
            rusqlite::params![subject_id, role_id],
          )?;
        }
        tx.commit()?;
        Ok(Ok(()))
      })
      .await?;

    outcome?;
    debug!(subject_id, "add_roles_to_subject");
    Ok(())
  }
}
