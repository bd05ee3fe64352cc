//! The `SubjectDirectory` trait.
//!
//! The directory owns every piece of persistent state the procedures touch:
//! subjects, principals, roles, grants and user configuration. Implemented by
//! backends such as `rouser-store-sqlite`; the procedures in
//! [`provision`](crate::provision) depend only on this abstraction.

use std::future::Future;

use crate::{
  criteria::{RoleCriteria, SubjectCriteria},
  role::{Role, RoleId},
  subject::{NewSubject, Subject, SubjectId},
};

/// Abstraction over a subject/role directory backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait SubjectDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Return all subjects matching `criteria`, ordered by id.
  fn find_subjects_by_criteria<'a>(
    &'a self,
    criteria: &'a SubjectCriteria,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + 'a;

  /// Persist a new subject and return it with its assigned id.
  ///
  /// Returns an error if a subject with the same name already exists.
  fn create_subject(
    &self,
    subject: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Persist the subject's attributes and user configuration.
  ///
  /// A configuration without an id is stored as a new configuration; the
  /// returned subject carries the assigned id. A configuration with an id must
  /// be the one the subject already holds. The stored property set is replaced
  /// by the one on `subject`. Renaming a subject carries its principal along.
  fn update_subject(
    &self,
    subject: Subject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Delete the given subjects together with their principals, grants and
  /// configuration.
  fn delete_subjects<'a>(
    &'a self,
    ids: &'a [SubjectId],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Credentials ───────────────────────────────────────────────────────

  /// Bind a login credential to the subject called `name`.
  fn create_principal<'a>(
    &'a self,
    name: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Authenticate and return the subject with a fresh `session_id`.
  fn login<'a>(
    &'a self,
    name: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + 'a;

  // ── Roles ─────────────────────────────────────────────────────────────

  /// Return all roles matching `criteria`, ordered by id.
  fn find_roles_by_criteria<'a>(
    &'a self,
    criteria: &'a RoleCriteria,
  ) -> impl Future<Output = Result<Vec<Role>, Self::Error>> + Send + 'a;

  /// Grant the given roles to a subject. Granting an already-held role is a
  /// no-op.
  fn add_roles_to_subject<'a>(
    &'a self,
    subject_id: SubjectId,
    role_ids: &'a [RoleId],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
