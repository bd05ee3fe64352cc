//! The provisioning and removal procedures.
//!
//! Both run strictly sequential calls against a caller-supplied
//! [`SubjectDirectory`]. Provisioning is guarded by an existence check, so a
//! second run is a no-op. Its body is not transactional: a failure after the
//! subject has been created leaves that subject in place and is reported as
//! [`Error::Provisioning`].

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  configuration::Configuration,
  criteria::{RoleCriteria, SubjectCriteria},
  directory::SubjectDirectory,
  error::ProvisionStep,
  profile::UserProfile,
  subject::{Subject, SubjectId},
};

/// What [`provision_user`] did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProvisionOutcome {
  /// A subject with the profile's first name was already present.
  AlreadyExists { subject_id: SubjectId },
  /// The subject was created and fully configured.
  Created(Subject),
}

/// What [`remove_user`] did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalOutcome {
  pub subject_id:      SubjectId,
  /// Further subjects that matched the lookup and were left alone.
  pub ignored_matches: Vec<SubjectId>,
}

fn lookup(profile: &UserProfile) -> SubjectCriteria {
  SubjectCriteria::by_first_name(&profile.first_name).strict(true)
}

/// Ensure the subject described by `profile` exists, can log in, holds the
/// profile's role, and has its subsystem visibility stored.
pub async fn provision_user<D>(directory: &D, profile: &UserProfile) -> Result<ProvisionOutcome>
where
  D: SubjectDirectory,
{
  let existing = directory
    .find_subjects_by_criteria(&lookup(profile))
    .await
    .map_err(Error::directory)?;

  if let Some(subject) = existing.first() {
    info!(name = %profile.name, subject_id = subject.id, "user already exists");
    return Ok(ProvisionOutcome::AlreadyExists { subject_id: subject.id });
  }

  let created = directory
    .create_subject(profile.new_subject())
    .await
    .map_err(Error::directory)?;
  debug!(subject_id = created.id, "subject created");

  let subject_id = created.id;
  let partial = |step: ProvisionStep| {
    move |source: Error| Error::Provisioning { subject_id, step, source: Box::new(source) }
  };

  directory
    .create_principal(&created.name, &profile.password)
    .await
    .map_err(Error::directory)
    .map_err(partial(ProvisionStep::CreatePrincipal))?;
  debug!(subject_id, "principal created");

  let roles = directory
    .find_roles_by_criteria(&RoleCriteria::by_name(&profile.role).strict(true))
    .await
    .map_err(Error::directory)
    .map_err(partial(ProvisionStep::LookupRole))?;
  let role = roles
    .first()
    .ok_or_else(|| Error::RoleNotFound(profile.role.clone()))
    .map_err(partial(ProvisionStep::LookupRole))?;

  directory
    .add_roles_to_subject(subject_id, &[role.id])
    .await
    .map_err(Error::directory)
    .map_err(partial(ProvisionStep::GrantRole))?;
  debug!(subject_id, role_id = role.id, "role granted");

  let mut session = directory
    .login(&created.name, &profile.password)
    .await
    .map_err(Error::directory)
    .map_err(partial(ProvisionStep::Login))?;

  session.user_configuration = Some(Configuration::new());
  let mut subject = directory
    .update_subject(session)
    .await
    .map_err(Error::directory)
    .map_err(partial(ProvisionStep::AttachConfiguration))?;

  subject
    .user_configuration
    .get_or_insert_with(Configuration::new)
    .put(profile.visibility.to_property());
  let subject = directory
    .update_subject(subject)
    .await
    .map_err(Error::directory)
    .map_err(partial(ProvisionStep::StoreVisibility))?;

  info!(name = %subject.name, subject_id, "user created");
  Ok(ProvisionOutcome::Created(subject))
}

/// Delete the subject described by `profile`.
///
/// Zero matches is [`Error::SubjectNotFound`] and changes nothing. If several
/// subjects match, only the first is deleted and the rest are reported.
pub async fn remove_user<D>(directory: &D, profile: &UserProfile) -> Result<RemovalOutcome>
where
  D: SubjectDirectory,
{
  let matches = directory
    .find_subjects_by_criteria(&lookup(profile))
    .await
    .map_err(Error::directory)?;

  let (first, rest) = matches
    .split_first()
    .ok_or_else(|| Error::SubjectNotFound(profile.first_name.clone()))?;

  let ignored_matches: Vec<SubjectId> = rest.iter().map(|s| s.id).collect();
  if !ignored_matches.is_empty() {
    warn!(
      first_name = %profile.first_name,
      deleting = first.id,
      ignored = ?ignored_matches,
      "several subjects match; deleting only the first"
    );
  }

  directory
    .delete_subjects(&[first.id])
    .await
    .map_err(Error::directory)?;

  info!(name = %first.name, subject_id = first.id, "user deleted");
  Ok(RemovalOutcome { subject_id: first.id, ignored_matches })
}
