//! Subcommand implementations. Each returns the line(s) to print.

use anyhow::{Context as _, Result};
use rouser_core::{
  criteria::{RoleCriteria, SubjectCriteria},
  directory::SubjectDirectory,
  provision::{ProvisionOutcome, provision_user, remove_user},
};
use rouser_store_sqlite::SqliteDirectory;
use serde_json::json;
use tracing::info;

use crate::settings::Settings;

/// `rouser init` — make sure the admin subject exists and knows the
/// configured password.
pub async fn init(directory: &SqliteDirectory, settings: &Settings) -> Result<String> {
  let admin = directory
    .bootstrap_admin(&settings.admin_username, &settings.admin_password)
    .await
    .context("failed to bootstrap admin subject")?;
  info!(subject_id = admin.id, "directory initialised");
  Ok(format!("Directory ready, admin is {}", admin.name))
}

/// Authenticate the operator as the configured admin. A failed check aborts
/// the command; the session handle itself is only logged.
async fn login_admin<D>(directory: &D, settings: &Settings) -> Result<()>
where
  D: SubjectDirectory,
{
  let admin = directory
    .login(&settings.admin_username, &settings.admin_password)
    .await
    .with_context(|| format!("admin login as {:?} failed", settings.admin_username))?;
  info!(admin = %admin.name, session = ?admin.session_id, "operator authenticated");
  Ok(())
}

/// `rouser provision`
pub async fn provision<D>(directory: &D, settings: &Settings) -> Result<String>
where
  D: SubjectDirectory,
{
  login_admin(directory, settings).await?;
  let name = &settings.user.name;
  let outcome = provision_user(directory, &settings.user)
    .await
    .with_context(|| format!("failed to provision user {name}"))?;
  Ok(match outcome {
    ProvisionOutcome::AlreadyExists { .. } => format!("User {name} already exists"),
    ProvisionOutcome::Created(_) => format!("User {name} created"),
  })
}

/// `rouser remove`
pub async fn remove<D>(directory: &D, settings: &Settings) -> Result<String>
where
  D: SubjectDirectory,
{
  login_admin(directory, settings).await?;
  let name = &settings.user.name;
  let outcome = remove_user(directory, &settings.user)
    .await
    .with_context(|| format!("failed to remove user {name}"))?;
  let mut report = format!("User {name} deleted");
  if !outcome.ignored_matches.is_empty() {
    report.push_str(&format!(
      " ({} other matching subject(s) left in place: {:?})",
      outcome.ignored_matches.len(),
      outcome.ignored_matches,
    ));
  }
  Ok(report)
}

/// `rouser show` — the target subject with its roles, as pretty JSON.
pub async fn show<D>(directory: &D, settings: &Settings) -> Result<String>
where
  D: SubjectDirectory,
{
  login_admin(directory, settings).await?;
  let criteria = SubjectCriteria::by_first_name(&settings.user.first_name).strict(true);
  let subjects = directory
    .find_subjects_by_criteria(&criteria)
    .await
    .context("subject lookup failed")?;

  let Some(subject) = subjects.into_iter().next() else {
    return Ok(format!("User {} does not exist", settings.user.name));
  };
  let roles = directory
    .find_roles_by_criteria(&RoleCriteria::by_subject(subject.id))
    .await
    .context("role lookup failed")?;

  serde_json::to_string_pretty(&json!({ "subject": subject, "roles": roles }))
    .context("serialising subject")
}
