//! Integration tests for `SqliteDirectory` against an in-memory database.

use rouser_core::{
  Error as CoreError,
  configuration::{Configuration, PropertySimple},
  criteria::{RoleCriteria, SubjectCriteria},
  directory::SubjectDirectory,
  error::ProvisionStep,
  profile::UserProfile,
  provision::{ProvisionOutcome, provision_user, remove_user},
  role::{ALL_RESOURCES_ROLE, SUPER_USER_ROLE},
  subject::NewSubject,
  visibility::SHOW_SUBSYSTEMS_PROPERTY,
};

use crate::{Error, SqliteDirectory};

async fn directory() -> SqliteDirectory {
  SqliteDirectory::open_in_memory()
    .await
    .expect("in-memory directory")
}

async fn named(d: &SqliteDirectory, name: &str) -> Vec<rouser_core::subject::Subject> {
  d.find_subjects_by_criteria(&SubjectCriteria::by_name(name).strict(true))
    .await
    .unwrap()
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn builtin_roles_are_seeded() {
  let d = directory().await;
  let roles = d.find_roles_by_criteria(&RoleCriteria::default()).await.unwrap();
  let names: Vec<_> = roles.iter().map(|r| r.name.as_str()).collect();
  assert_eq!(names, vec![SUPER_USER_ROLE, ALL_RESOURCES_ROLE]);
  assert_eq!(roles[0].id, 1);
}

#[tokio::test]
async fn reopening_file_keeps_data() {
  // WAL mode leaves -wal/-shm files beside the database; keep them all in
  // one scratch directory.
  let dir = std::env::temp_dir().join(format!("rouser-{}", uuid::Uuid::new_v4()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("directory.db");
  {
    let d = SqliteDirectory::open(&path).await.unwrap();
    d.create_subject(NewSubject::new("kept")).await.unwrap();
  }
  let d = SqliteDirectory::open(&path).await.unwrap();
  assert_eq!(named(&d, "kept").await.len(), 1);
  let roles = d.find_roles_by_criteria(&RoleCriteria::default()).await.unwrap();
  assert_eq!(roles.len(), 2);
  drop(d);
  std::fs::remove_dir_all(&dir).ok();
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_find_subject() {
  let d = directory().await;
  let created = d
    .create_subject(NewSubject::new("alice").first_name("Alice").last_name("Liddell"))
    .await
    .unwrap();

  let found = d
    .find_subjects_by_criteria(&SubjectCriteria::by_first_name("Alice").strict(true))
    .await
    .unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].id, created.id);
  assert_eq!(found[0].last_name, "Liddell");
  assert!(found[0].factive);
  assert!(found[0].user_configuration.is_none());
}

#[tokio::test]
async fn duplicate_subject_name_rejected() {
  let d = directory().await;
  d.create_subject(NewSubject::new("bob")).await.unwrap();
  let err = d.create_subject(NewSubject::new("bob")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateSubject(ref n) if n == "bob"));
}

#[tokio::test]
async fn non_strict_filter_matches_substring_ignoring_case() {
  let d = directory().await;
  d.create_subject(NewSubject::new("a").first_name("Username")).await.unwrap();
  d.create_subject(NewSubject::new("b").first_name("SUPERUSER")).await.unwrap();
  d.create_subject(NewSubject::new("c").first_name("admin")).await.unwrap();

  let loose = d
    .find_subjects_by_criteria(&SubjectCriteria::by_first_name("user"))
    .await
    .unwrap();
  assert_eq!(loose.len(), 2);

  let strict = d
    .find_subjects_by_criteria(&SubjectCriteria::by_first_name("user").strict(true))
    .await
    .unwrap();
  assert!(strict.is_empty());
}

#[tokio::test]
async fn results_are_ordered_by_id() {
  let d = directory().await;
  for name in ["z", "y", "x"] {
    d.create_subject(NewSubject::new(name).first_name("Same")).await.unwrap();
  }
  let found = d
    .find_subjects_by_criteria(&SubjectCriteria::by_first_name("Same"))
    .await
    .unwrap();
  let names: Vec<_> = found.iter().map(|s| s.name.as_str()).collect();
  assert_eq!(names, vec!["z", "y", "x"]);
}

#[tokio::test]
async fn update_assigns_configuration_and_replaces_properties() {
  let d = directory().await;
  let mut s = d.create_subject(NewSubject::new("carol")).await.unwrap();

  s.user_configuration = Some(Configuration::new());
  let mut s = d.update_subject(s).await.unwrap();
  let config_id = s.user_configuration.as_ref().unwrap().id.expect("assigned id");

  let config = s.user_configuration.as_mut().unwrap();
  config.put(PropertySimple::new(".ui.a", "1"));
  config.put(PropertySimple::new(".ui.b", "2"));
  let mut s = d.update_subject(s).await.unwrap();
  assert_eq!(s.user_configuration.as_ref().unwrap().id, Some(config_id));

  s.user_configuration.as_mut().unwrap().properties.remove(".ui.a");
  d.update_subject(s).await.unwrap();

  let stored = named(&d, "carol").await.remove(0);
  let config = stored.user_configuration.unwrap();
  assert_eq!(config.id, Some(config_id));
  assert_eq!(config.len(), 1);
  assert_eq!(config.get(".ui.b").unwrap().string_value, "2");
}

#[tokio::test]
async fn non_strict_filter_folds_ascii_case_only() {
  let d = directory().await;
  let s = d.create_subject(NewSubject::new("emile").first_name("Émile Zola")).await.unwrap();

  for (filter, expected) in [("zola", true), ("émile", false), ("ÉMILE", true)] {
    let criteria = SubjectCriteria::by_first_name(filter);
    let found = d.find_subjects_by_criteria(&criteria).await.unwrap();
    assert_eq!(found.len() == 1, expected, "filter {filter:?}");
    assert_eq!(criteria.matches(&s), expected, "in-memory filter {filter:?}");
  }
}

#[tokio::test]
async fn rename_moves_the_login_along() {
  let d = directory().await;
  let mut s = d.create_subject(NewSubject::new("alice")).await.unwrap();
  d.create_principal("alice", "pw").await.unwrap();
  d.add_roles_to_subject(s.id, &[1]).await.unwrap();

  s.name = "alice2".into();
  let renamed = d.update_subject(s).await.unwrap();
  assert_eq!(renamed.name, "alice2");

  assert!(named(&d, "alice").await.is_empty());
  assert_eq!(named(&d, "alice2").await.len(), 1);
  assert!(matches!(d.login("alice", "pw").await, Err(Error::InvalidCredentials)));
  assert_eq!(d.login("alice2", "pw").await.unwrap().id, renamed.id);

  // The renamed subject can still be deleted cleanly.
  d.delete_subjects(&[renamed.id]).await.unwrap();
  assert!(matches!(d.login("alice2", "pw").await, Err(Error::InvalidCredentials)));
}

#[tokio::test]
async fn rename_onto_taken_name_fails() {
  let d = directory().await;
  d.create_subject(NewSubject::new("taken")).await.unwrap();
  let mut s = d.create_subject(NewSubject::new("free")).await.unwrap();
  d.create_principal("free", "pw").await.unwrap();

  s.name = "taken".into();
  let err = d.update_subject(s).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateSubject(ref n) if n == "taken"));
  assert!(d.login("free", "pw").await.is_ok());
}

#[tokio::test]
async fn foreign_configuration_is_rejected() {
  let d = directory().await;
  let mut a = d.create_subject(NewSubject::new("a")).await.unwrap();
  let mut b = d.create_subject(NewSubject::new("b")).await.unwrap();

  let mut config = Configuration::new();
  config.put(PropertySimple::new("k", "a's value"));
  a.user_configuration = Some(config);
  let a = d.update_subject(a).await.unwrap();
  let owned = a.user_configuration.clone().unwrap();
  let owned_id = owned.id.unwrap();

  b.user_configuration = Some(owned);
  let err = d.update_subject(b.clone()).await.unwrap_err();
  assert!(matches!(
    err,
    Error::ConfigurationNotOwned { configuration_id, subject_id }
      if configuration_id == owned_id && subject_id == b.id
  ));
  assert!(named(&d, "b").await[0].user_configuration.is_none());

  // An id that was never issued is rejected the same way.
  b.user_configuration = Some(Configuration { id: Some(9_999), ..Configuration::new() });
  assert!(matches!(
    d.update_subject(b).await,
    Err(Error::ConfigurationNotOwned { configuration_id: 9_999, .. })
  ));

  d.delete_subjects(&[a.id]).await.unwrap();
}

#[tokio::test]
async fn update_missing_subject_fails() {
  let d = directory().await;
  let mut s = d.create_subject(NewSubject::new("ghost")).await.unwrap();
  d.delete_subjects(&[s.id]).await.unwrap();
  s.last_name = "Gone".into();
  let err = d.update_subject(s.clone()).await.unwrap_err();
  assert!(matches!(err, Error::SubjectNotFound(id) if id == s.id));
}

#[tokio::test]
async fn delete_removes_principal_grants_and_configuration() {
  let d = directory().await;
  let mut s = d.create_subject(NewSubject::new("dave")).await.unwrap();
  d.create_principal("dave", "pw").await.unwrap();
  d.add_roles_to_subject(s.id, &[1]).await.unwrap();
  let mut config = Configuration::new();
  config.put(PropertySimple::new("k", "v"));
  s.user_configuration = Some(config);
  let s = d.update_subject(s).await.unwrap();

  d.delete_subjects(&[s.id]).await.unwrap();

  assert!(named(&d, "dave").await.is_empty());
  assert!(matches!(d.login("dave", "pw").await, Err(Error::InvalidCredentials)));
  let held = d.find_roles_by_criteria(&RoleCriteria::by_subject(s.id)).await.unwrap();
  assert!(held.is_empty());

  // The name is free again and the new subject starts without configuration.
  let again = d.create_subject(NewSubject::new("dave")).await.unwrap();
  assert!(again.user_configuration.is_none());
}

#[tokio::test]
async fn delete_unknown_id_rolls_back() {
  let d = directory().await;
  let s = d.create_subject(NewSubject::new("erin")).await.unwrap();
  let err = d.delete_subjects(&[s.id, 9_999]).await.unwrap_err();
  assert!(matches!(err, Error::SubjectNotFound(9_999)));
  assert_eq!(named(&d, "erin").await.len(), 1);
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn principal_login_round() {
  let d = directory().await;
  let s = d.create_subject(NewSubject::new("frank")).await.unwrap();
  d.create_principal("frank", "hunter2").await.unwrap();

  let session = d.login("frank", "hunter2").await.unwrap();
  assert_eq!(session.id, s.id);
  assert!(session.session_id.is_some());

  let other = d.login("frank", "hunter2").await.unwrap();
  assert_ne!(session.session_id, other.session_id);

  assert!(matches!(d.login("frank", "nope").await, Err(Error::InvalidCredentials)));
  assert!(matches!(d.login("nobody", "hunter2").await, Err(Error::InvalidCredentials)));
}

#[tokio::test]
async fn principal_requires_subject_and_is_unique() {
  let d = directory().await;
  assert!(matches!(
    d.create_principal("nobody", "pw").await,
    Err(Error::UnknownSubject(_))
  ));
  d.create_subject(NewSubject::new("gina")).await.unwrap();
  d.create_principal("gina", "pw").await.unwrap();
  assert!(matches!(
    d.create_principal("gina", "pw2").await,
    Err(Error::DuplicatePrincipal(_))
  ));
  // The original credential still works.
  assert!(d.login("gina", "pw").await.is_ok());
}

#[tokio::test]
async fn inactive_subject_cannot_log_in() {
  let d = directory().await;
  let mut s = d.create_subject(NewSubject::new("hank")).await.unwrap();
  d.create_principal("hank", "pw").await.unwrap();
  s.factive = false;
  d.update_subject(s).await.unwrap();
  assert!(matches!(d.login("hank", "pw").await, Err(Error::InvalidCredentials)));
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn grant_is_idempotent_and_filterable() {
  let d = directory().await;
  let s = d.create_subject(NewSubject::new("ivy")).await.unwrap();
  d.add_roles_to_subject(s.id, &[1]).await.unwrap();
  d.add_roles_to_subject(s.id, &[1]).await.unwrap();

  let held = d.find_roles_by_criteria(&RoleCriteria::by_subject(s.id)).await.unwrap();
  assert_eq!(held.len(), 1);
  assert_eq!(held[0].name, SUPER_USER_ROLE);
}

#[tokio::test]
async fn grant_unknown_role_or_subject_fails() {
  let d = directory().await;
  let s = d.create_subject(NewSubject::new("jack")).await.unwrap();
  assert!(matches!(
    d.add_roles_to_subject(s.id, &[1, 42]).await,
    Err(Error::RoleNotFound(42))
  ));
  // Role 1 was rolled back with the failed grant.
  let held = d.find_roles_by_criteria(&RoleCriteria::by_subject(s.id)).await.unwrap();
  assert!(held.is_empty());

  assert!(matches!(
    d.add_roles_to_subject(777, &[1]).await,
    Err(Error::SubjectNotFound(777))
  ));
}

#[tokio::test]
async fn role_lookup_by_exact_name() {
  let d = directory().await;
  let exact = d
    .find_roles_by_criteria(&RoleCriteria::by_name(SUPER_USER_ROLE).strict(true))
    .await
    .unwrap();
  assert_eq!(exact.len(), 1);
  let loose = d.find_roles_by_criteria(&RoleCriteria::by_name("role")).await.unwrap();
  assert_eq!(loose.len(), 2);
}

// ─── Admin bootstrap ─────────────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_admin_creates_then_resets() {
  let d = directory().await;
  let admin = d.bootstrap_admin("rhqadmin", "first").await.unwrap();
  assert!(admin.fsystem);
  assert!(d.login("rhqadmin", "first").await.is_ok());

  let again = d.bootstrap_admin("rhqadmin", "second").await.unwrap();
  assert_eq!(again.id, admin.id);
  assert!(d.login("rhqadmin", "first").await.is_err());
  assert!(d.login("rhqadmin", "second").await.is_ok());

  let held = d.find_roles_by_criteria(&RoleCriteria::by_subject(admin.id)).await.unwrap();
  assert_eq!(held.len(), 1);
  assert_eq!(held[0].name, SUPER_USER_ROLE);
}

// ─── Procedures end to end ───────────────────────────────────────────────────

#[tokio::test]
async fn provision_grants_role_and_stores_visibility() {
  let d = directory().await;
  let profile = UserProfile::default();

  let outcome = provision_user(&d, &profile).await.unwrap();
  let ProvisionOutcome::Created(created) = outcome else {
    panic!("expected the subject to be created");
  };

  let held = d.find_roles_by_criteria(&RoleCriteria::by_subject(created.id)).await.unwrap();
  assert_eq!(held.len(), 1);
  assert_eq!(held[0].id, 1);

  let stored = named(&d, "Username").await;
  assert_eq!(stored.len(), 1);
  let config = stored[0].user_configuration.as_ref().expect("configuration");
  assert_eq!(config.len(), 1);
  let prop = config.get(SHOW_SUBSYSTEMS_PROPERTY).unwrap();
  assert_eq!(prop.string_value, "1|1|1|1|1|1|1|1");
  assert!(!prop.override_default);
}

#[tokio::test]
async fn provision_twice_leaves_one_subject() {
  let d = directory().await;
  let profile = UserProfile::default();
  provision_user(&d, &profile).await.unwrap();
  let second = provision_user(&d, &profile).await.unwrap();
  assert!(matches!(second, ProvisionOutcome::AlreadyExists { .. }));
  assert_eq!(named(&d, "Username").await.len(), 1);
}

#[tokio::test]
async fn provision_without_role_reports_partial_subject() {
  let d = directory().await;
  let profile = UserProfile { role: "Missing Role".into(), ..UserProfile::default() };
  let err = provision_user(&d, &profile).await.unwrap_err();
  match err {
    CoreError::Provisioning { step, source, .. } => {
      assert_eq!(step, ProvisionStep::LookupRole);
      assert!(matches!(*source, CoreError::RoleNotFound(_)));
    }
    other => panic!("unexpected error: {other:?}"),
  }
  assert_eq!(named(&d, "Username").await.len(), 1);
}

#[tokio::test]
async fn remove_on_empty_directory_fails_explicitly() {
  let d = directory().await;
  let err = remove_user(&d, &UserProfile::default()).await.unwrap_err();
  assert!(matches!(err, CoreError::SubjectNotFound(_)));
  let all = d.find_subjects_by_criteria(&SubjectCriteria::default()).await.unwrap();
  assert!(all.is_empty());
}

#[tokio::test]
async fn full_lifecycle_from_empty_directory() {
  let d = directory().await;
  let profile = UserProfile::default();

  provision_user(&d, &profile).await.unwrap();
  assert_eq!(named(&d, "Username").await.len(), 1);
  assert!(d.login(&profile.name, &profile.password).await.is_ok());

  let removed = remove_user(&d, &profile).await.unwrap();
  assert!(removed.ignored_matches.is_empty());

  let all = d.find_subjects_by_criteria(&SubjectCriteria::default()).await.unwrap();
  assert!(all.is_empty());
  assert!(matches!(
    d.login(&profile.name, &profile.password).await,
    Err(Error::InvalidCredentials)
  ));
}
