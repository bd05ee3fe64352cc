//! Runtime settings, layered from an optional TOML file and `ROUSER_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rouser_core::profile::UserProfile;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite file holding the directory. A leading `~/` is expanded.
  pub directory_path: PathBuf,
  pub admin_username: String,
  pub admin_password: String,
  /// The account to provision and remove.
  pub user:           UserProfile,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      directory_path: PathBuf::from("rouser.db"),
      admin_username: "rhqadmin".to_owned(),
      admin_password: "rhqadmin".to_owned(),
      user:           UserProfile::default(),
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and the environment.
  ///
  /// `ROUSER_ADMIN_PASSWORD=…` sets a top-level key; nested profile fields use
  /// a double underscore, e.g. `ROUSER_USER__PASSWORD=…`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ROUSER")
          .prefix_separator("_")
          .separator("__"),
      );
    Self::build(builder)
  }

  fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> anyhow::Result<Self> {
    let settings = builder.build().context("failed to read config file")?;
    let mut settings: Self = settings
      .try_deserialize()
      .context("failed to deserialise Settings")?;
    settings.directory_path = expand_tilde(&settings.directory_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
