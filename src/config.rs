use serde::{Deserialize, Serialize};
use std::{
  env, fs,
  path::{Path, PathBuf},
};

use crate::error::StoreError;
use crate::types::RenamePolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TournamentConfig {
  pub data_dir: PathBuf,
  pub log_dir: PathBuf,
  pub log_filter: String,
  pub bracket_key: String,
  pub rename_policy: RenamePolicy,
}

impl Default for TournamentConfig {
  fn default() -> Self {
    TournamentConfig {
      data_dir: PathBuf::from("data"),
      log_dir: PathBuf::from("logs"),
      log_filter: "info".to_string(),
      bracket_key: "active".to_string(),
      rename_policy: RenamePolicy::Reject,
    }
  }
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn env_flag_true_default(key: &str, default: bool) -> bool {
  match env::var(key) {
    Ok(value) => {
      let value = value.trim().to_ascii_lowercase();
      matches!(value.as_str(), "1" | "true" | "yes" | "on")
    }
    Err(_) => default,
  }
}

pub fn apply_env_defaults(mut config: TournamentConfig) -> TournamentConfig {
  if let Some(value) = env_default("BRACKET_DATA_DIR") {
    config.data_dir = PathBuf::from(value);
  }
  if let Some(value) = env_default("BRACKET_LOG_DIR") {
    config.log_dir = PathBuf::from(value);
  }
  if let Some(value) = env_default("BRACKET_LOG_FILTER") {
    config.log_filter = value;
  }
  if let Some(value) = env_default("BRACKET_KEY") {
    config.bracket_key = value;
  }
  let merge = env_flag_true_default("BRACKET_RENAME_MERGE", config.rename_policy == RenamePolicy::Merge);
  config.rename_policy = if merge { RenamePolicy::Merge } else { RenamePolicy::Reject };
  config
}

/// Defaults when the file is absent; environment variables override either way.
pub fn load_config(path: &Path) -> Result<TournamentConfig, StoreError> {
  if !path.is_file() {
    return Ok(apply_env_defaults(TournamentConfig::default()));
  }
  let data = fs::read_to_string(path).map_err(|source| StoreError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let config = serde_json::from_str::<TournamentConfig>(&data).map_err(|source| StoreError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(apply_env_defaults(config))
}

pub fn save_config(path: &Path, config: &TournamentConfig) -> Result<(), StoreError> {
  let payload = serde_json::to_string_pretty(config)?;
  fs::write(path, payload).map_err(|source| StoreError::Write {
    path: path.to_path_buf(),
    source,
  })
}

/// Load `KEY=value` lines into the process environment without overriding
/// anything already set. A missing or unreadable file is ignored.
pub fn load_env_file(path: &Path) {
  let Ok(contents) = fs::read_to_string(path) else {
    return;
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_env_lines() {
    assert_eq!(parse_env_line("# comment"), None);
    assert_eq!(parse_env_line("   "), None);
    assert_eq!(parse_env_line("=value"), None);
    assert_eq!(
      parse_env_line("export BRACKET_KEY=spring"),
      Some(("BRACKET_KEY".to_string(), "spring".to_string()))
    );
    assert_eq!(
      parse_env_line("BRACKET_LOG_FILTER=\"debug # not a comment\""),
      Some(("BRACKET_LOG_FILTER".to_string(), "debug # not a comment".to_string()))
    );
    assert_eq!(
      parse_env_line("BRACKET_DATA_DIR=/srv/hockey # trailing"),
      Some(("BRACKET_DATA_DIR".to_string(), "/srv/hockey".to_string()))
    );
  }

  #[test]
  fn missing_fields_fall_back_to_defaults() {
    let config: TournamentConfig = serde_json::from_str(r#"{"renamePolicy":"merge"}"#).unwrap();
    assert_eq!(config.rename_policy, RenamePolicy::Merge);
    assert_eq!(config.bracket_key, "active");
    assert_eq!(config.data_dir, PathBuf::from("data"));
  }

  #[test]
  fn config_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = TournamentConfig {
      data_dir: dir.path().join("state"),
      log_filter: "bracket_desk=debug".to_string(),
      ..TournamentConfig::default()
    };
    save_config(&path, &config).unwrap();
    let data = fs::read_to_string(&path).unwrap();
    assert!(data.contains("\"logFilter\""));
    let back: TournamentConfig = serde_json::from_str(&data).unwrap();
    assert_eq!(back, config);
  }

  // The only test in this crate that touches BRACKET_* variables.
  #[test]
  fn env_file_and_overrides_apply_over_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = dir.path().join(".env");
    fs::write(
      &env_path,
      "# local overrides\nBRACKET_KEY=spring\nexport BRACKET_DATA_DIR=\"/srv/brackets\"\nBRACKET_RENAME_MERGE=yes\n",
    )
    .unwrap();
    env::set_var("BRACKET_KEY", "summer");
    load_env_file(&env_path);
    load_env_file(&dir.path().join("missing.env"));

    let config_path = dir.path().join("config.json");
    fs::write(&config_path, r#"{"bracketKey":"winter","logFilter":"warn"}"#).unwrap();
    let config = load_config(&config_path).unwrap();

    for key in ["BRACKET_KEY", "BRACKET_DATA_DIR", "BRACKET_RENAME_MERGE"] {
      env::remove_var(key);
    }

    // Already-set variables win over the .env file; both win over the config file.
    assert_eq!(config.bracket_key, "summer");
    assert_eq!(config.data_dir, PathBuf::from("/srv/brackets"));
    assert_eq!(config.rename_policy, RenamePolicy::Merge);
    assert_eq!(config.log_filter, "warn");
    assert_eq!(apply_env_defaults(config).rename_policy, RenamePolicy::Merge);
  }

  #[test]
  fn unparsable_config_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, "{ not json").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }));
    assert!(err.to_string().contains("config.json"));
  }
}
