use chrono::Local;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
  fs,
  io::Write,
  path::{Path, PathBuf},
};
use tracing::{debug, warn};

use crate::config::TournamentConfig;
use crate::error::StoreError;
use crate::roster::Roster;
use crate::types::{Bracket, CompletedMatch};

/// One archived match, stamped with the tournament it belonged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
  pub tournament_id: String,
  pub archived_at: String,
  pub match_label: String,
  pub slot_a: String,
  pub slot_b: String,
  pub winner: String,
}

/// File-backed state: bracket blobs by key, the roster, and the match archive.
#[derive(Debug, Clone)]
pub struct TournamentStore {
  root: PathBuf,
}

impl TournamentStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    TournamentStore { root: root.into() }
  }

  pub fn from_config(config: &TournamentConfig) -> Self {
    TournamentStore::new(config.data_dir.clone())
  }

  pub fn bracket_path(&self, key: &str) -> PathBuf {
    self.root.join("brackets").join(format!("{key}.json"))
  }

  pub fn roster_path(&self) -> PathBuf {
    self.root.join("roster.json")
  }

  pub fn archive_path(&self) -> PathBuf {
    self.root.join("archive.jsonl")
  }

  /// `None` means no tournament is running under `key`.
  pub fn load_bracket(&self, key: &str) -> Result<Option<Bracket>, StoreError> {
    read_json(&self.bracket_path(key))
  }

  /// Saving `None` clears the key.
  pub fn save_bracket(&self, key: &str, bracket: Option<&Bracket>) -> Result<(), StoreError> {
    let path = self.bracket_path(key);
    match bracket {
      Some(bracket) => write_json(&path, bracket),
      None => {
        if path.is_file() {
          fs::remove_file(&path).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
          })?;
          debug!(path = %path.display(), "cleared bracket");
        }
        Ok(())
      }
    }
  }

  pub fn load_roster(&self) -> Result<Roster, StoreError> {
    Ok(read_json(&self.roster_path())?.unwrap_or_default())
  }

  pub fn save_roster(&self, roster: &Roster) -> Result<(), StoreError> {
    write_json(&self.roster_path(), roster)
  }

  /// Append every completed match under a fresh tournament id. Returns the id.
  pub fn append_archive(&self, matches: &[CompletedMatch]) -> Result<String, StoreError> {
    let now = Local::now();
    let tournament_id = now.format("T%Y%m%d-%H%M%S%.3f").to_string();
    let archived_at = now.to_rfc3339();

    let mut payload = String::new();
    for m in matches {
      let entry = ArchiveEntry {
        tournament_id: tournament_id.clone(),
        archived_at: archived_at.clone(),
        match_label: m.match_id.clone(),
        slot_a: m.slot_a.clone(),
        slot_b: m.slot_b.clone(),
        winner: m.winner.clone(),
      };
      payload.push_str(&serde_json::to_string(&entry)?);
      payload.push('\n');
    }

    let path = self.archive_path();
    ensure_parent(&path)?;
    let mut file = fs::OpenOptions::new()
      .create(true)
      .append(true)
      .open(&path)
      .map_err(|source| StoreError::Write {
        path: path.clone(),
        source,
      })?;
    file.write_all(payload.as_bytes()).map_err(|source| StoreError::Write {
      path: path.clone(),
      source,
    })?;
    debug!(path = %path.display(), tournament_id = %tournament_id, entries = matches.len(), "archived");
    Ok(tournament_id)
  }

  pub fn load_archive(&self) -> Result<Vec<ArchiveEntry>, StoreError> {
    let path = self.archive_path();
    if !path.is_file() {
      return Ok(Vec::new());
    }
    let data = fs::read_to_string(&path).map_err(|source| StoreError::Read {
      path: path.clone(),
      source,
    })?;
    let mut entries = Vec::new();
    for line in data.lines().filter(|line| !line.trim().is_empty()) {
      match serde_json::from_str::<ArchiveEntry>(line) {
        Ok(entry) => entries.push(entry),
        Err(e) => warn!(path = %path.display(), "skipping unreadable archive line: {e}"),
      }
    }
    Ok(entries)
  }
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|source| StoreError::Write {
      path: parent.to_path_buf(),
      source,
    })?;
  }
  Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
  if !path.is_file() {
    return Ok(None);
  }
  let data = fs::read_to_string(path).map_err(|source| StoreError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let value = serde_json::from_str(&data).map_err(|source| StoreError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
  ensure_parent(path)?;
  let payload = serde_json::to_string_pretty(value)?;
  fs::write(path, payload).map_err(|source| StoreError::Write {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(path = %path.display(), "saved");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bracket::{build_bracket_in_order, extract_completed_matches, report_result};
  use crate::test_support::field;
  use crate::types::Slot;

  #[test]
  fn missing_bracket_means_no_tournament() {
    let dir = tempfile::tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    assert_eq!(store.load_bracket("active").unwrap(), None);
    store.save_bracket("active", None).unwrap();
  }

  #[test]
  fn bracket_blob_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    let mut bracket = build_bracket_in_order(&field(&["A", "B", "C"])).unwrap();
    report_result(&mut bracket, "W1-1", Slot::B).unwrap();

    store.save_bracket("spring", Some(&bracket)).unwrap();
    assert_eq!(store.load_bracket("spring").unwrap(), Some(bracket));
    assert_eq!(store.load_bracket("autumn").unwrap(), None);

    store.save_bracket("spring", None).unwrap();
    assert_eq!(store.load_bracket("spring").unwrap(), None);
  }

  #[test]
  fn roster_defaults_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    assert!(store.load_roster().unwrap().is_empty());

    let mut roster = Roster::new();
    roster.add_player("Ann");
    store.save_roster(&roster).unwrap();
    assert_eq!(store.load_roster().unwrap(), roster);
  }

  #[test]
  fn archive_appends_per_tournament() {
    let dir = tempfile::tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    let mut bracket = build_bracket_in_order(&field(&["A", "B", "C", "D"])).unwrap();
    report_result(&mut bracket, "W1-1", Slot::A).unwrap();
    report_result(&mut bracket, "W1-2", Slot::B).unwrap();

    let first = store.append_archive(&extract_completed_matches(&bracket)).unwrap();
    store.append_archive(&extract_completed_matches(&bracket)[..1]).unwrap();

    let entries = store.load_archive().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].tournament_id, first);
    assert_eq!(entries[0].match_label, "W1-1");
    assert_eq!(entries[1].winner, "D");
  }

  #[test]
  fn corrupt_bracket_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = TournamentStore::new(dir.path());
    let path = store.bracket_path("active");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "[]").unwrap();
    assert!(matches!(store.load_bracket("active"), Err(StoreError::Parse { .. })));
  }
}
