use rand::Rng;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::bracket::{
  build_bracket_with_rng, extract_completed_matches, rename_participant, report_result,
  report_result_by_name, undo_result,
};
use crate::config::TournamentConfig;
use crate::error::{BracketError, StoreError};
use crate::roster::Roster;
use crate::store::TournamentStore;
use crate::types::{Bracket, RenamePolicy, SharedDesk, Slot};

/// Owns the persisted tournament. Every mutation is load, mutate, save; a
/// failed mutation never reaches the disk.
#[derive(Debug, Clone)]
pub struct TournamentDesk {
  store: TournamentStore,
  bracket_key: String,
  rename_policy: RenamePolicy,
}

impl TournamentDesk {
  pub fn new(store: TournamentStore, bracket_key: impl Into<String>, rename_policy: RenamePolicy) -> Self {
    TournamentDesk {
      store,
      bracket_key: bracket_key.into(),
      rename_policy,
    }
  }

  pub fn from_config(config: &TournamentConfig) -> Self {
    TournamentDesk::new(
      TournamentStore::from_config(config),
      config.bracket_key.clone(),
      config.rename_policy,
    )
  }

  pub fn shared(self) -> SharedDesk {
    Arc::new(Mutex::new(self))
  }

  pub fn store(&self) -> &TournamentStore {
    &self.store
  }

  pub fn bracket_key(&self) -> &str {
    &self.bracket_key
  }

  pub fn active(&self) -> Result<Option<Bracket>, StoreError> {
    self.store.load_bracket(&self.bracket_key)
  }

  pub fn roster(&self) -> Result<Roster, StoreError> {
    self.store.load_roster()
  }

  pub fn add_player(&mut self, name: &str) -> Result<bool, StoreError> {
    let name = name.trim();
    if !crate::builder::is_valid_name(name) {
      return Err(BracketError::InvalidName(name.to_string()).into());
    }
    let mut roster = self.store.load_roster()?;
    let added = roster.add_player(name);
    if added {
      self.store.save_roster(&roster)?;
    }
    Ok(added)
  }

  pub fn start(&mut self, selected: &[String]) -> Result<Bracket, StoreError> {
    self.start_with_rng(selected, &mut rand::thread_rng())
  }

  /// Seed a new tournament from `selected` and count it towards each known
  /// player's participation.
  pub fn start_with_rng<R: Rng + ?Sized>(
    &mut self,
    selected: &[String],
    rng: &mut R,
  ) -> Result<Bracket, StoreError> {
    if self.active()?.is_some() {
      return Err(StoreError::TournamentInProgress(self.bracket_key.clone()));
    }
    let bracket = build_bracket_with_rng(selected, rng)?;

    let mut roster = self.store.load_roster()?;
    let bumped = roster.record_participation(&bracket.participants());
    if bumped < bracket.participants().len() {
      warn!(
        selected = selected.len(),
        known = bumped,
        "some participants are not on the roster"
      );
    }
    self.store.save_roster(&roster)?;
    self.store.save_bracket(&self.bracket_key, Some(&bracket))?;
    info!(key = %self.bracket_key, participants = selected.len(), "tournament started");
    Ok(bracket)
  }

  pub fn report(&mut self, match_id: &str, winner_slot: Slot) -> Result<Bracket, StoreError> {
    self.mutate(|bracket| report_result(bracket, match_id, winner_slot))
      .map(|(bracket, ())| bracket)
  }

  pub fn report_by_name(&mut self, match_id: &str, winner: &str) -> Result<Bracket, StoreError> {
    self.mutate(|bracket| report_result_by_name(bracket, match_id, winner))
      .map(|(bracket, ())| bracket)
  }

  /// Returns the bracket and how many results were cleared.
  pub fn undo(&mut self, match_id: &str) -> Result<(Bracket, usize), StoreError> {
    self.mutate(|bracket| undo_result(bracket, match_id))
  }

  pub fn rename(&mut self, old: &str, new: &str) -> Result<(Bracket, usize), StoreError> {
    let policy = self.rename_policy;
    self.mutate(|bracket| rename_participant(bracket, old, new, policy))
  }

  /// Write every completed match to the archive and clear the active bracket.
  /// Returns how many matches were archived.
  pub fn archive_and_reset(&mut self) -> Result<usize, StoreError> {
    let bracket = self.active()?.ok_or(StoreError::NoActiveTournament)?;
    let completed = extract_completed_matches(&bracket);
    if !completed.is_empty() {
      let tournament_id = self.store.append_archive(&completed)?;
      info!(key = %self.bracket_key, tournament_id = %tournament_id, matches = completed.len(), "tournament archived");
    }
    self.store.save_bracket(&self.bracket_key, None)?;
    Ok(completed.len())
  }

  fn mutate<F, R>(&mut self, f: F) -> Result<(Bracket, R), StoreError>
  where
    F: FnOnce(&mut Bracket) -> Result<R, BracketError>,
  {
    let mut bracket = self.active()?.ok_or(StoreError::NoActiveTournament)?;
    let out = f(&mut bracket)?;
    self.store.save_bracket(&self.bracket_key, Some(&bracket))?;
    Ok((bracket, out))
  }
}

/// Lock the shared desk, then call `f` with it. Only one caller mutates at a time.
pub fn with_desk<F, R>(desk: &SharedDesk, f: F) -> Result<R, StoreError>
where
  F: FnOnce(&mut TournamentDesk) -> Result<R, StoreError>,
{
  let mut guard = desk.lock().map_err(|_| StoreError::LockPoisoned)?;
  f(&mut guard)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::field;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use std::thread;

  fn desk_in(dir: &std::path::Path) -> TournamentDesk {
    TournamentDesk::new(TournamentStore::new(dir), "active", RenamePolicy::Reject)
  }

  #[test]
  fn nothing_active_until_started() {
    let dir = tempfile::tempdir().unwrap();
    let mut desk = desk_in(dir.path());
    assert_eq!(desk.active().unwrap(), None);
    assert!(matches!(desk.report("W1-1", Slot::A), Err(StoreError::NoActiveTournament)));
    assert!(matches!(desk.archive_and_reset(), Err(StoreError::NoActiveTournament)));
  }

  #[test]
  fn start_records_participation_and_refuses_a_second_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut desk = desk_in(dir.path());
    for name in ["Ann", "Bob", "Cid"] {
      assert!(desk.add_player(name).unwrap());
    }
    let bracket = desk.start(&field(&["Ann", "Bob"])).unwrap();
    assert_eq!(bracket.participants(), vec!["Ann", "Bob"]);
    assert_eq!(desk.active().unwrap(), Some(bracket));

    let roster = desk.roster().unwrap();
    assert_eq!(roster.ranked(), vec!["Ann", "Bob", "Cid"]);
    assert_eq!(roster.get("Cid").unwrap().participation, 0);
    assert_eq!(roster.get("Ann").unwrap().participation, 1);

    assert!(matches!(
      desk.start(&field(&["Ann", "Cid"])),
      Err(StoreError::TournamentInProgress(key)) if key == desk.bracket_key()
    ));
  }

  #[test]
  fn rejected_report_leaves_the_file_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut desk = desk_in(dir.path());
    let mut rng = StdRng::seed_from_u64(7);
    let before = desk.start_with_rng(&field(&["A", "B", "C", "D"]), &mut rng).unwrap();

    let err = desk.report("W2-1", Slot::A).unwrap_err();
    assert!(matches!(
      err,
      StoreError::Bracket(BracketError::SlotEmpty { .. })
    ));
    assert_eq!(desk.active().unwrap(), Some(before));
  }

  #[test]
  fn report_undo_and_rename_persist() {
    let dir = tempfile::tempdir().unwrap();
    let mut desk = desk_in(dir.path());
    let mut rng = StdRng::seed_from_u64(7);
    let start = desk.start_with_rng(&field(&["A", "B", "C", "D"]), &mut rng).unwrap();
    let winner = start.find("W1-1").unwrap().slot_a.clone().unwrap();

    let after = desk.report_by_name("W1-1", &winner).unwrap();
    assert_eq!(after.find("W1-1").unwrap().winner.as_deref(), Some(winner.as_str()));
    assert_eq!(desk.active().unwrap(), Some(after));

    let (renamed, rewritten) = desk.rename(&winner, "Zed").unwrap();
    assert!(rewritten >= 3);
    assert!(!renamed.participants().contains(&winner));

    let (undone, cleared) = desk.undo("W1-1").unwrap();
    assert_eq!(cleared, 1);
    assert!(undone.find("W1-1").unwrap().winner.is_none());
    assert_eq!(desk.active().unwrap(), Some(undone));
  }

  #[test]
  fn archive_and_reset_clears_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut desk = desk_in(dir.path());
    desk.start(&field(&["A", "B"])).unwrap();
    assert_eq!(desk.archive_and_reset().unwrap(), 0);
    assert_eq!(desk.active().unwrap(), None);
    assert!(desk.store().load_archive().unwrap().is_empty());

    desk.start(&field(&["A", "B"])).unwrap();
    desk.report("W1-1", Slot::A).unwrap();
    assert_eq!(desk.archive_and_reset().unwrap(), 1);
    assert_eq!(desk.store().load_archive().unwrap().len(), 1);
  }

  #[test]
  fn shared_desk_serializes_writers() {
    let dir = tempfile::tempdir().unwrap();
    let shared = desk_in(dir.path()).shared();
    let handles: Vec<_> = (0..8)
      .map(|i| {
        let shared = shared.clone();
        thread::spawn(move || with_desk(&shared, |desk| desk.add_player(&format!("P{i}"))))
      })
      .collect();
    for handle in handles {
      assert!(handle.join().unwrap().unwrap());
    }
    let roster = with_desk(&shared, |desk| desk.roster()).unwrap();
    assert_eq!(roster.len(), 8);
  }
}
