//! Public entry points for driving a bracket. Every operation takes the bracket
//! explicitly; keeping track of which bracket is live belongs to the caller.

use rand::Rng;
use tracing::{error, info};

use crate::advance::advance_with;
use crate::builder::{is_valid_name, BracketBuilder};
use crate::error::BracketError;
use crate::locator::MatchLocator;
use crate::types::{Bracket, CompletedMatch, RenamePolicy, Slot, BYE};
use crate::undo::undo_with;

/// Build a bracket with uniformly shuffled seeding.
pub fn build_bracket(participants: &[String]) -> Result<Bracket, BracketError> {
  build_bracket_with_rng(participants, &mut rand::thread_rng())
}

pub fn build_bracket_with_rng<R: Rng + ?Sized>(
  participants: &[String],
  rng: &mut R,
) -> Result<Bracket, BracketError> {
  settle(BracketBuilder::new(participants)?.shuffled(rng).build())
}

/// Build a bracket keeping the caller's order as the seeding.
pub fn build_bracket_in_order(participants: &[String]) -> Result<Bracket, BracketError> {
  settle(BracketBuilder::new(participants)?.build())
}

fn settle(mut bracket: Bracket) -> Result<Bracket, BracketError> {
  let locator = MatchLocator::new(&bracket);
  advance_with(&mut bracket, &locator)?;
  Ok(bracket)
}

/// Record the participant in `winner_slot` as the winner of `match_id` and
/// propagate. The match must hold two real participants and have no result.
pub fn report_result(bracket: &mut Bracket, match_id: &str, winner_slot: Slot) -> Result<(), BracketError> {
  let locator = MatchLocator::new(bracket);
  report_with(bracket, &locator, match_id, winner_slot)
}

/// Same as [`report_result`], naming the winner instead of their slot.
pub fn report_result_by_name(bracket: &mut Bracket, match_id: &str, winner: &str) -> Result<(), BracketError> {
  let locator = MatchLocator::new(bracket);
  let m = locator.get(bracket, match_id)?;
  let slot = if m.slot_a.as_deref() == Some(winner) {
    Slot::A
  } else if m.slot_b.as_deref() == Some(winner) {
    Slot::B
  } else {
    return Err(BracketError::NotInMatch {
      match_id: match_id.to_string(),
      participant: winner.to_string(),
    });
  };
  report_with(bracket, &locator, match_id, slot)
}

fn report_with(
  bracket: &mut Bracket,
  locator: &MatchLocator,
  match_id: &str,
  winner_slot: Slot,
) -> Result<(), BracketError> {
  let m = locator.get(bracket, match_id)?;
  if m.is_decided() {
    if m.has_bye() {
      return Err(BracketError::ByeResult {
        match_id: match_id.to_string(),
      });
    }
    return Err(BracketError::AlreadyReported {
      match_id: match_id.to_string(),
    });
  }
  if !m.is_full() {
    return Err(BracketError::SlotEmpty {
      match_id: match_id.to_string(),
    });
  }
  if m.has_bye() {
    return Err(BracketError::ByeResult {
      match_id: match_id.to_string(),
    });
  }
  if m.is_self_paired() {
    return Err(BracketError::SelfPairing {
      match_id: match_id.to_string(),
      participant: m.slot_a.clone().unwrap_or_default(),
    });
  }

  let snapshot = bracket.clone();
  let m = locator.get_mut(bracket, match_id)?;
  m.set_result(winner_slot);
  let (winner, loser) = (m.winner.clone(), m.loser.clone());
  if let Err(err) = advance_with(bracket, locator) {
    error!(match_id, error = %err, "advance failed; result rolled back");
    *bracket = snapshot;
    return Err(err);
  }
  info!(match_id, winner = ?winner, loser = ?loser, "result reported");
  Ok(())
}

/// Revert `match_id` and everything propagated from it. Returns how many
/// results were cleared; zero when the match had none.
pub fn undo_result(bracket: &mut Bracket, match_id: &str) -> Result<usize, BracketError> {
  let locator = MatchLocator::new(bracket);
  let m = locator.get(bracket, match_id)?;
  if m.is_decided() && m.has_bye() {
    return Err(BracketError::ByeResult {
      match_id: match_id.to_string(),
    });
  }

  let snapshot = bracket.clone();
  match undo_with(bracket, &locator, match_id) {
    Ok(cleared) => {
      if cleared > 0 {
        info!(match_id, cleared, "result undone");
      }
      Ok(cleared)
    }
    Err(err) => {
      error!(match_id, error = %err, "undo failed; bracket restored");
      *bracket = snapshot;
      Err(err)
    }
  }
}

/// Rewrite every occurrence of `old` (slots, winners, losers) to `new`.
/// Returns the number of fields rewritten.
pub fn rename_participant(
  bracket: &mut Bracket,
  old: &str,
  new: &str,
  policy: RenamePolicy,
) -> Result<usize, BracketError> {
  let (old, new) = (old.trim(), new.trim());
  if old == BYE {
    return Err(BracketError::InvalidName(old.to_string()));
  }
  if !is_valid_name(new) {
    return Err(BracketError::InvalidName(new.to_string()));
  }
  let names = bracket.participants();
  if !names.iter().any(|name| name == old) {
    return Err(BracketError::ParticipantNotFound(old.to_string()));
  }
  if old == new {
    return Ok(0);
  }
  if names.iter().any(|name| name == new) {
    if policy == RenamePolicy::Reject {
      return Err(BracketError::NameCollision(new.to_string()));
    }
    // Merging two players who share a match would have them face themselves.
    if let Some(m) = bracket.matches().find(|m| m.holds(old) && m.holds(new)) {
      return Err(BracketError::SelfPairing {
        match_id: m.id.clone(),
        participant: new.to_string(),
      });
    }
  }

  let rewritten: usize = bracket.matches_mut().map(|m| m.rename(old, new)).sum();
  info!(old, new, rewritten, ?policy, "participant renamed");
  Ok(rewritten)
}

/// Decided matches with both slots filled, in bracket order. Read-only.
pub fn extract_completed_matches(bracket: &Bracket) -> Vec<CompletedMatch> {
  bracket
    .matches()
    .filter_map(|m| {
      Some(CompletedMatch {
        match_id: m.id.clone(),
        slot_a: m.slot_a.clone()?,
        slot_b: m.slot_b.clone()?,
        winner: m.winner.clone()?,
      })
    })
    .collect()
}
