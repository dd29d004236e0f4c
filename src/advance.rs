use std::collections::{HashMap, HashSet};

use tracing::{debug, error};

use crate::error::BracketError;
use crate::locator::MatchLocator;
use crate::types::{Bracket, Match, Side, Slot, BYE};

/// Propagate every decided match into the matches it feeds, settling byes and
/// walkovers along the way. Repeats full passes until nothing moves, so calling
/// it again on the result is a no-op. Returns the number of changes made.
pub fn advance(bracket: &mut Bracket) -> Result<usize, BracketError> {
  let locator = MatchLocator::new(bracket);
  advance_with(bracket, &locator)
}

pub(crate) fn advance_with(bracket: &mut Bracket, locator: &MatchLocator) -> Result<usize, BracketError> {
  let live = live_feed_counts(bracket);
  let mut total = 0;
  loop {
    let changed = advance_pass(bracket, locator, &live)?;
    if changed == 0 {
      break;
    }
    total += changed;
  }
  Ok(total)
}

/// For each match fed by other matches, how many of its feeds can ever deliver
/// a participant. A loss link out of a round-one bye delivers nobody, and a
/// match with no live feeds is dead, which voids its own win link in turn.
/// Byes only exist in round one, so this is fixed for the life of the bracket.
pub(crate) fn live_feed_counts(bracket: &Bracket) -> HashMap<String, usize> {
  let bye_matches: HashSet<&str> = bracket
    .winners
    .first()
    .map(|round| {
      round
        .iter()
        .filter(|m| m.has_bye())
        .map(|m| m.id.as_str())
        .collect()
    })
    .unwrap_or_default();

  let mut feeds: HashMap<&str, Vec<(&str, bool)>> = HashMap::new();
  for m in bracket.matches() {
    if let Some(target) = m.next_on_win.as_deref() {
      feeds.entry(target).or_default().push((m.id.as_str(), true));
    }
    if let Some(target) = m.next_on_loss.as_deref() {
      feeds.entry(target).or_default().push((m.id.as_str(), false));
    }
  }

  // Feeders always precede their targets in winners → losers → finals order.
  let mut dead: HashSet<&str> = HashSet::new();
  let mut live = HashMap::new();
  for m in bracket.matches() {
    let Some(sources) = feeds.get(m.id.as_str()) else {
      continue;
    };
    let count = sources
      .iter()
      .filter(|(source, on_win)| {
        if *on_win {
          !dead.contains(source)
        } else {
          !bye_matches.contains(source)
        }
      })
      .count();
    if count == 0 {
      dead.insert(m.id.as_str());
    }
    live.insert(m.id.clone(), count);
  }
  live
}

fn advance_pass(
  bracket: &mut Bracket,
  locator: &MatchLocator,
  live: &HashMap<String, usize>,
) -> Result<usize, BracketError> {
  let mut changed = 0;
  for side in [Side::Winners, Side::Losers, Side::Finals] {
    for r in 0..bracket.rounds(side).len() {
      for i in 0..bracket.rounds(side)[r].len() {
        let m = &mut bracket.rounds_mut(side)[r][i];
        if !m.is_decided() {
          let live_feeds = live.get(&m.id).copied();
          if settle_unopposed(m, live_feeds) {
            changed += 1;
          }
        }

        let m = &bracket.rounds(side)[r][i];
        let Some(winner) = m.winner.clone() else {
          continue;
        };
        let from = m.id.clone();
        let next_on_win = m.next_on_win.clone();
        let next_on_loss = m.next_on_loss.clone();
        let loser = m.loser.clone();

        if let Some(target) = next_on_win {
          if place(bracket, locator, &from, &target, &winner, side.preferred_slot())? {
            changed += 1;
          }
        }
        if let (Some(target), Some(loser)) = (next_on_loss, loser) {
          if loser != BYE && place(bracket, locator, &from, &target, &loser, side.preferred_slot())? {
            changed += 1;
          }
        }
      }
    }
  }
  Ok(changed)
}

/// Award a match that has no real opponent: either one slot is a bye, or the
/// only live feed has delivered and the other can never fill.
fn settle_unopposed(m: &mut Match, live_feeds: Option<usize>) -> bool {
  let a = m.slot_a.as_deref();
  let b = m.slot_b.as_deref();
  let winner_slot = match (a, b) {
    (Some(BYE), Some(BYE)) => return false,
    (Some(BYE), Some(_)) => Slot::B,
    (Some(_), Some(BYE)) => Slot::A,
    (Some(_), None) if live_feeds == Some(1) => {
      m.slot_b = Some(BYE.to_string());
      Slot::A
    }
    (None, Some(_)) if live_feeds == Some(1) => {
      m.slot_a = Some(BYE.to_string());
      Slot::B
    }
    _ => return false,
  };
  m.set_result(winner_slot);
  debug!(match_id = %m.id, winner = ?m.winner, "unopposed match settled");
  true
}

/// Put `participant` into `to`. Already present is a no-op; otherwise the
/// preferred slot, then the other one.
fn place(
  bracket: &mut Bracket,
  locator: &MatchLocator,
  from: &str,
  to: &str,
  participant: &str,
  preferred: Slot,
) -> Result<bool, BracketError> {
  let target = locator.follow(bracket, from, to)?;
  if target.holds(participant) {
    return Ok(false);
  }
  for slot in [preferred, preferred.other()] {
    let entry = target.slot_mut(slot);
    if entry.is_none() {
      *entry = Some(participant.to_string());
      debug!(from, to, %slot, participant, "placed");
      return Ok(true);
    }
  }
  error!(from, to, participant, "placement target is full");
  Err(BracketError::SlotConflict {
    match_id: to.to_string(),
    participant: participant.to_string(),
  })
}
