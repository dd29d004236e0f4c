use tracing::{debug, error};

use crate::error::BracketError;
use crate::locator::MatchLocator;
use crate::types::{Bracket, Slot, BYE};

enum Step {
  /// Unwind a match's result: detach its winner and loser downstream, then clear it.
  Undo(String),
  /// Take `participant` back out of `target`, unwinding `target` first if it
  /// was already played.
  Detach {
    from: String,
    target: String,
    participant: String,
  },
  Remove {
    target: String,
    participant: String,
  },
  Clear(String),
}

/// Revert one match's result and everything that was propagated from it.
/// A match with no result is left alone. Returns how many results were cleared.
pub fn undo(bracket: &mut Bracket, match_id: &str) -> Result<usize, BracketError> {
  let locator = MatchLocator::new(bracket);
  undo_with(bracket, &locator, match_id)
}

/// Depth-first over the forward links with an explicit stack: downstream
/// matches are unwound before the match that fed them is cleared. The link
/// graph is acyclic with finals as its only sink, so this terminates.
pub(crate) fn undo_with(
  bracket: &mut Bracket,
  locator: &MatchLocator,
  match_id: &str,
) -> Result<usize, BracketError> {
  locator.locate(match_id)?;
  let mut stack = vec![Step::Undo(match_id.to_string())];
  let mut cleared = 0;

  while let Some(step) = stack.pop() {
    match step {
      Step::Undo(id) => {
        let m = locator.get(bracket, &id)?;
        let (Some(winner), Some(loser)) = (m.winner.clone(), m.loser.clone()) else {
          continue;
        };
        let next_on_win = m.next_on_win.clone();
        let next_on_loss = m.next_on_loss.clone();

        stack.push(Step::Clear(id.clone()));
        if let Some(target) = next_on_loss {
          if loser != BYE {
            stack.push(Step::Detach {
              from: id.clone(),
              target,
              participant: loser,
            });
          }
        }
        if let Some(target) = next_on_win {
          stack.push(Step::Detach {
            from: id,
            target,
            participant: winner,
          });
        }
      }
      Step::Detach { from, target, participant } => {
        let t = locator.follow(bracket, &from, &target)?;
        if !t.holds(&participant) {
          error!(from = %from, target = %target, participant = %participant, "propagated participant is missing");
          return Err(BracketError::MissingFromSlot {
            match_id: target,
            participant,
          });
        }
        let played = t.is_decided();
        stack.push(Step::Remove {
          target: target.clone(),
          participant,
        });
        if played {
          stack.push(Step::Undo(target));
        }
      }
      Step::Remove { target, participant } => {
        let t = locator.get_mut(bracket, &target)?;
        for slot in [Slot::A, Slot::B] {
          let entry = t.slot_mut(slot);
          // A bye outside round one only ever fills a vacancy for the participant leaving.
          if matches!(entry.as_deref(), Some(name) if name == participant || name == BYE) {
            *entry = None;
          }
        }
        debug!(match_id = %target, participant = %participant, "removed");
      }
      Step::Clear(id) => {
        locator.get_mut(bracket, &id)?.clear_result();
        cleared += 1;
        debug!(match_id = %id, "result cleared");
      }
    }
  }
  Ok(cleared)
}
