use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::error::BracketError;
use crate::types::{Bracket, Match, Side, Slot, BYE, FINALS_ID};

/// Validated field of participants, ready to be laid out into a bracket.
#[derive(Clone, Debug)]
pub struct BracketBuilder {
  field: Vec<String>,
}

impl BracketBuilder {
  pub fn new(participants: &[String]) -> Result<Self, BracketError> {
    if participants.len() < 2 {
      return Err(BracketError::TooFewParticipants {
        count: participants.len(),
      });
    }
    let mut seen = HashSet::with_capacity(participants.len());
    let mut field = Vec::with_capacity(participants.len());
    for name in participants {
      if !is_valid_name(name) {
        return Err(BracketError::InvalidName(name.clone()));
      }
      let name = name.trim();
      if !seen.insert(name) {
        return Err(BracketError::DuplicateParticipant(name.to_string()));
      }
      field.push(name.to_string());
    }
    Ok(BracketBuilder { field })
  }

  /// Uniform random seeding.
  pub fn shuffled<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
    self.field.shuffle(rng);
    self
  }

  /// Lay out the skeleton, link it, and settle round-one byes.
  /// Bye winners are not yet propagated; that is the advancer's job.
  pub fn build(self) -> Bracket {
    let total_slots = next_power_of_two(self.field.len());
    let mut bracket = Bracket {
      winners: winners_skeleton(&self.field, total_slots),
      losers: losers_skeleton(total_slots),
      finals: vec![vec![Match::new(Side::Finals, 1, 1)]],
      total_slots,
    };
    link_rounds(&mut bracket);
    let byes = settle_byes(&mut bracket);
    info!(
      participants = self.field.len(),
      total_slots,
      byes,
      winners_rounds = bracket.winners.len(),
      losers_rounds = bracket.losers.len(),
      "built bracket"
    );
    bracket
  }
}

/// Names are compared and stored trimmed.
pub fn is_valid_name(name: &str) -> bool {
  let trimmed = name.trim();
  !trimmed.is_empty() && trimmed != BYE
}

/// Round one takes consecutive pairs; once the field runs short each remaining
/// match gets one participant and one bye, so no match pairs two byes.
fn winners_skeleton(field: &[String], total_slots: usize) -> Vec<Vec<Match>> {
  let first_round = total_slots / 2;
  let byes = total_slots - field.len();
  let paired = first_round - byes;

  let mut rounds = Vec::new();
  let mut w1 = Vec::with_capacity(first_round);
  for i in 0..first_round {
    let mut m = Match::new(Side::Winners, 1, i + 1);
    if i < paired {
      m.slot_a = Some(field[i * 2].clone());
      m.slot_b = Some(field[i * 2 + 1].clone());
    } else {
      m.slot_a = Some(field[paired + i].clone());
      m.slot_b = Some(BYE.to_string());
    }
    w1.push(m);
  }
  rounds.push(w1);

  let mut count = first_round / 2;
  while count >= 1 {
    let round = rounds.len() + 1;
    rounds.push((1..=count).map(|i| Match::new(Side::Winners, round, i)).collect());
    count /= 2;
  }
  rounds
}

/// Every winners round after the first contributes a drop round and a merge
/// round of equal size, halving from `total_slots / 4`.
fn losers_skeleton(total_slots: usize) -> Vec<Vec<Match>> {
  let winners_rounds = total_slots.trailing_zeros() as usize;
  let mut rounds = Vec::new();
  let mut count = total_slots / 4;
  for _ in 1..winners_rounds {
    for _ in 0..2 {
      let round = rounds.len() + 1;
      rounds.push((1..=count).map(|i| Match::new(Side::Losers, round, i)).collect());
    }
    count /= 2;
  }
  rounds
}

fn link_rounds(bracket: &mut Bracket) {
  let winners_rounds = bracket.winners.len();
  let losers_rounds = bracket.losers.len();

  for (r, round) in bracket.winners.iter_mut().enumerate() {
    for (i, m) in round.iter_mut().enumerate() {
      m.next_on_win = Some(if r + 1 < winners_rounds {
        format!("W{}-{}", r + 2, i / 2 + 1)
      } else {
        FINALS_ID.to_string()
      });
      m.next_on_loss = Some(if losers_rounds == 0 {
        // Two-player field: the loser goes straight to a finals rematch.
        FINALS_ID.to_string()
      } else if r == 0 {
        format!("L1-{}", i / 2 + 1)
      } else {
        format!("L{}-{}", r * 2, i + 1)
      });
    }
  }

  for (r, round) in bracket.losers.iter_mut().enumerate() {
    for (i, m) in round.iter_mut().enumerate() {
      m.next_on_win = Some(if r + 1 == losers_rounds {
        FINALS_ID.to_string()
      } else if (r + 1) % 2 == 0 {
        format!("L{}-{}", r + 2, i / 2 + 1)
      } else {
        format!("L{}-{}", r + 2, i + 1)
      });
    }
  }
}

fn settle_byes(bracket: &mut Bracket) -> usize {
  let mut settled = 0;
  if let Some(first) = bracket.winners.first_mut() {
    for m in first.iter_mut().filter(|m| m.has_bye()) {
      let winner_slot = if m.slot_a.as_deref() == Some(BYE) { Slot::B } else { Slot::A };
      m.set_result(winner_slot);
      debug!(match_id = %m.id, winner = ?m.winner, "bye settled at build");
      settled += 1;
    }
  }
  settled
}

pub(crate) fn next_power_of_two(n: usize) -> usize {
  n.max(2).next_power_of_two()
}
