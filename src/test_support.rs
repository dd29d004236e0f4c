use std::collections::HashSet;

use crate::types::{Bracket, BYE};

pub(crate) fn field(names: &[&str]) -> Vec<String> {
  names.iter().map(|name| name.to_string()).collect()
}

pub(crate) fn numbered(n: usize) -> Vec<String> {
  (1..=n).map(|i| format!("P{i}")).collect()
}

/// Checks the structural invariants every public operation must preserve.
pub(crate) fn assert_consistent(bracket: &Bracket) {
  let mut ids = HashSet::new();
  for m in bracket.matches() {
    assert!(ids.insert(m.id.as_str()), "duplicate id {}", m.id);
  }

  for m in bracket.matches() {
    assert_eq!(m.winner.is_some(), m.loser.is_some(), "{}: winner/loser out of step", m.id);
    if let (Some(a), Some(b)) = (&m.slot_a, &m.slot_b) {
      assert_ne!(a, b, "{}: same participant in both slots", m.id);
    }

    if m.id.starts_with('L') && m.holds(BYE) {
      assert!(m.is_decided(), "{}: vacancy bye without a result", m.id);
      assert_eq!(m.loser.as_deref(), Some(BYE), "{}", m.id);
    }

    let (Some(winner), Some(loser)) = (&m.winner, &m.loser) else {
      continue;
    };
    assert!(m.is_full(), "{}: decided with an empty slot", m.id);
    assert!(m.holds(winner) && m.holds(loser), "{}: result not in slots", m.id);
    assert_ne!(winner, loser, "{}", m.id);

    if let Some(next) = &m.next_on_win {
      let target = bracket.find(next).expect("winner target exists");
      assert!(target.holds(winner), "{} winner {winner} missing from {next}", m.id);
    }
    if let Some(next) = &m.next_on_loss {
      let target = bracket.find(next).expect("loser target exists");
      if loser == BYE {
        continue;
      }
      assert!(target.holds(loser), "{} loser {loser} missing from {next}", m.id);
    }
  }
}
