use std::collections::HashMap;

use crate::error::BracketError;
use crate::types::{Bracket, Match, Side};

/// Position of a match inside the three round arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchPos {
  pub side: Side,
  pub round: usize,
  pub index: usize,
}

/// Id → position index over a bracket. Matches only reference each other by id,
/// so every traversal goes through here. Build once per operation; the graph
/// shape never changes after construction.
#[derive(Clone, Debug, Default)]
pub struct MatchLocator {
  index: HashMap<String, MatchPos>,
}

impl MatchLocator {
  pub fn new(bracket: &Bracket) -> Self {
    let mut index = HashMap::new();
    for side in [Side::Winners, Side::Losers, Side::Finals] {
      for (round, matches) in bracket.rounds(side).iter().enumerate() {
        for (i, m) in matches.iter().enumerate() {
          index.insert(m.id.clone(), MatchPos { side, round, index: i });
        }
      }
    }
    MatchLocator { index }
  }

  pub fn len(&self) -> usize {
    self.index.len()
  }

  pub fn is_empty(&self) -> bool {
    self.index.is_empty()
  }

  pub fn locate(&self, id: &str) -> Result<MatchPos, BracketError> {
    self
      .index
      .get(id)
      .copied()
      .ok_or_else(|| BracketError::MatchNotFound(id.to_string()))
  }

  pub fn contains(&self, id: &str) -> bool {
    self.index.contains_key(id)
  }

  pub fn get<'b>(&self, bracket: &'b Bracket, id: &str) -> Result<&'b Match, BracketError> {
    let pos = self.locate(id)?;
    bracket
      .rounds(pos.side)
      .get(pos.round)
      .and_then(|round| round.get(pos.index))
      .ok_or_else(|| BracketError::MatchNotFound(id.to_string()))
  }

  pub fn get_mut<'b>(&self, bracket: &'b mut Bracket, id: &str) -> Result<&'b mut Match, BracketError> {
    let pos = self.locate(id)?;
    bracket
      .rounds_mut(pos.side)
      .get_mut(pos.round)
      .and_then(|round| round.get_mut(pos.index))
      .ok_or_else(|| BracketError::MatchNotFound(id.to_string()))
  }

  /// Resolve a forward link, reporting a dangling id as a broken graph.
  pub(crate) fn follow<'b>(
    &self,
    bracket: &'b mut Bracket,
    from: &str,
    to: &str,
  ) -> Result<&'b mut Match, BracketError> {
    self.get_mut(bracket, to).map_err(|_| BracketError::BrokenLink {
      from: from.to_string(),
      to: to.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bracket::build_bracket_in_order;

  fn names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("P{i}")).collect()
  }

  #[test]
  fn locates_every_match_across_all_sides() {
    let bracket = build_bracket_in_order(&names(8)).unwrap();
    let locator = MatchLocator::new(&bracket);
    assert!(!locator.is_empty());
    assert_eq!(locator.len(), bracket.matches().count());
    for m in bracket.matches() {
      assert_eq!(locator.get(&bracket, &m.id).unwrap().id, m.id);
    }
    let pos = locator.locate("L3-1").unwrap();
    assert_eq!(pos, MatchPos { side: Side::Losers, round: 2, index: 0 });
  }

  #[test]
  fn unknown_id_is_not_found() {
    let bracket = build_bracket_in_order(&names(4)).unwrap();
    let locator = MatchLocator::new(&bracket);
    assert_eq!(
      locator.locate("W9-9"),
      Err(BracketError::MatchNotFound("W9-9".to_string()))
    );
    assert!(!locator.contains("F2-1"));
  }
}
