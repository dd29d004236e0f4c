use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt,
    sync::{Arc, Mutex},
};

use crate::desk::TournamentDesk;

// ── Constants ──────────────────────────────────────────────────────────

/// Placeholder participant used to pad the field to a power of two.
pub const BYE: &str = "BYE";

pub const FINALS_ID: &str = "F1-1";

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedDesk = Arc<Mutex<TournamentDesk>>;

// ── Bracket domain types ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Winners,
    Losers,
    Finals,
}

impl Side {
    pub fn prefix(self) -> char {
        match self {
            Side::Winners => 'W',
            Side::Losers => 'L',
            Side::Finals => 'F',
        }
    }

    /// Slot a participant coming out of this side lands in first.
    pub fn preferred_slot(self) -> Slot {
        match self {
            Side::Losers => Slot::B,
            Side::Winners | Side::Finals => Slot::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => write!(f, "A"),
            Slot::B => write!(f, "B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RenamePolicy {
    /// Refuse to rename onto a name already present in the bracket.
    #[default]
    Reject,
    /// Rewrite anyway, folding both participants into one name.
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub slot_a: Option<String>,
    pub slot_b: Option<String>,
    pub winner: Option<String>,
    pub loser: Option<String>,
    pub next_on_win: Option<String>,
    #[serde(default)]
    pub next_on_loss: Option<String>,
}

impl Match {
    pub fn new(side: Side, round: usize, index: usize) -> Self {
        Match {
            id: format!("{}{}-{}", side.prefix(), round, index),
            slot_a: None,
            slot_b: None,
            winner: None,
            loser: None,
            next_on_win: None,
            next_on_loss: None,
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::A => self.slot_a.as_deref(),
            Slot::B => self.slot_b.as_deref(),
        }
    }

    pub fn slot_mut(&mut self, slot: Slot) -> &mut Option<String> {
        match slot {
            Slot::A => &mut self.slot_a,
            Slot::B => &mut self.slot_b,
        }
    }

    pub fn holds(&self, name: &str) -> bool {
        self.slot_a.as_deref() == Some(name) || self.slot_b.as_deref() == Some(name)
    }

    pub fn is_full(&self) -> bool {
        self.slot_a.is_some() && self.slot_b.is_some()
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    pub fn has_bye(&self) -> bool {
        self.slot_a.as_deref() == Some(BYE) || self.slot_b.as_deref() == Some(BYE)
    }

    /// Both slots filled with real participants and no result yet.
    pub fn is_ready(&self) -> bool {
        self.is_full() && !self.has_bye() && !self.is_decided() && !self.is_self_paired()
    }

    pub fn is_self_paired(&self) -> bool {
        self.slot_a.is_some() && self.slot_a == self.slot_b
    }

    pub(crate) fn set_result(&mut self, winner_slot: Slot) {
        self.winner = self.slot(winner_slot).map(str::to_string);
        self.loser = self.slot(winner_slot.other()).map(str::to_string);
    }

    pub(crate) fn clear_result(&mut self) {
        self.winner = None;
        self.loser = None;
    }

    fn names_mut(&mut self) -> [&mut Option<String>; 4] {
        [
            &mut self.slot_a,
            &mut self.slot_b,
            &mut self.winner,
            &mut self.loser,
        ]
    }

    pub(crate) fn rename(&mut self, old: &str, new: &str) -> usize {
        let mut hits = 0;
        for field in self.names_mut() {
            if field.as_deref() == Some(old) {
                *field = Some(new.to_string());
                hits += 1;
            }
        }
        hits
    }
}

/// The full match graph for one tournament. Persisted as one opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bracket {
    pub winners: Vec<Vec<Match>>,
    pub losers: Vec<Vec<Match>>,
    pub finals: Vec<Vec<Match>>,
    pub total_slots: usize,
}

impl Bracket {
    pub fn rounds(&self, side: Side) -> &[Vec<Match>] {
        match side {
            Side::Winners => &self.winners,
            Side::Losers => &self.losers,
            Side::Finals => &self.finals,
        }
    }

    pub(crate) fn rounds_mut(&mut self, side: Side) -> &mut Vec<Vec<Match>> {
        match side {
            Side::Winners => &mut self.winners,
            Side::Losers => &mut self.losers,
            Side::Finals => &mut self.finals,
        }
    }

    /// Every match, winners first, then losers, then finals, round by round.
    pub fn matches(&self) -> impl Iterator<Item = &Match> {
        self.winners
            .iter()
            .chain(self.losers.iter())
            .chain(self.finals.iter())
            .flatten()
    }

    pub(crate) fn matches_mut(&mut self) -> impl Iterator<Item = &mut Match> {
        self.winners
            .iter_mut()
            .chain(self.losers.iter_mut())
            .chain(self.finals.iter_mut())
            .flatten()
    }

    pub fn find(&self, id: &str) -> Option<&Match> {
        self.matches().find(|m| m.id == id)
    }

    /// Distinct real participants anywhere in the graph, sorted.
    pub fn participants(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for m in self.matches() {
            for name in [&m.slot_a, &m.slot_b, &m.winner, &m.loser]
                .into_iter()
                .flatten()
            {
                if name != BYE {
                    names.insert(name.clone());
                }
            }
        }
        names.into_iter().collect()
    }

    pub fn ready_matches(&self) -> Vec<&Match> {
        self.matches().filter(|m| m.is_ready()).collect()
    }

    pub fn champion(&self) -> Option<&str> {
        self.finals
            .last()
            .and_then(|round| round.first())
            .and_then(|m| m.winner.as_deref())
    }
}

/// A decided match as handed to the archival collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedMatch {
    pub match_id: String,
    pub slot_a: String,
    pub slot_b: String,
    pub winner: String,
}
