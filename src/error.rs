use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the bracket engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("need at least two participants, got {count}")]
    TooFewParticipants { count: usize },

    #[error("participant {0:?} appears more than once")]
    DuplicateParticipant(String),

    #[error("invalid participant name {0:?}")]
    InvalidName(String),

    #[error("match {0} not found")]
    MatchNotFound(String),

    #[error("match {match_id} is still waiting for a participant")]
    SlotEmpty { match_id: String },

    #[error("match {match_id} already has a result; undo it first")]
    AlreadyReported { match_id: String },

    #[error("match {match_id} is a bye; its result is settled automatically")]
    ByeResult { match_id: String },

    #[error("{participant:?} is not playing in match {match_id}")]
    NotInMatch { match_id: String, participant: String },

    #[error("participant {0:?} not found in the bracket")]
    ParticipantNotFound(String),

    #[error("participant {0:?} already exists in the bracket")]
    NameCollision(String),

    #[error("{participant:?} would face themselves in match {match_id}")]
    SelfPairing { match_id: String, participant: String },

    // Invariant violations. Reaching any of these means the graph was malformed.
    #[error("cannot place {participant:?} into {match_id}: both slots are taken")]
    SlotConflict { match_id: String, participant: String },

    #[error("match {from} links to unknown match {to}")]
    BrokenLink { from: String, to: String },

    #[error("expected {participant:?} in a slot of {match_id}")]
    MissingFromSlot { match_id: String, participant: String },
}

impl BracketError {
    /// True for errors that indicate a corrupted graph rather than a bad request.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            BracketError::SlotConflict { .. }
                | BracketError::BrokenLink { .. }
                | BracketError::MissingFromSlot { .. }
        )
    }
}

/// Failures raised by the persistence side and the desk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no active tournament")]
    NoActiveTournament,

    #[error("a tournament is already running under key {0}")]
    TournamentInProgress(String),

    #[error("tournament desk lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Bracket(#[from] BracketError),
}
