//! Bracket error types.

use thiserror::Error;

use super::models::{MatchId, ParticipantId, Side};

/// Broad error classes, used by callers to pick a recovery strategy.
///
/// `Validation` and `InvalidTransition` are recoverable (the organizer can
/// correct their input); `IllegalState` indicates a corrupted tree and is
/// fatal to the current operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    InvalidTransition,
    IllegalState,
}

/// Bracket errors
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum BracketError {
    /// Placement slot has no participant assigned
    #[error("placement slot {0} is empty")]
    EmptySlot(usize),

    /// Placement slot index outside the bracket size
    #[error("placement slot {0} is out of range")]
    SlotOutOfRange(usize),

    /// Participant occupies more than one placement slot
    #[error("participant {0} is placed more than once")]
    DuplicatePlacement(ParticipantId),

    /// Placed participant is not part of the roster
    #[error("participant {0} is not in the roster")]
    UnknownParticipant(ParticipantId),

    /// Bracket size must be a power of two with at least two seeds
    #[error("bracket size {0} is not a power of two of at least 2")]
    InvalidSize(usize),

    /// Double elimination cannot be built below four seeds
    #[error("double elimination needs at least 4 seeds, got {0}")]
    TooFewSeeds(usize),

    /// Stored payload does not describe a well-formed bracket
    #[error("malformed bracket payload: {0}")]
    MalformedPayload(String),

    /// No match with this id exists in the bracket
    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    /// Match cannot be decided before both teams are known
    #[error("match {0} is not ready: both teams must be set")]
    MatchNotReady(MatchId),

    /// Match already has a winner; winners are immutable
    #[error("match {0} is already decided")]
    AlreadyDecided(MatchId),

    /// Advancement would overwrite a populated team slot
    #[error("slot {side:?} of match {id} is already occupied")]
    SlotOccupied { id: MatchId, side: Side },

    /// A forward or loser pointer references a match that does not exist
    #[error("match {0} points at unknown match {1}")]
    DanglingPointer(MatchId, MatchId),

    /// Two matches share the same id
    #[error("duplicate match id: {0}")]
    DuplicateMatchId(MatchId),

    /// Participant appears in more than one undecided match of one tree
    #[error("participant {0} is live in more than one match of the same tree")]
    DuplicateLiveEntry(ParticipantId),

    /// A decided match is missing a team
    #[error("decided match {0} is missing a team")]
    DecidedWithoutTeams(MatchId),
}

impl BracketError {
    /// Classify the error for propagation policy decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BracketError::EmptySlot(_)
            | BracketError::SlotOutOfRange(_)
            | BracketError::DuplicatePlacement(_)
            | BracketError::UnknownParticipant(_)
            | BracketError::InvalidSize(_)
            | BracketError::TooFewSeeds(_)
            | BracketError::MalformedPayload(_) => ErrorKind::Validation,

            BracketError::MatchNotFound(_)
            | BracketError::MatchNotReady(_)
            | BracketError::AlreadyDecided(_) => ErrorKind::InvalidTransition,

            BracketError::SlotOccupied { .. }
            | BracketError::DanglingPointer(_, _)
            | BracketError::DuplicateMatchId(_)
            | BracketError::DuplicateLiveEntry(_)
            | BracketError::DecidedWithoutTeams(_) => ErrorKind::IllegalState,
        }
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(BracketError::EmptySlot(3).kind(), ErrorKind::Validation);
        assert_eq!(
            BracketError::AlreadyDecided("match-1-0".to_string()).kind(),
            ErrorKind::InvalidTransition
        );
        assert_eq!(
            BracketError::SlotOccupied {
                id: "lb-2-0".to_string(),
                side: Side::B,
            }
            .kind(),
            ErrorKind::IllegalState
        );
    }
}
