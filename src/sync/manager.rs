//! Mutating synchronization manager: the single logical writer for one
//! tournament's bracket.
//!
//! The manager owns the authoritative in-memory state and pushes the
//! complete bracket payload to the store after every successful mutation.
//! A failed store write is reported but never rolls back the in-memory
//! state; the operator may retry with [`BracketManager::save`].

use std::sync::Arc;

use log::{debug, info, warn};
use thiserror::Error;

use crate::bracket::{
    Bracket, BracketError, BracketFormat, BracketPayload, Participant, ParticipantId, Placement,
    Side,
};
use crate::db::{StoreError, TournamentStore};
use crate::roster::{TournamentId, TournamentStatus, UserId};

/// Synchronization errors
#[derive(Debug, Error)]
pub enum SyncError {
    /// Engine-level error (validation, invalid transition, integrity)
    #[error(transparent)]
    Bracket(#[from] BracketError),

    /// Store read/write failure; in-memory state is retained
    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    /// Tournament record does not exist
    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    /// The tournament was closed; the bracket is frozen
    #[error("tournament is completed; the bracket is frozen")]
    TournamentCompleted,

    /// Placement cannot be validated before the field is full
    #[error("roster is not full: {accepted} of {required} seats accepted")]
    RosterNotFull { accepted: usize, required: usize },

    /// Operation needs a generated bracket
    #[error("no bracket has been generated yet")]
    NoBracket,

    /// Operation needs the placement stage
    #[error("bracket already generated; reset it first")]
    AlreadyGenerated,

    /// The tournament cannot be closed before the bracket resolves
    #[error("bracket is not complete yet")]
    NotComplete,
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Bracket lifecycle stage: an unvalidated placement, or a live tree.
#[derive(Clone, Debug, PartialEq)]
pub enum BracketStage {
    /// Organizer is filling placement slots
    Placement(Placement),
    /// Bracket generated and being played
    Live(Bracket),
}

/// Single-writer manager for one tournament's bracket.
pub struct BracketManager {
    store: Arc<dyn TournamentStore>,
    tournament_id: TournamentId,
    format: BracketFormat,
    status: TournamentStatus,
    roster: Vec<Participant>,
    max_participants: Option<usize>,
    stage: BracketStage,
}

impl BracketManager {
    /// Load the tournament record and any stored bracket.
    ///
    /// A populated stored payload resumes as a live bracket; anything else
    /// starts an empty placement sized for the accepted roster.
    pub async fn open(
        store: Arc<dyn TournamentStore>,
        tournament_id: TournamentId,
    ) -> SyncResult<Self> {
        let record = store
            .fetch_tournament(tournament_id)
            .await?
            .ok_or(SyncError::TournamentNotFound(tournament_id))?;
        let roster = record.accepted_participants();

        let stage = match store.fetch_bracket(tournament_id).await? {
            Some(payload) if payload.is_populated() => {
                let bracket = Bracket::from_payload(payload)?;
                bracket.validate_integrity()?;
                BracketStage::Live(bracket)
            }
            _ => BracketStage::Placement(Placement::for_participants(roster.len())),
        };

        info!(
            "tournament {tournament_id}: manager opened ({} accepted participants, {})",
            roster.len(),
            match &stage {
                BracketStage::Placement(placement) =>
                    format!("empty placement of {} slots", placement.len()),
                BracketStage::Live(_) => "live bracket".to_string(),
            }
        );

        Ok(Self {
            store,
            tournament_id,
            format: record.format,
            status: record.status,
            roster,
            max_participants: record.max_participants,
            stage,
        })
    }

    pub fn tournament_id(&self) -> TournamentId {
        self.tournament_id
    }

    pub fn format(&self) -> BracketFormat {
        self.format
    }

    pub fn status(&self) -> TournamentStatus {
        self.status
    }

    /// Accepted participants, in roster order.
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// The live bracket, if one has been generated.
    pub fn bracket(&self) -> Option<&Bracket> {
        match &self.stage {
            BracketStage::Live(bracket) => Some(bracket),
            BracketStage::Placement(_) => None,
        }
    }

    /// The placement being edited, if no bracket exists yet.
    pub fn placement(&self) -> Option<&Placement> {
        match &self.stage {
            BracketStage::Placement(placement) => Some(placement),
            BracketStage::Live(_) => None,
        }
    }

    /// Whether the bracket is fully resolved.
    pub fn is_complete(&self) -> bool {
        match &self.stage {
            BracketStage::Live(bracket) => bracket.is_complete(),
            BracketStage::Placement(_) => false,
        }
    }

    /// Assign a participant to a placement slot. In-memory only; the
    /// placement is not persisted until it is validated.
    pub fn assign_slot(
        &mut self,
        actor_id: UserId,
        slot: usize,
        participant_id: impl Into<ParticipantId>,
    ) -> SyncResult<()> {
        self.ensure_mutable()?;
        let BracketStage::Placement(placement) = &mut self.stage else {
            return Err(SyncError::AlreadyGenerated);
        };
        let participant_id = participant_id.into();
        placement.assign(slot, participant_id.clone())?;
        debug!(
            "tournament {}: actor {actor_id} placed participant {participant_id} in slot {slot}",
            self.tournament_id
        );
        Ok(())
    }

    /// Clear a placement slot.
    pub fn clear_slot(&mut self, actor_id: UserId, slot: usize) -> SyncResult<()> {
        self.ensure_mutable()?;
        let BracketStage::Placement(placement) = &mut self.stage else {
            return Err(SyncError::AlreadyGenerated);
        };
        placement.clear(slot)?;
        debug!(
            "tournament {}: actor {actor_id} cleared slot {slot}",
            self.tournament_id
        );
        Ok(())
    }

    /// Validate the placement, generate the bracket, and persist it.
    ///
    /// Requires the full field: every seat accepted, every slot filled
    /// with a distinct roster participant.
    pub async fn validate_placement(&mut self, actor_id: UserId) -> SyncResult<()> {
        self.ensure_mutable()?;
        if let Some(required) = self.max_participants
            && required > 0
            && self.roster.len() < required
        {
            return Err(SyncError::RosterNotFull {
                accepted: self.roster.len(),
                required,
            });
        }
        let BracketStage::Placement(placement) = &self.stage else {
            return Err(SyncError::AlreadyGenerated);
        };

        let seeds = placement.validate(&self.roster)?;
        let bracket = Bracket::generate(self.format, &seeds)?;
        info!(
            "tournament {}: actor {actor_id} validated placement, {:?} bracket generated for {} seeds",
            self.tournament_id,
            self.format,
            seeds.len()
        );
        self.stage = BracketStage::Live(bracket);
        self.save().await
    }

    /// Declare the winner of a match, advance the tree, and persist it.
    pub async fn declare_winner(
        &mut self,
        actor_id: UserId,
        match_id: &str,
        side: Side,
    ) -> SyncResult<()> {
        self.ensure_mutable()?;
        let BracketStage::Live(bracket) = &mut self.stage else {
            return Err(SyncError::NoBracket);
        };
        bracket.declare_winner(match_id, side)?;
        // a tree that fails validation must never reach the store
        bracket.validate_integrity()?;
        info!(
            "tournament {}: actor {actor_id} declared side {side:?} winner of {match_id}",
            self.tournament_id
        );
        self.save().await
    }

    /// Discard all match state and restore an empty placement of the same
    /// size. Persists the empty payload so viewers see "no bracket".
    pub async fn reset(&mut self, actor_id: UserId) -> SyncResult<()> {
        self.ensure_mutable()?;
        let size = match &self.stage {
            BracketStage::Live(bracket) => bracket.size(),
            BracketStage::Placement(placement) => placement.len(),
        };
        self.stage = BracketStage::Placement(Placement::new(size));
        info!(
            "tournament {}: actor {actor_id} reset the bracket ({size} slots)",
            self.tournament_id
        );
        self.save().await
    }

    /// Close the tournament. Only permitted once the bracket is complete;
    /// afterwards every mutation is refused.
    pub async fn close_tournament(&mut self, actor_id: UserId) -> SyncResult<()> {
        self.ensure_mutable()?;
        if !self.is_complete() {
            return Err(SyncError::NotComplete);
        }
        self.store
            .set_tournament_status(self.tournament_id, TournamentStatus::Completed)
            .await?;
        self.status = TournamentStatus::Completed;
        info!(
            "tournament {}: actor {actor_id} closed the tournament",
            self.tournament_id
        );
        Ok(())
    }

    /// The full current state as stored: the live tree, or the empty
    /// payload while placing.
    pub fn payload(&self) -> BracketPayload {
        match &self.stage {
            BracketStage::Live(bracket) => bracket.to_payload(),
            BracketStage::Placement(_) => BracketPayload::empty(self.format),
        }
    }

    /// Unconditionally write the complete current state to the store.
    ///
    /// Called after every mutation; exposed so the operator can retry a
    /// failed write. The in-memory state is never rolled back.
    pub async fn save(&self) -> SyncResult<()> {
        let payload = self.payload();
        if let Err(err) = self.store.save_bracket(self.tournament_id, &payload).await {
            warn!(
                "tournament {}: bracket save failed, in-memory state retained: {err}",
                self.tournament_id
            );
            return Err(err.into());
        }
        Ok(())
    }

    fn ensure_mutable(&self) -> SyncResult<()> {
        if self.status == TournamentStatus::Completed {
            return Err(SyncError::TournamentCompleted);
        }
        Ok(())
    }
}
