//! External tournament and roster record shapes.
//!
//! These mirror the roster collaborator's GET payload: the tournament
//! record with its participant rows, as served by the boundary layer.

use serde::{Deserialize, Serialize};

use crate::bracket::BracketFormat;

/// Tournament ID type
pub type TournamentId = i64;

/// User ID type
pub type UserId = i64;

/// Tournament lifecycle status
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting participants / bracket being managed
    Pending,
    /// Bracket play underway
    InProgress,
    /// Closed by the organizer; the bracket is frozen
    Completed,
}

/// Participation status of a roster entry
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Join request awaiting the organizer's decision
    Pending,
    /// Confirmed participant
    Accepted,
    /// Declined by the organizer
    Rejected,
}

/// One roster row: either a registered user or an organizer-added guest.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RosterEntry {
    /// Roster row id
    pub id: i64,
    /// Registered user, if any
    pub user_id: Option<UserId>,
    /// Registered user's username
    pub username: Option<String>,
    /// Guest display name (guest rows only)
    pub guest_name: Option<String>,
    /// Registered user's email
    pub email: Option<String>,
    /// Participation status
    pub status: ParticipantStatus,
}

/// Tournament record as served by the roster collaborator.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TournamentRecord {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    pub game_type: String,
    pub format: BracketFormat,
    pub status: TournamentStatus,
    pub creator_id: UserId,
    pub max_participants: Option<usize>,
    pub participants: Vec<RosterEntry>,
}
