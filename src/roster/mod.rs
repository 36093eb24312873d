//! Roster module: external tournament/participant records and the adapter
//! into the engine's uniform participant shape.

mod adapter;
pub mod models;

pub use models::{
    ParticipantStatus, RosterEntry, TournamentId, TournamentRecord, TournamentStatus, UserId,
};
