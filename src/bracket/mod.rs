//! Bracket engine: match tree generation, winner advancement, and
//! completion detection.
//!
//! This module provides the core tournament bracket machinery:
//! - Seed placement and validation against a roster
//! - Single- and double-elimination match tree generation
//! - The winner/loser advancement state machine
//! - Completion detection and tree integrity validation
//! - The wire payload shape exchanged with the persistence store
//!
//! ## Example
//!
//! ```
//! use bracket_engine::bracket::{Bracket, BracketFormat, Participant, Side};
//!
//! let seeds = vec![
//!     Participant::new("1", "Alice"),
//!     Participant::new("2", "Bob"),
//!     Participant::new("3", "Carol"),
//!     Participant::new("4", "Dave"),
//! ];
//! let mut bracket = Bracket::generate(BracketFormat::SingleElimination, &seeds)?;
//! bracket.declare_winner("match-1-0", Side::A)?;
//! bracket.declare_winner("match-1-1", Side::B)?;
//! bracket.declare_winner("match-2-0", Side::A)?;
//! assert!(bracket.is_complete());
//! # Ok::<(), bracket_engine::bracket::BracketError>(())
//! ```

pub mod errors;
pub mod models;

mod generator;
mod state_machine;

pub use errors::{BracketError, BracketResult, ErrorKind};
pub use models::{
    Bracket, BracketFormat, BracketPayload, GRAND_FINAL_ID, Match, MatchId, Participant,
    ParticipantId, Placement, Side,
};
