//! # Bracket Engine
//!
//! A tournament bracket library: seed participants into single- or
//! double-elimination brackets, record match outcomes, and keep one
//! authoritative bracket state consistent between a mutating organizer
//! view and read-only polling viewers.
//!
//! ## Architecture
//!
//! The engine is a tree-shaped state machine with deterministic
//! advancement rules:
//!
//! - **Placement**: the organizer fills an ordered slot list, one slot per
//!   seed, sized to the smallest power of two covering the field
//! - **Generation**: a validated placement becomes the initial match tree;
//!   double elimination adds a losers bracket and a grand final
//! - **Advancement**: declaring a winner pushes the winning participant
//!   into the next round's slot and, in double elimination, routes the
//!   loser into the losers bracket
//! - **Completion**: single elimination resolves when every match has a
//!   winner; double elimination when the grand final does
//! - **Synchronization**: every mutation writes the complete bracket state
//!   to the store; viewers re-fetch it on a fixed interval
//!
//! ## Core Modules
//!
//! - [`bracket`]: match tree, generation, advancement, completion
//! - [`roster`]: external participant records and the adapter into the
//!   engine's uniform participant shape
//! - [`db`]: store trait with PostgreSQL and in-memory implementations
//! - [`sync`]: the mutating manager and the polling viewer
//!
//! ## Example
//!
//! ```
//! use bracket_engine::{Bracket, BracketFormat, Participant, Side};
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
//! # Ok::<(), bracket_engine::BracketError>(())
//! ```

/// Match tree generation, advancement, and completion detection.
pub mod bracket;
pub use bracket::{
    Bracket, BracketError, BracketFormat, BracketPayload, BracketResult, ErrorKind, Match,
    MatchId, Participant, ParticipantId, Placement, Side,
};

/// External roster records and the participant adapter.
pub mod roster;
pub use roster::{
    ParticipantStatus, RosterEntry, TournamentId, TournamentRecord, TournamentStatus, UserId,
};

/// Persistence store trait and implementations.
pub mod db;
pub use db::{
    Database, DatabaseConfig, MemoryTournamentStore, PgTournamentStore, StoreError, StoreResult,
    TournamentStore,
};

/// Synchronization layer: mutating manager and polling viewer.
pub mod sync;
pub use sync::{
    BracketManager, BracketSnapshot, BracketStage, BracketViewer, DEFAULT_POLL_INTERVAL,
    SyncError, SyncResult, ViewerHandle,
};
