//! Bracket data models: participants, matches, the owned match tree, seed
//! placement, and the store payload shape.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::errors::{BracketError, BracketResult};

/// Participant ID type (opaque, unique within a tournament)
pub type ParticipantId = String;

/// Match ID type (unique across both trees of a bracket)
pub type MatchId = String;

/// Id of the grand-final match in a double-elimination bracket
pub const GRAND_FINAL_ID: &str = "final-0";

/// A participant seeded into the bracket. Immutable once placed.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Participant {
    /// Opaque identifier
    pub id: ParticipantId,
    /// Display name
    pub name: String,
}

impl Participant {
    /// Create a new participant
    pub fn new(id: impl Into<ParticipantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Which side of a match a participant occupies
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// The opposite side
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Bracket kind
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketFormat {
    SingleElimination,
    DoubleElimination,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The atomic unit of the bracket tree.
///
/// Serialized field names match the stored payload exactly (`matchIndex`,
/// `teamA`, `nextMatchId`, ...); empty team slots serialize as explicit
/// nulls, absent pointers are omitted.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Unique within the whole bracket
    pub id: MatchId,

    /// 1-based round index within its tree
    pub round: u32,

    /// 0-based position within the round; drives the advancement slot parity
    pub match_index: usize,

    /// Top team, empty until determined
    #[serde(default)]
    pub team_a: Option<Participant>,

    /// Bottom team, empty until determined
    #[serde(default)]
    pub team_b: Option<Participant>,

    /// Winning side; immutable once set
    #[serde(default)]
    pub winner: Option<Side>,

    /// Match that receives this match's winner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_match_id: Option<MatchId>,

    /// Losers-bracket match that receives this match's loser
    /// (winners-bracket matches of a double elimination only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loser_next_match_id: Option<MatchId>,

    /// True for losers-bracket matches
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_loser_bracket: bool,
}

impl Match {
    /// Create an empty match with neither team determined.
    pub(crate) fn new(id: MatchId, round: u32, match_index: usize) -> Self {
        Self {
            id,
            round,
            match_index,
            team_a: None,
            team_b: None,
            winner: None,
            next_match_id: None,
            loser_next_match_id: None,
            is_loser_bracket: false,
        }
    }

    /// Both teams are known and no winner has been declared yet.
    pub fn is_ready(&self) -> bool {
        self.team_a.is_some() && self.team_b.is_some() && self.winner.is_none()
    }

    /// A winner has been declared.
    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// The team on `side`, if determined.
    pub fn team(&self, side: Side) -> Option<&Participant> {
        match side {
            Side::A => self.team_a.as_ref(),
            Side::B => self.team_b.as_ref(),
        }
    }

    /// The winning participant, if the match is decided.
    pub fn winning_team(&self) -> Option<&Participant> {
        self.winner.and_then(|side| self.team(side))
    }

    /// The losing participant, if the match is decided.
    pub fn losing_team(&self) -> Option<&Participant> {
        self.winner.and_then(|side| self.team(side.other()))
    }

    pub(crate) fn set_team(&mut self, side: Side, participant: Participant) {
        match side {
            Side::A => self.team_a = Some(participant),
            Side::B => self.team_b = Some(participant),
        }
    }
}

/// An ordered sequence of participant slots, filled by the organizer before
/// bracket generation. Slot count equals the bracket size (the smallest
/// power of two covering the field).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Placement {
    slots: Vec<Option<ParticipantId>>,
}

impl Placement {
    /// Create an empty placement with `size` slots.
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    /// Smallest power of two covering `participant_count` (minimum 2).
    pub fn bracket_size(participant_count: usize) -> usize {
        participant_count.next_power_of_two().max(2)
    }

    /// Create an empty placement sized for `participant_count` participants.
    pub fn for_participants(participant_count: usize) -> Self {
        Self::new(Self::bracket_size(participant_count))
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot contents, in seed order.
    pub fn slots(&self) -> &[Option<ParticipantId>] {
        &self.slots
    }

    /// Assign a participant to a slot.
    pub fn assign(
        &mut self,
        slot: usize,
        participant_id: impl Into<ParticipantId>,
    ) -> BracketResult<()> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(BracketError::SlotOutOfRange(slot))?;
        *entry = Some(participant_id.into());
        Ok(())
    }

    /// Clear a slot.
    pub fn clear(&mut self, slot: usize) -> BracketResult<()> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(BracketError::SlotOutOfRange(slot))?;
        *entry = None;
        Ok(())
    }

    /// True when every slot is filled.
    pub fn is_filled(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Check the placement against the roster and return the seeds in slot
    /// order: every slot filled, ids distinct, every id known, size a power
    /// of two.
    pub fn validate(&self, roster: &[Participant]) -> BracketResult<Vec<Participant>> {
        let size = self.slots.len();
        if size < 2 || !size.is_power_of_two() {
            return Err(BracketError::InvalidSize(size));
        }

        let mut seen: HashSet<&ParticipantId> = HashSet::new();
        let mut seeds = Vec::with_capacity(size);
        for (slot, entry) in self.slots.iter().enumerate() {
            let id = entry.as_ref().ok_or(BracketError::EmptySlot(slot))?;
            if !seen.insert(id) {
                return Err(BracketError::DuplicatePlacement(id.clone()));
            }
            let participant = roster
                .iter()
                .find(|p| &p.id == id)
                .ok_or_else(|| BracketError::UnknownParticipant(id.clone()))?;
            seeds.push(participant.clone());
        }
        Ok(seeds)
    }
}

/// The full match tree of one tournament.
///
/// The bracket owns every match by value in indexed round arrays; forward
/// and loser pointers between matches are match ids resolved through a
/// lookup table built per mutation, never shared references.
#[derive(Clone, Debug, PartialEq)]
pub struct Bracket {
    pub(crate) format: BracketFormat,
    pub(crate) winners: Vec<Vec<Match>>,
    pub(crate) losers: Vec<Vec<Match>>,
    pub(crate) grand_final: Option<Match>,
}

impl Bracket {
    pub fn format(&self) -> BracketFormat {
        self.format
    }

    /// Winners-bracket rounds (the only rounds for single elimination).
    pub fn winners_rounds(&self) -> &[Vec<Match>] {
        &self.winners
    }

    /// Losers-bracket rounds (empty for single elimination).
    pub fn losers_rounds(&self) -> &[Vec<Match>] {
        &self.losers
    }

    /// The grand-final match (double elimination only).
    pub fn grand_final(&self) -> Option<&Match> {
        self.grand_final.as_ref()
    }

    /// Bracket size: the number of round-1 seed slots.
    pub fn size(&self) -> usize {
        self.winners.first().map_or(0, |round| round.len() * 2)
    }

    /// Every match of the bracket, winners rounds first.
    pub fn all_matches(&self) -> impl Iterator<Item = &Match> {
        self.winners
            .iter()
            .flatten()
            .chain(self.losers.iter().flatten())
            .chain(self.grand_final.iter())
    }

    /// Look up a match anywhere in the bracket.
    pub fn find_match(&self, id: &str) -> Option<&Match> {
        self.all_matches().find(|m| m.id == id)
    }

    /// The wire shape stored by the persistence collaborator. For double
    /// elimination the grand final travels as the trailing round of `main`.
    pub fn to_payload(&self) -> BracketPayload {
        match self.format {
            BracketFormat::SingleElimination => {
                BracketPayload::SingleElimination(self.winners.clone())
            }
            BracketFormat::DoubleElimination => {
                let mut main = self.winners.clone();
                if let Some(grand_final) = &self.grand_final {
                    main.push(vec![grand_final.clone()]);
                }
                BracketPayload::DoubleElimination {
                    main,
                    loser: self.losers.clone(),
                }
            }
        }
    }

    /// Rebuild a bracket from a stored payload.
    pub fn from_payload(payload: BracketPayload) -> BracketResult<Self> {
        match payload {
            BracketPayload::SingleElimination(rounds) => {
                if rounds.is_empty() || rounds[0].is_empty() {
                    return Err(BracketError::MalformedPayload(
                        "single elimination bracket has no matches".to_string(),
                    ));
                }
                Ok(Self {
                    format: BracketFormat::SingleElimination,
                    winners: rounds,
                    losers: Vec::new(),
                    grand_final: None,
                })
            }
            BracketPayload::DoubleElimination { mut main, loser } => {
                if main.len() < 2 {
                    return Err(BracketError::MalformedPayload(
                        "double elimination bracket needs winners rounds and a grand final"
                            .to_string(),
                    ));
                }
                let final_round = main.pop().ok_or_else(|| {
                    BracketError::MalformedPayload("missing grand final round".to_string())
                })?;
                if final_round.len() != 1 {
                    return Err(BracketError::MalformedPayload(
                        "grand final round must hold exactly one match".to_string(),
                    ));
                }
                let grand_final = final_round.into_iter().next().ok_or_else(|| {
                    BracketError::MalformedPayload("missing grand final match".to_string())
                })?;
                Ok(Self {
                    format: BracketFormat::DoubleElimination,
                    winners: main,
                    losers: loser,
                    grand_final: Some(grand_final),
                })
            }
        }
    }
}

/// The bracket shape exchanged with the store: a plain round array for
/// single elimination, a `main`/`loser` pair for double elimination.
///
/// An empty payload (`[]` or `{"main": [], "loser": []}`) is how a reset
/// bracket is represented; viewers treat it as "no bracket yet".
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BracketPayload {
    DoubleElimination {
        main: Vec<Vec<Match>>,
        loser: Vec<Vec<Match>>,
    },
    SingleElimination(Vec<Vec<Match>>),
}

impl BracketPayload {
    /// The empty "no bracket" payload for `format`.
    pub fn empty(format: BracketFormat) -> Self {
        match format {
            BracketFormat::SingleElimination => Self::SingleElimination(Vec::new()),
            BracketFormat::DoubleElimination => Self::DoubleElimination {
                main: Vec::new(),
                loser: Vec::new(),
            },
        }
    }

    /// Whether the payload describes a generated bracket: a first-round
    /// match with at least one team set. Anything else reads as "no
    /// bracket yet".
    pub fn is_populated(&self) -> bool {
        let rounds = match self {
            Self::SingleElimination(rounds) => rounds,
            Self::DoubleElimination { main, .. } => main,
        };
        rounds
            .first()
            .and_then(|round| round.first())
            .is_some_and(|m| m.team_a.is_some() || m.team_b.is_some())
    }
}
