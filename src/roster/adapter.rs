//! Adapter from external roster records to engine participants.

use crate::bracket::Participant;

use super::models::{ParticipantStatus, RosterEntry, TournamentRecord};

impl RosterEntry {
    /// The engine-facing participant id: the user id for registered users,
    /// otherwise the roster row id.
    pub fn participant_id(&self) -> String {
        match self.user_id {
            Some(user_id) => user_id.to_string(),
            None => self.id.to_string(),
        }
    }

    /// Display name resolution: username, then guest name, then email,
    /// then a numbered fallback.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.guest_name.clone())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| format!("User {}", self.participant_id()))
    }

    /// Map this roster row into the engine's uniform participant shape.
    pub fn participant(&self) -> Participant {
        Participant::new(self.participant_id(), self.display_name())
    }
}

impl TournamentRecord {
    /// The participants eligible for placement: accepted entries only, in
    /// roster order.
    pub fn accepted_participants(&self) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|entry| entry.status == ParticipantStatus::Accepted)
            .map(RosterEntry::participant)
            .collect()
    }

    /// Whether the field is full: bracket management only opens once every
    /// seat is taken.
    pub fn is_full(&self) -> bool {
        match self.max_participants {
            Some(max) if max > 0 => self.accepted_participants().len() >= max,
            _ => false,
        }
    }
}
