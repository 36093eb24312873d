//! Store trait and implementations.
//!
//! The engine talks to its persistence collaborator through the
//! [`TournamentStore`] trait: fetch/save the bracket payload keyed by
//! tournament id, fetch the tournament record with its roster, and update
//! the tournament status. The trait exists for dependency injection —
//! production uses [`PgTournamentStore`], tests use
//! [`MemoryTournamentStore`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;

use crate::bracket::{BracketFormat, BracketPayload};
use crate::roster::{
    ParticipantStatus, RosterEntry, TournamentId, TournamentRecord, TournamentStatus,
};

use super::errors::{StoreError, StoreResult};

/// Persistence collaborator for bracket state and tournament records.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Fetch the stored bracket payload; `None` if none was ever saved.
    async fn fetch_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<BracketPayload>>;

    /// Write the complete current bracket state (always the full tree,
    /// never a diff), keyed by tournament id.
    async fn save_bracket(
        &self,
        tournament_id: TournamentId,
        payload: &BracketPayload,
    ) -> StoreResult<()>;

    /// Fetch the tournament record with its roster.
    async fn fetch_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<TournamentRecord>>;

    /// Update the tournament status.
    async fn set_tournament_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()>;
}

fn status_to_str(status: TournamentStatus) -> &'static str {
    match status {
        TournamentStatus::Pending => "pending",
        TournamentStatus::InProgress => "in_progress",
        TournamentStatus::Completed => "completed",
    }
}

fn status_from_str(status: &str) -> TournamentStatus {
    match status {
        "in_progress" => TournamentStatus::InProgress,
        "completed" => TournamentStatus::Completed,
        _ => TournamentStatus::Pending,
    }
}

/// Default PostgreSQL implementation of [`TournamentStore`].
///
/// The bracket payload lives as a JSON column on the tournament row, so a
/// save is a single-row update and readers always see a whole tree.
pub struct PgTournamentStore {
    pool: Arc<PgPool>,
}

impl PgTournamentStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentStore for PgTournamentStore {
    async fn fetch_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<BracketPayload>> {
        let row = sqlx::query("SELECT bracket FROM tournaments WHERE id = $1")
            .bind(tournament_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        match row.get::<Option<serde_json::Value>, _>("bracket") {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn save_bracket(
        &self,
        tournament_id: TournamentId,
        payload: &BracketPayload,
    ) -> StoreResult<()> {
        let value = serde_json::to_value(payload)?;
        let result = sqlx::query("UPDATE tournaments SET bracket = $1 WHERE id = $2")
            .bind(value)
            .bind(tournament_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TournamentNotFound(tournament_id));
        }
        Ok(())
    }

    async fn fetch_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<TournamentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, game_type, format, status, creator_id, max_participants
            FROM tournaments
            WHERE id = $1
            "#,
        )
        .bind(tournament_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let format = match row.get::<String, _>("format").as_str() {
            "double_elimination" => BracketFormat::DoubleElimination,
            _ => BracketFormat::SingleElimination,
        };
        let status = status_from_str(&row.get::<String, _>("status"));

        let participant_rows = sqlx::query(
            r#"
            SELECT id, user_id, username, guest_name, email, status
            FROM tournament_participants
            WHERE tournament_id = $1
            ORDER BY id
            "#,
        )
        .bind(tournament_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let participants = participant_rows
            .into_iter()
            .map(|row| RosterEntry {
                id: row.get("id"),
                user_id: row.get("user_id"),
                username: row.get("username"),
                guest_name: row.get("guest_name"),
                email: row.get("email"),
                status: match row.get::<String, _>("status").as_str() {
                    "accepted" => ParticipantStatus::Accepted,
                    "rejected" => ParticipantStatus::Rejected,
                    _ => ParticipantStatus::Pending,
                },
            })
            .collect();

        Ok(Some(TournamentRecord {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            game_type: row.get("game_type"),
            format,
            status,
            creator_id: row.get("creator_id"),
            max_participants: row
                .get::<Option<i32>, _>("max_participants")
                .map(|max| max as usize),
            participants,
        }))
    }

    async fn set_tournament_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE tournaments SET status = $1 WHERE id = $2")
            .bind(status_to_str(status))
            .bind(tournament_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TournamentNotFound(tournament_id));
        }
        Ok(())
    }
}

/// In-memory implementation of [`TournamentStore`] for tests and local
/// development.
#[derive(Default)]
pub struct MemoryTournamentStore {
    tournaments: RwLock<HashMap<TournamentId, TournamentRecord>>,
    brackets: RwLock<HashMap<TournamentId, BracketPayload>>,
}

impl MemoryTournamentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a tournament record.
    pub async fn insert_tournament(&self, record: TournamentRecord) {
        self.tournaments.write().await.insert(record.id, record);
    }
}

#[async_trait]
impl TournamentStore for MemoryTournamentStore {
    async fn fetch_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<BracketPayload>> {
        Ok(self.brackets.read().await.get(&tournament_id).cloned())
    }

    async fn save_bracket(
        &self,
        tournament_id: TournamentId,
        payload: &BracketPayload,
    ) -> StoreResult<()> {
        if !self.tournaments.read().await.contains_key(&tournament_id) {
            return Err(StoreError::TournamentNotFound(tournament_id));
        }
        self.brackets
            .write()
            .await
            .insert(tournament_id, payload.clone());
        Ok(())
    }

    async fn fetch_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> StoreResult<Option<TournamentRecord>> {
        Ok(self.tournaments.read().await.get(&tournament_id).cloned())
    }

    async fn set_tournament_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        match self.tournaments.write().await.get_mut(&tournament_id) {
            Some(record) => {
                record.status = status;
                Ok(())
            }
            None => Err(StoreError::TournamentNotFound(tournament_id)),
        }
    }
}
