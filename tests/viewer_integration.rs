//! Integration tests for the polling viewer against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bracket_engine::{
    BracketFormat, BracketManager, BracketViewer, MemoryTournamentStore, ParticipantStatus,
    RosterEntry, Side, TournamentId, TournamentRecord, TournamentStatus, UserId,
};
use tokio::time::timeout;

const TOURNAMENT_ID: TournamentId = 7;
const ORGANIZER: UserId = 70;
const POLL: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_secs(5);

fn tournament(names: &[&str]) -> TournamentRecord {
    TournamentRecord {
        id: TOURNAMENT_ID,
        name: "Viewer Cup".to_string(),
        description: None,
        game_type: "darts".to_string(),
        format: BracketFormat::SingleElimination,
        status: TournamentStatus::Pending,
        creator_id: ORGANIZER,
        max_participants: Some(names.len()),
        participants: names
            .iter()
            .enumerate()
            .map(|(i, name)| RosterEntry {
                id: i as i64 + 1,
                user_id: Some(i as i64 + 1),
                username: Some(name.to_string()),
                guest_name: None,
                email: None,
                status: ParticipantStatus::Accepted,
            })
            .collect(),
    }
}

async fn setup_store() -> Arc<MemoryTournamentStore> {
    let store = Arc::new(MemoryTournamentStore::new());
    store
        .insert_tournament(tournament(&["A", "B", "C", "D"]))
        .await;
    store
}

#[tokio::test]
async fn viewer_picks_up_saved_bracket_within_a_tick() -> Result<()> {
    let store = setup_store().await;
    let (viewer, handle) = BracketViewer::new(store.clone(), TOURNAMENT_ID, POLL);
    let task = tokio::spawn(viewer.run());
    let mut updates = handle.subscribe();

    // first poll: nothing stored yet
    timeout(WAIT, updates.changed()).await??;
    assert!(updates.borrow().bracket.is_none());

    // organizer generates a bracket
    let mut manager = BracketManager::open(store, TOURNAMENT_ID).await?;
    for slot in 0..4 {
        manager.assign_slot(ORGANIZER, slot, format!("{}", slot + 1))?;
    }
    manager.validate_placement(ORGANIZER).await?;

    // the viewer converges without being pushed anything
    loop {
        timeout(WAIT, updates.changed()).await??;
        if updates.borrow().bracket.is_some() {
            break;
        }
    }
    let snapshot = handle.snapshot();
    assert!(snapshot.bracket.is_some_and(|b| b.is_populated()));
    assert!(snapshot.fetched_at.is_some());

    handle.stop().await;
    timeout(WAIT, task).await??;
    Ok(())
}

#[tokio::test]
async fn viewer_sees_reset_as_no_bracket() -> Result<()> {
    let store = setup_store().await;

    let mut manager = BracketManager::open(store.clone(), TOURNAMENT_ID).await?;
    for slot in 0..4 {
        manager.assign_slot(ORGANIZER, slot, format!("{}", slot + 1))?;
    }
    manager.validate_placement(ORGANIZER).await?;
    manager.declare_winner(ORGANIZER, "match-1-0", Side::A).await?;

    let (viewer, handle) = BracketViewer::new(store, TOURNAMENT_ID, POLL);
    let task = tokio::spawn(viewer.run());
    let mut updates = handle.subscribe();

    timeout(WAIT, updates.changed()).await??;
    assert!(updates.borrow().bracket.is_some());

    // the empty payload written by a reset reads as "no bracket yet"
    manager.reset(ORGANIZER).await?;
    loop {
        timeout(WAIT, updates.changed()).await??;
        if updates.borrow().bracket.is_none() {
            break;
        }
    }

    handle.stop().await;
    timeout(WAIT, task).await??;
    Ok(())
}

#[tokio::test]
async fn dropping_the_handle_stops_the_viewer() -> Result<()> {
    let store = setup_store().await;
    let (viewer, handle) = BracketViewer::new(store, TOURNAMENT_ID, POLL);
    let task = tokio::spawn(viewer.run());

    drop(handle);
    timeout(WAIT, task).await??;
    Ok(())
}
