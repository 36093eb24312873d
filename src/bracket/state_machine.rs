//! Winner advancement, loser routing, completion detection, and tree
//! integrity checks.
//!
//! Each match moves strictly forward: `Empty -> Ready` (both teams set)
//! `-> Decided` (winner set). There is no undo; the only way back is a
//! full bracket reset performed by the synchronization layer.

use std::collections::{HashMap, HashSet};

use log::debug;

use super::errors::{BracketError, BracketResult};
use super::models::{Bracket, BracketFormat, Match, MatchId, Participant, Side};

/// Which tree a match belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Tree {
    Winners,
    Losers,
    GrandFinal,
}

/// Position of a match: tree, 0-based round, 0-based index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Locator {
    tree: Tree,
    round: usize,
    index: usize,
}

impl Bracket {
    /// Declare the winner of a match and advance the bracket.
    ///
    /// Preconditions: the match exists, both teams are populated, and no
    /// winner has been declared yet. The winner is pushed into the next
    /// match's slot; in double elimination the loser of a winners-bracket
    /// match is routed into the losers bracket, and the two finals feed
    /// the grand final. All destination slots are checked before any
    /// state changes, so a failed call leaves the bracket untouched.
    pub fn declare_winner(&mut self, match_id: &str, side: Side) -> BracketResult<()> {
        let index = self.locator_index()?;
        let loc = *index
            .get(match_id)
            .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;
        let m = self
            .match_at(loc)
            .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;

        if m.winner.is_some() {
            return Err(BracketError::AlreadyDecided(m.id.clone()));
        }
        let (Some(team_a), Some(team_b)) = (m.team_a.clone(), m.team_b.clone()) else {
            return Err(BracketError::MatchNotReady(m.id.clone()));
        };
        let winner = match side {
            Side::A => team_a.clone(),
            Side::B => team_b.clone(),
        };
        let loser = match side {
            Side::A => team_b,
            Side::B => team_a,
        };
        let decided_id = m.id.clone();
        let next_match_id = m.next_match_id.clone();
        let loser_next_match_id = m.loser_next_match_id.clone();

        // Resolve every write and check its slot is open before mutating.
        let mut writes: Vec<(Locator, Side, Participant)> = Vec::new();

        if let Some(next_id) = next_match_id {
            let next_loc = *index
                .get(&next_id)
                .ok_or_else(|| BracketError::DanglingPointer(decided_id.clone(), next_id.clone()))?;
            let slot = self.winner_slot(loc, next_loc);
            self.ensure_open(next_loc, slot, &next_id)?;
            writes.push((next_loc, slot, winner));
        }

        if loc.tree == Tree::Winners
            && let Some(drop_id) = loser_next_match_id
        {
            let drop_loc = *index
                .get(&drop_id)
                .ok_or_else(|| BracketError::DanglingPointer(decided_id.clone(), drop_id.clone()))?;
            let slot = if loc.round == 0 {
                // Round-1 losers pair up: take the first open slot.
                let target = self
                    .match_at(drop_loc)
                    .ok_or_else(|| BracketError::MatchNotFound(drop_id.clone()))?;
                if target.team_a.is_none() {
                    Side::A
                } else if target.team_b.is_none() {
                    Side::B
                } else {
                    return Err(BracketError::SlotOccupied {
                        id: drop_id.clone(),
                        side: Side::B,
                    });
                }
            } else {
                // Later drop-ins always take teamB: teamA is reserved for
                // the losers bracket's own survivor.
                self.ensure_open(drop_loc, Side::B, &drop_id)?;
                Side::B
            };
            writes.push((drop_loc, slot, loser));
        }

        // Apply.
        let Some(decided) = self.match_at_mut(loc) else {
            return Err(BracketError::MatchNotFound(decided_id));
        };
        decided.winner = Some(side);
        for (write_loc, write_slot, participant) in writes {
            let Some(target) = self.match_at_mut(write_loc) else {
                return Err(BracketError::MatchNotFound(decided_id));
            };
            debug!(
                "advancing {} into {:?} slot of {}",
                participant.name, write_slot, target.id
            );
            target.set_team(write_slot, participant);
        }
        debug!("match {decided_id} decided: side {side:?} wins");
        Ok(())
    }

    /// Whether the bracket is fully resolved: every match decided for
    /// single elimination, the grand final decided for double elimination.
    pub fn is_complete(&self) -> bool {
        match self.format {
            BracketFormat::SingleElimination => {
                !self.winners.is_empty() && self.winners.iter().flatten().all(Match::is_decided)
            }
            BracketFormat::DoubleElimination => {
                self.grand_final.as_ref().is_some_and(|m| m.is_decided())
            }
        }
    }

    /// Validate the structural invariants of the tree: unique match ids,
    /// resolvable pointers, decided matches fully populated, and no
    /// participant live in two matches of the same tree at once.
    ///
    /// Called by the synchronization layer after each mutation; a failure
    /// means the tree must not be persisted.
    pub fn validate_integrity(&self) -> BracketResult<()> {
        let index = self.locator_index()?;

        for m in self.all_matches() {
            for target in [&m.next_match_id, &m.loser_next_match_id]
                .into_iter()
                .flatten()
            {
                if !index.contains_key(target) {
                    return Err(BracketError::DanglingPointer(m.id.clone(), target.clone()));
                }
            }
            if m.winner.is_some() && (m.team_a.is_none() || m.team_b.is_none()) {
                return Err(BracketError::DecidedWithoutTeams(m.id.clone()));
            }
        }

        for rounds in [&self.winners, &self.losers] {
            let mut live = HashSet::new();
            for m in rounds.iter().flatten() {
                if m.winner.is_some() {
                    continue;
                }
                for participant in [&m.team_a, &m.team_b].into_iter().flatten() {
                    if !live.insert(participant.id.as_str()) {
                        return Err(BracketError::DuplicateLiveEntry(participant.id.clone()));
                    }
                }
            }
        }

        Ok(())
    }

    /// Build the id -> position table for this tree. Rebuilt per mutation;
    /// pointers are never resolved by scanning rounds.
    fn locator_index(&self) -> BracketResult<HashMap<MatchId, Locator>> {
        let mut index = HashMap::new();
        let trees = [(Tree::Winners, &self.winners), (Tree::Losers, &self.losers)];
        for (tree, rounds) in trees {
            for (round, matches) in rounds.iter().enumerate() {
                for (i, m) in matches.iter().enumerate() {
                    let loc = Locator {
                        tree,
                        round,
                        index: i,
                    };
                    if index.insert(m.id.clone(), loc).is_some() {
                        return Err(BracketError::DuplicateMatchId(m.id.clone()));
                    }
                }
            }
        }
        if let Some(grand_final) = &self.grand_final {
            let loc = Locator {
                tree: Tree::GrandFinal,
                round: 0,
                index: 0,
            };
            if index.insert(grand_final.id.clone(), loc).is_some() {
                return Err(BracketError::DuplicateMatchId(grand_final.id.clone()));
            }
        }
        Ok(index)
    }

    fn match_at(&self, loc: Locator) -> Option<&Match> {
        match loc.tree {
            Tree::Winners => self.winners.get(loc.round)?.get(loc.index),
            Tree::Losers => self.losers.get(loc.round)?.get(loc.index),
            Tree::GrandFinal => self.grand_final.as_ref(),
        }
    }

    fn match_at_mut(&mut self, loc: Locator) -> Option<&mut Match> {
        match loc.tree {
            Tree::Winners => self.winners.get_mut(loc.round)?.get_mut(loc.index),
            Tree::Losers => self.losers.get_mut(loc.round)?.get_mut(loc.index),
            Tree::GrandFinal => self.grand_final.as_mut(),
        }
    }

    fn round_len(&self, loc: Locator) -> usize {
        match loc.tree {
            Tree::Winners => self.winners.get(loc.round).map_or(0, Vec::len),
            Tree::Losers => self.losers.get(loc.round).map_or(0, Vec::len),
            Tree::GrandFinal => 1,
        }
    }

    /// Destination slot for a winner advancing from `from` to `to`.
    ///
    /// Into the grand final the winners champion takes `teamA` and the
    /// losers champion `teamB`. Where the next round halves the match
    /// count, the parity rule applies: even `matchIndex` feeds
    /// `teamA`, odd feeds `teamB`. The losers bracket's minor -> major hop
    /// maps matches 1:1 and always feeds `teamA`, whose `teamB` is
    /// reserved for the winners-bracket drop-in.
    fn winner_slot(&self, from: Locator, to: Locator) -> Side {
        match to.tree {
            Tree::GrandFinal => {
                if from.tree == Tree::Winners {
                    Side::A
                } else {
                    Side::B
                }
            }
            _ => {
                if from.tree == Tree::Losers
                    && to.tree == Tree::Losers
                    && self.round_len(from) == self.round_len(to)
                {
                    Side::A
                } else if from.index % 2 == 0 {
                    Side::A
                } else {
                    Side::B
                }
            }
        }
    }

    fn ensure_open(&self, loc: Locator, side: Side, id: &str) -> BracketResult<()> {
        let m = self
            .match_at(loc)
            .ok_or_else(|| BracketError::MatchNotFound(id.to_string()))?;
        if m.team(side).is_some() {
            return Err(BracketError::SlotOccupied {
                id: m.id.clone(),
                side,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::Participant;

    fn seeds(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|name| Participant::new(name.to_lowercase(), *name))
            .collect()
    }

    fn team_id(m: &Match, side: Side) -> Option<&str> {
        m.team(side).map(|p| p.id.as_str())
    }

    #[test]
    fn test_winner_advances_with_slot_parity() {
        let mut bracket = Bracket::generate(
            BracketFormat::SingleElimination,
            &seeds(&["A", "B", "C", "D", "E", "F", "G", "H"]),
        )
        .unwrap();

        bracket.declare_winner("match-1-0", Side::A).unwrap();
        bracket.declare_winner("match-1-1", Side::B).unwrap();
        bracket.declare_winner("match-1-2", Side::A).unwrap();
        bracket.declare_winner("match-1-3", Side::B).unwrap();

        let round2 = &bracket.winners_rounds()[1];
        assert_eq!(team_id(&round2[0], Side::A), Some("a"));
        assert_eq!(team_id(&round2[0], Side::B), Some("d"));
        assert_eq!(team_id(&round2[1], Side::A), Some("e"));
        assert_eq!(team_id(&round2[1], Side::B), Some("h"));
    }

    #[test]
    fn test_declare_winner_rejects_unknown_match() {
        let mut bracket =
            Bracket::generate(BracketFormat::SingleElimination, &seeds(&["A", "B"])).unwrap();
        assert_eq!(
            bracket.declare_winner("match-9-9", Side::A),
            Err(BracketError::MatchNotFound("match-9-9".to_string()))
        );
    }

    #[test]
    fn test_declare_winner_rejects_unready_match() {
        let mut bracket = Bracket::generate(
            BracketFormat::SingleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();
        assert_eq!(
            bracket.declare_winner("match-2-0", Side::A),
            Err(BracketError::MatchNotReady("match-2-0".to_string()))
        );
    }

    #[test]
    fn test_declare_winner_is_not_repeatable() {
        let mut bracket = Bracket::generate(
            BracketFormat::SingleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();
        bracket.declare_winner("match-1-0", Side::A).unwrap();
        // same winner again is still an invalid transition
        assert_eq!(
            bracket.declare_winner("match-1-0", Side::A),
            Err(BracketError::AlreadyDecided("match-1-0".to_string()))
        );
        assert_eq!(
            bracket.declare_winner("match-1-0", Side::B),
            Err(BracketError::AlreadyDecided("match-1-0".to_string()))
        );
    }

    #[test]
    fn test_failed_declare_leaves_bracket_untouched() {
        let mut bracket = Bracket::generate(
            BracketFormat::SingleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();
        let before = bracket.clone();
        let _ = bracket.declare_winner("match-2-0", Side::A);
        assert_eq!(bracket, before);
    }

    #[test]
    fn test_single_elimination_completion() {
        let mut bracket = Bracket::generate(
            BracketFormat::SingleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();
        assert!(!bracket.is_complete());

        bracket.declare_winner("match-1-0", Side::A).unwrap();
        bracket.declare_winner("match-1-1", Side::A).unwrap();
        assert!(!bracket.is_complete());

        bracket.declare_winner("match-2-0", Side::A).unwrap();
        assert!(bracket.is_complete());

        let final_match = bracket.find_match("match-2-0").unwrap();
        assert_eq!(final_match.winning_team().map(|p| p.id.as_str()), Some("a"));
    }

    #[test]
    fn test_double_elimination_four_seed_run() {
        // 4 seeds A,B,C,D: A beats B, D beats C, losers B,C pair up;
        // B beats C, A beats D, D drops into the losers final teamB;
        // B beats D, grand final is A vs B, A wins.
        let mut bracket = Bracket::generate(
            BracketFormat::DoubleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();

        bracket.declare_winner("wb-1-0", Side::A).unwrap();
        bracket.declare_winner("wb-1-1", Side::B).unwrap();

        let lb1 = bracket.find_match("lb-1-0").unwrap();
        assert_eq!(team_id(lb1, Side::A), Some("b"));
        assert_eq!(team_id(lb1, Side::B), Some("c"));

        bracket.declare_winner("lb-1-0", Side::A).unwrap();
        let lb2 = bracket.find_match("lb-2-0").unwrap();
        assert_eq!(team_id(lb2, Side::A), Some("b"));
        assert_eq!(lb2.team_b, None);

        bracket.declare_winner("wb-2-0", Side::A).unwrap();
        let lb2 = bracket.find_match("lb-2-0").unwrap();
        assert_eq!(team_id(lb2, Side::B), Some("d"));
        let grand_final = bracket.grand_final().unwrap();
        assert_eq!(team_id(grand_final, Side::A), Some("a"));
        assert_eq!(grand_final.team_b, None);
        assert!(!bracket.is_complete());

        bracket.declare_winner("lb-2-0", Side::A).unwrap();
        let grand_final = bracket.grand_final().unwrap();
        assert_eq!(team_id(grand_final, Side::B), Some("b"));
        assert!(!bracket.is_complete());

        bracket.declare_winner("final-0", Side::A).unwrap();
        assert!(bracket.is_complete());
        assert_eq!(
            bracket
                .grand_final()
                .unwrap()
                .winning_team()
                .map(|p| p.id.as_str()),
            Some("a")
        );
    }

    #[test]
    fn test_double_elimination_is_complete_ignores_side_brackets() {
        // The grand final alone decides completion; an undecided losers
        // match elsewhere is irrelevant once the grand final is resolved.
        let mut bracket = Bracket::generate(
            BracketFormat::DoubleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();
        bracket.declare_winner("wb-1-0", Side::A).unwrap();
        bracket.declare_winner("wb-1-1", Side::B).unwrap();
        bracket.declare_winner("lb-1-0", Side::A).unwrap();
        bracket.declare_winner("wb-2-0", Side::A).unwrap();
        bracket.declare_winner("lb-2-0", Side::A).unwrap();
        assert!(!bracket.is_complete());
        bracket.declare_winner("final-0", Side::B).unwrap();
        assert!(bracket.is_complete());
    }

    #[test]
    fn test_eight_seed_losers_routing() {
        let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let mut bracket =
            Bracket::generate(BracketFormat::DoubleElimination, &seeds(&names)).unwrap();

        // Higher seed wins every winners round 1 match.
        for i in 0..4 {
            bracket.declare_winner(&format!("wb-1-{i}"), Side::A).unwrap();
        }
        // Losers B,D pair in lb-1-0 and F,H in lb-1-1.
        let lb10 = bracket.find_match("lb-1-0").unwrap();
        assert_eq!(team_id(lb10, Side::A), Some("b"));
        assert_eq!(team_id(lb10, Side::B), Some("d"));
        let lb11 = bracket.find_match("lb-1-1").unwrap();
        assert_eq!(team_id(lb11, Side::A), Some("f"));
        assert_eq!(team_id(lb11, Side::B), Some("h"));

        // Winners round 2: A beats C, E beats G. C and G drop into the
        // major round's teamB slots.
        bracket.declare_winner("wb-2-0", Side::A).unwrap();
        bracket.declare_winner("wb-2-1", Side::A).unwrap();
        let lb20 = bracket.find_match("lb-2-0").unwrap();
        assert_eq!(team_id(lb20, Side::B), Some("c"));
        let lb21 = bracket.find_match("lb-2-1").unwrap();
        assert_eq!(team_id(lb21, Side::B), Some("g"));

        // Minor-round survivors land in teamA of their major match.
        bracket.declare_winner("lb-1-0", Side::A).unwrap();
        bracket.declare_winner("lb-1-1", Side::A).unwrap();
        let lb20 = bracket.find_match("lb-2-0").unwrap();
        assert_eq!(team_id(lb20, Side::A), Some("b"));
        let lb21 = bracket.find_match("lb-2-1").unwrap();
        assert_eq!(team_id(lb21, Side::A), Some("f"));

        // Major winners pair up in lb-3-0 by parity.
        bracket.declare_winner("lb-2-0", Side::A).unwrap();
        bracket.declare_winner("lb-2-1", Side::B).unwrap();
        let lb30 = bracket.find_match("lb-3-0").unwrap();
        assert_eq!(team_id(lb30, Side::A), Some("b"));
        assert_eq!(team_id(lb30, Side::B), Some("g"));

        // Winners final loser drops into the losers final teamB.
        bracket.declare_winner("wb-3-0", Side::A).unwrap();
        let lb40 = bracket.find_match("lb-4-0").unwrap();
        assert_eq!(team_id(lb40, Side::B), Some("e"));

        bracket.declare_winner("lb-3-0", Side::A).unwrap();
        bracket.declare_winner("lb-4-0", Side::A).unwrap();
        let grand_final = bracket.grand_final().unwrap();
        assert_eq!(team_id(grand_final, Side::A), Some("a"));
        assert_eq!(team_id(grand_final, Side::B), Some("b"));

        bracket.declare_winner("final-0", Side::B).unwrap();
        assert!(bracket.is_complete());
        bracket.validate_integrity().unwrap();
    }

    #[test]
    fn test_validate_integrity_catches_duplicate_live_entry() {
        let mut bracket = Bracket::generate(
            BracketFormat::SingleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();
        bracket.validate_integrity().unwrap();

        // Corrupt the tree: copy a live participant into a second match.
        let duplicate = bracket.winners[0][0].team_a.clone();
        bracket.winners[1][0].team_a = duplicate;
        assert_eq!(
            bracket.validate_integrity(),
            Err(BracketError::DuplicateLiveEntry("a".to_string()))
        );
    }

    #[test]
    fn test_validate_integrity_catches_dangling_pointer() {
        let mut bracket = Bracket::generate(
            BracketFormat::SingleElimination,
            &seeds(&["A", "B", "C", "D"]),
        )
        .unwrap();
        bracket.winners[0][0].next_match_id = Some("match-7-7".to_string());
        assert_eq!(
            bracket.validate_integrity(),
            Err(BracketError::DanglingPointer(
                "match-1-0".to_string(),
                "match-7-7".to_string()
            ))
        );
    }

    #[test]
    fn test_payload_round_trip_preserves_tree() {
        for format in [
            BracketFormat::SingleElimination,
            BracketFormat::DoubleElimination,
        ] {
            let mut bracket =
                Bracket::generate(format, &seeds(&["A", "B", "C", "D"])).unwrap();
            bracket.declare_winner(
                match format {
                    BracketFormat::SingleElimination => "match-1-0",
                    BracketFormat::DoubleElimination => "wb-1-0",
                },
                Side::B,
            )
            .unwrap();

            let json = serde_json::to_string(&bracket.to_payload()).unwrap();
            let reloaded = Bracket::from_payload(serde_json::from_str(&json).unwrap()).unwrap();
            assert_eq!(reloaded, bracket);
        }
    }
}
