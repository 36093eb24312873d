//! Bracket generation from a validated seed order.
//!
//! Round 1 pairs placement slots `2i` and `2i+1`; every later round halves
//! the match count until a single final remains. Double elimination adds a
//! losers bracket of alternating minor/major rounds plus a grand final.

use super::errors::{BracketError, BracketResult};
use super::models::{
    Bracket, BracketFormat, GRAND_FINAL_ID, Match, MatchId, Participant,
};

impl Bracket {
    /// Build the initial match tree for `seeds`.
    ///
    /// `seeds` is the validated placement output: its length must be a
    /// power of two (callers round the visible participant cap up to the
    /// nearest power of two; the engine itself plays no byes).
    pub fn generate(format: BracketFormat, seeds: &[Participant]) -> BracketResult<Self> {
        match format {
            BracketFormat::SingleElimination => single_elimination(seeds),
            BracketFormat::DoubleElimination => double_elimination(seeds),
        }
    }
}

fn check_size(seeds: &[Participant]) -> BracketResult<u32> {
    let n = seeds.len();
    if n < 2 || !n.is_power_of_two() {
        return Err(BracketError::InvalidSize(n));
    }
    Ok(n.trailing_zeros())
}

fn match_id(prefix: &str, round: u32, index: usize) -> MatchId {
    format!("{prefix}-{round}-{index}")
}

/// A sequence of halving rounds: round 1 seeded from `seeds`, each match
/// `i` of round `r` forwarding its winner to match `i/2` of round `r+1`.
/// The final's forward pointer is `final_next` (absent for single
/// elimination, the grand final for a winners bracket).
fn halving_rounds(
    seeds: &[Participant],
    prefix: &str,
    final_next: Option<&str>,
) -> Vec<Vec<Match>> {
    let mut rounds = Vec::new();
    let mut matches_in_round = seeds.len() / 2;
    let mut round_num = 1u32;
    loop {
        let is_final_round = matches_in_round == 1;
        let mut round = Vec::with_capacity(matches_in_round);
        for i in 0..matches_in_round {
            let mut m = Match::new(match_id(prefix, round_num, i), round_num, i);
            if round_num == 1 {
                m.team_a = Some(seeds[2 * i].clone());
                m.team_b = Some(seeds[2 * i + 1].clone());
            }
            m.next_match_id = if is_final_round {
                final_next.map(str::to_string)
            } else {
                Some(match_id(prefix, round_num + 1, i / 2))
            };
            round.push(m);
        }
        rounds.push(round);
        if is_final_round {
            break;
        }
        matches_in_round /= 2;
        round_num += 1;
    }
    rounds
}

fn single_elimination(seeds: &[Participant]) -> BracketResult<Bracket> {
    check_size(seeds)?;
    Ok(Bracket {
        format: BracketFormat::SingleElimination,
        winners: halving_rounds(seeds, "match", None),
        losers: Vec::new(),
        grand_final: None,
    })
}

/// Double elimination for `n = 2^k` seeds, `k >= 2`.
///
/// The losers bracket has `2(k-1)` rounds. For each `j` in `1..=k-1`,
/// minor round `2j-1` and major round `2j` both hold `n / 2^(j+1)`
/// matches:
///
/// - minor round 1 pairs the winners-round-1 losers (match `i` drops its
///   loser into `lb-1-{i/2}`, first free slot); later minor rounds pair
///   the survivors of the preceding major round;
/// - major round `2j` receives the minor-round survivor in `teamA` and
///   the loser of winners round `j+1` match `i` in `teamB`.
///
/// The last major round is the losers final; the winners final's loser
/// drops into its `teamB` and its winner meets the winners champion in
/// the grand final.
fn double_elimination(seeds: &[Participant]) -> BracketResult<Bracket> {
    let k = check_size(seeds)? as usize;
    let n = seeds.len();
    if n < 4 {
        return Err(BracketError::TooFewSeeds(n));
    }

    let mut winners = halving_rounds(seeds, "wb", Some(GRAND_FINAL_ID));
    for round in &mut winners {
        for m in round {
            m.loser_next_match_id = Some(if m.round == 1 {
                match_id("lb", 1, m.match_index / 2)
            } else {
                match_id("lb", 2 * (m.round - 1), m.match_index)
            });
        }
    }

    let mut losers = Vec::with_capacity(2 * (k - 1));
    for j in 1..=k - 1 {
        let matches_in_round = n >> (j + 1);
        let minor_round = (2 * j - 1) as u32;
        let major_round = (2 * j) as u32;
        let is_losers_final = j == k - 1;

        let mut minor = Vec::with_capacity(matches_in_round);
        for i in 0..matches_in_round {
            let mut m = Match::new(match_id("lb", minor_round, i), minor_round, i);
            m.is_loser_bracket = true;
            m.next_match_id = Some(match_id("lb", major_round, i));
            minor.push(m);
        }
        losers.push(minor);

        let mut major = Vec::with_capacity(matches_in_round);
        for i in 0..matches_in_round {
            let mut m = Match::new(match_id("lb", major_round, i), major_round, i);
            m.is_loser_bracket = true;
            m.next_match_id = Some(if is_losers_final {
                GRAND_FINAL_ID.to_string()
            } else {
                match_id("lb", major_round + 1, i / 2)
            });
            major.push(m);
        }
        losers.push(major);
    }

    let grand_final = Match::new(GRAND_FINAL_ID.to_string(), (k + 1) as u32, 0);

    Ok(Bracket {
        format: BracketFormat::DoubleElimination,
        winners,
        losers,
        grand_final: Some(grand_final),
    })
}
