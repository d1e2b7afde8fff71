//! Deterministic board reconstruction
//!
//! A board is never stored. Every participant rebuilds it from the session
//! seed and the word universe the session was created with, so the generator
//! must consume its random stream in exactly the same order every time:
//! first the word draws, then the color permutation.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Number of cells on a board
pub const BOARD_SIZE: usize = 25;

/// Cell color as seen by one team
///
/// Serialized as the single-letter codes the presentation layer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Neutral bystander
    #[serde(rename = "t")]
    Tan,
    /// Safe agent
    #[serde(rename = "g")]
    Green,
    /// Assassin
    #[serde(rename = "b")]
    Black,
}

impl Color {
    pub fn code(self) -> char {
        match self {
            Color::Tan => 't',
            Color::Green => 'g',
            Color::Black => 'b',
        }
    }
}

/// One of the two teams sharing a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    One,
    Two,
}

/// Team value outside the wire range `0..=2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("team must be 0, 1 or 2, got {0}")]
pub struct InvalidTeam(pub u8);

impl Team {
    /// Decodes the wire representation, where `0` means "no team"
    pub fn from_wire(value: u8) -> Result<Option<Team>, InvalidTeam> {
        match value {
            0 => Ok(None),
            1 => Ok(Some(Team::One)),
            2 => Ok(Some(Team::Two)),
            other => Err(InvalidTeam(other)),
        }
    }

    pub fn to_wire(team: Option<Team>) -> u8 {
        match team {
            None => 0,
            Some(Team::One) => 1,
            Some(Team::Two) => 2,
        }
    }

    /// The other team, whose clues this team guesses from
    pub fn partner(self) -> Team {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }
}

use Color::{Black, Green, Tan};

/// Canonical (Team-One, Team-Two) color pairs before shuffling.
///
/// Each side sees 9 green, 3 black and 13 tan cells.
pub const COLOR_DISTRIBUTION: [(Color, Color); BOARD_SIZE] = [
    (Black, Green),
    (Tan, Green),
    (Tan, Green),
    (Tan, Green),
    (Tan, Green),
    (Tan, Green),
    (Green, Green),
    (Green, Green),
    (Green, Green),
    (Green, Tan),
    (Green, Tan),
    (Green, Tan),
    (Green, Tan),
    (Green, Tan),
    (Green, Black),
    (Tan, Black),
    (Black, Black),
    (Tan, Tan),
    (Tan, Tan),
    (Tan, Tan),
    (Tan, Tan),
    (Tan, Tan),
    (Tan, Tan),
    (Tan, Tan),
    (Black, Tan),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("a word list must have at least {required} distinct words, got {available}")]
    InsufficientWords { required: usize, available: usize },
}

/// The 25 words of a game and both teams' views of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    pub words: Vec<String>,
    pub one_layout: [Color; BOARD_SIZE],
    pub two_layout: [Color; BOARD_SIZE],
}

impl Board {
    pub fn layout(&self, team: Team) -> &[Color; BOARD_SIZE] {
        match team {
            Team::One => &self.one_layout,
            Team::Two => &self.two_layout,
        }
    }
}

/// Rebuilds the board for `seed` from `universe`
///
/// Words are drawn uniformly with replacement and de-duplicated by string
/// value until `BOARD_SIZE` distinct words are collected, so the universe must
/// hold at least that many distinct strings.
pub fn generate_board(seed: i64, universe: &[String]) -> Result<Board, BoardError> {
    let available = count_distinct(universe, BOARD_SIZE);
    if available < BOARD_SIZE {
        return Err(BoardError::InsufficientWords {
            required: BOARD_SIZE,
            available,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);

    let mut used: HashSet<&str> = HashSet::with_capacity(BOARD_SIZE);
    let mut words = Vec::with_capacity(BOARD_SIZE);
    while words.len() < BOARD_SIZE {
        let word = &universe[rng.gen_range(0..universe.len())];
        if used.insert(word.as_str()) {
            words.push(word.clone());
        }
    }

    // Same generator, continuing after the word draws
    let mut perm: Vec<usize> = (0..BOARD_SIZE).collect();
    perm.shuffle(&mut rng);

    let mut one_layout = [Tan; BOARD_SIZE];
    let mut two_layout = [Tan; BOARD_SIZE];
    for (i, &(one, two)) in COLOR_DISTRIBUTION.iter().enumerate() {
        one_layout[perm[i]] = one;
        two_layout[perm[i]] = two;
    }

    Ok(Board {
        words,
        one_layout,
        two_layout,
    })
}

/// Distinct strings in `words`, counting no further than `limit`
fn count_distinct(words: &[String], limit: usize) -> usize {
    let mut seen: HashSet<&str> = HashSet::with_capacity(limit);
    for word in words {
        seen.insert(word.as_str());
        if seen.len() >= limit {
            break;
        }
    }
    seen.len()
}
