//! A single live game: its persisted state, the board derived from it, and
//! the presence and guess rules that mutate it.
//!
//! Nothing here locks. A `Session` is only ever touched through the registry,
//! which holds the one lock around every call into this module.

use log::{debug, info};
use shared::{
    generate_board, Board, BoardError, Color, PlayerView, SessionView, Team, BOARD_SIZE,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::RegistryError;

/// A participant in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    /// None until the player picks a side for the current game
    pub team: Option<Team>,
    /// Milliseconds since the epoch of the player's last action
    pub last_seen: u64,
}

impl Player {
    /// True once `ttl` has fully elapsed since the player was last seen
    pub fn is_stale(&self, now: u64, ttl: Duration) -> bool {
        self.last_seen.saturating_add(ttl.as_millis() as u64) < now
    }
}

/// Everything needed to rebuild a game: the seed, the word universe it draws
/// from, and what the players have done so far
#[derive(Debug, Clone)]
pub struct SessionState {
    pub seed: i64,
    pub round: u32,
    pub exposed_one: [bool; BOARD_SIZE],
    pub exposed_two: [bool; BOARD_SIZE],
    pub players: HashMap<String, Player>,
    pub word_set: Arc<[String]>,
}

impl SessionState {
    pub fn new(seed: i64, word_set: Arc<[String]>) -> Self {
        Self {
            seed,
            round: 0,
            exposed_one: [false; BOARD_SIZE],
            exposed_two: [false; BOARD_SIZE],
            players: HashMap::new(),
            word_set,
        }
    }

    fn exposed_mut(&mut self, team: Team) -> &mut [bool; BOARD_SIZE] {
        match team {
            Team::One => &mut self.exposed_one,
            Team::Two => &mut self.exposed_two,
        }
    }

    /// Records that `player_id` was seen at `now`, creating the player on
    /// first contact. A `None` team keeps whatever team was stored before.
    pub fn touch(&mut self, player_id: &str, team: Option<Team>, now: u64) -> Player {
        let player = self
            .players
            .entry(player_id.to_string())
            .and_modify(|p| p.last_seen = now)
            .or_insert_with(|| {
                debug!("Player {} joined", player_id);
                Player {
                    team: None,
                    last_seen: now,
                }
            });
        if team.is_some() {
            player.team = team;
        }
        *player
    }

    /// Drops every player not seen within `ttl` of `now`, returning how many
    /// were removed
    pub fn prune(&mut self, now: u64, ttl: Duration) -> usize {
        let before = self.players.len();
        self.players.retain(|_, player| !player.is_stale(now, ttl));
        before - self.players.len()
    }
}

/// What the guess rules do beyond marking the cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuessPolicy {
    /// Only record the exposure
    #[default]
    RecordOnly,
    /// Also advance the round counter when an assassin is first revealed
    EndRoundOnAssassin,
}

/// Result of applying one guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The cell was newly uncovered and showed this color
    Revealed(Color),
    /// The team had already uncovered this cell
    AlreadyExposed(Color),
    /// The guesser has no team, so nothing was exposed
    Unattributed,
}

/// A registry entry: state plus the board derived from it
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub created_at: u64,
    pub board: Board,
}

impl Session {
    /// Builds a fresh session, generating its board from `seed`
    pub fn new(seed: i64, word_set: Arc<[String]>, now: u64) -> Result<Self, BoardError> {
        Self::reconstruct(SessionState::new(seed, word_set), now)
    }

    /// Regenerates the board for an existing state
    pub fn reconstruct(state: SessionState, now: u64) -> Result<Self, BoardError> {
        let board = generate_board(state.seed, &state.word_set)?;
        Ok(Self {
            state,
            created_at: now,
            board,
        })
    }

    /// Starts the next game: new seed and board, same players but with their
    /// teams cleared so they choose again
    pub fn next_game(
        &self,
        seed: i64,
        word_set: Arc<[String]>,
        now: u64,
    ) -> Result<Self, BoardError> {
        let mut next = Session::new(seed, word_set, now)?;
        next.state.players = self
            .state
            .players
            .iter()
            .map(|(id, player)| {
                (
                    id.clone(),
                    Player {
                        team: None,
                        last_seen: player.last_seen,
                    },
                )
            })
            .collect();
        Ok(next)
    }

    /// Applies a guess by `team` on cell `index`
    ///
    /// The revealed color comes from the partner team's layout, since the
    /// guessers are working from the partner's clues. Exposure only ever goes
    /// from false to true; repeating a guess changes nothing.
    pub fn guess(
        &mut self,
        team: Option<Team>,
        index: i64,
        policy: GuessPolicy,
    ) -> Result<GuessOutcome, RegistryError> {
        let cell = usize::try_from(index)
            .ok()
            .filter(|&i| i < BOARD_SIZE)
            .ok_or(RegistryError::InvalidIndex(index))?;

        let Some(team) = team else {
            return Ok(GuessOutcome::Unattributed);
        };

        let color = self.board.layout(team.partner())[cell];
        let exposed = &mut self.state.exposed_mut(team)[cell];
        if *exposed {
            return Ok(GuessOutcome::AlreadyExposed(color));
        }
        *exposed = true;

        if color == Color::Black && policy == GuessPolicy::EndRoundOnAssassin {
            self.state.round += 1;
            info!(
                "Assassin revealed by team {:?} at cell {}, round now {}",
                team, cell, self.state.round
            );
        }

        Ok(GuessOutcome::Revealed(color))
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            seed: self.state.seed.to_string(),
            round: self.state.round,
            exposed_one: self.state.exposed_one.to_vec(),
            exposed_two: self.state.exposed_two.to_vec(),
            players: self
                .state
                .players
                .iter()
                .map(|(id, player)| {
                    (
                        id.clone(),
                        PlayerView {
                            team: Team::to_wire(player.team),
                            last_seen: player.last_seen,
                        },
                    )
                })
                .collect(),
            created_at: self.created_at,
            words: self.board.words.clone(),
            one_layout: self.board.one_layout.to_vec(),
            two_layout: self.board.two_layout.to_vec(),
        }
    }
}
