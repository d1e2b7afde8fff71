//! Types shared between the session server and its clients: the board
//! generator every client can rerun from a seed, and the datagram protocol.

pub mod board;

pub use board::{
    generate_board, Board, BoardError, Color, InvalidTeam, Team, BOARD_SIZE, COLOR_DISTRIBUTION,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest payload a single UDP datagram can carry
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Longest game id, player id or word list name a request may carry
pub const MAX_ID_LEN: usize = 64;

/// Longest single word a new game may bring
pub const MAX_WORD_LEN: usize = 64;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    /// Create a session, or start the next game in an existing one.
    ///
    /// `prev_seed` must echo the current seed for an existing session to be
    /// replaced. It is a string because JSON clients lose precision on i64.
    NewGame {
        request_id: u32,
        game_id: String,
        words: Vec<String>,
        word_list: Option<String>,
        prev_seed: Option<String>,
    },
    GameState {
        request_id: u32,
        game_id: String,
        player_id: Option<String>,
        team: u8,
    },
    Guess {
        request_id: u32,
        game_id: String,
        player_id: String,
        team: u8,
        index: i32,
    },

    State {
        request_id: u32,
        session: SessionView,
    },
    Error {
        request_id: u32,
        code: ErrorCode,
        message: String,
    },
}

impl Packet {
    pub fn request_id(&self) -> u32 {
        match self {
            Packet::NewGame { request_id, .. }
            | Packet::GameState { request_id, .. }
            | Packet::Guess { request_id, .. }
            | Packet::State { request_id, .. }
            | Packet::Error { request_id, .. } => *request_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MalformedBody,
    NotFound,
    TooFewWords,
    InvalidIndex,
    UnknownWordList,
    /// The session no longer fits in one datagram
    ReplyTooLarge,
}

/// Snapshot of a live session as handed to clients
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub seed: String,
    pub round: u32,
    pub exposed_one: Vec<bool>,
    pub exposed_two: Vec<bool>,
    pub players: BTreeMap<String, PlayerView>,
    pub created_at: u64,
    pub words: Vec<String>,
    pub one_layout: Vec<Color>,
    pub two_layout: Vec<Color>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PlayerView {
    /// 0 when the player has not picked a team this game
    pub team: u8,
    pub last_seen: u64,
}
