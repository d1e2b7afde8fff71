//! # Word Board Session Server
//!
//! Server-side engine for a cooperative shared-board word game. Many clients
//! poll the same game; the server keeps the one authoritative copy of every
//! game and applies their actions to it one at a time.
//!
//! ## Core Responsibilities
//!
//! ### Deterministic Boards
//! A game is persisted as a seed plus the word universe it was created with.
//! The 25 words and both teams' color layouts are regenerated from that seed
//! (see [`shared::generate_board`]), so every client sees the same board
//! without the server storing it.
//!
//! ### Serialized Mutation
//! All games live in a [`registry::SessionRegistry`]. Every operation takes
//! its single lock once, applies presence and guess rules, and returns an
//! owned snapshot. Concurrent players can never interleave half-applied
//! updates.
//!
//! ### Reclaiming Abandoned Games
//! Clients never say goodbye. Players who stop polling for 50 seconds drop
//! out of the roster, and a game with no players left is evicted once it is a
//! day old. A background [`registry::Sweeper`] runs this every ten minutes.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! One game's state, its board, the presence tracker and the guess rules.
//!
//! ### Registry Module (`registry`)
//! The concurrent store of live games and the sweeper task.
//!
//! ### Network Module (`network`)
//! UDP transport: decodes requests, runs them on a bounded pool of handler
//! tasks and sends back the resulting state.
//!
//! ### Word List Module (`wordlist`)
//! Loads the named word lists new games can draw from.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::registry::{RegistryConfig, SessionRegistry};
//! use server::wordlist::WordLists;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lists = WordLists::load_dir(Path::new("wordlists"))?;
//!     let (registry, sweeper) = SessionRegistry::start(RegistryConfig::default(), lists);
//!
//!     // Serve at most 64 requests at once
//!     let mut server = Server::new("127.0.0.1:8080", registry, 64).await?;
//!     server.run().await?;
//!
//!     sweeper.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod network;
pub mod registry;
pub mod session;
pub mod utils;
pub mod wordlist;
