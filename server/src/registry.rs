//! Session registry: the single owner of every live game
//!
//! All access to sessions goes through one `tokio::sync::Mutex` guarding the
//! session map and the seed generator together. Each public operation takes
//! the lock once, finishes its work without awaiting, and hands back an owned
//! `SessionView` snapshot, so callers never observe a half-applied update and
//! operations on one game are totally ordered by lock acquisition.
//!
//! Abandoned games are reclaimed by a periodic sweep rather than an explicit
//! leave message: players who stop polling age out of the roster, and a game
//! with nobody left is dropped once it is old enough.

use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shared::{SessionView, Team};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::error::RegistryError;
use crate::session::{GuessOutcome, GuessPolicy, Session};
use crate::utils::{Clock, SystemClock};
use crate::wordlist::WordLists;

/// Tunables for presence, eviction and guess handling
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Players unseen for longer than this are dropped from the roster
    pub player_ttl: Duration,
    /// Empty games younger than this are kept
    pub retention: Duration,
    /// How often the background sweeper runs
    pub sweep_interval: Duration,
    /// List used when a new game supplies neither words nor a list name
    pub default_word_list: String,
    pub guess_policy: GuessPolicy,
    /// Fixes the seed generator, for reproducible runs
    pub rng_seed: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            player_ttl: Duration::from_secs(50),
            retention: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(10 * 60),
            default_word_list: "green".to_string(),
            guess_policy: GuessPolicy::default(),
            rng_seed: None,
        }
    }
}

/// Where a new game's words come from
#[derive(Debug, Clone)]
pub enum WordSource {
    /// Words supplied by the caller
    Words(Vec<String>),
    /// A list loaded at startup
    Named(String),
    /// The configured default list
    Default,
}

impl WordSource {
    /// Interprets the new-game request fields: explicit words win, then a list
    /// name, then the default
    pub fn from_request(words: Vec<String>, word_list: Option<String>) -> Self {
        if !words.is_empty() {
            WordSource::Words(words)
        } else {
            match word_list {
                Some(name) if !name.is_empty() => WordSource::Named(name),
                _ => WordSource::Default,
            }
        }
    }
}

/// Counts from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub players_pruned: usize,
    pub sessions_removed: usize,
    pub sessions_kept: usize,
}

struct Inner {
    sessions: HashMap<String, Session>,
    rng: ChaCha8Rng,
}

impl Inner {
    fn next_seed(&mut self) -> i64 {
        self.rng.gen_range(0..=i64::MAX)
    }
}

/// Concurrent store of live sessions, shared between handlers via `Arc`
pub struct SessionRegistry {
    inner: Mutex<Inner>,
    word_lists: WordLists,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
}

impl SessionRegistry {
    pub fn new(config: RegistryConfig, word_lists: WordLists) -> Self {
        Self::with_clock(config, word_lists, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: RegistryConfig,
        word_lists: WordLists,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rng = config
            .rng_seed
            .map(ChaCha8Rng::seed_from_u64)
            .unwrap_or_else(ChaCha8Rng::from_entropy);

        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                rng,
            }),
            word_lists,
            clock,
            config,
        }
    }

    /// Builds a shared registry with its sweeper already running
    ///
    /// The sweeper lives until the returned handle is shut down or dropped.
    /// Must be called from within a tokio runtime.
    pub fn start(config: RegistryConfig, word_lists: WordLists) -> (Arc<Self>, Sweeper) {
        Self::start_with_clock(config, word_lists, Arc::new(SystemClock))
    }

    pub fn start_with_clock(
        config: RegistryConfig,
        word_lists: WordLists,
        clock: Arc<dyn Clock>,
    ) -> (Arc<Self>, Sweeper) {
        let registry = Arc::new(Self::with_clock(config, word_lists, clock));
        let sweeper = Sweeper::spawn(Arc::clone(&registry), registry.config.sweep_interval);
        (registry, sweeper)
    }

    fn resolve_words(&self, source: WordSource) -> Result<Arc<[String]>, RegistryError> {
        match source {
            WordSource::Words(words) => Ok(words.into()),
            WordSource::Named(name) => self
                .word_lists
                .get(&name)
                .ok_or(RegistryError::UnknownWordList(name)),
            // A missing default behaves like an empty list
            WordSource::Default => Ok(self
                .word_lists
                .get(&self.config.default_word_list)
                .unwrap_or_else(|| Arc::from(Vec::new()))),
        }
    }

    /// Creates the game `id`, or starts its next game
    ///
    /// An existing game is only replaced when `claimed_prior_seed` matches its
    /// current seed. Anything else is treated as a delayed duplicate of an
    /// earlier request and gets the existing game back untouched.
    pub async fn create_or_get(
        &self,
        id: &str,
        words: WordSource,
        claimed_prior_seed: Option<&str>,
    ) -> Result<SessionView, RegistryError> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();

        let replacing = match inner.sessions.get(id) {
            Some(existing) => {
                let current = existing.state.seed.to_string();
                if claimed_prior_seed != Some(current.as_str()) {
                    debug!(
                        "Ignoring stale new-game for {} (claimed {:?}, current {})",
                        id, claimed_prior_seed, current
                    );
                    return Ok(existing.view());
                }
                true
            }
            None => false,
        };

        let word_set = self.resolve_words(words)?;
        let seed = inner.next_seed();

        let session = match inner.sessions.get(id) {
            Some(existing) if replacing => existing.next_game(seed, word_set, now)?,
            _ => Session::new(seed, word_set, now)?,
        };

        if replacing {
            info!(
                "Game {} moved to a new board (seed {}, {} players carried over)",
                id,
                seed,
                session.state.players.len()
            );
        } else {
            info!("Created game {} (seed {})", id, seed);
        }

        let view = session.view();
        inner.sessions.insert(id.to_string(), session);
        Ok(view)
    }

    pub async fn get(&self, id: &str) -> Result<SessionView, RegistryError> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .get(id)
            .map(Session::view)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// Marks `player_id` as present in game `id`, joining `team` if given
    pub async fn record_presence(
        &self,
        id: &str,
        player_id: &str,
        team: Option<Team>,
    ) -> Result<SessionView, RegistryError> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        session.state.touch(player_id, team, now);
        Ok(session.view())
    }

    /// Applies a guess without attributing it to a player
    pub async fn apply_guess(
        &self,
        id: &str,
        team: Option<Team>,
        index: i64,
    ) -> Result<SessionView, RegistryError> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        self.guess_locked(id, session, team, index)?;
        Ok(session.view())
    }

    /// Records the guessing player's presence, then applies their guess, as
    /// one step
    ///
    /// Presence is recorded even when the index turns out to be invalid.
    pub async fn guess(
        &self,
        id: &str,
        player_id: &str,
        team: Option<Team>,
        index: i64,
    ) -> Result<SessionView, RegistryError> {
        let mut inner = self.inner.lock().await;
        let now = self.clock.now();
        let session = inner
            .sessions
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        session.state.touch(player_id, team, now);
        self.guess_locked(id, session, team, index)?;
        Ok(session.view())
    }

    fn guess_locked(
        &self,
        id: &str,
        session: &mut Session,
        team: Option<Team>,
        index: i64,
    ) -> Result<GuessOutcome, RegistryError> {
        let outcome = session.guess(team, index, self.config.guess_policy)?;
        debug!("Game {}: team {:?} guessed {} -> {:?}", id, team, index, outcome);
        Ok(outcome)
    }

    /// Drops stale players everywhere, then any game left empty that is older
    /// than the retention window
    pub async fn sweep(&self, now: u64) -> SweepReport {
        let mut inner = self.inner.lock().await;
        let ttl = self.config.player_ttl;
        let retention = self.config.retention.as_millis() as u64;
        let mut report = SweepReport::default();

        inner.sessions.retain(|id, session| {
            report.players_pruned += session.state.prune(now, ttl);
            let keep = !session.state.players.is_empty()
                || session.created_at.saturating_add(retention) > now;
            if keep {
                report.sessions_kept += 1;
            } else {
                info!("Evicting idle game {}", id);
                report.sessions_removed += 1;
            }
            keep
        });

        report
    }

    /// Runs `sweep` at the current clock time
    pub async fn sweep_now(&self) -> SweepReport {
        self.sweep(self.clock.now()).await
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Handle to the recurring eviction task
pub struct Sweeper {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    fn spawn(registry: Arc<SessionRegistry>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // Skip the first tick since it fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = registry.sweep_now().await;
                        if report.players_pruned > 0 || report.sessions_removed > 0 {
                            info!(
                                "Sweep pruned {} players, removed {} games, {} remain",
                                report.players_pruned,
                                report.sessions_removed,
                                report.sessions_kept
                            );
                        } else {
                            debug!("Sweep found nothing to do ({} games)", report.sessions_kept);
                        }
                    }
                    _ = &mut shutdown_rx => {
                        debug!("Sweeper stopping");
                        break;
                    }
                }
            }
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Stops the sweeper and waits for it to finish
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
