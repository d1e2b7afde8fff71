use clap::{Parser, ValueEnum};
use log::{info, warn};
use server::network::Server;
use server::registry::{RegistryConfig, SessionRegistry};
use server::session::GuessPolicy;
use server::wordlist::WordLists;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Guesses only uncover cells
    Record,
    /// Uncovering an assassin also ends the round
    EndRound,
}

impl From<PolicyArg> for GuessPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Record => GuessPolicy::RecordOnly,
            PolicyArg::EndRound => GuessPolicy::EndRoundOnAssassin,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Directory of *.txt word lists
    #[arg(short, long, default_value = "wordlists")]
    words: PathBuf,

    /// Word list used when a new game brings no words
    #[arg(long, default_value = "green")]
    default_list: String,

    /// Maximum number of requests handled at once
    #[arg(long, default_value = "64")]
    max_in_flight: usize,

    /// Seconds between eviction sweeps
    #[arg(long, default_value = "600")]
    sweep_interval: u64,

    /// Seconds a silent player stays on the roster
    #[arg(long, default_value = "50")]
    player_ttl: u64,

    /// Hours an empty game is kept after creation
    #[arg(long, default_value = "24")]
    retention_hours: u64,

    /// What happens when a guess uncovers an assassin
    #[arg(long, value_enum, default_value = "record")]
    guess_policy: PolicyArg,

    /// Seed for the generator that issues game seeds
    #[arg(long)]
    rng_seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let args = Args::parse();

    let word_lists = match WordLists::load_dir(&args.words) {
        Ok(lists) => lists,
        Err(e) => {
            warn!(
                "Could not load word lists from {}: {}; new games must bring their own words",
                args.words.display(),
                e
            );
            WordLists::new()
        }
    };
    if word_lists.get(&args.default_list).is_none() {
        warn!("Default word list {} is not loaded", args.default_list);
    }

    let config = RegistryConfig {
        player_ttl: Duration::from_secs(args.player_ttl),
        retention: Duration::from_secs(args.retention_hours * 60 * 60),
        sweep_interval: Duration::from_secs(args.sweep_interval.max(1)),
        default_word_list: args.default_list,
        guess_policy: args.guess_policy.into(),
        rng_seed: args.rng_seed,
    };
    info!("Starting with {:?}", config);

    let (registry, sweeper) = SessionRegistry::start(config, word_lists);

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, registry, args.max_in_flight).await?;

    let result = tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
            Ok(())
        }
    };

    sweeper.shutdown().await;
    result
}
