use bincode::{deserialize, serialize};
use clap::Parser;
use log::info;
use shared::{Color, Packet, SessionView, Team, MAX_DATAGRAM_SIZE};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// Creates (or joins) a game on a running server, optionally makes a guess,
/// and prints the resulting state as JSON
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to talk to
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    server: SocketAddr,

    /// Game to create or join
    #[arg(short, long, default_value = "probe")]
    game: String,

    /// Player id to join as
    #[arg(long, default_value = "probe-player")]
    player: String,

    /// Team to join (0 = none, 1 or 2)
    #[arg(short, long, default_value = "1")]
    team: u8,

    /// Cell to guess after joining
    #[arg(long)]
    guess: Option<i32>,

    /// Start the next game, proving the current seed
    #[arg(long)]
    next: bool,

    /// Seconds to wait for each reply
    #[arg(long, default_value = "2")]
    wait: u64,
}

/// Cells per row when printing a key
const GRID_WIDTH: usize = 5;

/// Renders a team's key as rows of color codes
fn key_grid(layout: &[Color]) -> String {
    layout
        .chunks(GRID_WIDTH)
        .map(|row| row.iter().map(|c| c.code()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

struct Probe {
    socket: UdpSocket,
    server: SocketAddr,
    wait: Duration,
    next_request_id: u32,
    buf: Vec<u8>,
}

impl Probe {
    /// Sends one request and waits for the reply carrying the same id
    async fn request(
        &mut self,
        build: impl FnOnce(u32) -> Packet,
    ) -> Result<SessionView, Box<dyn std::error::Error>> {
        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let packet = build(request_id);
        self.socket
            .send_to(&serialize(&packet)?, self.server)
            .await?;

        loop {
            let received = timeout(self.wait, self.socket.recv_from(&mut self.buf)).await;
            let (len, _) = received??;
            let reply: Packet = deserialize(&self.buf[..len])?;
            if reply.request_id() != request_id {
                continue;
            }
            return match reply {
                Packet::State { session, .. } => Ok(session),
                Packet::Error { code, message, .. } => {
                    Err(format!("server error {:?}: {}", code, message).into())
                }
                other => Err(format!("unexpected reply {:?}", other).into()),
            };
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    info!("Probe socket bound to {}", socket.local_addr()?);

    let mut probe = Probe {
        socket,
        server: args.server,
        wait: Duration::from_secs(args.wait),
        next_request_id: 1,
        buf: vec![0u8; MAX_DATAGRAM_SIZE],
    };

    let game = args.game.clone();
    let mut state = probe
        .request(|request_id| Packet::NewGame {
            request_id,
            game_id: game,
            words: vec![],
            word_list: None,
            prev_seed: None,
        })
        .await?;
    info!("Game {} has seed {}", args.game, state.seed);

    if args.next {
        let game = args.game.clone();
        let prev_seed = state.seed.clone();
        state = probe
            .request(|request_id| Packet::NewGame {
                request_id,
                game_id: game,
                words: vec![],
                word_list: None,
                prev_seed: Some(prev_seed),
            })
            .await?;
        info!("Moved to next game with seed {}", state.seed);
    }

    let (game, player) = (args.game.clone(), args.player.clone());
    state = probe
        .request(|request_id| Packet::GameState {
            request_id,
            game_id: game,
            player_id: Some(player),
            team: args.team,
        })
        .await?;

    if let Some(index) = args.guess {
        let (game, player) = (args.game.clone(), args.player.clone());
        state = probe
            .request(|request_id| Packet::Guess {
                request_id,
                game_id: game,
                player_id: player,
                team: args.team,
                index,
            })
            .await?;
    }

    // Key goes to stderr so stdout stays valid JSON
    if let Ok(Some(team)) = Team::from_wire(args.team) {
        let layout = match team {
            Team::One => &state.one_layout,
            Team::Two => &state.two_layout,
        };
        eprintln!("Key for team {}:\n{}", args.team, key_grid(layout));
    }

    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{generate_board, BOARD_SIZE};

    #[test]
    fn test_key_grid_layout() {
        let words: Vec<String> = (0..40).map(|i| format!("w{}", i)).collect();
        let board = generate_board(3, &words).unwrap();

        let grid = key_grid(&board.one_layout);
        let rows: Vec<&str> = grid.lines().collect();
        assert_eq!(rows.len(), BOARD_SIZE / GRID_WIDTH);
        assert!(rows.iter().all(|r| r.len() == GRID_WIDTH));
        assert_eq!(grid.matches('b').count(), 3);
        assert_eq!(grid.matches('g').count(), 9);
    }
}
