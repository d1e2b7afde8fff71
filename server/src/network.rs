//! Server network layer handling UDP request/response traffic

use crate::error::RegistryError;
use crate::registry::{SessionRegistry, WordSource};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{ErrorCode, Packet, SessionView, Team, MAX_DATAGRAM_SIZE, MAX_ID_LEN, MAX_WORD_LEN};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Semaphore};

/// Reply queued by a handler for the sender task
#[derive(Debug)]
pub struct Outgoing {
    pub packet: Packet,
    pub addr: SocketAddr,
}

/// Main server: receives requests, runs them against the registry on a
/// bounded pool of handler tasks and sends back the resulting state
pub struct Server {
    socket: Arc<UdpSocket>,
    registry: Arc<SessionRegistry>,
    handler_slots: Arc<Semaphore>,

    outgoing_tx: mpsc::Sender<Outgoing>,
    outgoing_rx: Option<mpsc::Receiver<Outgoing>>,
}

impl Server {
    pub async fn new(
        addr: &str,
        registry: Arc<SessionRegistry>,
        max_in_flight: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let max_in_flight = max_in_flight.max(1);
        let (outgoing_tx, outgoing_rx) = mpsc::channel(max_in_flight);

        Ok(Server {
            socket,
            registry,
            handler_slots: Arc::new(Semaphore::new(max_in_flight)),
            outgoing_tx,
            outgoing_rx: Some(outgoing_rx),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Spawns task that drains the reply queue onto the socket
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let Some(mut outgoing_rx) = self.outgoing_rx.take() else {
            return;
        };

        tokio::spawn(async move {
            while let Some(Outgoing { packet, addr }) = outgoing_rx.recv().await {
                if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                    error!("Failed to send reply to {}: {}", addr, e);
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = encode_reply(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    /// Main server loop: receive, hand off to a handler, repeat
    ///
    /// Waits for a free handler slot before reading the next datagram, so a
    /// burst of requests queues in the socket rather than in memory. A slot
    /// is held until its reply is queued for sending.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_sender();

        info!("Server started successfully");

        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            let permit = Arc::clone(&self.handler_slots).acquire_owned().await?;

            let (len, addr) = match self.socket.recv_from(&mut buffer).await {
                Ok(received) => received,
                Err(e) => {
                    error!("Error receiving packet: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    continue;
                }
            };

            let request = deserialize::<Packet>(&buffer[..len]);
            let registry = Arc::clone(&self.registry);
            let outgoing_tx = self.outgoing_tx.clone();

            tokio::spawn(async move {
                let reply = match request {
                    Ok(packet) => handle_packet(&registry, packet).await,
                    Err(e) => {
                        warn!("Failed to deserialize packet from {}: {}", addr, e);
                        malformed(0)
                    }
                };
                if outgoing_tx
                    .send(Outgoing { packet: reply, addr })
                    .await
                    .is_err()
                {
                    error!("Reply queue closed, dropping reply to {}", addr);
                }
                drop(permit);
            });
        }
    }
}

/// Encodes a reply, swapping in an error when it would not fit in one
/// datagram
pub fn encode_reply(packet: &Packet) -> Result<Vec<u8>, bincode::Error> {
    let data = serialize(packet)?;
    if data.len() <= MAX_DATAGRAM_SIZE {
        return Ok(data);
    }

    warn!(
        "Reply to request {} is {} bytes, sending an error instead",
        packet.request_id(),
        data.len()
    );
    serialize(&Packet::Error {
        request_id: packet.request_id(),
        code: ErrorCode::ReplyTooLarge,
        message: format!("Reply of {} bytes does not fit in a datagram.", data.len()),
    })
}

fn valid_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_ID_LEN
}

fn over_limit(field: Option<&str>) -> bool {
    field.is_some_and(|f| f.len() > MAX_ID_LEN)
}

/// Runs one request against the registry and builds the reply
///
/// Ids and words longer than the protocol limits are rejected up front, so
/// no single client can grow a session past what one datagram can carry.
pub async fn handle_packet(registry: &SessionRegistry, packet: Packet) -> Packet {
    let request_id = packet.request_id();
    match packet {
        Packet::NewGame {
            game_id,
            words,
            word_list,
            prev_seed,
            ..
        } => {
            let oversized = words.iter().any(|w| w.len() > MAX_WORD_LEN)
                || over_limit(word_list.as_deref())
                || over_limit(prev_seed.as_deref());
            if !valid_id(&game_id) || oversized {
                return malformed(request_id);
            }
            let source = WordSource::from_request(words, word_list);
            reply(
                request_id,
                registry
                    .create_or_get(&game_id, source, prev_seed.as_deref())
                    .await,
            )
        }

        Packet::GameState {
            game_id,
            player_id,
            team,
            ..
        } => {
            let Ok(team) = Team::from_wire(team) else {
                return malformed(request_id);
            };
            if !valid_id(&game_id) || over_limit(player_id.as_deref()) {
                return malformed(request_id);
            }
            let result = match player_id.as_deref() {
                Some(player_id) if !player_id.is_empty() => {
                    registry.record_presence(&game_id, player_id, team).await
                }
                _ => registry.get(&game_id).await,
            };
            reply(request_id, result)
        }

        Packet::Guess {
            game_id,
            player_id,
            team,
            index,
            ..
        } => {
            // A guess has to come from someone on a team
            let Ok(Some(team)) = Team::from_wire(team) else {
                return malformed(request_id);
            };
            if !valid_id(&game_id) || !valid_id(&player_id) {
                return malformed(request_id);
            }
            reply(
                request_id,
                registry
                    .guess(&game_id, &player_id, Some(team), i64::from(index))
                    .await,
            )
        }

        Packet::State { .. } | Packet::Error { .. } => {
            debug!("Ignoring reply-type packet sent as a request");
            malformed(request_id)
        }
    }
}

fn reply(request_id: u32, result: Result<SessionView, RegistryError>) -> Packet {
    match result {
        Ok(session) => Packet::State {
            request_id,
            session,
        },
        Err(e) => Packet::Error {
            request_id,
            code: e.code(),
            message: e.to_string(),
        },
    }
}

fn malformed(request_id: u32) -> Packet {
    Packet::Error {
        request_id,
        code: ErrorCode::MalformedBody,
        message: "Unable to parse request body.".to_string(),
    }
}
