//! TCP server for the renderer adapter
//!
//! Handles incoming connections and manages client lifecycle. Commands from the
//! controller are forwarded to the engine actor; snapshot changes and core
//! signals are fanned out to every client that asked for them.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use arrayvec::ArrayVec;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use number_match_engine::config::{parse_var, ConfigError};
use number_match_engine::{EngineError, EngineHandle};
use number_match_types::{CellId, GameAction};

use crate::protocol::*;

pub const HOST_VAR: &str = "NUMBER_MATCH_HOST";
pub const PORT_VAR: &str = "NUMBER_MATCH_PORT";

pub const DEFAULT_PORT: u16 = 7878;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            protocol_version: PROTOCOL_VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let host = lookup(HOST_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);
        let port = parse_var(&lookup, PORT_VAR, "port")?.unwrap_or(defaults.port);

        Ok(Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Major version a client must speak
    fn major_prefix(&self) -> &str {
        let end = self
            .protocol_version
            .find('.')
            .map_or(self.protocol_version.len(), |i| i + 1);
        &self.protocol_version[..end]
    }
}

/// Shared server state
struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
    out_seq: AtomicU64,
}

impl ServerState {
    fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
            out_seq: AtomicU64::new(0),
        }
    }

    /// Sequence number for server-initiated messages
    fn next_seq(&self) -> u64 {
        self.out_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Handle to a connected client
struct ClientHandle {
    id: usize,
    addr: SocketAddr,
    handshaken: bool,
    stream_observations: bool,
    stream_events: bool,
    last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(Arc<ObservationMessage>),
    Event(Arc<EventMessage>),
}

async fn is_handshaken(state: &ServerState, client_id: usize) -> bool {
    let clients = state.clients.read().await;
    clients
        .iter()
        .find(|c| c.id == client_id)
        .map(|c| c.handshaken)
        .unwrap_or(false)
}

/// Enforce strictly increasing `seq` per client.
async fn check_and_update_seq(state: &ServerState, client_id: usize, seq: u64) -> bool {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return true;
    };

    match client.last_seq {
        Some(prev) if seq <= prev => false,
        _ => {
            client.last_seq = Some(seq);
            true
        }
    }
}

/// Start the TCP server.
///
/// Runs until the listener fails. `ready_tx` receives the bound address, which
/// is how callers learn the port when binding to port 0.
pub async fn run_server(
    config: ServerConfig,
    engine: EngineHandle,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let bound = listener.local_addr()?;
    info!(%bound, "adapter listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    tokio::spawn(dispatch(Arc::clone(&state), engine.clone()));

    let mut client_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!(client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state, engine).await {
                warn!(client_id, error = %e, "client error");
            }
            info!(client_id, "client disconnected");
        });
    }
}

/// Fan out observations and events to streaming clients.
async fn dispatch(state: Arc<ServerState>, engine: EngineHandle) {
    let mut snapshots = engine.watch();
    let mut events = engine.subscribe();

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                let obs = Arc::new(build_observation(&snapshot, state.next_seq()));
                let clients = state.clients.read().await;
                for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                    let _ = c.tx.send(ClientOutbound::Observation(Arc::clone(&obs)));
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    let msg = Arc::new(build_event(&event, state.next_seq()));
                    let clients = state.clients.read().await;
                    for c in clients.iter().filter(|c| c.handshaken && c.stream_events) {
                        let _ = c.tx.send(ClientOutbound::Event(Arc::clone(&msg)));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    debug!("dispatcher stopped");
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    engine: EngineHandle,
) -> anyhow::Result<()> {
    let (reader, writer) = socket.into_split();
    let reader = BufReader::new(reader);

    let (tx, rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            handshaken: false,
            stream_observations: false,
            stream_events: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let write_task = tokio::spawn(write_loop(writer, rx));

    // Cleanup must run even when the read side fails.
    let result = read_loop(reader, client_id, &state, &engine, &tx).await;

    release_client(&state, client_id).await;

    drop(tx);
    let _ = write_task.await;

    result
}

async fn write_loop(
    mut writer: tokio::net::tcp::OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<ClientOutbound>,
) {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    while let Some(msg) = rx.recv().await {
        let encoded = match &msg {
            ClientOutbound::Welcome(m) => encode(&mut buf, m),
            ClientOutbound::Ack(m) => encode(&mut buf, m),
            ClientOutbound::Error(m) => encode(&mut buf, m),
            ClientOutbound::Observation(m) => encode(&mut buf, m.as_ref()),
            ClientOutbound::Event(m) => encode(&mut buf, m.as_ref()),
        };
        if !encoded {
            continue;
        }
        buf.push(b'\n');
        if writer.write_all(&buf).await.is_err() {
            break;
        }
        if writer.flush().await.is_err() {
            break;
        }
    }
}

fn encode<T: Serialize>(buf: &mut Vec<u8>, msg: &T) -> bool {
    buf.clear();
    serde_json::to_writer(&mut *buf, msg).is_ok()
}

async fn read_loop(
    mut reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    client_id: usize,
    state: &ServerState,
    engine: &EngineHandle,
    tx: &mpsc::UnboundedSender<ClientOutbound>,
) -> anyhow::Result<()> {
    let send_error = |seq: u64, code: ErrorCode, message: &str| {
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            // Client disconnected
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if is_handshaken(state, client_id).await
                    && !check_and_update_seq(state, client_id, hello.seq).await
                {
                    send_error(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                if !hello.protocol_version.starts_with(state.config.major_prefix()) {
                    send_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    return Ok(());
                }

                // First client to hello becomes controller.
                let (role, controller_id) = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                        client.stream_events = hello.requested.stream_events;
                    }
                    if controller.is_none() {
                        *controller = Some(client_id);
                        info!(client_id, client = %hello.client.name, "client is now controller");
                    }
                    let role = if *controller == Some(client_id) {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    };
                    (role, controller.map(|id| id as u64))
                };

                let welcome = create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                    controller_id,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                if hello.requested.stream_observations {
                    let obs = build_observation(&engine.snapshot(), state.next_seq());
                    let _ = tx.send(ClientOutbound::Observation(Arc::new(obs)));
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !is_handshaken(state, client_id).await {
                    send_error(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
                    continue;
                }

                if !check_and_update_seq(state, client_id, cmd.seq).await {
                    send_error(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                if *state.controller.read().await != Some(client_id) {
                    send_error(cmd.seq, ErrorCode::NotController, "Only controller may send commands");
                    continue;
                }

                let actions = match map_command(&cmd) {
                    Ok(actions) => actions,
                    Err(message) => {
                        send_error(cmd.seq, ErrorCode::InvalidCommand, &message);
                        continue;
                    }
                };

                // Backpressure: the whole batch must fit in the intent queue.
                if engine.capacity() < actions.len() {
                    send_error(cmd.seq, ErrorCode::Backpressure, "Intent queue is full");
                    continue;
                }

                let mut pending = ArrayVec::<oneshot::Receiver<bool>, MAX_INTENTS>::new();
                let mut refused = None;
                for action in actions {
                    match engine.try_apply(action) {
                        Ok(rx) => pending.push(rx),
                        Err(e) => {
                            refused = Some(e);
                            break;
                        }
                    }
                }

                // Ack after the engine has applied (and published) every intent.
                let mut applied = Vec::with_capacity(pending.len());
                for rx in pending {
                    applied.push(rx.await.unwrap_or(false));
                }
                debug!(client_id, seq = cmd.seq, ?applied, "command applied");

                match refused {
                    None => {
                        let _ = tx.send(ClientOutbound::Ack(create_ack(cmd.seq, applied)));
                    }
                    Some(EngineError::Backpressure) => {
                        send_error(cmd.seq, ErrorCode::Backpressure, "Intent queue is full");
                    }
                    Some(e) => return Err(e.into()),
                }
            }

            Ok(ParsedMessage::Unknown(msg)) => {
                if is_handshaken(state, client_id).await
                    && !check_and_update_seq(state, client_id, msg.seq).await
                {
                    send_error(msg.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                send_error(msg.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }

            Err(e) => {
                send_error(
                    extract_seq(trimmed),
                    ErrorCode::InvalidCommand,
                    &format!("JSON parse error: {}", e),
                );
            }
        }
    }
}

/// Remove a client and promote the next handshaken client if it was controller.
async fn release_client(state: &ServerState, client_id: usize) {
    let mut controller = state.controller.write().await;
    let mut clients = state.clients.write().await;

    let addr = clients.iter().find(|c| c.id == client_id).map(|c| c.addr);
    clients.retain(|c| c.id != client_id);
    debug!(client_id, ?addr, remaining = clients.len(), "client removed");

    if *controller == Some(client_id) {
        let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
        *controller = next_id;
        match next_id {
            Some(new_id) => info!(client_id = new_id, "controller promoted"),
            None => info!(client_id, "controller released"),
        }
    }
}

/// Map a protocol command into engine intents.
fn map_command(cmd: &CommandMessage) -> Result<ArrayVec<GameAction, MAX_INTENTS>, String> {
    if cmd.actions.0.is_empty() {
        return Err("Missing actions".to_string());
    }

    let mut actions = ArrayVec::new();
    for intent in &cmd.actions.0 {
        let action = match intent.action {
            ActionName::StartLevel => GameAction::StartLevel(
                intent
                    .level_index
                    .ok_or_else(|| "startLevel requires level_index".to_string())?,
            ),
            ActionName::SelectCell => GameAction::SelectCell(CellId(
                intent
                    .cell_id
                    .ok_or_else(|| "selectCell requires cell_id".to_string())?,
            )),
            ActionName::AddRow => GameAction::AddRow,
            ActionName::Restart => GameAction::Restart,
            ActionName::AdvanceLevel => GameAction::AdvanceLevel,
            ActionName::GoToMenu => GameAction::GoToMenu,
        };
        actions.push(action);
    }
    Ok(actions)
}
