//! Protocol module - JSON message types for the renderer adapter
//!
//! Line-delimited JSON. Every message carries `type`, `seq` (sequence number)
//! and `ts` (timestamp in ms).

use serde::{Deserialize, Serialize};

use arrayvec::ArrayVec;

use number_match_core::GameSnapshot;
use number_match_types::{CoreEvent, GameStatus, Level, LEVELS};

pub const PROTOCOL_VERSION: &str = "1.0.0";
pub const GAME_ID: &str = "number-match";

/// Most intents accepted in one command
pub const MAX_INTENTS: usize = 16;

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default)]
    pub stream_observations: bool,
    #[serde(default)]
    pub stream_events: bool,
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub actions: ActionList,
}

/// One intent inside a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IntentSpec {
    pub action: ActionName,
    #[serde(default)]
    pub cell_id: Option<u32>,
    #[serde(default)]
    pub level_index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    StartLevel,
    SelectCell,
    AddRow,
    Restart,
    AdvanceLevel,
    GoToMenu,
}

impl ActionName {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("startLevel") {
            Some(Self::StartLevel)
        } else if s.eq_ignore_ascii_case("selectCell") {
            Some(Self::SelectCell)
        } else if s.eq_ignore_ascii_case("addRow") {
            Some(Self::AddRow)
        } else if s.eq_ignore_ascii_case("restart") {
            Some(Self::Restart)
        } else if s.eq_ignore_ascii_case("advanceLevel") {
            Some(Self::AdvanceLevel)
        } else if s.eq_ignore_ascii_case("goToMenu") {
            Some(Self::GoToMenu)
        } else {
            None
        }
    }
}

impl<'de> Deserialize<'de> for ActionName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown action: {s}")))
    }
}

/// Fixed-capacity list of intents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionList(pub ArrayVec<IntentSpec, MAX_INTENTS>);

impl<'de> Deserialize<'de> for ActionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = ActionList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of at most {} intents", MAX_INTENTS)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::new();
                while let Some(intent) = seq.next_element::<IntentSpec>()? {
                    out.try_push(intent)
                        .map_err(|_| serde::de::Error::custom("too many actions"))?;
                }
                Ok(ActionList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "event")]
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLower {
    Idle,
    Playing,
    Won,
    Lost,
}

impl From<GameStatus> for StatusLower {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::Idle => Self::Idle,
            GameStatus::Playing => Self::Playing,
            GameStatus::Won => Self::Won,
            GameStatus::Lost => Self::Lost,
        }
    }
}

/// Static level description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelInfo {
    pub index: usize,
    pub id: u8,
    pub name: String,
    pub rows: u8,
    pub cols: u8,
    pub time_limit_secs: u32,
    pub max_extra_rows: u8,
}

impl LevelInfo {
    pub fn new(index: usize, level: &Level) -> Self {
        Self {
            index,
            id: level.id,
            name: level.name.to_string(),
            rows: level.rows,
            cols: level.cols,
            time_limit_secs: level.time_limit_secs,
            max_extra_rows: level.max_extra_rows,
        }
    }
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub levels: Vec<LevelInfo>,
}

/// Acknowledgment after a command's intents were applied.
///
/// `applied[i]` tells whether intent `i` changed the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    pub applied: Vec<bool>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellObservation {
    pub id: u32,
    pub row: u8,
    pub col: u8,
    pub value: Option<u8>,
    pub matched: bool,
    pub selected: bool,
    pub hinted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardObservation {
    pub rows: u8,
    pub cols: u8,
    pub cells: Vec<CellObservation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintObservation {
    pub first: u32,
    pub second: u32,
}

/// Session observation (sent to streaming clients on every change)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub episode_id: u32,
    pub status: StatusLower,
    pub playable: bool,
    pub win_pending: bool,
    pub level: LevelInfo,
    pub board: BoardObservation,
    pub selected: Option<u32>,
    pub hint: Option<HintObservation>,
    pub time_remaining: u32,
    pub time_display: String,
    pub extra_rows_added: u8,
    pub extra_rows_remaining: u8,
    pub remaining_cells: usize,
}

/// Transient signal (sent to clients that asked for events)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: EventType,
    pub seq: u64,
    pub ts: u64,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusLower>,
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            // An unknown message type is answered, not treated as garbage.
            #[derive(Debug, Deserialize)]
            struct Envelope {
                #[serde(rename = "type")]
                msg_type: Option<String>,
                seq: Option<u64>,
            }
            let envelope = serde_json::from_str::<Envelope>(json)?;
            match envelope.msg_type.as_deref() {
                Some("hello") | Some("command") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: envelope.seq.unwrap_or(0),
                })),
            }
        }
    }
}

/// Best-effort `seq` of a line that failed to parse
pub fn extract_seq(json: &str) -> u64 {
    serde_json::from_str::<serde_json::Value>(json)
        .ok()
        .and_then(|v| v.get("seq").and_then(|s| s.as_u64()))
        .unwrap_or(0)
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities {
            stream_observations: true,
            stream_events: true,
        },
    }
}

pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: GAME_ID.to_string(),
        levels: LEVELS
            .iter()
            .enumerate()
            .map(|(i, level)| LevelInfo::new(i, level))
            .collect(),
    }
}

pub fn create_ack(seq: u64, applied: Vec<bool>) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        applied,
    }
}

pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Build an observation from a session snapshot
pub fn build_observation(snapshot: &GameSnapshot, seq: u64) -> ObservationMessage {
    let cells = snapshot
        .cells
        .iter()
        .map(|c| CellObservation {
            id: c.id.0,
            row: c.row,
            col: c.col,
            value: c.value,
            matched: c.matched,
            selected: c.selected,
            hinted: c.hinted,
        })
        .collect();

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        episode_id: snapshot.episode_id,
        status: snapshot.status.into(),
        playable: snapshot.playable(),
        win_pending: snapshot.win_pending,
        level: LevelInfo::new(snapshot.level_index, &snapshot.level),
        board: BoardObservation {
            rows: snapshot.rows,
            cols: snapshot.cols,
            cells,
        },
        selected: snapshot.selected.map(|id| id.0),
        hint: snapshot.hint.map(|h| HintObservation {
            first: h.first.0,
            second: h.second.0,
        }),
        time_remaining: snapshot.time_remaining,
        time_display: snapshot.time_display(),
        extra_rows_added: snapshot.extra_rows_added,
        extra_rows_remaining: snapshot.extra_rows_remaining(),
        remaining_cells: snapshot.remaining_cells(),
    }
}

/// Build an event message from a core signal
pub fn build_event(event: &CoreEvent, seq: u64) -> EventMessage {
    let mut msg = EventMessage {
        msg_type: EventType::Event,
        seq,
        ts: current_timestamp_ms(),
        event: event.as_str().to_string(),
        first: None,
        second: None,
        row: None,
        status: None,
    };

    match *event {
        CoreEvent::MatchSuccess { first, second } | CoreEvent::MatchFailure { first, second } => {
            msg.first = Some(first.0);
            msg.second = Some(second.0);
        }
        CoreEvent::HintShown(pair) => {
            msg.first = Some(pair.first.0);
            msg.second = Some(pair.second.0);
        }
        CoreEvent::RowAdded { row } => msg.row = Some(row),
        CoreEvent::StatusChanged(status) => msg.status = Some(status.into()),
        CoreEvent::BoardCleared | CoreEvent::HintCleared => {}
    }

    msg
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
