//! Adapter module - renderer control via TCP socket with JSON protocol
//!
//! The game has no built-in presentation. An external renderer connects over
//! TCP, streams observations of the session and sends player intents back.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7878)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Streaming**: Server sends an `observation` whenever the session changes
//!    and an `event` for every transient signal, if requested
//! 5. **Commanding**: Controller sends intents, server answers with `ack`
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested streams
//! - **command**: A batch of intents (`startLevel`, `selectCell`, `addRow`,
//!   `restart`, `advanceLevel`, `goToMenu`)
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with role and the level catalog
//! - **observation**: Full session snapshot (board, status, countdown, hint)
//! - **event**: Transient signal (`matchSuccess`, `hintShown`, `statusChanged`, ...)
//! - **ack**: Command applied, with a per-intent `applied` flag
//! - **error**: Error response with code and message
//!
//! # Environment Variables
//!
//! - `NUMBER_MATCH_HOST`: Bind address (default: "127.0.0.1")
//! - `NUMBER_MATCH_PORT`: Port number (default: 7878)
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"web","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1700000000000,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":1700000000001,"status":"idle",...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"actions":[{"action":"startLevel","level_index":0}]}
//! Server -> Client: {"type":"observation","seq":2,"ts":1700000000002,"status":"playing",...}
//! Server -> Client: {"type":"ack","seq":2,"ts":1700000000002,"status":"ok","applied":[true]}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7878
//! {"type":"hello","seq":1,"ts":0,"client":{"name":"test","version":"1.0.0"},"protocol_version":"1.0.0","requested":{"stream_observations":true}}
//! ```

pub mod protocol;
pub mod server;

pub use number_match_core as core;
pub use number_match_engine as engine;
pub use number_match_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use server::{run_server, ServerConfig};
