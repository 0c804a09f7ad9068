use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;

use number_match::adapter::protocol::{create_hello, PROTOCOL_VERSION};
use number_match::adapter::server::{run_server, ServerConfig, PORT_VAR};
use number_match::engine::{Engine, EngineConfig};

struct Client {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, msg: &Value) {
        self.send_raw(&serde_json::to_string(msg).unwrap()).await;
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timeout waiting for line")
            .expect("io error")
            .expect("expected line");
        serde_json::from_str(&line).unwrap()
    }

    /// Skip streamed messages until one of the given type arrives.
    async fn recv_type(&mut self, ty: &str) -> Value {
        loop {
            let msg = self.recv().await;
            if msg["type"] == ty {
                return msg;
            }
        }
    }
}

fn hello(seq: u64, name: &str, stream: bool) -> Value {
    let mut msg = create_hello(seq, name, PROTOCOL_VERSION);
    msg.requested.stream_observations = stream;
    msg.requested.stream_events = stream;
    serde_json::to_value(&msg).unwrap()
}

fn command(seq: u64, actions: Value) -> Value {
    json!({"type": "command", "seq": seq, "ts": 0, "actions": actions})
}

async fn start() -> (SocketAddr, Engine, JoinHandle<anyhow::Result<()>>) {
    let engine = Engine::spawn(EngineConfig::with_seed(99));
    let config = assert_ok!(ServerConfig::from_lookup(|var| {
        (var == PORT_VAR).then(|| "0".to_string())
    }));

    let (ready_tx, ready_rx) = oneshot::channel();
    let server = tokio::spawn(run_server(config, engine.handle(), Some(ready_tx)));
    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .unwrap()
        .unwrap();
    (addr, engine, server)
}

#[tokio::test]
async fn controller_plays_through_protocol() {
    let (addr, engine, server) = start().await;
    let mut client = Client::connect(addr).await;

    client.send(&hello(1, "renderer", true)).await;
    let welcome = client.recv().await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["game_id"], "number-match");
    assert_eq!(welcome["levels"].as_array().unwrap().len(), 3);

    let initial = client.recv_type("observation").await;
    assert_eq!(initial["status"], "idle");

    client
        .send(&command(2, json!([{"action": "startLevel", "level_index": 0}])))
        .await;
    let ack = client.recv_type("ack").await;
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["applied"], json!([true]));

    let obs = engine.handle().snapshot();
    assert_eq!(obs.level.name, "Easy");
    let first = obs.cells.iter().find(|c| c.value.is_some()).unwrap().id.0;

    client
        .send(&command(
            3,
            json!([
                {"action": "selectCell", "cell_id": first},
                {"action": "selectCell", "cell_id": 20},
                {"action": "addRow"}
            ]),
        ))
        .await;
    let ack = client.recv_type("ack").await;
    // Cell 20 starts empty, so only the first tap and the row are applied.
    assert_eq!(ack["applied"], json!([true, false, true]));

    let observation = loop {
        let msg = client.recv_type("observation").await;
        if msg["extra_rows_added"] == 1 {
            break msg;
        }
    };
    assert_eq!(observation["status"], "playing");
    assert_eq!(observation["selected"], first);
    assert_eq!(observation["extra_rows_remaining"], 1);
    assert_eq!(observation["remaining_cells"], 12);
    assert_eq!(observation["board"]["cells"].as_array().unwrap().len(), 20);

    server.abort();
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn protocol_errors() {
    let (addr, engine, server) = start().await;

    let mut client = Client::connect(addr).await;
    client
        .send(&command(1, json!([{"action": "addRow"}])))
        .await;
    let err = client.recv().await;
    assert_eq!(err["code"], "handshake_required");

    client.send(&hello(2, "ctrl", false)).await;
    assert_eq!(client.recv().await["type"], "welcome");

    // seq must increase
    client
        .send(&command(2, json!([{"action": "addRow"}])))
        .await;
    assert_eq!(client.recv().await["code"], "invalid_command");

    client
        .send(&command(3, json!([{"action": "jump"}])))
        .await;
    let err = client.recv().await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 3);

    client
        .send(&command(4, json!([{"action": "selectCell"}])))
        .await;
    assert_eq!(client.recv().await["code"], "invalid_command");

    client.send_raw("not json").await;
    assert_eq!(client.recv().await["code"], "invalid_command");

    client.send(&json!({"type": "control", "seq": 5, "ts": 0})).await;
    assert_eq!(client.recv().await["message"], "Unknown message type");

    let mut observer = Client::connect(addr).await;
    observer.send(&hello(1, "viewer", false)).await;
    let welcome = observer.recv().await;
    assert_eq!(welcome["role"], "observer");
    observer
        .send(&command(2, json!([{"action": "restart"}])))
        .await;
    assert_eq!(observer.recv().await["code"], "not_controller");

    let mut stale = Client::connect(addr).await;
    let mut old = hello(1, "old", false);
    old["protocol_version"] = json!("0.9.0");
    stale.send(&old).await;
    assert_eq!(stale.recv().await["code"], "protocol_mismatch");

    server.abort();
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn observer_promoted_when_controller_leaves() {
    let (addr, engine, server) = start().await;

    let mut controller = Client::connect(addr).await;
    controller.send(&hello(1, "first", false)).await;
    assert_eq!(controller.recv().await["role"], "controller");

    let mut observer = Client::connect(addr).await;
    observer.send(&hello(1, "second", false)).await;
    let welcome = observer.recv().await;
    assert_eq!(welcome["role"], "observer");
    assert_eq!(welcome["client_id"], 2);
    assert_eq!(welcome["controller_id"], 1);

    drop(controller);
    tokio::time::sleep(Duration::from_millis(100)).await;

    observer
        .send(&command(2, json!([{"action": "startLevel", "level_index": 1}])))
        .await;
    let ack = observer.recv().await;
    assert_eq!(ack["type"], "ack", "expected ack, got {ack}");
    assert_eq!(ack["applied"], json!([true]));
    assert_eq!(engine.handle().snapshot().level.name, "Medium");

    server.abort();
    engine.shutdown().await.unwrap();
}
