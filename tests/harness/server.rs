//! Recording WebSocket server.
//!
//! Accepts (or rejects) upgrades on a random local port and logs every
//! opened connection, text message and close frame with a timestamp.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use wsswarm::protocol::handshake::find_header_end;
use wsswarm::protocol::{CLOSE_NORMAL, Frame, OpCode, compute_accept_key};

/// How the server answers upgrade requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Accept,
    /// Answer every upgrade with `403 Forbidden`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened,
    Text(String),
    Close(Option<u16>),
}

#[derive(Debug, Clone)]
pub struct EventRecord {
    pub conn: usize,
    pub event: Event,
    pub at: Instant,
}

#[derive(Default)]
struct State {
    attempts: usize,
    events: Vec<EventRecord>,
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn spawn(mode: Mode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State::default()));

        let shared = state.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let conn = {
                    let mut state = shared.lock().unwrap();
                    state.attempts += 1;
                    state.attempts - 1
                };
                let shared = shared.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, conn, mode, shared).await;
                });
            }
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Number of TCP connections accepted, whether upgraded or not.
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn events_for(&self, conn: usize) -> Vec<EventRecord> {
        self.events().into_iter().filter(|r| r.conn == conn).collect()
    }

    /// Connection ids that completed the upgrade.
    pub fn opened(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter(|r| r.event == Event::Opened)
            .map(|r| r.conn)
            .collect()
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    conn: usize,
    mode: Mode,
    state: Arc<Mutex<State>>,
) -> std::io::Result<()> {
    let record = |event: Event| {
        state.lock().unwrap().events.push(EventRecord {
            conn,
            event,
            at: Instant::now(),
        });
    };

    let mut buf = BytesMut::with_capacity(4096);
    let end = loop {
        if let Some(end) = find_header_end(&buf) {
            break end;
        }
        if stream.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
    };
    let head = String::from_utf8_lossy(&buf.split_to(end)).into_owned();

    if mode == Mode::Reject {
        stream
            .write_all(b"HTTP/1.1 403 Forbidden\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await?;
        return stream.shutdown().await;
    }

    let key = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("sec-websocket-key")
                .then(|| value.trim().to_string())
        })
        .unwrap_or_default();
    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Accept: {}\r\n\r\n",
        compute_accept_key(&key)
    );
    stream.write_all(response.as_bytes()).await?;
    record(Event::Opened);

    loop {
        match Frame::parse(&buf[..]) {
            Ok((frame, consumed)) => {
                buf.advance(consumed);
                match frame.opcode {
                    OpCode::Text => {
                        let text = String::from_utf8_lossy(frame.payload()).into_owned();
                        record(Event::Text(text));
                    }
                    OpCode::Close => {
                        record(Event::Close(frame.close_code()));
                        let mut reply = BytesMut::new();
                        Frame::close(Some(CLOSE_NORMAL), "").encode(&mut reply, None);
                        stream.write_all(&reply).await?;
                        return stream.shutdown().await;
                    }
                    _ => {}
                }
                continue;
            }
            Err(wsswarm::Error::IncompleteFrame { .. }) => {}
            Err(_) => return Ok(()),
        }
        if stream.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }
    }
}
