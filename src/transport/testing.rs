//! In-memory connector that records every transport call.

use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::error::{Error, Result};
use crate::transport::{Connector, Endpoint, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Connect,
    Send(String),
    Close,
}

/// One recorded call: which connection it belongs to, what, and when.
#[derive(Debug, Clone)]
pub(crate) struct Record {
    pub conn: usize,
    pub call: Call,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Shared {
    next_conn: usize,
    connect_attempts: usize,
    records: Vec<Record>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockConnector {
    shared: Arc<Mutex<Shared>>,
    refuse_connect: bool,
    fail_send: bool,
    fail_close: bool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }

    pub fn failing_send() -> Self {
        Self {
            fail_send: true,
            ..Self::default()
        }
    }

    pub fn failing_close() -> Self {
        Self {
            fail_close: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.shared.lock().unwrap().records.clone()
    }

    pub fn connect_attempts(&self) -> usize {
        self.shared.lock().unwrap().connect_attempts
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.records().iter().filter(|r| matches(&r.call)).count()
    }

    pub fn calls_for(&self, conn: usize) -> Vec<Record> {
        self.records().into_iter().filter(|r| r.conn == conn).collect()
    }

    fn record(&self, conn: usize, call: Call) {
        self.shared.lock().unwrap().records.push(Record {
            conn,
            call,
            at: Instant::now(),
        });
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, _endpoint: &Endpoint) -> Result<MockTransport> {
        let conn = {
            let mut shared = self.shared.lock().unwrap();
            shared.connect_attempts += 1;
            if self.refuse_connect {
                return Err(Error::Io("connection refused".into()));
            }
            shared.next_conn += 1;
            shared.next_conn - 1
        };
        self.record(conn, Call::Connect);
        Ok(MockTransport {
            conn,
            owner: self.clone(),
        })
    }
}

pub(crate) struct MockTransport {
    conn: usize,
    owner: MockConnector,
}

impl Transport for MockTransport {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        if self.owner.fail_send {
            return Err(Error::Io("broken pipe".into()));
        }
        self.owner.record(self.conn, Call::Send(text.to_string()));
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.owner.record(self.conn, Call::Close);
        if self.owner.fail_close {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }
}
