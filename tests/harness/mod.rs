//! Test harness for swarm integration tests.
//!
//! Provides a minimal WebSocket server that records what each client did.

mod server;

pub use server::{Event, EventRecord, Mode, MockServer};
