//! # wsswarm - WebSocket connection-lifecycle swarm
//!
//! `wsswarm` opens many concurrent WebSocket client sessions against a target
//! server to exercise how it handles clients that disconnect at different
//! points of a connect / authenticate / idle lifecycle.
//!
//! ## Features
//!
//! - **Randomised termination**: each session stops after connecting, after
//!   authenticating, or after idling for the hold duration
//! - **Guaranteed teardown**: every opened connection is closed exactly once
//! - **Staggered fan-out** over a `JoinSet`, with a single fan-in barrier
//! - **Minimal RFC 6455 client** with masked frames and a bounded close handshake
//! - **Reproducible runs** via a per-session seeded RNG
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use wsswarm::{Swarm, SwarmConfig, WsConnector};
//!
//! let config = SwarmConfig::default().with_endpoint("ws://localhost:8888/ws");
//! let connector = WsConnector::new(config.transport.clone());
//! let joined = Swarm::new(config, connector)?.run().await;
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod swarm;
pub mod transport;

pub use config::{SwarmConfig, TransportConfig};
pub use error::{Error, Result};
pub use session::{
    AuthMessage, ClientSession, FailureKind, LifecycleRunner, SessionFailure, SessionOutcome,
    Stage, choose_stage, generate_identity,
};
pub use swarm::Swarm;
pub use transport::{Connector, Endpoint, Transport, WsConnector, WsTransport};
