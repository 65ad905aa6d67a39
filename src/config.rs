//! Configuration for the swarm and its client transport.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default target endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8888/ws";

/// Default number of concurrent sessions.
pub const DEFAULT_CONCURRENCY: usize = 500;

/// Default length of the generated session identity.
pub const DEFAULT_IDENTITY_LEN: usize = 8;

/// Transport-level settings for each client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Maximum size of the server's handshake response in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,

    /// How long `close` waits for the server's close frame before
    /// shutting the socket down anyway.
    ///
    /// Default: 3 seconds
    pub close_timeout: Duration,

    /// Read buffer size (in bytes).
    ///
    /// Default: 4 KB (4096)
    pub read_buffer_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_handshake_size: 8192,
            close_timeout: Duration::from_secs(3),
            read_buffer_size: 4096,
        }
    }
}

impl TransportConfig {
    /// Set the handshake size limit.
    #[must_use]
    pub const fn with_max_handshake_size(mut self, size: usize) -> Self {
        self.max_handshake_size = size;
        self
    }

    /// Set the close-reply wait.
    #[must_use]
    pub const fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Validate that `size` bytes of handshake response are within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`] if `size` exceeds the configured maximum.
    pub const fn check_handshake_size(&self, size: usize) -> Result<()> {
        if size > self.max_handshake_size {
            Err(Error::HandshakeTooLarge {
                size,
                max: self.max_handshake_size,
            })
        } else {
            Ok(())
        }
    }
}

/// Immutable swarm configuration, handed to [`Swarm::new`](crate::Swarm::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwarmConfig {
    /// Target WebSocket URL (`ws://host[:port]/path`).
    pub endpoint: String,

    /// Number of sessions to launch.
    ///
    /// Default: 500
    pub concurrency: usize,

    /// How long a stage-3 session idles before disconnecting.
    ///
    /// Default: 500 ms
    pub hold: Duration,

    /// Pause between successive session launches.
    ///
    /// Default: 10 ms
    pub stagger: Duration,

    /// Length of the generated identity token.
    ///
    /// Default: 8
    pub identity_len: usize,

    /// Base seed for per-session RNGs. `None` seeds every session from the OS.
    pub seed: Option<u64>,

    /// Transport settings shared by every session.
    pub transport: TransportConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            hold: Duration::from_millis(500),
            stagger: Duration::from_millis(10),
            identity_len: DEFAULT_IDENTITY_LEN,
            seed: None,
            transport: TransportConfig::default(),
        }
    }
}

impl SwarmConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the number of sessions.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the stage-3 hold duration.
    #[must_use]
    pub const fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    /// Set the launch stagger.
    #[must_use]
    pub const fn with_stagger(mut self, stagger: Duration) -> Self {
        self.stagger = stagger;
        self
    }

    /// Set the identity token length.
    #[must_use]
    pub const fn with_identity_len(mut self, len: usize) -> Self {
        self.identity_len = len;
        self
    }

    /// Seed every session RNG deterministically from `seed`.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set transport settings.
    #[must_use]
    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Check values that would make every session fail before it starts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero identity length or a zero
    /// handshake size limit.
    pub fn validate(&self) -> Result<()> {
        if self.identity_len == 0 {
            return Err(Error::InvalidConfig(
                "identity length must be at least 1".into(),
            ));
        }
        if self.transport.max_handshake_size == 0 {
            return Err(Error::InvalidConfig(
                "handshake size limit must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
