//! One simulated client: connect, pick a stage, act on it, always close.
//!
//! ## Session Lifecycle
//!
//! 1. Generate an identity token from the session RNG
//! 2. Connect; on failure the session ends without a stage
//! 3. Draw a [`Stage`] from the same RNG
//! 4. Stage 1 disconnects at once; stages 2 and 3 send one [`AuthMessage`]
//! 5. Stage 3 then idles for the configured hold
//! 6. The transport is closed whenever step 2 succeeded
//!
//! Every failure is contained in the returned [`SessionOutcome`]; nothing
//! escapes to the caller.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::Error;
use crate::transport::{Connector, Endpoint, Transport};

/// Message class tag the target server reads as "authentication/identity".
pub const AUTH_MESSAGE_TYPE: u8 = 16;

/// Where a session stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Stage 1: disconnect straight after connecting, no data sent.
    Immediate,
    /// Stage 2: send the auth message, then disconnect.
    AfterAuth,
    /// Stage 3: send the auth message, idle for the hold, then disconnect.
    AfterIdle,
}

impl Stage {
    /// All stages, in order.
    pub const ALL: [Stage; 3] = [Stage::Immediate, Stage::AfterAuth, Stage::AfterIdle];

    /// Stage number as used in log lines (1, 2 or 3).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Stage::Immediate => 1,
            Stage::AfterAuth => 2,
            Stage::AfterIdle => 3,
        }
    }

    /// Whether this stage sends the auth message.
    #[must_use]
    pub const fn sends_auth(self) -> bool {
        !matches!(self, Stage::Immediate)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stage {}", self.number())
    }
}

/// Draw a random alphanumeric identity of `len` characters.
pub fn generate_identity<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

/// Draw a stage uniformly from the three.
pub fn choose_stage<R: Rng>(rng: &mut R) -> Stage {
    Stage::ALL[rng.random_range(0..Stage::ALL.len())]
}

/// Body of the auth message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthPayload {
    /// The session identity.
    #[serde(rename = "Username")]
    pub username: String,
    /// Always `true`.
    #[serde(rename = "Success")]
    pub success: bool,
}

/// The one message a stage 2/3 session sends.
///
/// Serializes as
/// `{"Type":16,"ID":"<id>","Payload":{"Username":"<id>","Success":true}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthMessage {
    /// Message class, [`AUTH_MESSAGE_TYPE`].
    #[serde(rename = "Type")]
    pub kind: u8,
    /// Correlation id; the session identity.
    #[serde(rename = "ID")]
    pub id: String,
    /// Username and success flag.
    #[serde(rename = "Payload")]
    pub payload: AuthPayload,
}

impl AuthMessage {
    /// Auth message for `identity`, used as both correlation id and username.
    #[must_use]
    pub fn for_identity(identity: &str) -> Self {
        Self {
            kind: AUTH_MESSAGE_TYPE,
            id: identity.to_string(),
            payload: AuthPayload {
                username: identity.to_string(),
                success: true,
            },
        }
    }

    /// Encode as a JSON text payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encode` if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Why a session ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Target unreachable or handshake rejected.
    Connect,
    /// Writing the auth message failed.
    Send,
    /// Any other transport fault, including a failed close.
    Transport,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Connect => write!(f, "connect failure"),
            FailureKind::Send => write!(f, "send failure"),
            FailureKind::Transport => write!(f, "transport failure"),
        }
    }
}

/// A classified session failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    /// Where in the lifecycle it failed.
    pub kind: FailureKind,
    /// The underlying transport or encoding error.
    pub error: Error,
}

/// How one session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    /// The generated identity token.
    pub identity: String,
    /// The drawn stage; `None` when the connection never opened.
    pub stage: Option<Stage>,
    /// `Ok` for a clean stage-based disconnect.
    pub result: Result<(), SessionFailure>,
}

impl SessionOutcome {
    /// Whether the session reached its stage and closed without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.result.is_ok()
    }

    /// Failure classification, `None` for a clean session.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.result.as_ref().err().map(|f| f.kind)
    }
}

/// An open session: its identity, stage and the transport it alone owns.
pub struct ClientSession<T> {
    identity: String,
    stage: Stage,
    transport: T,
}

impl<T: Transport> ClientSession<T> {
    /// Wrap a freshly opened transport.
    pub fn new(identity: String, stage: Stage, transport: T) -> Self {
        Self {
            identity,
            stage,
            transport,
        }
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Perform the stage's protocol activity. Never closes the transport.
    pub async fn drive(&mut self, hold: Duration) -> Result<(), SessionFailure> {
        if !self.stage.sends_auth() {
            info!(stage = self.stage.number(), "disconnecting without sending");
            return Ok(());
        }

        let text = AuthMessage::for_identity(&self.identity)
            .to_json()
            .map_err(|error| SessionFailure {
                kind: FailureKind::Transport,
                error,
            })?;
        self.transport
            .send_text(&text)
            .await
            .map_err(|error| SessionFailure {
                kind: FailureKind::Send,
                error,
            })?;
        debug!("auth message sent");

        if self.stage == Stage::AfterIdle {
            tokio::time::sleep(hold).await;
        }
        info!(stage = self.stage.number(), "disconnecting");
        Ok(())
    }

    /// Release the transport. Consumes the session, so it runs exactly once.
    pub async fn close(self) -> Result<(), SessionFailure> {
        self.transport.close().await.map_err(|error| SessionFailure {
            kind: FailureKind::Transport,
            error,
        })
    }
}

/// Runs complete session lifecycles against one endpoint.
pub struct LifecycleRunner<C> {
    connector: Arc<C>,
    endpoint: Arc<Endpoint>,
    hold: Duration,
    identity_len: usize,
}

impl<C> Clone for LifecycleRunner<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
            endpoint: Arc::clone(&self.endpoint),
            hold: self.hold,
            identity_len: self.identity_len,
        }
    }
}

impl<C: Connector> LifecycleRunner<C> {
    pub fn new(connector: Arc<C>, endpoint: Arc<Endpoint>, hold: Duration, identity_len: usize) -> Self {
        Self {
            connector,
            endpoint,
            hold,
            identity_len,
        }
    }

    /// Run one session to completion, drawing identity and stage from `rng`.
    pub async fn run<R: Rng + Send>(&self, rng: &mut R) -> SessionOutcome {
        let identity = generate_identity(rng, self.identity_len);
        let span = info_span!("session", id = %identity);
        self.run_as(identity, rng).instrument(span).await
    }

    async fn run_as<R: Rng + Send>(&self, identity: String, rng: &mut R) -> SessionOutcome {
        let transport = match self.connector.connect(&self.endpoint).await {
            Ok(transport) => transport,
            Err(error) => {
                warn!(endpoint = %self.endpoint, error = %error, "connection failed");
                return SessionOutcome {
                    identity,
                    stage: None,
                    result: Err(SessionFailure {
                        kind: FailureKind::Connect,
                        error,
                    }),
                };
            }
        };
        info!("connection established");

        let stage = choose_stage(rng);
        let mut session = ClientSession::new(identity, stage, transport);

        let driven = session.drive(self.hold).await;
        if let Err(failure) = &driven {
            warn!(stage = stage.number(), error = %failure.error, "{}", failure.kind);
        }

        let identity = session.identity().to_string();
        let closed = session.close().await;
        match &closed {
            Ok(()) => info!("connection closed"),
            Err(failure) => warn!(error = %failure.error, "close failed"),
        }

        SessionOutcome {
            identity,
            stage: Some(stage),
            // The first failure wins; a close error only counts after a clean stage.
            result: driven.and(closed),
        }
    }
}
