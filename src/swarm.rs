//! Fan-out/fan-in orchestration of many sessions.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::SwarmConfig;
use crate::error::Result;
use crate::session::{LifecycleRunner, SessionOutcome};
use crate::transport::{Connector, Endpoint};

/// Produces the RNG for session `i`.
pub type RngFactory = Arc<dyn Fn(usize) -> StdRng + Send + Sync>;

/// Launches `concurrency` sessions against one endpoint and waits for all
/// of them.
///
/// ```rust,ignore
/// use wsswarm::{Swarm, SwarmConfig, WsConnector};
///
/// let config = SwarmConfig::default().with_concurrency(50);
/// let connector = WsConnector::new(config.transport.clone());
/// let joined = Swarm::new(config, connector)?.run().await;
/// ```
pub struct Swarm<C> {
    config: SwarmConfig,
    runner: LifecycleRunner<C>,
    rng_factory: RngFactory,
}

impl<C: Connector> Swarm<C> {
    /// Validate `config`, parse its endpoint and prepare the runner.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidConfig` if the configuration is unusable
    /// - `Error::InvalidEndpoint` / `Error::UnsupportedScheme` for a bad URL
    pub fn new(config: SwarmConfig, connector: C) -> Result<Self> {
        config.validate()?;
        let endpoint = Endpoint::parse(&config.endpoint)?;
        let runner = LifecycleRunner::new(
            Arc::new(connector),
            Arc::new(endpoint),
            config.hold,
            config.identity_len,
        );
        let rng_factory = default_rng_factory(config.seed);

        Ok(Self {
            config,
            runner,
            rng_factory,
        })
    }

    /// Replace how per-session RNGs are created.
    #[must_use]
    pub fn with_rng_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(usize) -> StdRng + Send + Sync + 'static,
    {
        self.rng_factory = Arc::new(factory);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Run every session and return how many were joined.
    ///
    /// Returns only once all launched sessions reached a terminal state.
    /// A session whose task panicked still counts.
    pub async fn run(&self) -> usize {
        self.fan_out().await.0
    }

    /// Like [`run`](Self::run), but hands back the outcome of every session
    /// that finished without panicking, in completion order.
    pub async fn run_collect(&self) -> Vec<SessionOutcome> {
        self.fan_out().await.1
    }

    async fn fan_out(&self) -> (usize, Vec<SessionOutcome>) {
        let total = self.config.concurrency;
        info!(
            endpoint = %self.config.endpoint,
            sessions = total,
            hold_ms = self.config.hold.as_millis() as u64,
            stagger_ms = self.config.stagger.as_millis() as u64,
            "launching sessions"
        );

        let mut set = JoinSet::new();
        for i in 0..total {
            if i > 0 && !self.config.stagger.is_zero() {
                tokio::time::sleep(self.config.stagger).await;
            }
            let runner = self.runner.clone();
            let mut rng = (self.rng_factory)(i);
            set.spawn(async move { runner.run(&mut rng).await });
            debug!(session = i, "launched");
        }

        let mut joined = 0usize;
        let mut outcomes = Vec::with_capacity(total);
        while let Some(result) = set.join_next().await {
            joined += 1;
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "session task failed"),
            }
        }

        info!(sessions = joined, "all sessions complete");
        (joined, outcomes)
    }
}

fn default_rng_factory(seed: Option<u64>) -> RngFactory {
    match seed {
        Some(seed) => Arc::new(move |i| StdRng::seed_from_u64(seed.wrapping_add(i as u64))),
        None => Arc::new(|_| StdRng::from_os_rng()),
    }
}
