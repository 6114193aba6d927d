//! The Counter: picks the initiator, runs the wave, reports the count.
//!
//! The Counter is the driver around the protocol. It owns no node state
//! itself; it hands a topology to one of the runtimes and collects the
//! result once the wave has terminated.

use rand::seq::SliceRandom;
use rand::Rng;

use chaincount_core::{Hop, NodeId, Topology, TopologyError};
use chaincount_net::{ChainNetwork, RunConfig, RunReport};

use crate::error::Result;
use crate::local::LocalChain;

/// Which runtime hosts the nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Runtime {
    /// Single-threaded, deterministic, in-process.
    #[default]
    Local,
    /// One tokio task per node over the in-memory transport.
    Network,
}

/// Configuration for the Counter.
#[derive(Debug, Clone)]
pub struct CounterConfig {
    /// Runtime used by [`Counter::count`].
    pub runtime: Runtime,
    /// Whether reports carry the full hop trace.
    pub record_trace: bool,
    /// Hop budget for the local runtime (`None` = exactly `2 * (n - 1)`).
    pub max_hops: Option<usize>,
    /// Network runtime configuration.
    pub network: RunConfig,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            runtime: Runtime::Local,
            record_trace: true,
            max_hops: None,
            network: RunConfig::default(),
        }
    }
}

impl CounterConfig {
    /// Select the runtime.
    pub fn with_runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = runtime;
        self
    }

    /// Keep or drop the hop trace.
    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    /// Set the local hop budget.
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = Some(max_hops);
        self
    }

    /// Bound the network runtime's wave.
    pub fn with_wave_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.network.wave_timeout = timeout;
        self
    }
}

/// Outcome of one counting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountReport {
    /// Where the wave started and ended.
    pub initiator: NodeId,
    /// The number of nodes in the chain.
    pub count: u64,
    /// Delivered hops in order (empty when tracing is off).
    pub hops: Vec<Hop>,
    /// Number of messages sent.
    pub messages: usize,
}

impl From<RunReport> for CountReport {
    fn from(report: RunReport) -> Self {
        Self {
            initiator: report.initiator,
            count: report.count,
            hops: report.hops,
            messages: report.messages,
        }
    }
}

/// Driver for counting runs.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    config: CounterConfig,
}

impl Counter {
    /// Create a counter.
    pub fn new(config: CounterConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Count with the configured runtime.
    pub async fn count(&self, topology: &Topology) -> Result<CountReport> {
        match self.config.runtime {
            Runtime::Local => self.count_local(topology),
            Runtime::Network => self.count_network(topology).await,
        }
    }

    /// Count on the in-process runtime.
    pub fn count_local(&self, topology: &Topology) -> Result<CountReport> {
        let mut chain = LocalChain::new(topology).with_trace(self.config.record_trace);
        if let Some(max_hops) = self.config.max_hops {
            chain = chain.with_max_hops(max_hops);
        }
        chain.run()
    }

    /// Count on the actor-per-node runtime.
    pub async fn count_network(&self, topology: &Topology) -> Result<CountReport> {
        let config = RunConfig {
            record_trace: self.config.record_trace,
            ..self.config.network.clone()
        };
        let mut chain = ChainNetwork::spawn(topology, config).await;
        let report = chain.run().await;
        chain.shutdown().await;
        Ok(report?.into())
    }

    /// Count a chain given left to right, starting from a node chosen
    /// uniformly at random.
    pub async fn count_from_random<I, N, R>(&self, names: I, rng: &mut R) -> Result<CountReport>
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
        R: Rng + ?Sized,
    {
        let ids: Vec<NodeId> = names.into_iter().map(Into::into).collect();
        let initiator = ids.choose(rng).cloned().ok_or(TopologyError::Empty)?;
        tracing::debug!(initiator = %initiator, "picked random initiator");

        let topology = Topology::linear(ids, initiator)?;
        self.count(&topology).await
    }
}
