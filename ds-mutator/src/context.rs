use std::time::Duration;

use kube::Client;

use crate::node::{KubeNodeLookup, NodeLookup};

/// Upper bound on a single node lookup unless configured otherwise
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime options of the mutator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Trace request and response bodies and every resolution step
    pub verbose: bool,
    /// Bound on the node lookup, `None` waits for the lookup to finish
    pub lookup_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            lookup_timeout: Some(DEFAULT_LOOKUP_TIMEOUT),
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn with_lookup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lookup_timeout = timeout;
        self
    }
}

/// Shared handler context
#[derive(Clone)]
pub struct Context<L = KubeNodeLookup>
where
    L: NodeLookup,
{
    /// Node lookup capability
    pub lookup: L,
    /// Runtime options
    pub config: Config,
}

impl<L> From<(L, Config)> for Context<L>
where
    L: NodeLookup,
{
    fn from((lookup, config): (L, Config)) -> Self {
        Self { lookup, config }
    }
}

impl From<(Client, Config)> for Context {
    fn from((client, config): (Client, Config)) -> Self {
        Self {
            lookup: KubeNodeLookup::new(client),
            config,
        }
    }
}

impl From<Client> for Context {
    fn from(client: Client) -> Self {
        (client, Config::default()).into()
    }
}
