use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::{Api, Client};

use crate::error::FetchError;

/// Read-only access to nodes in cluster state
#[async_trait]
pub trait NodeLookup: Send + Sync {
    /// Fetches a single node by name
    async fn get(&self, name: &str) -> Result<Node, FetchError>;
}

#[async_trait]
impl<L> NodeLookup for Arc<L>
where
    L: NodeLookup + ?Sized,
{
    async fn get(&self, name: &str) -> Result<Node, FetchError> {
        (**self).get(name).await
    }
}

/// [`NodeLookup`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeNodeLookup {
    api: Api<Node>,
}

impl KubeNodeLookup {
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

impl From<Client> for KubeNodeLookup {
    fn from(client: Client) -> Self {
        Self::new(client)
    }
}

#[async_trait]
impl NodeLookup for KubeNodeLookup {
    async fn get(&self, name: &str) -> Result<Node, FetchError> {
        self.api
            .get_opt(name)
            .await?
            .ok_or_else(|| FetchError::NotFound(name.to_owned()))
    }
}

/// Looks up a node and returns its labels
///
/// The lookup is bounded by `timeout` when one is given and is never retried.
pub async fn inspect<L>(
    lookup: &L,
    name: &str,
    timeout: Option<Duration>,
) -> Result<BTreeMap<String, String>, FetchError>
where
    L: NodeLookup + ?Sized,
{
    let node = match timeout {
        Some(limit) => tokio::time::timeout(limit, lookup.get(name))
            .await
            .map_err(|_| FetchError::Timeout(limit))??,
        None => lookup.get(name).await?,
    };

    Ok(node.metadata.labels.unwrap_or_default())
}
