//! Admission core of a mutating webhook for DaemonSet pods
//!
//! Takes the raw body of an `AdmissionReview` for a Pod and returns the raw
//! body of the reply. Pods owned by a DaemonSet are traced back to the node
//! they are pinned to through their required node affinity, that node's labels
//! are inspected and a [`PatchPolicy`] decides which JSON patch operations to
//! return. The default policy, [`ObserveOnly`], never patches.
//!
//! Transport, TLS and process wiring are left to the caller:
//!
//! ```no_run
//! # async fn run(body: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! use ds_mutator::{Config, KubeNodeLookup, Mutator};
//!
//! let client = kube::Client::try_default().await?;
//! let lookup = KubeNodeLookup::new(client);
//! let mutator = Mutator::new((lookup, Config::default().with_verbose(true)));
//!
//! let reply = mutator.mutate(body).await?;
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod affinity;
pub mod context;
pub mod error;
pub mod node;
pub mod owner;
pub mod patch;

pub use admission::Mutator;
pub use context::{Config, Context};
pub use error::{Error, FetchError, ResolveError, Result};
pub use node::{KubeNodeLookup, NodeLookup};
pub use owner::OwnerKind;
pub use patch::{ObserveOnly, PatchInputs, PatchPolicy};
