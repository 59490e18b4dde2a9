use std::time::Duration;

use kube::core::admission::SerializePatchError;
use thiserror::Error;

/// Errors that abort handling of an admission review
///
/// None of these produce a response body; the transport is expected to turn
/// them into a non-2xx reply.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body is not a valid `AdmissionReview`
    #[error("DecodeError: unmarshaling admission review failed: {0}")]
    DecodeReview(#[source] serde_json::Error),

    /// The admission request does not carry an object
    #[error("DecodeError: admission request {uid} has no object")]
    MissingObject { uid: String },

    /// The embedded object is not a valid Pod
    #[error("DecodeError: unable to unmarshal pod object: {0}")]
    DecodeObject(#[source] serde_json::Error),

    /// The accumulated patch could not be attached to the response
    #[error("EncodeError: {0}")]
    SerializePatch(#[from] SerializePatchError),

    /// The outbound `AdmissionReview` could not be serialized
    #[error("EncodeError: marshaling admission review failed: {0}")]
    EncodeReview(#[source] serde_json::Error),
}

impl Error {
    /// Whether the error was caused by malformed input rather than by this webhook
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::DecodeReview(_) | Self::MissingObject { .. } | Self::DecodeObject(_)
        )
    }
}

/// The node a pod is pinned to could not be read from its affinity
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("can't find the node for the daemonset pod")]
    NodeNotFound,
}

/// Looking up a node in cluster state failed
#[derive(Error, Debug)]
pub enum FetchError {
    /// The node does not exist
    #[error("node {0} not found")]
    NotFound(String),

    /// The lookup did not complete in time
    #[error("node lookup timed out after {0:?}")]
    Timeout(Duration),

    /// Error from the Kubernetes client
    #[error("Kube Error: {0}")]
    Kube(#[from] kube::Error),
}

/// Result type for admission handling
pub type Result<T, E = Error> = std::result::Result<T, E>;
