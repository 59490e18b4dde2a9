use std::fmt;

use k8s_openapi::api::core::v1::Pod;

/// Controller kind of a pod's first owner reference
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnerKind {
    /// The pod has no owner references
    None,
    DaemonSet,
    ReplicaSet,
    StatefulSet,
    Job,
    /// Any other owner kind, kept verbatim
    Other(String),
}

impl OwnerKind {
    pub fn is_daemon_set(&self) -> bool {
        matches!(self, Self::DaemonSet)
    }
}

impl From<&str> for OwnerKind {
    fn from(kind: &str) -> Self {
        match kind {
            "DaemonSet" => Self::DaemonSet,
            "ReplicaSet" => Self::ReplicaSet,
            "StatefulSet" => Self::StatefulSet,
            "Job" => Self::Job,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("<none>"),
            Self::DaemonSet => f.write_str("DaemonSet"),
            Self::ReplicaSet => f.write_str("ReplicaSet"),
            Self::StatefulSet => f.write_str("StatefulSet"),
            Self::Job => f.write_str("Job"),
            Self::Other(kind) => f.write_str(kind),
        }
    }
}

/// Classifies a pod by the kind of its first owner reference
///
/// Only the first reference is consulted: a pod is expected to have a single
/// controlling owner. Co-owned pods are classified by whichever owner the API
/// server lists first.
pub fn classify(pod: &Pod) -> OwnerKind {
    pod.metadata
        .owner_references
        .as_deref()
        .and_then(<[_]>::first)
        .map_or(OwnerKind::None, |owner| OwnerKind::from(owner.kind.as_str()))
}
