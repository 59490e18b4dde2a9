use std::collections::BTreeMap;

use json_patch::PatchOperation;
use k8s_openapi::api::core::v1::Pod;
use tracing::info;

/// Node label consulted by [`ObserveOnly`] unless configured otherwise
pub const DEFAULT_NODE_LABEL: &str = "visenze.component";

/// Everything known about a DaemonSet pod once its node has been inspected
#[derive(Clone, Copy, Debug)]
pub struct PatchInputs<'a> {
    pub pod: &'a Pod,
    pub node_name: &'a str,
    pub labels: &'a BTreeMap<String, String>,
}

impl PatchInputs<'_> {
    /// Value of a label on the pod's target node
    pub fn node_label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Decides how a DaemonSet pod is mutated
///
/// Returned operations are applied by the API server in order, so an operation
/// may rely on the effect of the ones before it. Every path must point into the
/// Pod being admitted.
pub trait PatchPolicy: Send + Sync {
    fn build(&self, inputs: &PatchInputs<'_>) -> Vec<PatchOperation>;
}

impl<F> PatchPolicy for F
where
    F: Fn(&PatchInputs<'_>) -> Vec<PatchOperation> + Send + Sync,
{
    fn build(&self, inputs: &PatchInputs<'_>) -> Vec<PatchOperation> {
        self(inputs)
    }
}

/// Default policy: reports the recognized node label and never patches
#[derive(Clone, Debug)]
pub struct ObserveOnly {
    label_key: String,
}

impl ObserveOnly {
    pub fn new(label_key: impl Into<String>) -> Self {
        Self {
            label_key: label_key.into(),
        }
    }

    pub fn label_key(&self) -> &str {
        &self.label_key
    }
}

impl Default for ObserveOnly {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_LABEL)
    }
}

impl PatchPolicy for ObserveOnly {
    fn build(&self, inputs: &PatchInputs<'_>) -> Vec<PatchOperation> {
        if let Some(value) = inputs.node_label(&self.label_key) {
            info!(
                node = inputs.node_name,
                label = %self.label_key,
                value,
                "found the label"
            );
        }

        Vec::new()
    }
}
