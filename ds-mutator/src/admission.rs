use json_patch::{Patch, PatchOperation};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use kube::api::DynamicObject;
use kube::core::Status;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::affinity;
use crate::context::{Config, Context};
use crate::error::{Error, Result};
use crate::node::{self, NodeLookup};
use crate::owner;
use crate::patch::{ObserveOnly, PatchInputs, PatchPolicy};

/// Mutating admission handler for Pods owned by DaemonSets
///
/// The mutator never denies a request. Failing to resolve or look up the node
/// of a DaemonSet pod only means no patch is produced; the only errors are
/// request bodies that cannot be decoded and responses that cannot be encoded.
pub struct Mutator<L, P = ObserveOnly> {
    lookup: L,
    config: Config,
    policy: P,
}

impl<L> Mutator<L>
where
    L: NodeLookup,
{
    /// Creates a mutator using the [`ObserveOnly`] policy
    pub fn new(context: impl Into<Context<L>>) -> Self {
        let Context { lookup, config } = context.into();
        Self {
            lookup,
            config,
            policy: ObserveOnly::default(),
        }
    }
}

impl<L, P> Mutator<L, P>
where
    L: NodeLookup,
    P: PatchPolicy,
{
    /// Replaces the policy deciding which operations are patched into DaemonSet pods
    #[must_use]
    pub fn with_policy<Q>(self, policy: Q) -> Mutator<L, Q>
    where
        Q: PatchPolicy,
    {
        Mutator {
            lookup: self.lookup,
            config: self.config,
            policy,
        }
    }

    /// Handles a serialized `AdmissionReview` and returns the serialized reply
    ///
    /// A review without a request yields an empty body rather than an error.
    pub async fn mutate(&self, body: &[u8]) -> Result<Vec<u8>> {
        if self.config.verbose {
            info!(body = %String::from_utf8_lossy(body), "recv");
        }

        let value: Value = serde_json::from_slice(body).map_err(Error::DecodeReview)?;
        if value
            .as_object()
            .is_some_and(|review| review.get("request").is_none_or(Value::is_null))
        {
            debug!("admission review carries no request");
            self.trace_response(&[]);
            return Ok(Vec::new());
        }

        let review: AdmissionReview<DynamicObject> =
            serde_json::from_value(value).map_err(Error::DecodeReview)?;
        let request: AdmissionRequest<DynamicObject> = match review.try_into() {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "nothing to review");
                self.trace_response(&[]);
                return Ok(Vec::new());
            }
        };

        let response = self.review(&request).await?;
        let body = serde_json::to_vec(&response.into_review()).map_err(Error::EncodeReview)?;

        self.trace_response(&body);
        Ok(body)
    }

    /// Builds the response to an already decoded admission request
    ///
    /// The response is always allowed, echoes the request UID and carries a
    /// JSON patch, which is an empty list when nothing needs to change.
    pub async fn review(
        &self,
        request: &AdmissionRequest<DynamicObject>,
    ) -> Result<AdmissionResponse> {
        let pod = decode_pod(request)?;
        let operations = self.patch_operations(&pod).await;

        debug!(
            uid = %request.uid,
            operation = ?request.operation,
            namespace = %pod.namespace().unwrap_or_default(),
            name = %pod.name_any(),
            operations = operations.len(),
            "built pod patch"
        );

        let mut response = AdmissionResponse::from(request).with_patch(Patch(operations))?;
        response.result = Status::success();

        Ok(response)
    }

    async fn patch_operations(&self, pod: &Pod) -> Vec<PatchOperation> {
        let verbose = self.config.verbose;

        let owner_kind = owner::classify(pod);
        if verbose {
            info!(owner_kind = %owner_kind, "owner references type");
        }
        if !owner_kind.is_daemon_set() {
            return Vec::new();
        }

        let namespace = pod.namespace().unwrap_or_default();
        let name = pod.name_any();

        let node_name = match affinity::scheduled_node(pod) {
            Ok(node_name) => node_name,
            Err(err) => {
                warn!(
                    namespace = %namespace,
                    name = %name,
                    error = %err,
                    "can't find the node the pod will run on"
                );
                return Vec::new();
            }
        };

        if verbose {
            let scheduler = pod
                .spec
                .as_ref()
                .and_then(|spec| spec.scheduler_name.as_deref())
                .unwrap_or_default();
            info!(node = %node_name, scheduler, "resolved node of daemonset pod");
        }

        let labels =
            match node::inspect(&self.lookup, &node_name, self.config.lookup_timeout).await {
                Ok(labels) => labels,
                Err(err) => {
                    warn!(
                        namespace = %namespace,
                        name = %name,
                        node = %node_name,
                        error = %err,
                        "node lookup failed, skipping mutation"
                    );
                    return Vec::new();
                }
            };

        self.policy.build(&PatchInputs {
            pod,
            node_name: &node_name,
            labels: &labels,
        })
    }

    fn trace_response(&self, body: &[u8]) {
        if self.config.verbose {
            info!(body = %String::from_utf8_lossy(body), "resp");
        }
    }
}

fn decode_pod(request: &AdmissionRequest<DynamicObject>) -> Result<Pod> {
    let object = request.object.as_ref().ok_or_else(|| Error::MissingObject {
        uid: request.uid.clone(),
    })?;

    serde_json::to_value(object)
        .and_then(serde_json::from_value)
        .map_err(Error::DecodeObject)
}
