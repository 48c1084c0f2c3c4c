//! The standard delivery pipeline shape.
//!
//! A prebuilt graph for the common build-validate-publish flow: build the
//! image, fan out the validation checks behind a join barrier, then publish
//! only on the release branch. Callers supply the actions; policy knobs
//! control which checks gate the run.

use crate::action::{ExternalAction, PollPolicy};
use crate::errors::GraphConstructionError;
use crate::graph::{Guard, StageGraph, StageNode};
use std::sync::Arc;
use std::time::Duration;

/// Policy knobs for the delivery graph.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Branch on which publish stages run.
    pub release_branch: String,
    /// Whether a failed registry push fails the run.
    pub push_blocking: bool,
    /// Poll attempts for the smoke check against the started service.
    pub smoke_max_attempts: u32,
    /// Interval between smoke poll attempts.
    pub smoke_interval: Duration,
    /// Whether static analysis findings fail the run.
    pub sast_blocking: bool,
    /// Whether leaked-secret findings fail the run.
    pub secret_scan_blocking: bool,
    /// Whether lint findings fail the run.
    pub lint_blocking: bool,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            release_branch: "main".to_string(),
            push_blocking: true,
            smoke_max_attempts: 15,
            smoke_interval: Duration::from_secs(2),
            sast_blocking: false,
            secret_scan_blocking: false,
            lint_blocking: false,
        }
    }
}

/// The actions a delivery pipeline invokes, one per leaf stage.
#[derive(Debug, Clone)]
pub struct DeliveryActions {
    /// Builds the image.
    pub build: Arc<dyn ExternalAction>,
    /// Runs the unit test suite.
    pub tests: Arc<dyn ExternalAction>,
    /// Static analysis of the source tree.
    pub sast: Arc<dyn ExternalAction>,
    /// Scans the tree for leaked credentials.
    pub secret_scan: Arc<dyn ExternalAction>,
    /// Style and lint checks.
    pub lint: Arc<dyn ExternalAction>,
    /// Probes the started service until it answers; polled.
    pub smoke: Arc<dyn ExternalAction>,
    /// Tears the smoke-test service down; runs on every outcome.
    pub smoke_teardown: Arc<dyn ExternalAction>,
    /// Scans the built image for known vulnerabilities.
    pub vuln_scan: Arc<dyn ExternalAction>,
    /// Pushes the image to the registry.
    pub push: Arc<dyn ExternalAction>,
    /// Updates deployment manifests to the new tag.
    pub propagate: Arc<dyn ExternalAction>,
}

fn apply_blocking(node: StageNode, blocking: bool) -> StageNode {
    if blocking {
        node
    } else {
        node.advisory()
    }
}

/// Builds the standard delivery graph from actions and policy.
///
/// Shape: `build` then a parallel `validate` fan-out (tests, sast,
/// secret-scan, lint, smoke, vuln-scan), then `push` and `propagate`, both
/// gated to the release branch.
///
/// # Errors
///
/// Returns an error if the policy produces an invalid graph, e.g. zero
/// smoke attempts.
pub fn delivery_graph(
    actions: DeliveryActions,
    policy: &DeliveryPolicy,
) -> Result<StageGraph, GraphConstructionError> {
    let release_guard = Guard::branch_equals(policy.release_branch.clone());

    let validate = StageNode::parallel(
        "validate",
        vec![
            StageNode::leaf("tests", actions.tests),
            apply_blocking(StageNode::leaf("sast", actions.sast), policy.sast_blocking),
            apply_blocking(
                StageNode::leaf("secret-scan", actions.secret_scan),
                policy.secret_scan_blocking,
            ),
            apply_blocking(StageNode::leaf("lint", actions.lint), policy.lint_blocking),
            StageNode::leaf("smoke", actions.smoke)
                .with_poll(PollPolicy::new(
                    policy.smoke_max_attempts,
                    policy.smoke_interval,
                ))
                .with_cleanup(actions.smoke_teardown),
            StageNode::leaf("vuln-scan", actions.vuln_scan),
        ],
    );

    let root = StageNode::sequential(
        "delivery",
        vec![
            StageNode::leaf("build", actions.build),
            validate,
            apply_blocking(
                StageNode::leaf("push", actions.push).guarded(release_guard.clone()),
                policy.push_blocking,
            ),
            StageNode::leaf("propagate", actions.propagate).guarded(release_guard),
        ],
    );

    StageGraph::new(root)
}
