//! Stage nodes: the declarative shape of a pipeline.

use super::Guard;
use crate::action::{ExternalAction, PollPolicy};
use crate::core::StageKind;
use std::sync::Arc;

/// What a stage node contains.
#[derive(Debug, Clone)]
pub enum NodeBody {
    /// One external action, optionally polled and with a compensating
    /// cleanup action.
    Leaf(LeafSpec),
    /// Children executed one at a time, in declared order.
    Sequential(Vec<StageNode>),
    /// Children executed concurrently behind a join barrier. Children must
    /// be mutually independent; nothing may rely on a sibling's output.
    Parallel(Vec<StageNode>),
}

/// Configuration for a leaf stage.
#[derive(Debug, Clone)]
pub struct LeafSpec {
    /// The external action to invoke.
    pub action: Arc<dyn ExternalAction>,
    /// When set, the action runs under a bounded poll loop.
    pub poll: Option<PollPolicy>,
    /// A compensating action that runs whenever the main action was
    /// started, on every outcome including cancellation. Used by leaves
    /// with externally visible side effects (e.g., a test container that
    /// must not be left running).
    pub cleanup: Option<Arc<dyn ExternalAction>>,
}

/// One node in the pipeline's execution tree.
#[derive(Debug, Clone)]
pub struct StageNode {
    /// Name, unique among siblings.
    pub name: String,
    /// Optional precondition; false skips the node and its whole subtree.
    pub guard: Option<Guard>,
    /// Whether a failure here is fatal to ancestors. Non-blocking nodes
    /// record failures without propagating them.
    pub blocking: bool,
    /// The node's content.
    pub body: NodeBody,
}

impl StageNode {
    /// Creates a leaf node wrapping one action. Blocking by default.
    #[must_use]
    pub fn leaf(name: impl Into<String>, action: Arc<dyn ExternalAction>) -> Self {
        Self {
            name: name.into(),
            guard: None,
            blocking: true,
            body: NodeBody::Leaf(LeafSpec {
                action,
                poll: None,
                cleanup: None,
            }),
        }
    }

    /// Creates a sequential node.
    #[must_use]
    pub fn sequential(name: impl Into<String>, children: Vec<StageNode>) -> Self {
        Self {
            name: name.into(),
            guard: None,
            blocking: true,
            body: NodeBody::Sequential(children),
        }
    }

    /// Creates a parallel node.
    #[must_use]
    pub fn parallel(name: impl Into<String>, children: Vec<StageNode>) -> Self {
        Self {
            name: name.into(),
            guard: None,
            blocking: true,
            body: NodeBody::Parallel(children),
        }
    }

    /// Marks the node advisory: its failure is recorded, never fatal.
    #[must_use]
    pub fn advisory(mut self) -> Self {
        self.blocking = false;
        self
    }

    /// Attaches a guard.
    #[must_use]
    pub fn guarded(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Attaches a poll policy. Only meaningful on leaves; validation
    /// rejects it elsewhere.
    #[must_use]
    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        if let NodeBody::Leaf(spec) = &mut self.body {
            spec.poll = Some(poll);
        }
        self
    }

    /// Attaches a compensating cleanup action to a leaf.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: Arc<dyn ExternalAction>) -> Self {
        if let NodeBody::Leaf(spec) = &mut self.body {
            spec.cleanup = Some(cleanup);
        }
        self
    }

    /// Returns the node's kind.
    #[must_use]
    pub fn kind(&self) -> StageKind {
        match &self.body {
            NodeBody::Leaf(_) => StageKind::Leaf,
            NodeBody::Sequential(_) => StageKind::Sequential,
            NodeBody::Parallel(_) => StageKind::Parallel,
        }
    }

    /// Returns the node's children, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[StageNode] {
        match &self.body {
            NodeBody::Leaf(_) => &[],
            NodeBody::Sequential(children) | NodeBody::Parallel(children) => children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::NoOpAction;
    use std::time::Duration;

    fn noop(name: &str) -> Arc<dyn ExternalAction> {
        Arc::new(NoOpAction::new(name))
    }

    #[test]
    fn test_leaf_defaults_blocking() {
        let node = StageNode::leaf("build", noop("build"));
        assert!(node.blocking);
        assert_eq!(node.kind(), StageKind::Leaf);
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_advisory_clears_blocking() {
        let node = StageNode::leaf("lint", noop("lint")).advisory();
        assert!(!node.blocking);
    }

    #[test]
    fn test_composite_kinds() {
        let seq = StageNode::sequential("all", vec![StageNode::leaf("a", noop("a"))]);
        let par = StageNode::parallel("checks", vec![StageNode::leaf("b", noop("b"))]);

        assert_eq!(seq.kind(), StageKind::Sequential);
        assert_eq!(par.kind(), StageKind::Parallel);
        assert_eq!(seq.children().len(), 1);
    }

    #[test]
    fn test_with_poll_on_leaf() {
        let node = StageNode::leaf("smoke", noop("smoke"))
            .with_poll(PollPolicy::new(15, Duration::from_secs(2)));

        match &node.body {
            NodeBody::Leaf(spec) => {
                assert_eq!(spec.poll.unwrap().max_attempts, 15);
            }
            _ => panic!("expected leaf"),
        }
    }

    #[test]
    fn test_with_poll_ignored_on_composite() {
        let node = StageNode::sequential("all", vec![StageNode::leaf("a", noop("a"))])
            .with_poll(PollPolicy::new(3, Duration::from_secs(1)));
        // Composite bodies have no poll slot; validation also rejects this
        // shape if a caller builds it by hand.
        assert_eq!(node.kind(), StageKind::Sequential);
    }
}
