//! Graph validation: malformed trees are rejected before anything runs.

use super::{NodeBody, StageNode};
use crate::errors::GraphConstructionError;
use std::collections::HashSet;

/// A stage tree that passed construction-time validation.
///
/// Nodes own their children by value, so cyclic graphs are unrepresentable;
/// what validation catches is the rest of the malformed-graph space:
/// duplicate sibling names, empty composites, empty names and poll policies
/// that can never succeed. All of it surfaces here, never mid-run.
#[derive(Debug, Clone)]
pub struct StageGraph {
    root: StageNode,
}

impl StageGraph {
    /// Validates `root` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphConstructionError`] found walking the tree.
    pub fn new(root: StageNode) -> Result<Self, GraphConstructionError> {
        validate_node(&root)?;
        Ok(Self { root })
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> &StageNode {
        &self.root
    }

    /// Returns the total number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        count_nodes(&self.root)
    }
}

fn count_nodes(node: &StageNode) -> usize {
    1 + node.children().iter().map(count_nodes).sum::<usize>()
}

fn validate_node(node: &StageNode) -> Result<(), GraphConstructionError> {
    if node.name.trim().is_empty() {
        return Err(GraphConstructionError::EmptyName);
    }

    match &node.body {
        NodeBody::Leaf(spec) => {
            if let Some(poll) = &spec.poll {
                if poll.max_attempts == 0 {
                    return Err(GraphConstructionError::InvalidPollPolicy {
                        name: node.name.clone(),
                        reason: "max_attempts must be >= 1".to_string(),
                    });
                }
            }
        }
        NodeBody::Sequential(children) | NodeBody::Parallel(children) => {
            if children.is_empty() {
                return Err(GraphConstructionError::EmptyComposite {
                    name: node.name.clone(),
                    kind: node.kind().to_string(),
                });
            }

            let mut seen = HashSet::new();
            for child in children {
                if !seen.insert(child.name.as_str()) {
                    return Err(GraphConstructionError::DuplicateSiblingName {
                        parent: node.name.clone(),
                        name: child.name.clone(),
                    });
                }
                validate_node(child)?;
            }
        }
    }

    Ok(())
}
