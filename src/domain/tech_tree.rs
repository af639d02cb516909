//! Depth-bounded tech-tree preview over primary transitions.

use serde::Serialize;

use crate::domain::entities::ObjectId;
use crate::domain::graph::{ObjectGraph, ObjectRef};

/// One entry of a tech-tree preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TechTreeNode {
    /// The producing transition is a decay of this many seconds.
    Decay { decay: u32 },
    /// An input object; `nodes` is `None` when it has no recipe and an empty
    /// list when the preview was cut off below it.
    Object {
        id: ObjectId,
        nodes: Option<Vec<TechTreeNode>>,
    },
}

impl ObjectGraph {
    /// Preview of what goes into `object`, `depth` levels deep.
    ///
    /// Returns `None` for natural objects and objects without a recipe, and
    /// an empty list when `depth` is 0.
    pub fn tech_tree_nodes(&self, object: ObjectRef, depth: u32) -> Option<Vec<TechTreeNode>> {
        let transition = self.primary_transition(object)?;
        if self.object(object).is_natural() {
            return None;
        }
        if depth == 0 {
            return Some(Vec::new());
        }

        let mut nodes = Vec::new();
        if let Some(decay) = transition.decay {
            nodes.push(TechTreeNode::Decay { decay });
        }
        for input in transition.inputs() {
            nodes.push(self.tech_tree_node(input, depth - 1));
        }
        Some(nodes)
    }

    pub fn tech_tree_node(&self, object: ObjectRef, depth: u32) -> TechTreeNode {
        TechTreeNode::Object {
            id: self.id(object).clone(),
            nodes: self.tech_tree_nodes(object, depth),
        }
    }
}
