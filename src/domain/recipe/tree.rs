//! Computation-scoped arena of recipe nodes.
//!
//! One `RecipeTree` holds the nodes of exactly one recipe computation. The
//! object graph is only borrowed, so independent computations over the same
//! graph each use their own tree.

use std::collections::HashSet;

use generational_arena::Arena;
use serde::Serialize;
use tracing::{instrument, trace};

use crate::domain::entities::{ObjectId, Transition};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::graph::{ObjectGraph, ObjectRef};
use crate::domain::recipe::node::{AvailableTools, NodeRef, RecipeNode};

/// Step data of one node, as shown in a rendered recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeStep {
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(rename = "actorID", skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ObjectId>,
    #[serde(rename = "targetID", skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hand: bool,
}

#[derive(Debug)]
pub struct RecipeTree<'g> {
    graph: &'g ObjectGraph,
    arena: Arena<RecipeNode>,
    /// Live nodes in insertion order
    order: Vec<NodeRef>,
    tool_search_hops: usize,
}

impl<'g> RecipeTree<'g> {
    pub fn new(graph: &'g ObjectGraph, tool_search_hops: usize) -> Self {
        Self {
            graph,
            arena: Arena::new(),
            order: Vec::new(),
            tool_search_hops,
        }
    }

    pub fn graph(&self) -> &'g ObjectGraph {
        self.graph
    }

    /// Add a root node with a fresh tool set.
    pub fn insert_root(&mut self, object: ObjectRef) -> NodeRef {
        self.insert_node(RecipeNode::new(object, AvailableTools::new()))
    }

    pub fn insert_node(&mut self, node: RecipeNode) -> NodeRef {
        let node_ref = NodeRef(self.arena.insert(node));
        self.order.push(node_ref);
        node_ref
    }

    pub fn node(&self, node: NodeRef) -> Option<&RecipeNode> {
        self.arena.get(node.0)
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> &[NodeRef] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Nodes listing `node` among their parents, in insertion order.
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.order
            .iter()
            .copied()
            .filter(|n| self.parents(*n).contains(&node))
            .collect()
    }

    /// Expand a node into nodes for the inputs of its primary transition.
    ///
    /// Runs at most once per node; later calls return nothing. Tools and
    /// ingredients are leaves.
    #[instrument(level = "trace", skip(self))]
    pub fn generate_nodes(&mut self, node: NodeRef) -> Vec<NodeRef> {
        let graph = self.graph;
        let Some(current) = self.arena.get_mut(node.0) else {
            return Vec::new();
        };
        if !current.mark_expanded() {
            return Vec::new();
        }
        if self.is_tool(node) || self.is_ingredient(node) {
            return Vec::new();
        }

        let Some(current) = self.node(node) else {
            return Vec::new();
        };
        let object = current.object();
        let tools = current.available_tools().clone();
        let Some(transition) = graph.primary_transition(object) else {
            return Vec::new();
        };

        self.discover_tools(object, transition, &tools);

        transition
            .inputs()
            .collect::<Vec<_>>()
            .into_iter()
            .map(|input| self.insert_node(RecipeNode::with_parent(input, node, tools.clone())))
            .collect()
    }

    /// Merge `duplicate` into `existing` and drop it from the tree.
    ///
    /// Fails when `existing` is already an ancestor of one of the new
    /// parents: the object would then be needed to make itself.
    pub fn merge(&mut self, existing: NodeRef, duplicate: NodeRef) -> DomainResult<()> {
        let Some(other) = self.arena.get(duplicate.0) else {
            return Ok(());
        };
        if let Some(parent) = other
            .parents()
            .iter()
            .find(|p| self.is_ancestor(existing, **p))
        {
            trace!(?parent, "merge would close a cycle");
            let object = self.node(existing).map(RecipeNode::object);
            return Err(DomainError::RecipeCycle(
                object.map_or_else(|| ObjectId::new("?"), |o| self.graph.id(o).clone()),
            ));
        }

        let Some(other) = self.arena.remove(duplicate.0) else {
            return Ok(());
        };
        self.order.retain(|n| *n != duplicate);
        if let Some(node) = self.arena.get_mut(existing.0) {
            node.merge(&other);
        }
        Ok(())
    }

    /// `candidate` is `node` itself or reachable from it through parents.
    pub fn is_ancestor(&self, candidate: NodeRef, node: NodeRef) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if current == candidate {
                return true;
            }
            if visited.insert(current) {
                stack.extend_from_slice(self.parents(current));
            }
        }
        false
    }

    /// Already owned: the object is a known tool, or it is only needed to
    /// make a tool.
    pub fn is_tool(&self, node: NodeRef) -> bool {
        let Some(current) = self.node(node) else {
            return false;
        };
        self.parent_is_tool(node) || current.available_tools().contains(current.object())
    }

    pub fn parent_is_tool(&self, node: NodeRef) -> bool {
        self.parents(node).iter().any(|p| self.is_tool(*p))
    }

    /// A base resource, gathered rather than crafted.
    pub fn is_ingredient(&self, node: NodeRef) -> bool {
        let Some(current) = self.node(node) else {
            return false;
        };
        let depth = self.graph.object(current.object()).depth;
        !self.is_tool(node) && (!depth.has_value() || depth.difficulty() == Some(0.0))
    }

    /// Shown as a numbered step in a rendered recipe.
    pub fn show_in_step(&self, node: NodeRef) -> bool {
        !self.is_tool(node) && !self.is_ingredient(node)
    }

    /// 0 for a root, otherwise one more than the deepest parent.
    pub fn depth(&self, node: NodeRef) -> usize {
        self.parents(node)
            .iter()
            .map(|p| self.depth(*p))
            .max()
            .map_or(0, |d| d + 1)
    }

    /// How many of this object the recipe needs.
    ///
    /// Tools are reused and count once; anything else is needed once per
    /// use by each parent.
    pub fn count(&self, node: NodeRef) -> usize {
        if self.is_tool(node) {
            return 1;
        }
        let parents = self.parents(node);
        if parents.is_empty() {
            return 1;
        }
        parents.iter().map(|p| self.count(*p)).sum()
    }

    pub fn json_data(&self, node: NodeRef) -> Option<RecipeStep> {
        let object = self.node(node)?.object();
        let count = self.count(node);
        let transition = self.graph.primary_transition(object);
        let id_of = |o: Option<ObjectRef>| o.map(|o| self.graph.id(o).clone());

        Some(RecipeStep {
            id: self.graph.id(object).clone(),
            count: (count > 1).then_some(count),
            actor_id: transition.and_then(|t| id_of(t.actor)),
            target_id: transition.and_then(|t| id_of(t.target)),
            decay: transition.and_then(|t| t.decay),
            hand: transition.is_some_and(|t| t.hand),
        })
    }

    fn parents(&self, node: NodeRef) -> &[NodeRef] {
        self.node(node).map(RecipeNode::parents).unwrap_or_default()
    }

    /// Register the by-products of `transition` (and of trivial transitions
    /// reachable from them) that are easier than `object` as tools.
    fn discover_tools(&self, object: ObjectRef, transition: &Transition, tools: &AvailableTools) {
        self.add_available_tool(object, transition.new_actor, 0, tools);
        self.add_available_tool(object, transition.new_target, 0, tools);
    }

    fn add_available_tool(
        &self,
        object: ObjectRef,
        candidate: Option<ObjectRef>,
        hops: usize,
        tools: &AvailableTools,
    ) {
        let Some(candidate) = candidate else {
            return;
        };
        let found = self.graph.object(candidate);
        if candidate == object || found.is_natural() || tools.contains(candidate) {
            return;
        }

        if found.depth.compare(&self.graph.object(object).depth).is_lt() {
            trace!(tool = %found.id, hops, "available tool");
            tools.insert(candidate);
        }

        if hops > self.tool_search_hops {
            return;
        }

        for away in &found.transitions_away {
            let away = self.graph.transition(*away);
            if away.is_trivial() {
                self.add_available_tool(object, away.new_actor, hops + 1, tools);
                self.add_available_tool(object, away.new_target, hops + 1, tools);
            }
        }
    }
}
