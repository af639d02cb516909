//! Recipe node: one object reached while deriving a recipe.

use std::cell::RefCell;
use std::rc::Rc;

use generational_arena::Index;

use crate::domain::graph::ObjectRef;

/// Handle of a node in a [`RecipeTree`](super::RecipeTree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub(crate) Index);

/// One-shot expansion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expansion {
    #[default]
    Unexpanded,
    Expanded,
}

/// Tools known to be available during one recipe computation.
///
/// Cloning the handle shares the set: a node and every node spawned from it
/// see the same tools, so a tool found in one branch is visible to siblings.
#[derive(Debug, Clone, Default)]
pub struct AvailableTools(Rc<RefCell<Vec<ObjectRef>>>);

impl AvailableTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, object: ObjectRef) -> bool {
        self.0.borrow().contains(&object)
    }

    /// Register a tool; returns false when it was already known.
    pub fn insert(&self, object: ObjectRef) -> bool {
        let mut tools = self.0.borrow_mut();
        if tools.contains(&object) {
            return false;
        }
        tools.push(object);
        true
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Tools in discovery order.
    pub fn to_vec(&self) -> Vec<ObjectRef> {
        self.0.borrow().clone()
    }

    /// Both handles point at the same set.
    pub fn shares_with(&self, other: &AvailableTools) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A node of the recipe DAG.
///
/// Nodes only know their parents; the tree arena answers questions that need
/// the rest of the structure.
#[derive(Debug)]
pub struct RecipeNode {
    object: ObjectRef,
    available_tools: AvailableTools,
    parents: Vec<NodeRef>,
    expansion: Expansion,
}

impl RecipeNode {
    /// A root node (no parents).
    pub fn new(object: ObjectRef, available_tools: AvailableTools) -> Self {
        Self {
            object,
            available_tools,
            parents: Vec::new(),
            expansion: Expansion::Unexpanded,
        }
    }

    /// A node spawned while expanding `parent`.
    pub fn with_parent(object: ObjectRef, parent: NodeRef, available_tools: AvailableTools) -> Self {
        Self {
            object,
            available_tools,
            parents: vec![parent],
            expansion: Expansion::Unexpanded,
        }
    }

    pub fn object(&self) -> ObjectRef {
        self.object
    }

    pub fn available_tools(&self) -> &AvailableTools {
        &self.available_tools
    }

    pub fn parents(&self) -> &[NodeRef] {
        &self.parents
    }

    pub fn expansion(&self) -> Expansion {
        self.expansion
    }

    /// Move to `Expanded`; returns false if the node was already expanded.
    pub fn mark_expanded(&mut self) -> bool {
        match self.expansion {
            Expansion::Unexpanded => {
                self.expansion = Expansion::Expanded;
                true
            }
            Expansion::Expanded => false,
        }
    }

    /// Take over the parents of another node reaching the same object.
    pub fn merge(&mut self, other: &RecipeNode) {
        self.parents.extend_from_slice(&other.parents);
    }
}
