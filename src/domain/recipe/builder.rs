//! Breadth-first recipe derivation.

use std::collections::{BTreeMap, HashMap, VecDeque};

use itertools::Itertools;
use serde::Serialize;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::domain::entities::ObjectId;
use crate::domain::error::DomainResult;
use crate::domain::graph::{ObjectGraph, ObjectRef};
use crate::domain::recipe::node::NodeRef;
use crate::domain::recipe::tree::{RecipeStep, RecipeTree};

/// How many hops the tool search follows from a by-product.
pub const DEFAULT_TOOL_SEARCH_HOPS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeOptions {
    pub tool_search_hops: usize,
}

impl Default for RecipeOptions {
    fn default() -> Self {
        Self {
            tool_search_hops: DEFAULT_TOOL_SEARCH_HOPS,
        }
    }
}

/// Derives recipes, keeping one node per object within each computation.
pub struct RecipeBuilder<'g> {
    graph: &'g ObjectGraph,
    options: RecipeOptions,
}

impl<'g> RecipeBuilder<'g> {
    pub fn new(graph: &'g ObjectGraph) -> Self {
        Self::with_options(graph, RecipeOptions::default())
    }

    pub fn with_options(graph: &'g ObjectGraph, options: RecipeOptions) -> Self {
        Self { graph, options }
    }

    /// Expand the recipe of `object` breadth-first.
    ///
    /// A revisited object is merged into its existing node, which is queued
    /// again; expansion is one-shot, so this only matters for nodes still
    /// waiting in the queue.
    #[instrument(level = "debug", skip(self), fields(object = %self.graph.id(object)))]
    pub fn build(&self, object: ObjectRef) -> DomainResult<Recipe<'g>> {
        let mut tree = RecipeTree::new(self.graph, self.options.tool_search_hops);
        let root = tree.insert_root(object);
        let mut index = HashMap::from([(object, root)]);
        let mut queue = VecDeque::from([root]);

        while let Some(node) = queue.pop_front() {
            for child in tree.generate_nodes(node) {
                let Some(child_object) = tree.node(child).map(|n| n.object()) else {
                    continue;
                };
                match index.get(&child_object) {
                    Some(&existing) => {
                        tree.merge(existing, child)?;
                        queue.push_back(existing);
                    }
                    None => {
                        index.insert(child_object, child);
                        queue.push_back(child);
                    }
                }
            }
        }
        debug!("build: {} nodes", tree.len());

        Ok(Recipe {
            object,
            root,
            tree,
            index,
        })
    }
}

/// JSON shape of a derived recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDocument {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Vec<RecipeStep>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<ObjectId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ObjectId>,
}

/// Result of one recipe computation.
#[derive(Debug)]
pub struct Recipe<'g> {
    object: ObjectRef,
    root: NodeRef,
    tree: RecipeTree<'g>,
    index: HashMap<ObjectRef, NodeRef>,
}

impl<'g> Recipe<'g> {
    pub fn object(&self) -> ObjectRef {
        self.object
    }

    pub fn root(&self) -> NodeRef {
        self.root
    }

    pub fn tree(&self) -> &RecipeTree<'g> {
        &self.tree
    }

    /// The single node of `object` in this recipe.
    pub fn node_for(&self, object: ObjectRef) -> Option<NodeRef> {
        self.index.get(&object).copied()
    }

    /// Step data grouped by depth, deepest (made first) group first.
    pub fn steps(&self) -> Vec<Vec<RecipeStep>> {
        let mut by_depth: BTreeMap<usize, Vec<RecipeStep>> = BTreeMap::new();
        for &node in self.tree.nodes() {
            if !self.tree.show_in_step(node) {
                continue;
            }
            if let Some(step) = self.tree.json_data(node) {
                by_depth.entry(self.tree.depth(node)).or_default().push(step);
            }
        }
        by_depth.into_values().rev().collect()
    }

    /// Ingredient ids, repeated once per required unit.
    pub fn ingredients(&self) -> Vec<ObjectId> {
        let graph = self.tree.graph();
        self.tree
            .nodes()
            .iter()
            .filter(|n| self.tree.is_ingredient(**n))
            .flat_map(|n| {
                let id = self.tree.node(*n).map(|node| graph.id(node.object()).clone());
                std::iter::repeat(id).take(self.tree.count(*n))
            })
            .flatten()
            .collect()
    }

    /// Distinct tools used by the recipe, in discovery order.
    pub fn tools(&self) -> Vec<ObjectId> {
        let graph = self.tree.graph();
        self.tree
            .nodes()
            .iter()
            .filter_map(|n| self.tree.node(*n))
            .filter(|node| node.available_tools().contains(node.object()))
            .map(|node| graph.id(node.object()).clone())
            .unique()
            .collect()
    }

    pub fn has_data(&self) -> bool {
        self.tree.nodes().iter().any(|n| self.tree.show_in_step(*n))
    }

    pub fn json_data(&self) -> RecipeDocument {
        RecipeDocument {
            steps: self.steps(),
            ingredients: self.ingredients(),
            tools: self.tools(),
        }
    }

    /// Render the recipe as an indented tree, inputs below what they make.
    pub fn to_tree_string(&self) -> Tree<String> {
        self.subtree(self.root)
    }

    fn subtree(&self, node: NodeRef) -> Tree<String> {
        let leaves: Vec<_> = self
            .tree
            .children(node)
            .into_iter()
            .map(|child| self.subtree(child))
            .collect();
        Tree::new(self.label(node)).with_leaves(leaves)
    }

    fn label(&self, node: NodeRef) -> String {
        let graph = self.tree.graph();
        let Some(object) = self.tree.node(node).map(|n| graph.object(n.object())) else {
            return "?".to_string();
        };
        let mut label = match &object.name {
            Some(name) => format!("{} ({})", name, object.id),
            None => object.id.to_string(),
        };
        let count = self.tree.count(node);
        if count > 1 {
            label.push_str(&format!(" x{}", count));
        }
        if self.tree.is_tool(node) {
            label.push_str(" [tool]");
        } else if self.tree.is_ingredient(node) {
            label.push_str(" [ingredient]");
        }
        label
    }
}
