//! Recipe derivation: node type, per-run arena and breadth-first builder.

pub mod builder;
pub mod node;
pub mod tree;

pub use builder::{Recipe, RecipeBuilder, RecipeDocument, RecipeOptions, DEFAULT_TOOL_SEARCH_HOPS};
pub use node::{AvailableTools, Expansion, NodeRef, RecipeNode};
pub use tree::{RecipeStep, RecipeTree};
