//! Domain layer: object graph and derivations
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod depth;
pub mod entities;
pub mod error;
pub mod graph;
pub mod recipe;
pub mod tech_tree;
pub mod version;

pub use depth::{classify_depths, transition_depth};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use graph::{ObjectGraph, ObjectRef, TransitionRef};
pub use recipe::{Recipe, RecipeBuilder, RecipeDocument, RecipeOptions, RecipeStep};
pub use tech_tree::TechTreeNode;
pub use version::{ChangeLog, TagRules, Version};
