//! JSON export service
//!
//! Writes one document per object plus an `objects.json` index. Documents
//! are derived in parallel; every worker runs its own recipe computation.

use std::ops::Not;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    DomainError, ObjectGraph, ObjectId, ObjectRef, RecipeBuilder, RecipeDocument, RecipeOptions,
    TechTreeNode, Transition, TransitionRef,
};
use crate::infrastructure::traits::FileSystem;

pub const DEFAULT_TECH_TREE_DEPTH: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub tech_tree_depth: u32,
    pub recipe: RecipeOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            tech_tree_depth: DEFAULT_TECH_TREE_DEPTH,
            recipe: RecipeOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionDocument {
    #[serde(rename = "actorID", skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ObjectId>,
    #[serde(rename = "targetID", skip_serializing_if = "Option::is_none")]
    pub target_id: Option<ObjectId>,
    #[serde(rename = "newActorID", skip_serializing_if = "Option::is_none")]
    pub new_actor_id: Option<ObjectId>,
    #[serde(rename = "newTargetID", skip_serializing_if = "Option::is_none")]
    pub new_target_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay: Option<u32>,
    #[serde(skip_serializing_if = "Not::not")]
    pub tool: bool,
    #[serde(skip_serializing_if = "Not::not")]
    pub hand: bool,
}

impl TransitionDocument {
    fn new(graph: &ObjectGraph, transition: &Transition) -> Self {
        let id = |o: Option<ObjectRef>| o.map(|o| graph.id(o).clone());
        Self {
            actor_id: id(transition.actor),
            target_id: id(transition.target),
            new_actor_id: id(transition.new_actor),
            new_target_id: id(transition.new_target),
            decay: transition.decay,
            tool: transition.tool,
            hand: transition.hand,
        }
    }
}

/// Per-object document; absent or non-positive values are omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectDocument {
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub transitions_toward: Vec<TransitionDocument>,
    pub transitions_away: Vec<TransitionDocument>,
    pub transitions_timed: Vec<TransitionDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_value: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_uses: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_chance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clothing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insulation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_chance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biomes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_slots: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_tree: Option<Vec<TechTreeNode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<RecipeDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// Counts reported after an export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub objects: usize,
    pub recipes: usize,
    pub recipe_cycles: usize,
}

/// A built document and whether its recipe hit a cycle.
struct Derived {
    document: ObjectDocument,
    cycle: bool,
}

/// Export service.
pub struct ExportService {
    fs: Arc<dyn FileSystem>,
    options: ExportOptions,
}

impl ExportService {
    pub fn new(fs: Arc<dyn FileSystem>, options: ExportOptions) -> Self {
        Self { fs, options }
    }

    /// Build the document of one object.
    pub fn object_document(&self, graph: &ObjectGraph, object: ObjectRef) -> ObjectDocument {
        self.derive(graph, object).document
    }

    /// Index entries ordered newest object first.
    pub fn index(&self, graph: &ObjectGraph) -> Vec<IndexEntry> {
        let mut objects: Vec<_> = graph.objects().map(|(_, o)| o).collect();
        objects.sort_by_key(|o| o.sort_weight());
        objects
            .into_iter()
            .map(|o| IndexEntry {
                id: o.id.clone(),
                name: o.name.clone(),
                difficulty: format_difficulty(o.depth.difficulty()),
            })
            .collect()
    }

    /// Write `<out_dir>/objects/<id>.json` for every object and the index.
    #[instrument(level = "debug", skip(self, graph))]
    pub fn export(&self, graph: &ObjectGraph, out_dir: &Path) -> ApplicationResult<ExportSummary> {
        let objects_dir = out_dir.join("objects");
        self.fs
            .create_dir_all(&objects_dir)
            .with_path_context("create output directory", &objects_dir)?;

        let rendered: Vec<(ObjectId, ApplicationResult<String>, bool, bool)> = graph
            .object_refs()
            .par_iter()
            .map(|object| {
                let derived = self.derive(graph, *object);
                let has_recipe = derived.document.recipe.is_some();
                (
                    derived.document.id.clone(),
                    to_json(&derived.document),
                    has_recipe,
                    derived.cycle,
                )
            })
            .collect();

        let mut summary = ExportSummary::default();
        for (id, json, has_recipe, cycle) in rendered {
            let path = objects_dir.join(format!("{}.json", id));
            self.fs
                .write(&path, &json?)
                .with_path_context("write object", &path)?;
            summary.objects += 1;
            summary.recipes += usize::from(has_recipe);
            summary.recipe_cycles += usize::from(cycle);
        }

        let index_path = out_dir.join("objects.json");
        self.fs
            .write(&index_path, &to_json(&self.index(graph))?)
            .with_path_context("write index", &index_path)?;

        info!(
            "Exported {} objects ({} recipes, {} cycles skipped)",
            summary.objects, summary.recipes, summary.recipe_cycles
        );
        Ok(summary)
    }

    fn derive(&self, graph: &ObjectGraph, object: ObjectRef) -> Derived {
        let found = graph.object(object);
        let transitions = |refs: &[TransitionRef], timed: Option<bool>| -> Vec<TransitionDocument> {
            refs.iter()
                .map(|t| graph.transition(*t))
                .filter(|t| timed.map_or(true, |timed| t.decay.is_some() == timed))
                .map(|t| TransitionDocument::new(graph, t))
                .collect()
        };

        let (recipe, cycle) = match RecipeBuilder::with_options(graph, self.options.recipe).build(object) {
            Ok(recipe) => (recipe.has_data().then(|| recipe.json_data()), false),
            Err(DomainError::RecipeCycle(at)) => {
                warn!("Omitting recipe of {}: cycle at {}", found.id, at);
                (None, true)
            }
            Err(e) => {
                warn!("Omitting recipe of {}: {}", found.id, e);
                (None, false)
            }
        };

        let num_uses = found.num_uses().filter(|n| *n > 1);
        let clothing = found.clothing().map(str::to_string);
        let natural = found.map_chance().filter(|c| *c > 0.0);
        let num_slots = found.num_slots().filter(|n| *n > 0);

        let document = ObjectDocument {
            id: found.id.clone(),
            name: found.name.clone(),
            transitions_toward: transitions(&found.transitions_toward, None),
            transitions_away: transitions(&found.transitions_away, Some(false)),
            transitions_timed: transitions(&found.transitions_away, Some(true)),
            version: found.version,
            food_value: found.food_value().filter(|v| *v > 0),
            heat_value: found.heat_value().filter(|v| *v > 0),
            num_uses,
            use_chance: num_uses.and(found.use_chance().filter(|c| *c > 0.0)),
            depth: found.depth.value(),
            difficulty: format_difficulty(found.depth.difficulty()),
            insulation: clothing.as_ref().and(found.insulation()),
            clothing,
            map_chance: natural,
            biomes: natural.map(|_| found.biomes.clone()),
            num_slots,
            slot_size: num_slots.and(found.slot_size()),
            size: found.contain_size(),
            tech_tree: graph.tech_tree_nodes(object, self.options.tech_tree_depth),
            recipe,
        };
        debug!(id = %document.id, "derived document");
        Derived { document, cycle }
    }
}

/// Two decimals; zero and unknown difficulties are omitted.
fn format_difficulty(difficulty: Option<f64>) -> Option<String> {
    difficulty.filter(|d| *d != 0.0).map(|d| format!("{:.2}", d))
}

fn to_json<T: Serialize>(value: &T) -> ApplicationResult<String> {
    serde_json::to_string(value).map_err(|e| ApplicationError::OperationFailed {
        context: "serialize document".to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_difficulties_when_formatting_then_uses_two_decimals() {
        assert_eq!(format_difficulty(Some(2.5)), Some("2.50".to_string()));
        assert_eq!(format_difficulty(Some(0.0)), None);
        assert_eq!(format_difficulty(None), None);
    }
}
