//! Tests for ExportService

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{json, Value};
use tempfile::TempDir;

use crafttree::application::services::{ContentLoader, ExportOptions, ExportService};
use crafttree::domain::{Depth, GameObject, ObjectGraph, ObjectId, Transition};
use crafttree::infrastructure::traits::RealFileSystem;
use crafttree::util::testing::{fixture_content_dir, init_test_setup};

#[fixture]
fn graph() -> ObjectGraph {
    init_test_setup();
    ContentLoader::new(Arc::new(RealFileSystem))
        .load(&fixture_content_dir())
        .expect("load fixture content")
}

fn exporter() -> ExportService {
    ExportService::new(Arc::new(RealFileSystem), ExportOptions::default())
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// ============================================================
// Documents
// ============================================================

#[rstest]
fn given_wet_bowl_when_building_document_then_splits_timed_transitions(graph: ObjectGraph) {
    // Act
    let document = exporter().object_document(&graph, graph.require("235").unwrap());

    // Assert
    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["name"], json!("Clay Bowl - wet"));
    assert_eq!(
        value["transitionsToward"],
        json!([{"targetID": "70", "newActorID": "235", "hand": true}])
    );
    assert_eq!(value["transitionsAway"], json!([]));
    assert_eq!(
        value["transitionsTimed"],
        json!([{"targetID": "235", "newTargetID": "236", "decay": 30}])
    );
    assert_eq!(value["numSlots"], json!(1));
    assert_eq!(value["slotSize"], json!(1.0));
    assert_eq!(value["size"], json!(1.0));
    assert!(value.get("numUses").is_none());
    assert!(value.get("mapChance").is_none());
}

#[rstest]
fn given_natural_bush_when_building_document_then_includes_biomes(graph: ObjectGraph) {
    let document = exporter().object_document(&graph, graph.require("30").unwrap());

    assert_eq!(document.food_value, Some(3));
    assert_eq!(document.num_uses, Some(6));
    assert_eq!(document.use_chance, None);
    assert_eq!(document.map_chance, Some(0.2));
    assert_eq!(document.biomes, Some(vec!["0".to_string()]));
    assert_eq!(document.depth, Some(0));
    assert_eq!(document.difficulty, None);
    assert_eq!(document.tech_tree, None);
    assert_eq!(document.recipe, None);
    assert_eq!(document.size, None);
}

#[rstest]
fn given_thread_when_building_document_then_carries_recipe_and_tech_tree(graph: ObjectGraph) {
    let document = exporter().object_document(&graph, graph.require("58").unwrap());

    assert_eq!(document.depth, Some(2));
    assert_eq!(document.difficulty.as_deref(), Some("3.00"));
    assert_eq!(document.tech_tree.as_ref().map(Vec::len), Some(2));
    let recipe = document.recipe.unwrap();
    assert_eq!(recipe.tools, vec![ObjectId::new("34")]);
    assert_eq!(recipe.steps.len(), 2);
}

#[rstest]
fn given_fixture_content_when_indexing_then_orders_newest_first(graph: ObjectGraph) {
    let index = exporter().index(&graph);

    let ids: Vec<&str> = index.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["236", "235", "71", "70", "58", "57", "50", "34", "33", "32", "30"]
    );
    assert_eq!(index[0].difficulty.as_deref(), Some("2.00"));
    assert_eq!(index[2].difficulty, None);
}

// ============================================================
// Export run
// ============================================================

#[rstest]
fn given_fixture_content_when_exporting_then_writes_all_documents(graph: ObjectGraph) {
    // Arrange
    let out = TempDir::new().unwrap();

    // Act
    let summary = exporter().export(&graph, out.path()).unwrap();

    // Assert
    assert_eq!(summary.objects, 11);
    assert_eq!(summary.recipes, 5);
    assert_eq!(summary.recipe_cycles, 0);
    assert!(out.path().join("objects").join("71.json").is_file());

    let thread = read_json(&out.path().join("objects").join("58.json"));
    assert_eq!(thread["id"], json!("58"));
    assert_eq!(thread["difficulty"], json!("3.00"));
    assert_eq!(thread["recipe"]["ingredients"], json!(["50"]));

    let index = read_json(&out.path().join("objects.json"));
    assert_eq!(index.as_array().map(Vec::len), Some(11));
    assert_eq!(index[0], json!({"id": "236", "name": "Clay Bowl", "difficulty": "2.00"}));
}

#[test]
fn given_mutual_recipes_when_exporting_then_omits_and_counts_cycles() {
    init_test_setup();
    // Arrange: a is made from b and b from a
    let mut graph = ObjectGraph::new();
    let mut a = GameObject::new("1", Some("a"));
    a.depth = Depth::new(1, 1.0);
    let mut b = GameObject::new("2", Some("b"));
    b.depth = Depth::new(2, 2.0);
    let a = graph.insert_object(a).unwrap();
    let b = graph.insert_object(b).unwrap();
    graph.insert_transition(Transition {
        actor: Some(b),
        new_actor: Some(a),
        ..Default::default()
    });
    graph.insert_transition(Transition {
        actor: Some(a),
        new_actor: Some(b),
        ..Default::default()
    });
    let out = TempDir::new().unwrap();

    // Act
    let summary = exporter().export(&graph, out.path()).unwrap();

    // Assert
    assert_eq!(summary.objects, 2);
    assert_eq!(summary.recipes, 0);
    assert_eq!(summary.recipe_cycles, 2);
    let document = read_json(&out.path().join("objects").join("1.json"));
    assert!(document.get("recipe").is_none());
    assert!(document.get("techTree").is_some());
}
