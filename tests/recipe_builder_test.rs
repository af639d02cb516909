//! Tests for recipes derived from the fixture content

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use crafttree::application::services::ContentLoader;
use crafttree::domain::{ObjectGraph, ObjectId, RecipeBuilder, RecipeOptions};
use crafttree::infrastructure::traits::RealFileSystem;
use crafttree::util::testing::{fixture_content_dir, init_test_setup};

#[fixture]
fn graph() -> ObjectGraph {
    init_test_setup();
    ContentLoader::new(Arc::new(RealFileSystem))
        .load(&fixture_content_dir())
        .expect("load fixture content")
}

#[rstest]
fn given_thread_when_building_recipe_then_orders_steps_deepest_first(graph: ObjectGraph) {
    // Arrange
    let thread = graph.require("58").unwrap();

    // Act
    let recipe = RecipeBuilder::new(&graph).build(thread).unwrap();

    // Assert
    assert_eq!(
        serde_json::to_value(recipe.json_data()).unwrap(),
        json!({
            "steps": [
                [{"id": "57", "targetID": "50", "hand": true}],
                [{"id": "58", "actorID": "34", "targetID": "57"}]
            ],
            "ingredients": ["50"],
            "tools": ["34"]
        })
    );
}

#[rstest]
fn given_thread_when_building_recipe_then_sharp_stone_is_a_leaf_tool(graph: ObjectGraph) {
    let recipe = RecipeBuilder::new(&graph)
        .build(graph.require("58").unwrap())
        .unwrap();

    let sharp = recipe.node_for(graph.require("34").unwrap()).unwrap();
    assert!(recipe.tree().is_tool(sharp));
    assert!(recipe.tree().children(sharp).is_empty());
    // the stones that make it are never visited
    assert!(recipe.node_for(graph.require("33").unwrap()).is_none());
}

#[rstest]
fn given_fired_bowl_when_building_recipe_then_includes_decay_step(graph: ObjectGraph) {
    let recipe = RecipeBuilder::new(&graph)
        .build(graph.require("236").unwrap())
        .unwrap();

    assert_eq!(
        serde_json::to_value(recipe.json_data()).unwrap(),
        json!({
            "steps": [
                [{"id": "235", "targetID": "70", "hand": true}],
                [{"id": "236", "targetID": "235", "decay": 30}]
            ],
            "ingredients": ["70"]
        })
    );
    assert!(recipe.tools().is_empty());
}

#[rstest]
#[case::natural("70")]
#[case::unreachable("71")]
fn given_object_without_steps_when_building_then_has_no_data(
    graph: ObjectGraph,
    #[case] id: &str,
) {
    let recipe = RecipeBuilder::with_options(&graph, RecipeOptions::default())
        .build(graph.require(id).unwrap())
        .unwrap();

    assert!(!recipe.has_data());
    assert!(recipe.steps().is_empty());
}

#[rstest]
fn given_sharp_stone_when_building_then_needs_both_stones(graph: ObjectGraph) {
    let recipe = RecipeBuilder::new(&graph)
        .build(graph.require("34").unwrap())
        .unwrap();

    assert_eq!(
        recipe.ingredients(),
        vec![ObjectId::new("33"), ObjectId::new("32")]
    );
    assert_eq!(recipe.steps().len(), 1);
}

#[rstest]
fn given_thread_when_rendering_tree_then_labels_tools_and_ingredients(graph: ObjectGraph) {
    let recipe = RecipeBuilder::new(&graph)
        .build(graph.require("58").unwrap())
        .unwrap();

    let rendered = recipe.to_tree_string().to_string();

    assert!(rendered.starts_with("Thread (58)"));
    assert!(rendered.contains("Sharp Stone (34) [tool]"));
    assert!(rendered.contains("Milkweed (50) [ingredient]"));
}
