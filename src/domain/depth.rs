//! Difficulty classifier.
//!
//! Natural objects sit at depth 0. Everything else gets the cheapest depth
//! reachable through a producing transition, relaxed until stable. Afterwards
//! each object's producing edges are ordered cheapest first, which makes the
//! primary transition the easiest known recipe.

use std::cmp::Ordering;

use tracing::{debug, instrument};

use crate::domain::entities::Depth;
use crate::domain::graph::{ObjectGraph, ObjectRef, TransitionRef};

/// Assign a [`Depth`] to every object and order `transitions_toward`.
#[instrument(level = "debug", skip(graph))]
pub fn classify_depths(graph: &mut ObjectGraph) {
    let refs: Vec<ObjectRef> = graph.object_refs().to_vec();
    for &object in &refs {
        let natural = graph.object(object).is_natural();
        graph.object_mut(object).depth = if natural {
            Depth::new(0, 0.0)
        } else {
            Depth::unknown()
        };
    }

    let max_passes = graph.object_count() + 1;
    let mut passes = 0;
    loop {
        passes += 1;
        let mut changed = false;
        let transitions: Vec<TransitionRef> = graph.transitions().map(|(r, _)| r).collect();
        for transition in transitions {
            let Some(candidate) = transition_depth(graph, transition) else {
                continue;
            };
            for product in graph.transition(transition).products() {
                let current = graph.object(product).depth;
                if candidate.compare(&current) == Ordering::Less {
                    graph.object_mut(product).depth = candidate;
                    changed = true;
                }
            }
        }
        if !changed || passes >= max_passes {
            break;
        }
    }
    debug!("classify_depths: settled after {} passes", passes);

    for &object in &refs {
        let mut ordered = graph.object(object).transitions_toward.clone();
        ordered.sort_by(|a, b| {
            match (transition_depth(graph, *a), transition_depth(graph, *b)) {
                (Some(a), Some(b)) => a.compare(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        graph.reorder_transitions_toward(object, ordered);
    }
}

/// Depth an object gets when produced by `transition`.
///
/// `None` while some input has no depth yet, and for malformed edges.
pub fn transition_depth(graph: &ObjectGraph, transition: TransitionRef) -> Option<Depth> {
    let transition = graph.transition(transition);
    if transition.is_malformed() {
        return None;
    }
    let mut value = 0;
    let mut difficulty = 0.0;
    for input in transition.inputs() {
        let depth = graph.object(input).depth;
        value = value.max(depth.value()?);
        difficulty += depth.difficulty()?;
    }
    Some(Depth::new(value + 1, difficulty + 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{GameObject, Transition};

    fn natural(id: &str) -> GameObject {
        let mut object = GameObject::new(id, Some(id));
        object.data.insert("mapChance".into(), "0.5".into());
        object
    }

    #[test]
    fn given_chain_when_classifying_then_depth_grows_per_step() {
        let mut graph = ObjectGraph::new();
        let clay = graph.insert_object(natural("clay")).unwrap();
        let bowl = graph.insert_object(GameObject::new("bowl", None)).unwrap();
        let fired = graph.insert_object(GameObject::new("fired", None)).unwrap();
        graph.insert_transition(Transition {
            actor: Some(clay),
            new_actor: Some(bowl),
            hand: true,
            ..Default::default()
        });
        graph.insert_transition(Transition {
            target: Some(bowl),
            new_target: Some(fired),
            decay: Some(30),
            ..Default::default()
        });

        classify_depths(&mut graph);

        assert_eq!(graph.object(clay).depth, Depth::new(0, 0.0));
        assert_eq!(graph.object(bowl).depth, Depth::new(1, 1.0));
        assert_eq!(graph.object(fired).depth, Depth::new(2, 2.0));
    }

    #[test]
    fn given_two_recipes_when_classifying_then_cheapest_becomes_primary() {
        let mut graph = ObjectGraph::new();
        let stone = graph.insert_object(natural("stone")).unwrap();
        let branch = graph.insert_object(natural("branch")).unwrap();
        let hard = graph.insert_object(GameObject::new("hard", None)).unwrap();
        let tool = graph.insert_object(GameObject::new("tool", None)).unwrap();
        graph.insert_transition(Transition {
            actor: Some(stone),
            target: Some(branch),
            new_target: Some(hard),
            ..Default::default()
        });
        // listed first but more expensive
        let expensive = graph.insert_transition(Transition {
            actor: Some(hard),
            target: Some(stone),
            new_target: Some(tool),
            ..Default::default()
        });
        let cheap = graph.insert_transition(Transition {
            actor: Some(stone),
            target: Some(stone),
            new_target: Some(tool),
            ..Default::default()
        });

        classify_depths(&mut graph);

        assert_eq!(graph.object(tool).transitions_toward, vec![cheap, expensive]);
        assert_eq!(graph.object(tool).depth, Depth::new(1, 1.0));
    }

    #[test]
    fn given_unreachable_object_when_classifying_then_has_no_value() {
        let mut graph = ObjectGraph::new();
        let a = graph.insert_object(GameObject::new("a", None)).unwrap();
        let b = graph.insert_object(GameObject::new("b", None)).unwrap();
        graph.insert_transition(Transition {
            actor: Some(a),
            target: Some(a),
            new_target: Some(b),
            ..Default::default()
        });

        classify_depths(&mut graph);

        assert!(!graph.object(a).depth.has_value());
        assert!(!graph.object(b).depth.has_value());
    }
}
