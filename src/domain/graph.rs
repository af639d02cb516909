//! Arena-backed object/transition graph.
//!
//! Objects and transitions are stored in generational arenas and refer to
//! each other through typed handles. Objects are never removed, so every
//! handle handed out by the graph stays valid for the graph's lifetime.

use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::{GameObject, ObjectId, Transition};
use crate::domain::error::{DomainError, DomainResult};

/// Handle of an object in an [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(Index);

/// Handle of a transition in an [`ObjectGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionRef(Index);

/// Object/transition graph, immutable once loading has finished.
#[derive(Debug, Default)]
pub struct ObjectGraph {
    objects: Arena<GameObject>,
    transitions: Arena<Transition>,
    by_id: HashMap<ObjectId, ObjectRef>,
    /// Objects in insertion order
    order: Vec<ObjectRef>,
    /// Transitions in insertion order
    transition_order: Vec<TransitionRef>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object; ids must be unique.
    pub fn insert_object(&mut self, object: GameObject) -> DomainResult<ObjectRef> {
        if self.by_id.contains_key(&object.id) {
            return Err(DomainError::DuplicateObject(object.id));
        }
        let id = object.id.clone();
        let object_ref = ObjectRef(self.objects.insert(object));
        self.by_id.insert(id, object_ref);
        self.order.push(object_ref);
        Ok(object_ref)
    }

    pub fn lookup(&self, id: &str) -> Option<ObjectRef> {
        self.by_id.get(&ObjectId::new(id)).copied()
    }

    /// Resolve an id, failing for unknown ids.
    pub fn require(&self, id: &str) -> DomainResult<ObjectRef> {
        self.lookup(id)
            .ok_or_else(|| DomainError::UnknownObject(ObjectId::new(id)))
    }

    pub fn object(&self, object: ObjectRef) -> &GameObject {
        &self.objects[object.0]
    }

    pub fn object_mut(&mut self, object: ObjectRef) -> &mut GameObject {
        &mut self.objects[object.0]
    }

    pub fn transition(&self, transition: TransitionRef) -> &Transition {
        &self.transitions[transition.0]
    }

    /// Add a transition and wire it into its endpoints.
    ///
    /// The edge is listed as "away" on its actor and target, and as "toward"
    /// on every object it produces (see [`Transition::products`]).
    #[instrument(level = "trace", skip(self))]
    pub fn insert_transition(&mut self, transition: Transition) -> TransitionRef {
        let inputs: Vec<ObjectRef> = transition.inputs().collect();
        let products = transition.products();
        let transition_ref = TransitionRef(self.transitions.insert(transition));
        self.transition_order.push(transition_ref);

        for (i, input) in inputs.iter().enumerate() {
            if inputs[..i].contains(input) {
                continue;
            }
            self.object_mut(*input).transitions_away.push(transition_ref);
        }
        for product in products {
            self.object_mut(product).transitions_toward.push(transition_ref);
        }
        transition_ref
    }

    /// The first producing edge of an object, its canonical recipe.
    pub fn primary_transition(&self, object: ObjectRef) -> Option<&Transition> {
        self.object(object)
            .transitions_toward
            .first()
            .map(|t| self.transition(*t))
    }

    /// Objects in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectRef, &GameObject)> + '_ {
        self.order.iter().map(move |r| (*r, self.object(*r)))
    }

    pub fn object_refs(&self) -> &[ObjectRef] {
        &self.order
    }

    /// Transitions in insertion order.
    pub fn transitions(&self) -> impl Iterator<Item = (TransitionRef, &Transition)> + '_ {
        self.transition_order
            .iter()
            .map(move |r| (*r, self.transition(*r)))
    }

    pub fn object_count(&self) -> usize {
        self.order.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transition_order.len()
    }

    /// Id of an object handle.
    pub fn id(&self, object: ObjectRef) -> &ObjectId {
        &self.object(object).id
    }

    /// Replace the order of an object's producing edges.
    ///
    /// `order` must be a permutation of the current list; anything else is
    /// ignored so wiring stays symmetric.
    pub fn reorder_transitions_toward(&mut self, object: ObjectRef, order: Vec<TransitionRef>) {
        let current = &self.object(object).transitions_toward;
        let is_permutation = order.len() == current.len()
            && current.iter().all(|t| order.contains(t));
        if is_permutation {
            self.object_mut(object).transitions_toward = order;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(ids: &[&str]) -> (ObjectGraph, Vec<ObjectRef>) {
        let mut graph = ObjectGraph::new();
        let refs = ids
            .iter()
            .map(|id| graph.insert_object(GameObject::new(*id, Some(id))).unwrap())
            .collect();
        (graph, refs)
    }

    #[test]
    fn given_duplicate_id_when_inserting_then_errors() {
        let (mut graph, _) = graph_with(&["1"]);
        let result = graph.insert_object(GameObject::new("1", None));
        assert_eq!(result, Err(DomainError::DuplicateObject(ObjectId::new("1"))));
    }

    #[test]
    fn given_transition_when_inserting_then_wires_both_directions() {
        let (mut graph, refs) = graph_with(&["axe", "tree", "log", "stump"]);
        let t = graph.insert_transition(Transition {
            actor: Some(refs[0]),
            target: Some(refs[1]),
            new_actor: Some(refs[0]),
            new_target: Some(refs[2]),
            tool: true,
            ..Default::default()
        });

        assert_eq!(graph.object(refs[0]).transitions_away, vec![t]);
        assert_eq!(graph.object(refs[1]).transitions_away, vec![t]);
        assert_eq!(graph.object(refs[2]).transitions_toward, vec![t]);
        // the axe survives, it is not produced
        assert!(graph.object(refs[0]).transitions_toward.is_empty());
        assert!(graph.object(refs[3]).transitions_toward.is_empty());
        assert_eq!(graph.primary_transition(refs[2]), Some(graph.transition(t)));
    }

    #[test]
    fn given_same_actor_and_target_when_inserting_then_lists_edge_once() {
        let (mut graph, refs) = graph_with(&["stone", "pile"]);
        graph.insert_transition(Transition {
            actor: Some(refs[0]),
            target: Some(refs[0]),
            new_target: Some(refs[1]),
            ..Default::default()
        });

        assert_eq!(graph.object(refs[0]).transitions_away.len(), 1);
        assert_eq!(graph.object(refs[1]).transitions_toward.len(), 1);
    }

    #[test]
    fn given_malformed_transition_when_inserting_then_is_tolerated() {
        let (mut graph, refs) = graph_with(&["ghost"]);
        graph.insert_transition(Transition {
            new_target: Some(refs[0]),
            ..Default::default()
        });

        assert_eq!(graph.transition_count(), 1);
        let primary = graph.primary_transition(refs[0]).unwrap();
        assert!(primary.is_malformed());
    }

    #[test]
    fn given_non_permutation_when_reordering_then_keeps_order() {
        let (mut graph, refs) = graph_with(&["a", "b"]);
        let t1 = graph.insert_transition(Transition {
            target: Some(refs[0]),
            new_target: Some(refs[1]),
            ..Default::default()
        });
        let t2 = graph.insert_transition(Transition {
            decay: Some(10),
            target: Some(refs[0]),
            new_target: Some(refs[1]),
            ..Default::default()
        });

        graph.reorder_transitions_toward(refs[1], vec![t2]);
        assert_eq!(graph.object(refs[1]).transitions_toward, vec![t1, t2]);

        graph.reorder_transitions_toward(refs[1], vec![t2, t1]);
        assert_eq!(graph.object(refs[1]).transitions_toward, vec![t2, t1]);
    }
}
