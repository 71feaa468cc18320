//! Cycle analysis over the reference graph
//!
//! Uses petgraph's Kosaraju SCC to find cycles. The resolution algorithms
//! detect cycles on their own as they walk; this pass reports all of them
//! up front so a builder can reject a malformed model before first read.

use petgraph::algo::kosaraju_scc;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use super::ReferenceGraph;
use crate::dictionary::{Dictionary, TypeId};
use crate::error::{DictionaryError, Result};

/// A strongly connected group of descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCycle {
    /// Members, sorted by handle
    pub members: Vec<TypeId>,
    /// Single descriptor linking to itself
    pub is_self_referential: bool,
}

impl ReferenceGraph {
    /// Every cycle in the graph, ordered by its smallest member
    pub fn cycles(&self) -> Vec<TypeCycle> {
        let mut cycles = Vec::new();
        for scc in kosaraju_scc(&self.graph) {
            if scc.len() == 1 {
                let node_idx = scc[0];
                let has_self_ref = self
                    .graph
                    .edges_directed(node_idx, Direction::Outgoing)
                    .any(|e| e.target() == node_idx);
                if has_self_ref {
                    cycles.push(TypeCycle {
                        members: vec![self.graph[node_idx]],
                        is_self_referential: true,
                    });
                }
            } else {
                let mut members: Vec<TypeId> = scc.iter().map(|idx| self.graph[*idx]).collect();
                members.sort();
                cycles.push(TypeCycle {
                    members,
                    is_self_referential: false,
                });
            }
        }
        cycles.sort_by_key(|cycle| cycle.members[0]);
        cycles
    }

    pub fn is_acyclic(&self) -> bool {
        self.cycles().is_empty()
    }
}

impl Dictionary {
    /// Fail with [`DictionaryError::CyclicTypeGraph`] naming the members of
    /// the first cycle found
    pub fn check_acyclic(&self) -> Result<()> {
        let graph = ReferenceGraph::build(self);
        let Some(cycle) = graph.cycles().into_iter().next() else {
            return Ok(());
        };
        let names: Vec<String> = cycle
            .members
            .iter()
            .map(|id| self.get(*id).map_or_else(|| id.to_string(), |td| td.name().to_string()))
            .collect();
        Err(DictionaryError::CyclicTypeGraph { name: names.join(", ") })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityBody;
    use crate::types::{PrimitiveType, SelectBody, TypeDescriptor};

    #[test]
    fn test_acyclic_dictionary() {
        let dict = Dictionary::new();
        let schema = dict.add_schema("s");
        let integer = dict.builtin(PrimitiveType::Integer).unwrap();
        dict.insert_type(schema, TypeDescriptor::defined("count", PrimitiveType::Integer, "INTEGER").unwrap().with_referent(integer))
            .unwrap();
        assert!(ReferenceGraph::build(&dict).is_acyclic());
        assert!(dict.check_acyclic().is_ok());
    }

    #[test]
    fn test_mutual_supertypes_form_one_cycle() {
        let dict = Dictionary::new();
        let schema = dict.add_schema("s");
        let a = dict.insert_entity(schema, TypeDescriptor::entity("a", EntityBody::new())).unwrap();
        let body = EntityBody::new();
        body.add_supertype(a);
        let b = dict.insert_entity(schema, TypeDescriptor::entity("b", body)).unwrap();
        dict.entity(a).unwrap().as_entity().unwrap().add_supertype(b);

        let cycles = ReferenceGraph::build(&dict).cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].members, vec![a.as_type(), b.as_type()]);
        assert_eq!(
            dict.check_acyclic().unwrap_err(),
            DictionaryError::CyclicTypeGraph { name: "a, b".to_string() }
        );
    }

    #[test]
    fn test_self_referential_select() {
        let dict = Dictionary::new();
        let schema = dict.add_schema("s");
        let loopy = dict.insert_type(schema, TypeDescriptor::select("loopy", "SELECT", SelectBody::new())).unwrap();
        dict.get(loopy).unwrap().as_select().unwrap().add_choice(loopy);

        let cycles = ReferenceGraph::build(&dict).cycles();
        assert_eq!(cycles, vec![TypeCycle { members: vec![loopy], is_self_referential: true }]);
    }
}
