//! Reference Graph
//!
//! A petgraph view over the dictionary arena. One node per descriptor, one
//! edge per non-owning link:
//! - `Referent`: alias target or aggregate element type
//! - `Supertype`: entity to supertype
//! - `Choice`: select to alternative
//!
//! The graph is a snapshot. It does not follow later mutation of the
//! dictionary.

pub mod analysis;

pub use analysis::TypeCycle;

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dictionary::{Dictionary, EntityId, TypeId};
use crate::types::DescriptorBody;

/// Kind of link an edge stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Referent,
    Supertype,
    Choice,
}

pub struct ReferenceGraph {
    pub(crate) graph: DiGraph<TypeId, EdgeKind>,
    node_indices: HashMap<TypeId, NodeIndex>,
}

impl ReferenceGraph {
    /// Snapshot every descriptor link in `dict`
    pub fn build(dict: &Dictionary) -> Self {
        let ids = dict.type_ids();
        let mut graph: DiGraph<TypeId, EdgeKind> = DiGraph::with_capacity(ids.len(), ids.len());
        let node_indices: HashMap<TypeId, NodeIndex> = ids.iter().map(|id| (*id, graph.add_node(*id))).collect();

        for id in &ids {
            let Some(td) = dict.get(*id) else { continue };
            let mut targets = Vec::new();
            if let Some(referent) = td.referent() {
                targets.push((referent, EdgeKind::Referent));
            }
            match td.body() {
                DescriptorBody::Entity(body) => {
                    targets.extend(body.supertypes().snapshot().into_iter().map(|s| (s.as_type(), EdgeKind::Supertype)));
                }
                DescriptorBody::Select(body) => {
                    targets.extend(body.choices().snapshot().into_iter().map(|c| (c, EdgeKind::Choice)));
                }
                _ => {}
            }

            let from = node_indices[id];
            for (target, kind) in targets {
                match node_indices.get(&target) {
                    Some(&to) => {
                        graph.add_edge(from, to, kind);
                    }
                    None => debug!(from = td.name(), to = %target, ?kind, "skipping dangling link"),
                }
            }
        }

        Self { graph, node_indices }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Immediate outgoing links of `id`
    pub fn refs_out(&self, id: TypeId) -> Vec<(TypeId, EdgeKind)> {
        let Some(&node_idx) = self.node_indices.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self
            .graph
            .edges_directed(node_idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()], *e.weight()))
            .collect();
        // petgraph yields edges newest first
        out.reverse();
        out
    }

    /// Immediate incoming links of `id`
    pub fn refs_in(&self, id: TypeId) -> Vec<(TypeId, EdgeKind)> {
        let Some(&node_idx) = self.node_indices.get(&id) else {
            return Vec::new();
        };
        let mut incoming: Vec<_> = self
            .graph
            .edges_directed(node_idx, Direction::Incoming)
            .map(|e| (self.graph[e.source()], *e.weight()))
            .collect();
        incoming.sort();
        incoming
    }

    /// Entities naming `entity` as a direct supertype
    pub fn subtypes(&self, entity: EntityId) -> Vec<EntityId> {
        self.refs_in(entity.as_type())
            .into_iter()
            .filter(|(_, kind)| *kind == EdgeKind::Supertype)
            .map(|(id, _)| EntityId(id))
            .collect()
    }
}
