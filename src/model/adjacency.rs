//! The raw adjacency-list store behind [`crate::model::GraphModel`].
//!
//! [`AdjacencyList`] performs unchecked structural mutations and reports each as a
//! [`JournalEntry`] that [`AdjacencyList::revert`] can undo exactly. Validation,
//! transactions and notification live one level up.

use std::sync::Arc;

use crate::model::{Edge, Vertex};

/// One structural mutation, recorded with enough positions to restore the prior
/// state verbatim.
#[derive(Debug, Clone)]
pub(crate) enum JournalEntry {
    /// A vertex was appended
    VertexAdded { vertex: Arc<Vertex> },
    /// The vertex at `index` was removed and higher positions shifted down
    VertexRemoved { index: usize, vertex: Arc<Vertex> },
    /// An edge was appended and its adjacency entries pushed
    EdgeAdded {
        edge: Arc<Edge>,
        source: usize,
        target: usize,
    },
    /// The edge at `index` was removed, along with its adjacency entries
    EdgeRemoved {
        index: usize,
        edge: Arc<Edge>,
        source: usize,
        target: usize,
        source_slot: usize,
        target_slot: Option<usize>,
    },
}

/// Ordered vertices, ordered edges, and per-vertex lists of adjacent positions.
#[derive(Debug, Default)]
pub(crate) struct AdjacencyList {
    pub(crate) vertices: Vec<Arc<Vertex>>,
    pub(crate) edges: Vec<Arc<Edge>>,
    pub(crate) adjacency: Vec<Vec<usize>>,
}

impl AdjacencyList {
    /// Position of the first vertex equal to `vertex`.
    pub(crate) fn index_of(&self, vertex: &Vertex) -> Option<usize> {
        self.vertices.iter().position(|v| **v == *vertex)
    }

    /// Position of `edge` in the edge list.
    pub(crate) fn edge_index(&self, edge: &Edge) -> Option<usize> {
        self.edges.iter().position(|e| **e == *edge)
    }

    pub(crate) fn find_edge(&self, source: &Vertex, target: &Vertex) -> Option<Arc<Edge>> {
        if source == target {
            return None;
        }
        let si = self.index_of(source)?;
        let ti = self.index_of(target)?;

        // Cheap rejection before scanning every edge
        if !self.adjacency[si].contains(&ti) && !self.adjacency[ti].contains(&si) {
            return None;
        }

        self.edges
            .iter()
            .find(|edge| {
                (**edge.source() == *source && **edge.target() == *target)
                    || (!edge.is_directed()
                        && **edge.source() == *target
                        && **edge.target() == *source)
            })
            .cloned()
    }

    pub(crate) fn find_vertex(&self, x: i32, y: i32, z: i32) -> Option<Arc<Vertex>> {
        self.vertices.iter().find(|v| v.contains(x, y, z)).cloned()
    }

    /// Edges leaving `vertex`, or with `directed_only == false` every incident edge.
    pub(crate) fn adjacent_edges(&self, vertex: &Vertex, directed_only: bool) -> Vec<Arc<Edge>> {
        self.edges
            .iter()
            .filter(|edge| {
                **edge.source() == *vertex || (!directed_only && **edge.target() == *vertex)
            })
            .cloned()
            .collect()
    }

    pub(crate) fn adjacent_vertices(&self, vertex: &Vertex) -> Vec<Arc<Vertex>> {
        let Some(index) = self.index_of(vertex) else {
            return Vec::new();
        };
        self.adjacency[index]
            .iter()
            .map(|&position| Arc::clone(&self.vertices[position]))
            .collect()
    }

    pub(crate) fn push_vertex(&mut self, vertex: Arc<Vertex>) -> JournalEntry {
        self.vertices.push(Arc::clone(&vertex));
        self.adjacency.push(Vec::new());
        JournalEntry::VertexAdded { vertex }
    }

    /// Removes the vertex at `index`; the caller guarantees it has no incident edges.
    pub(crate) fn remove_vertex_at(&mut self, index: usize) -> JournalEntry {
        let vertex = self.vertices.remove(index);
        self.adjacency.remove(index);
        for list in &mut self.adjacency {
            for position in list.iter_mut().filter(|p| **p > index) {
                *position -= 1;
            }
        }
        JournalEntry::VertexRemoved { index, vertex }
    }

    pub(crate) fn push_edge(&mut self, edge: Arc<Edge>, source: usize, target: usize) -> JournalEntry {
        self.adjacency[source].push(target);
        if !edge.is_directed() {
            self.adjacency[target].push(source);
        }
        self.edges.push(Arc::clone(&edge));
        JournalEntry::EdgeAdded {
            edge,
            source,
            target,
        }
    }

    pub(crate) fn remove_edge_at(&mut self, index: usize, source: usize, target: usize) -> JournalEntry {
        let edge = self.edges.remove(index);
        let source_slot = Self::remove_entry(&mut self.adjacency[source], target);
        let target_slot = if edge.is_directed() {
            None
        } else {
            Some(Self::remove_entry(&mut self.adjacency[target], source))
        };
        JournalEntry::EdgeRemoved {
            index,
            edge,
            source,
            target,
            source_slot,
            target_slot,
        }
    }

    /// Undoes a mutation. Entries must be reverted in reverse journal order.
    pub(crate) fn revert(&mut self, entry: JournalEntry) {
        match entry {
            JournalEntry::VertexAdded { .. } => {
                self.vertices.pop();
                self.adjacency.pop();
            }
            JournalEntry::VertexRemoved { index, vertex } => {
                for list in &mut self.adjacency {
                    for position in list.iter_mut().filter(|p| **p >= index) {
                        *position += 1;
                    }
                }
                self.vertices.insert(index, vertex);
                self.adjacency.insert(index, Vec::new());
            }
            JournalEntry::EdgeAdded {
                edge,
                source,
                target,
            } => {
                self.edges.pop();
                if !edge.is_directed() {
                    self.adjacency[target].pop();
                }
                self.adjacency[source].pop();
            }
            JournalEntry::EdgeRemoved {
                index,
                edge,
                source,
                target,
                source_slot,
                target_slot,
            } => {
                self.adjacency[source].insert(source_slot, target);
                if let Some(slot) = target_slot {
                    self.adjacency[target].insert(slot, source);
                }
                self.edges.insert(index, edge);
            }
        }
    }

    /// Removes the first `value` from `list`, returning its slot.
    fn remove_entry(list: &mut Vec<usize>, value: usize) -> usize {
        match list.iter().position(|&p| p == value) {
            Some(slot) => {
                list.remove(slot);
                slot
            }
            None => list.len(),
        }
    }
}
