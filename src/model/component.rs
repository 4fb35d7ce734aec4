use std::fmt;
use std::sync::Arc;

use crate::model::{properties::PropertyValue, Edge, GraphModel, Vertex};

/// Either kind of model element, for APIs that accept both.
#[derive(Debug, Clone)]
pub enum Component {
    /// A vertex handle
    Vertex(Arc<Vertex>),
    /// An edge handle
    Edge(Arc<Edge>),
}

impl Component {
    /// Returns the vertex handle, if this is a vertex.
    #[must_use]
    pub fn as_vertex(&self) -> Option<&Arc<Vertex>> {
        match self {
            Component::Vertex(vertex) => Some(vertex),
            Component::Edge(_) => None,
        }
    }

    /// Returns the edge handle, if this is an edge.
    #[must_use]
    pub fn as_edge(&self) -> Option<&Arc<Edge>> {
        match self {
            Component::Edge(edge) => Some(edge),
            Component::Vertex(_) => None,
        }
    }

    /// Returns the cost of the element.
    #[must_use]
    pub fn cost(&self) -> f64 {
        match self {
            Component::Vertex(vertex) => vertex.cost(),
            Component::Edge(edge) => edge.cost(),
        }
    }

    /// Returns the label of the element.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Component::Vertex(vertex) => vertex.label(),
            Component::Edge(edge) => edge.label(),
        }
    }

    /// Returns a client property of the element.
    #[must_use]
    pub fn client_property(&self, key: &str) -> Option<PropertyValue> {
        match self {
            Component::Vertex(vertex) => vertex.client_property(key),
            Component::Edge(edge) => edge.client_property(key),
        }
    }

    /// Returns the model the element belongs to.
    #[must_use]
    pub fn model(&self) -> Option<Arc<GraphModel>> {
        match self {
            Component::Vertex(vertex) => vertex.model(),
            Component::Edge(edge) => edge.model(),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Component::Vertex(a), Component::Vertex(b)) => a == b,
            (Component::Edge(a), Component::Edge(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Arc<Vertex>> for Component {
    fn from(vertex: Arc<Vertex>) -> Self {
        Component::Vertex(vertex)
    }
}

impl From<Arc<Edge>> for Component {
    fn from(edge: Arc<Edge>) -> Self {
        Component::Edge(edge)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Vertex(vertex) => write!(f, "{vertex}"),
            Component::Edge(edge) => write!(f, "{edge}"),
        }
    }
}
