//! Edges between two vertices.

use std::f64::consts::PI;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, Weak};

use crate::{
    model::{
        properties::{names, PropertyListener, PropertySupport, PropertyValue},
        GraphModel, Vertex,
    },
    Result,
};

#[derive(Debug, Clone)]
struct EdgeState {
    directed: bool,
    cost: f64,
    label: String,
}

/// An edge of a [`GraphModel`], connecting a source and a target vertex.
///
/// The endpoints are fixed at construction. Two edges are equal when they connect
/// the very same vertex handles in the same order; coordinates are not compared.
///
/// # Examples
///
/// ```rust
/// use edgeloom::model::{Edge, Vertex};
/// use std::sync::Arc;
///
/// let a = Arc::new(Vertex::new(0, 0, 0));
/// let b = Arc::new(Vertex::new(3, 4, 0));
/// let edge = Edge::new(a, b, true);
/// assert!((edge.length() - 5.0).abs() < 1e-9);
/// ```
pub struct Edge {
    source: Arc<Vertex>,
    target: Arc<Vertex>,
    state: RwLock<EdgeState>,
    properties: PropertySupport,
    owner: RwLock<Weak<GraphModel>>,
}

impl Edge {
    /// Creates a detached edge with zero cost and an empty label.
    #[must_use]
    pub fn new(source: Arc<Vertex>, target: Arc<Vertex>, directed: bool) -> Self {
        Edge {
            source,
            target,
            state: RwLock::new(EdgeState {
                directed,
                cost: 0.0,
                label: String::new(),
            }),
            properties: PropertySupport::new(),
            owner: RwLock::new(Weak::new()),
        }
    }

    /// Returns the source vertex.
    #[must_use]
    pub fn source(&self) -> &Arc<Vertex> {
        &self.source
    }

    /// Returns the target vertex.
    #[must_use]
    pub fn target(&self) -> &Arc<Vertex> {
        &self.target
    }

    /// Returns `true` if the edge only runs from source to target.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        with_read!(self.state, |s: &EdgeState| s.directed)
    }

    /// Returns the cost.
    #[must_use]
    pub fn cost(&self) -> f64 {
        with_read!(self.state, |s: &EdgeState| s.cost)
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> String {
        with_read!(self.state, |s: &EdgeState| s.label.clone())
    }

    /// Changes the directedness of a detached edge.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::IllegalState`] if the edge belongs to a model, whose
    /// adjacency table depends on the flag.
    pub fn set_directed(&self, directed: bool) -> Result<()> {
        if self.model().is_some() {
            return Err(state_error!("cannot change directedness of an edge in a model"));
        }
        let old = with_write!(self.state, |s: &mut EdgeState| std::mem::replace(
            &mut s.directed,
            directed
        ));
        self.properties
            .fire(names::DIRECTED, Some(old.into()), Some(directed.into()));
        Ok(())
    }

    /// Sets the cost.
    pub fn set_cost(&self, cost: f64) {
        let old = with_write!(self.state, |s: &mut EdgeState| std::mem::replace(
            &mut s.cost,
            cost
        ));
        self.properties
            .fire(names::COST, Some(old.into()), Some(cost.into()));
    }

    /// Sets the label.
    pub fn set_label(&self, label: impl Into<String>) {
        let label = label.into();
        let old = with_write!(self.state, |s: &mut EdgeState| std::mem::replace(
            &mut s.label,
            label.clone()
        ));
        self.properties
            .fire(names::LABEL, Some(old.into()), Some(label.into()));
    }

    /// Returns the direction from source to target in radians, in `[0, 2π)`.
    ///
    /// The y axis points down, so the vertical delta is flipped.
    #[must_use]
    pub fn angle(&self) -> f64 {
        let (sx, sy, _) = self.source.position();
        let (tx, ty, _) = self.target.position();
        let angle = (f64::from(sy) - f64::from(ty)).atan2(f64::from(tx) - f64::from(sx));
        if angle < 0.0 {
            angle + 2.0 * PI
        } else {
            angle
        }
    }

    /// Returns the 3D distance between the endpoints.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.source.distance(&self.target)
    }

    /// Returns `true` if `vertex` is the source or the target of this edge.
    #[must_use]
    pub fn touches(&self, vertex: &Vertex) -> bool {
        *self.source == *vertex || *self.target == *vertex
    }

    /// Returns the model this edge belongs to, if any.
    #[must_use]
    pub fn model(&self) -> Option<Arc<GraphModel>> {
        with_read!(self.owner, |owner: &Weak<GraphModel>| owner.upgrade())
    }

    pub(crate) fn set_owner(&self, owner: Weak<GraphModel>) {
        with_write!(self.owner, |slot: &mut Weak<GraphModel>| *slot = owner);
    }

    /// Returns the client property stored under `key`.
    #[must_use]
    pub fn client_property(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key)
    }

    /// Sets or, with `None`, removes a client property.
    pub fn put_client_property(&self, key: &str, value: Option<PropertyValue>) {
        self.properties.put(key, value);
    }

    /// Returns all client properties ordered by key.
    #[must_use]
    pub fn client_properties(&self) -> Vec<(String, PropertyValue)> {
        self.properties.entries()
    }

    /// Registers a listener for attribute and client property changes.
    pub fn add_property_listener(&self, listener: Arc<dyn PropertyListener>) {
        self.properties.add_listener(listener);
    }

    /// Unregisters a property listener.
    pub fn remove_property_listener(&self, listener: &Arc<dyn PropertyListener>) -> bool {
        self.properties.remove_listener(listener)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source) && Arc::ptr_eq(&self.target, &other.target)
    }
}

impl Eq for Edge {}

impl Hash for Edge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.source).hash(state);
        Arc::as_ptr(&self.target).hash(state);
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = with_read!(self.state, |s: &EdgeState| s.clone());
        f.debug_struct("Edge")
            .field("source", &self.source.position())
            .field("target", &self.target.position())
            .field("directed", &state.directed)
            .field("cost", &state.cost)
            .field("label", &state.label)
            .finish()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.is_directed() { "->" } else { "--" };
        write!(f, "{} {arrow} {}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: i32, y: i32) -> Arc<Vertex> {
        Arc::new(Vertex::new(x, y, 0))
    }

    #[test]
    fn test_identity_equality() {
        let a = vertex(0, 0);
        let b = vertex(1, 1);
        let twin = vertex(0, 0);

        let e1 = Edge::new(Arc::clone(&a), Arc::clone(&b), true);
        let e2 = Edge::new(Arc::clone(&a), Arc::clone(&b), false);
        let e3 = Edge::new(twin, Arc::clone(&b), true);
        let e4 = Edge::new(b, a, true);

        assert_eq!(e1, e2);
        assert_ne!(e1, e3);
        assert_ne!(e1, e4);
    }

    #[test]
    fn test_angle_quadrants() {
        let origin = vertex(0, 0);
        let right = Edge::new(Arc::clone(&origin), vertex(10, 0), true);
        let up = Edge::new(Arc::clone(&origin), vertex(0, -10), true);
        let down = Edge::new(Arc::clone(&origin), vertex(0, 10), true);

        assert!(right.angle().abs() < 1e-12);
        assert!((up.angle() - PI / 2.0).abs() < 1e-12);
        assert!((down.angle() - 3.0 * PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_length_and_touches() {
        let a = vertex(0, 0);
        let b = Arc::new(Vertex::new(2, 3, 6));
        let edge = Edge::new(Arc::clone(&a), Arc::clone(&b), false);
        assert!((edge.length() - 7.0).abs() < 1e-12);
        assert!(edge.touches(&a));
        assert!(edge.touches(&Vertex::new(2, 3, 6)));
        assert!(!edge.touches(&Vertex::new(9, 9, 9)));
    }

    #[test]
    fn test_set_directed_detached() {
        let edge = Edge::new(vertex(0, 0), vertex(1, 0), false);
        edge.set_directed(true).unwrap();
        assert!(edge.is_directed());
        assert_eq!(edge.to_string(), "(0, 0, 0) -> (1, 0, 0)");
    }
}
