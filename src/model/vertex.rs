//! Vertices: points in integer 3D space with a hit-test ellipse.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock, Weak};

use crate::model::{
    properties::{names, PropertyListener, PropertySupport, PropertyValue},
    GraphModel,
};

#[derive(Debug, Clone)]
struct VertexState {
    x: i32,
    y: i32,
    z: i32,
    width: i32,
    height: i32,
    depth: i32,
    cost: f64,
    label: String,
}

/// A vertex of a [`GraphModel`].
///
/// Vertices are shared as `Arc<Vertex>` handles. Their attributes use interior
/// mutability so a vertex can be repositioned or relabelled while it is part of a
/// model; such changes are reported to [`PropertyListener`]s and are not recorded
/// in the model's undo history.
///
/// Two vertices are equal when their coordinates are equal, regardless of size,
/// cost or label.
///
/// # Examples
///
/// ```rust
/// use edgeloom::model::Vertex;
///
/// let vertex = Vertex::new(10, 10, 0);
/// vertex.set_width(20);
/// vertex.set_height(10);
/// assert!(vertex.contains(19, 10, 5));
/// assert!(!vertex.contains(10, 16, 0));
/// assert_eq!(vertex, Vertex::new(10, 10, 0));
/// ```
pub struct Vertex {
    state: RwLock<VertexState>,
    properties: PropertySupport,
    owner: RwLock<Weak<GraphModel>>,
}

impl Vertex {
    /// Creates a detached vertex at `(x, y, z)` with a zero-size ellipse, depth 1,
    /// zero cost and an empty label.
    #[must_use]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Vertex {
            state: RwLock::new(VertexState {
                x,
                y,
                z,
                width: 0,
                height: 0,
                depth: 1,
                cost: 0.0,
                label: String::new(),
            }),
            properties: PropertySupport::new(),
            owner: RwLock::new(Weak::new()),
        }
    }

    /// Returns the x coordinate.
    #[must_use]
    pub fn x(&self) -> i32 {
        with_read!(self.state, |s: &VertexState| s.x)
    }

    /// Returns the y coordinate.
    #[must_use]
    pub fn y(&self) -> i32 {
        with_read!(self.state, |s: &VertexState| s.y)
    }

    /// Returns the z coordinate.
    #[must_use]
    pub fn z(&self) -> i32 {
        with_read!(self.state, |s: &VertexState| s.z)
    }

    /// Returns `(x, y, z)` read atomically.
    #[must_use]
    pub fn position(&self) -> (i32, i32, i32) {
        with_read!(self.state, |s: &VertexState| (s.x, s.y, s.z))
    }

    /// Returns the ellipse width.
    #[must_use]
    pub fn width(&self) -> i32 {
        with_read!(self.state, |s: &VertexState| s.width)
    }

    /// Returns the ellipse height.
    #[must_use]
    pub fn height(&self) -> i32 {
        with_read!(self.state, |s: &VertexState| s.height)
    }

    /// Returns the depth.
    #[must_use]
    pub fn depth(&self) -> i32 {
        with_read!(self.state, |s: &VertexState| s.depth)
    }

    /// Returns the cost.
    #[must_use]
    pub fn cost(&self) -> f64 {
        with_read!(self.state, |s: &VertexState| s.cost)
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> String {
        with_read!(self.state, |s: &VertexState| s.label.clone())
    }

    /// Moves the vertex along the x axis.
    pub fn set_x(&self, x: i32) {
        let old = with_write!(self.state, |s: &mut VertexState| std::mem::replace(
            &mut s.x, x
        ));
        self.properties
            .fire(names::X, Some(old.into()), Some(x.into()));
    }

    /// Moves the vertex along the y axis.
    pub fn set_y(&self, y: i32) {
        let old = with_write!(self.state, |s: &mut VertexState| std::mem::replace(
            &mut s.y, y
        ));
        self.properties
            .fire(names::Y, Some(old.into()), Some(y.into()));
    }

    /// Moves the vertex along the z axis.
    pub fn set_z(&self, z: i32) {
        let old = with_write!(self.state, |s: &mut VertexState| std::mem::replace(
            &mut s.z, z
        ));
        self.properties
            .fire(names::Z, Some(old.into()), Some(z.into()));
    }

    /// Sets the ellipse width. Non-positive values are ignored.
    pub fn set_width(&self, width: i32) {
        self.set_dimension(names::WIDTH, width, |s| &mut s.width);
    }

    /// Sets the ellipse height. Non-positive values are ignored.
    pub fn set_height(&self, height: i32) {
        self.set_dimension(names::HEIGHT, height, |s| &mut s.height);
    }

    /// Sets the depth. Non-positive values are ignored.
    pub fn set_depth(&self, depth: i32) {
        self.set_dimension(names::DEPTH, depth, |s| &mut s.depth);
    }

    /// Sets the cost.
    pub fn set_cost(&self, cost: f64) {
        let old = with_write!(self.state, |s: &mut VertexState| std::mem::replace(
            &mut s.cost,
            cost
        ));
        self.properties
            .fire(names::COST, Some(old.into()), Some(cost.into()));
    }

    /// Sets the label.
    pub fn set_label(&self, label: impl Into<String>) {
        let label = label.into();
        let old = with_write!(self.state, |s: &mut VertexState| std::mem::replace(
            &mut s.label,
            label.clone()
        ));
        self.properties
            .fire(names::LABEL, Some(old.into()), Some(label.into()));
    }

    /// Tests whether `(x, y)` lies inside the ellipse centred on this vertex.
    ///
    /// The semi-axes are `width / 2` and `height / 2`; `z` is ignored. A vertex
    /// whose ellipse has a zero semi-axis contains no point.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32, _z: i32) -> bool {
        let state = with_read!(self.state, |s: &VertexState| s.clone());
        let a = i128::from(state.width / 2);
        let b = i128::from(state.height / 2);
        if a == 0 || b == 0 {
            return false;
        }

        let nx = i128::from(x) - i128::from(state.x);
        let ny = i128::from(y) - i128::from(state.y);
        // nx²/a² + ny²/b² <= 1, scaled by a²b² to stay in integers
        nx * nx * b * b + ny * ny * a * a <= a * a * b * b
    }

    /// Returns the Euclidean distance between both vertices in 3D.
    #[must_use]
    pub fn distance(&self, other: &Vertex) -> f64 {
        let (x1, y1, z1) = self.position();
        let (x2, y2, z2) = other.position();
        let dx = f64::from(x1) - f64::from(x2);
        let dy = f64::from(y1) - f64::from(y2);
        let dz = f64::from(z1) - f64::from(z2);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Returns the model this vertex belongs to, if any.
    #[must_use]
    pub fn model(&self) -> Option<Arc<GraphModel>> {
        with_read!(self.owner, |owner: &Weak<GraphModel>| owner.upgrade())
    }

    /// Returns `true` if this vertex belongs to `model`.
    #[must_use]
    pub fn is_owned_by(&self, model: &GraphModel) -> bool {
        with_read!(self.owner, |owner: &Weak<GraphModel>| std::ptr::eq(
            owner.as_ptr(),
            model
        ))
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

    fn set_dimension(
        &self,
        name: &str,
        value: i32,
        field: impl FnOnce(&mut VertexState) -> &mut i32,
    ) {
        if value <= 0 {
            return;
        }
        let old = with_write!(self.state, |s: &mut VertexState| std::mem::replace(
            field(s),
            value
        ));
        self.properties
            .fire(name, Some(old.into()), Some(value.into()));
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.position() == other.position()
    }
}

impl Eq for Vertex {}

impl Hash for Vertex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.position().hash(state);
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = with_read!(self.state, |s: &VertexState| s.clone());
        f.debug_struct("Vertex")
            .field("x", &state.x)
            .field("y", &state.y)
            .field("z", &state.z)
            .field("width", &state.width)
            .field("height", &state.height)
            .field("cost", &state.cost)
            .field("label", &state.label)
            .finish()
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, z) = self.position();
        let label = self.label();
        if label.is_empty() {
            write!(f, "({x}, {y}, {z})")
        } else {
            write!(f, "{label} ({x}, {y}, {z})")
        }
    }
}
