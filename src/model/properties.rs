//! Client properties and property change notification shared by all components.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use strum::{EnumCount, EnumIter};

use crate::utils::ListenerList;

/// A value stored in a component's client properties or carried by a [`PropertyChange`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

/// Discriminant of a [`PropertyValue`], as written to snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumCount, EnumIter)]
#[repr(u8)]
pub enum PropertyTag {
    /// [`PropertyValue::Bool`]
    Bool = 0,
    /// [`PropertyValue::Int`]
    Int = 1,
    /// [`PropertyValue::Float`]
    Float = 2,
    /// [`PropertyValue::Text`]
    Text = 3,
    /// [`PropertyValue::Bytes`]
    Bytes = 4,
}

impl PropertyValue {
    /// Returns the discriminant of this value.
    #[must_use]
    pub fn tag(&self) -> PropertyTag {
        match self {
            PropertyValue::Bool(_) => PropertyTag::Bool,
            PropertyValue::Int(_) => PropertyTag::Int,
            PropertyValue::Float(_) => PropertyTag::Float,
            PropertyValue::Text(_) => PropertyTag::Text,
            PropertyValue::Bytes(_) => PropertyTag::Bytes,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(value) => write!(f, "{value}"),
            PropertyValue::Int(value) => write!(f, "{value}"),
            PropertyValue::Float(value) => write!(f, "{value}"),
            PropertyValue::Text(value) => write!(f, "{value}"),
            PropertyValue::Bytes(value) => write!(f, "{value:02x?}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Int(i64::from(value))
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Float(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(value: Vec<u8>) -> Self {
        PropertyValue::Bytes(value)
    }
}

/// Names of the built-in properties reported through [`PropertyChange::name`].
pub mod names {
    /// Vertex x coordinate
    pub const X: &str = "x";
    /// Vertex y coordinate
    pub const Y: &str = "y";
    /// Vertex z coordinate
    pub const Z: &str = "z";
    /// Vertex ellipse width
    pub const WIDTH: &str = "width";
    /// Vertex ellipse height
    pub const HEIGHT: &str = "height";
    /// Vertex depth
    pub const DEPTH: &str = "depth";
    /// Component cost
    pub const COST: &str = "cost";
    /// Component label
    pub const LABEL: &str = "label";
    /// Edge directedness
    pub const DIRECTED: &str = "directed";
}

/// A single property change reported to [`PropertyListener`]s.
///
/// `old` or `new` is `None` when a client property is created or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    /// Name of the built-in property or key of the client property
    pub name: String,
    /// Value before the change
    pub old: Option<PropertyValue>,
    /// Value after the change
    pub new: Option<PropertyValue>,
}

/// Receives property changes of a vertex, edge or model.
pub trait PropertyListener: Send + Sync {
    /// Called after the property has changed.
    fn property_changed(&self, change: &PropertyChange);
}

impl<F> PropertyListener for F
where
    F: Fn(&PropertyChange) + Send + Sync,
{
    fn property_changed(&self, change: &PropertyChange) {
        self(change);
    }
}

/// Client property storage plus the listeners notified on any property change.
///
/// Every component embeds one of these. The property map is kept ordered so that
/// snapshots are written deterministically.
#[derive(Default)]
pub struct PropertySupport {
    listeners: ListenerList<dyn PropertyListener>,
    client: RwLock<BTreeMap<String, PropertyValue>>,
}

impl PropertySupport {
    /// Creates an empty property store without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a property listener.
    pub fn add_listener(&self, listener: Arc<dyn PropertyListener>) {
        self.listeners.add(listener);
    }

    /// Unregisters a property listener, returning whether it was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn PropertyListener>) -> bool {
        self.listeners.remove(listener)
    }

    /// Notifies listeners of a change, unless `old` and `new` are equal.
    pub fn fire(&self, name: &str, old: Option<PropertyValue>, new: Option<PropertyValue>) {
        if old == new || self.listeners.is_empty() {
            return;
        }
        let change = PropertyChange {
            name: name.to_string(),
            old,
            new,
        };
        for listener in self.listeners.snapshot().iter() {
            listener.property_changed(&change);
        }
    }

    /// Returns the client property stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        with_read!(self.client, |map: &BTreeMap<String, PropertyValue>| map
            .get(key)
            .cloned())
    }

    /// Sets (`Some`) or removes (`None`) the client property `key`.
    ///
    /// Listeners are notified only if the stored value actually changed.
    pub fn put(&self, key: &str, value: Option<PropertyValue>) {
        let old = with_write!(self.client, |map: &mut BTreeMap<String, PropertyValue>| {
            match &value {
                Some(value) => map.insert(key.to_string(), value.clone()),
                None => map.remove(key),
            }
        });
        self.fire(key, old, value);
    }

    /// Returns all client properties ordered by key.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, PropertyValue)> {
        with_read!(self.client, |map: &BTreeMap<String, PropertyValue>| map
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    /// Returns the number of client properties.
    #[must_use]
    pub fn len(&self) -> usize {
        with_read!(self.client, |map: &BTreeMap<String, PropertyValue>| map
            .len())
    }

    /// Returns `true` if no client property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PropertySupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySupport")
            .field("client", &self.entries())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(support: &PropertySupport) -> Arc<Mutex<Vec<PropertyChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        support.add_listener(Arc::new(move |change: &PropertyChange| {
            sink.lock().unwrap().push(change.clone());
        }));
        seen
    }

    #[test]
    fn test_put_fires_only_on_change() {
        let support = PropertySupport::new();
        let seen = recorder(&support);

        support.put("colour", Some("red".into()));
        support.put("colour", Some("red".into()));
        support.put("colour", Some("blue".into()));
        support.put("missing", None);
        support.put("colour", None);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].old, None);
        assert_eq!(seen[1].old, Some(PropertyValue::Text("red".into())));
        assert_eq!(seen[2].new, None);
        assert!(support.is_empty());
    }

    #[test]
    fn test_entries_are_ordered() {
        let support = PropertySupport::new();
        support.put("b", Some(2i64.into()));
        support.put("a", Some(true.into()));
        let keys: Vec<String> = support.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(support.get("b"), Some(PropertyValue::Int(2)));
    }

    #[test]
    fn test_tags() {
        assert_eq!(PropertyValue::Float(1.0).tag(), PropertyTag::Float);
        assert_eq!(PropertyTag::COUNT, 5);
        assert_eq!(PropertyValue::Bytes(vec![1, 2]).to_string(), "[01, 02]");
    }
}
