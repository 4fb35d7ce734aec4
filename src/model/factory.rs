//! Construction of models, components and model access.

use std::sync::Arc;

use crate::{
    file::{FileModelAccess, ModelAccess, ModelSource},
    model::{Edge, GraphModel, Vertex},
    ModelConfig,
};

/// Creates the objects making up a model.
///
/// Callers hand a factory around explicitly; there is no process-wide instance.
pub trait ModelFactory: Send + Sync {
    /// Creates an empty model.
    fn create_model(&self) -> Arc<GraphModel>;

    /// Creates a vertex that belongs to no model yet.
    fn create_vertex(&self, x: i32, y: i32, z: i32, cost: f64) -> Arc<Vertex>;

    /// Creates an edge that belongs to no model yet.
    fn create_edge(&self, source: Arc<Vertex>, target: Arc<Vertex>, directed: bool) -> Arc<Edge>;

    /// Creates the reader and writer for a model source.
    fn create_access(&self, source: Arc<ModelSource>) -> Box<dyn ModelAccess>;
}

/// The stock [`ModelFactory`], sizing vertices from a [`ModelConfig`].
#[derive(Debug, Clone, Default)]
pub struct DefaultModelFactory {
    config: ModelConfig,
}

impl DefaultModelFactory {
    /// Creates a factory using [`ModelConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory using `config`.
    #[must_use]
    pub fn with_config(config: ModelConfig) -> Self {
        DefaultModelFactory { config }
    }

    /// Returns the configuration in use.
    #[must_use]
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ModelFactory for DefaultModelFactory {
    fn create_model(&self) -> Arc<GraphModel> {
        GraphModel::new()
    }

    fn create_vertex(&self, x: i32, y: i32, z: i32, cost: f64) -> Arc<Vertex> {
        let vertex = Vertex::new(x, y, z);
        vertex.set_width(self.config.vertex_width);
        vertex.set_height(self.config.vertex_height);
        vertex.set_depth(self.config.vertex_depth);
        vertex.set_cost(cost);
        Arc::new(vertex)
    }

    fn create_edge(&self, source: Arc<Vertex>, target: Arc<Vertex>, directed: bool) -> Arc<Edge> {
        Arc::new(Edge::new(source, target, directed))
    }

    fn create_access(&self, source: Arc<ModelSource>) -> Box<dyn ModelAccess> {
        Box::new(FileModelAccess::with_config(source, self.config.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_defaults_from_config() {
        let factory =
            DefaultModelFactory::with_config(ModelConfig::new().with_vertex_size(10, 20));
        let vertex = factory.create_vertex(1, 2, 3, 4.5);
        assert_eq!(vertex.position(), (1, 2, 3));
        assert_eq!((vertex.width(), vertex.height(), vertex.depth()), (10, 20, 1));
        assert_eq!(vertex.cost(), 4.5);
        assert!(vertex.model().is_none());
        assert!(vertex.contains(5, 1, 0));
    }

    #[test]
    fn test_edge_and_model() {
        let factory = DefaultModelFactory::new();
        let model = factory.create_model();
        let a = factory.create_vertex(0, 0, 0, 0.0);
        let b = factory.create_vertex(10, 0, 0, 0.0);
        let edge = factory.create_edge(Arc::clone(&a), Arc::clone(&b), true);
        assert!(edge.is_directed());
        assert!(Arc::ptr_eq(edge.source(), &a));
        assert!(!model.is_in_transaction());
        assert_eq!(model.vertex_count(), 0);
    }
}
