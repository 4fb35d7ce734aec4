//! Configuration for model construction, undo history and persistence.
//!
//! [`ModelConfig`] carries the defaults used by
//! [`DefaultModelFactory`](crate::model::DefaultModelFactory) when creating vertices,
//! the bound applied by [`UndoHistory`](crate::model::UndoHistory), and whether
//! [`FileModelAccess`](crate::file::FileModelAccess) verifies snapshot digests.

/// Configuration for models, factories and model access.
///
/// # Examples
///
/// ```rust
/// use edgeloom::ModelConfig;
///
/// let config = ModelConfig {
///     vertex_width: 48,
///     ..ModelConfig::default()
/// };
/// assert_eq!(config.vertex_height, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Width of the hit-test ellipse given to new vertices (default: 32).
    pub vertex_width: i32,

    /// Height of the hit-test ellipse given to new vertices (default: 32).
    pub vertex_height: i32,

    /// Depth given to new vertices (default: 1).
    pub vertex_depth: i32,

    /// Maximum number of compound edits kept by an undo history (default: 100).
    pub undo_limit: usize,

    /// Verify the SHA-1 trailer when reading snapshots (default: true).
    pub verify_checksum: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            vertex_width: 32,
            vertex_height: 32,
            vertex_depth: 1,
            undo_limit: 100,
            verify_checksum: true,
        }
    }
}

impl ModelConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default ellipse size of new vertices.
    #[must_use]
    pub fn with_vertex_size(mut self, width: i32, height: i32) -> Self {
        self.vertex_width = width;
        self.vertex_height = height;
        self
    }

    /// Sets the undo history bound.
    #[must_use]
    pub fn with_undo_limit(mut self, limit: usize) -> Self {
        self.undo_limit = limit;
        self
    }

    /// Enables or disables snapshot digest verification.
    #[must_use]
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert_eq!(config.vertex_width, 32);
        assert_eq!(config.vertex_height, 32);
        assert_eq!(config.vertex_depth, 1);
        assert_eq!(config.undo_limit, 100);
        assert!(config.verify_checksum);
    }

    #[test]
    fn test_builders() {
        let config = ModelConfig::new()
            .with_vertex_size(10, 20)
            .with_undo_limit(3)
            .with_checksum_verification(false);
        assert_eq!(config.vertex_width, 10);
        assert_eq!(config.vertex_height, 20);
        assert_eq!(config.undo_limit, 3);
        assert!(!config.verify_checksum);
    }
}
