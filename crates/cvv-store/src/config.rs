//! Replica configuration.

use cvv_core::DEFAULT_VERSION_EPSILON;

/// Configuration for a [`crate::Replica`].
#[derive(Clone, Debug)]
pub struct ReplicaConfig {
    /// Increment applied to the previous local version when the clock has
    /// not advanced past it.
    pub version_epsilon: f64,
}

impl Default for ReplicaConfig {
    fn default() -> Self {
        Self {
            version_epsilon: DEFAULT_VERSION_EPSILON,
        }
    }
}

/// Builder for replica configuration.
pub struct ReplicaConfigBuilder {
    config: ReplicaConfig,
}

impl ReplicaConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ReplicaConfig::default(),
        }
    }

    pub fn version_epsilon(mut self, epsilon: f64) -> Self {
        self.config.version_epsilon = epsilon;
        self
    }

    pub fn build(self) -> ReplicaConfig {
        self.config
    }
}

impl Default for ReplicaConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
