//! Deployment-time configuration.
//!
//! Capacities are fixed at construction; there is no runtime reallocation path (see
//! the Buffer Pool's append-only contract).

use serde::{Deserialize, Serialize};

/// Depth-buffer convention. Must stay consistent with the projection matrix the host
/// camera produces — pairing the wrong clear value with the wrong compare function
/// silently produces blank frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepthConvention {
    Standard,
    ReversedZ,
}

impl DepthConvention {
    pub fn clear_value(self) -> f32 {
        match self {
            DepthConvention::Standard => 1.0,
            DepthConvention::ReversedZ => 0.0,
        }
    }

    pub fn compare_function(self) -> wgpu::CompareFunction {
        match self {
            DepthConvention::Standard => wgpu::CompareFunction::Less,
            DepthConvention::ReversedZ => wgpu::CompareFunction::Greater,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AtlasConfig {
    pub capacity_vertices: u32,
    pub capacity_indices: u32,
    pub capacity_instances: u32,
    pub max_commands: u32,
    pub depth_convention: DepthConvention,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            capacity_vertices: 1_000_000,
            capacity_indices: 3_000_000,
            capacity_instances: 1_000_000,
            max_commands: 4_096,
            depth_convention: DepthConvention::ReversedZ,
        }
    }
}

impl AtlasConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = AtlasConfig::default();
        let text = toml::to_string(&cfg).expect("serialize config");
        let parsed = AtlasConfig::from_toml_str(&text).expect("parse config");
        assert_eq!(parsed.capacity_vertices, cfg.capacity_vertices);
        assert_eq!(parsed.depth_convention, cfg.depth_convention);
    }
}
