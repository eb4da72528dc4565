use serde::Deserialize;

/// Per-node instrumentation configuration, fixed at node construction.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct NodeConfig {
    /// Master switch. When false the node behaves exactly like an
    /// uninstrumented one: no input-state tracking, no companion
    /// publishers, no per-message work.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Queue depth for companion provenance publishers. A provenance record
    /// is a point-in-time snapshot; only the most recent one is meaningful
    /// to a late subscriber, so the default keeps a single slot.
    #[serde(default = "default_info_depth")]
    pub info_qos_depth: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_info_depth() -> usize {
    1
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            info_qos_depth: default_info_depth(),
        }
    }
}

impl NodeConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_enabled_with_single_slot() {
        let config = NodeConfig::default();
        assert!(config.enabled);
        assert_eq!(config.info_qos_depth, 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: NodeConfig = serde_json::from_str("{}").unwrap();
        assert!(config.enabled);

        let config: NodeConfig = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.info_qos_depth, 1);
    }
}
